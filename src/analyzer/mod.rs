mod classifier;
mod rules;
mod status;

pub use classifier::{Classifier, sort_findings};
pub use rules::{
    AnomalousOutcomeRule, ConnectAcceptedRule, OptionsDisclosureRule, Rule, RuleConfig,
    ServerErrorRule, StatusRange, TlsFailureRule, TraceReflectionRule, UnauthenticatedWriteRule,
    default_rules,
};
pub use status::StatusAnalyzer;
