pub mod analyzer;
pub mod cancel;
pub mod cli;
pub mod config;
pub mod discovery;
pub mod error;
pub mod http;
pub mod models;
pub mod prober;
pub mod reporter;
pub mod scanner;

pub use analyzer::{Classifier, RuleConfig};
pub use cancel::CancellationFlag;
pub use config::AuditConfig;
pub use discovery::{Discoverer, DiscoveryLimits};
pub use error::ConfigError;
pub use http::{HttpClient, HttpTransport};
pub use models::{
    AuditReport, Endpoint, Finding, HttpMethod, OutcomeTable, ProbeOutcome, RuleId, Severity,
};
pub use prober::MethodProber;
pub use reporter::{ConsoleReporter, HtmlExporter, JsonExporter};
pub use scanner::Auditor;
