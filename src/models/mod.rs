mod endpoint;
mod finding;
mod method;
mod report;
mod result;

pub use endpoint::{Endpoint, QueryPolicy};
pub use finding::{Finding, RuleId, Severity};
pub use method::HttpMethod;
pub use report::{AuditParameters, AuditReport, AuditSummary};
pub use result::{
    MethodProbeResult, OutcomeRow, OutcomeTable, ProbeOutcome, SkipReason, TransportErrorKind,
};
