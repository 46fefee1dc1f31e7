use serde::{Deserialize, Serialize};
use std::fmt;

use super::{Endpoint, HttpMethod};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Low,
    Medium,
    High,
    Critical,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Severity::Info => "INFO",
            Severity::Low => "LOW",
            Severity::Medium => "MEDIUM",
            Severity::High => "HIGH",
            Severity::Critical => "CRITICAL",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RuleId {
    TraceReflection,
    UnauthenticatedWrite,
    OptionsMethodDisclosure,
    ConnectAccepted,
    ServerError,
    TlsVerificationFailure,
    AnomalousOutcome,
    NoEndpointsTested,
}

impl RuleId {
    pub fn as_str(&self) -> &'static str {
        match self {
            RuleId::TraceReflection => "trace-reflection",
            RuleId::UnauthenticatedWrite => "unauthenticated-write",
            RuleId::OptionsMethodDisclosure => "options-method-disclosure",
            RuleId::ConnectAccepted => "connect-accepted",
            RuleId::ServerError => "server-error",
            RuleId::TlsVerificationFailure => "tls-verification-failure",
            RuleId::AnomalousOutcome => "anomalous-outcome",
            RuleId::NoEndpointsTested => "no-endpoints-tested",
        }
    }

    pub fn recommendation(&self) -> &'static str {
        match self {
            RuleId::TraceReflection => "Disable TRACE in the web server or reverse proxy",
            RuleId::UnauthenticatedWrite => {
                "Require authentication for write methods or reject them with 405"
            }
            RuleId::OptionsMethodDisclosure => {
                "Restrict the Allow header to methods the resource actually serves"
            }
            RuleId::ConnectAccepted => "Reject CONNECT on application endpoints",
            RuleId::ServerError => "Return 405 for unsupported methods instead of failing",
            RuleId::TlsVerificationFailure => "Serve a certificate valid for this host",
            RuleId::AnomalousOutcome | RuleId::NoEndpointsTested => "",
        }
    }
}

impl fmt::Display for RuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    pub endpoint: Option<Endpoint>,
    pub method: Option<HttpMethod>,
    pub severity: Severity,
    pub rule: RuleId,
    pub rationale: String,
}

impl Finding {
    pub fn new(
        severity: Severity,
        rule: RuleId,
        endpoint: &Endpoint,
        method: HttpMethod,
        rationale: impl Into<String>,
    ) -> Self {
        Self {
            endpoint: Some(endpoint.clone()),
            method: Some(method),
            severity,
            rule,
            rationale: rationale.into(),
        }
    }

    pub fn no_endpoints_tested(rationale: impl Into<String>) -> Self {
        Self {
            endpoint: None,
            method: None,
            severity: Severity::Info,
            rule: RuleId::NoEndpointsTested,
            rationale: rationale.into(),
        }
    }

    pub fn location(&self) -> String {
        match (&self.method, &self.endpoint) {
            (Some(m), Some(e)) => format!("{:7} {}", m, e),
            (None, Some(e)) => e.to_string(),
            _ => "-".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::Critical > Severity::High);
        assert!(Severity::High > Severity::Medium);
        assert!(Severity::Low > Severity::Info);
    }

    #[test]
    fn test_rule_id_serde_matches_as_str() {
        for rule in [
            RuleId::TraceReflection,
            RuleId::UnauthenticatedWrite,
            RuleId::OptionsMethodDisclosure,
            RuleId::NoEndpointsTested,
        ] {
            let json = serde_json::to_string(&rule).unwrap();
            assert_eq!(json, format!("\"{}\"", rule.as_str()));
        }
    }
}
