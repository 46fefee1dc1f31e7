use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::sync::LazyLock;

use super::status::{METHOD_NOT_ALLOWED, StatusAnalyzer};
use crate::error::ConfigError;
use crate::models::{
    Finding, HttpMethod, MethodProbeResult, OutcomeRow, ProbeOutcome, RuleId, Severity,
    TransportErrorKind,
};

static TRACE_ECHO: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?im)^(TRACE\s+\S+\s+HTTP/\d|user-agent\s*:)").expect("static trace echo pattern")
});

/// Half-open status range `[min, max)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusRange {
    pub min: u16,
    pub max: u16,
}

impl StatusRange {
    pub fn contains(&self, status: u16) -> bool {
        (self.min..self.max).contains(&status)
    }
}

/// Thresholds for the rule set. Every field is optional in a rules file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleConfig {
    pub trace_max_status: u16,
    pub write_methods: Vec<HttpMethod>,
    pub write_success: StatusRange,
    pub challenge_statuses: Vec<u16>,
    pub options_expected: Vec<HttpMethod>,
    pub flag_tls_failures: bool,
    pub disabled_rules: Vec<RuleId>,
}

impl Default for RuleConfig {
    fn default() -> Self {
        Self {
            trace_max_status: 400,
            write_methods: vec![HttpMethod::Put, HttpMethod::Delete],
            write_success: StatusRange { min: 200, max: 300 },
            challenge_statuses: vec![401, 403],
            options_expected: vec![
                HttpMethod::Get,
                HttpMethod::Post,
                HttpMethod::Head,
                HttpMethod::Options,
            ],
            flag_tls_failures: false,
            disabled_rules: Vec::new(),
        }
    }
}

impl RuleConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::RulesRead {
            path: path.display().to_string(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| ConfigError::RulesParse {
            path: path.display().to_string(),
            source,
        })
    }

    pub fn is_enabled(&self, rule: RuleId) -> bool {
        !self.disabled_rules.contains(&rule)
    }
}

/// One independent, pure check over a single probe result. `row` gives
/// access to the other results of the same endpoint.
pub trait Rule: Send + Sync {
    fn id(&self) -> RuleId;

    fn evaluate(
        &self,
        row: &OutcomeRow,
        result: &MethodProbeResult,
        config: &RuleConfig,
    ) -> Option<Finding>;
}

pub fn default_rules() -> Vec<Box<dyn Rule>> {
    vec![
        Box::new(TraceReflectionRule),
        Box::new(UnauthenticatedWriteRule),
        Box::new(OptionsDisclosureRule),
        Box::new(ConnectAcceptedRule),
        Box::new(ServerErrorRule),
        Box::new(TlsFailureRule),
        Box::new(AnomalousOutcomeRule),
    ]
}

fn responded_status(result: &MethodProbeResult) -> Option<u16> {
    result
        .outcome
        .status()
        .filter(|&s| StatusAnalyzer::is_valid(s) && s != METHOD_NOT_ALLOWED)
}

pub struct TraceReflectionRule;

impl Rule for TraceReflectionRule {
    fn id(&self) -> RuleId {
        RuleId::TraceReflection
    }

    fn evaluate(&self, _row: &OutcomeRow, result: &MethodProbeResult, config: &RuleConfig) -> Option<Finding> {
        if result.method != HttpMethod::Trace {
            return None;
        }
        let status = responded_status(result).filter(|&s| s < config.trace_max_status)?;

        let reflected = result.outcome.body().is_some_and(|b| TRACE_ECHO.is_match(b));
        let rationale = if reflected {
            format!("TRACE answered {} and echoed the request back, enabling cross-site tracing of headers", status)
        } else {
            format!("TRACE answered {}; the server may reflect request headers (cross-site tracing)", status)
        };

        Some(Finding::new(Severity::High, self.id(), &result.endpoint, result.method, rationale))
    }
}

pub struct UnauthenticatedWriteRule;

impl Rule for UnauthenticatedWriteRule {
    fn id(&self) -> RuleId {
        RuleId::UnauthenticatedWrite
    }

    fn evaluate(&self, row: &OutcomeRow, result: &MethodProbeResult, config: &RuleConfig) -> Option<Finding> {
        if !config.write_methods.contains(&result.method) {
            return None;
        }
        let status = responded_status(result).filter(|&s| config.write_success.contains(s))?;
        if StatusAnalyzer::baseline_challenged(row, &config.challenge_statuses) {
            return None;
        }

        Some(Finding::new(
            Severity::Critical,
            self.id(),
            &result.endpoint,
            result.method,
            format!(
                "{} succeeded with {} and no authentication challenge was seen on the baseline GET",
                result.method, status
            ),
        ))
    }
}

pub struct OptionsDisclosureRule;

impl Rule for OptionsDisclosureRule {
    fn id(&self) -> RuleId {
        RuleId::OptionsMethodDisclosure
    }

    fn evaluate(&self, _row: &OutcomeRow, result: &MethodProbeResult, config: &RuleConfig) -> Option<Finding> {
        if result.method != HttpMethod::Options {
            return None;
        }
        responded_status(result)?;

        let header = result
            .outcome
            .header("allow")
            .or_else(|| result.outcome.header("public"))?;

        let extra: Vec<String> = StatusAnalyzer::allowed_methods(header)
            .into_iter()
            .filter(|m| {
                HttpMethod::parse(m).is_none_or(|parsed| !config.options_expected.contains(&parsed))
            })
            .collect();

        if extra.is_empty() {
            return None;
        }

        Some(Finding::new(
            Severity::Medium,
            self.id(),
            &result.endpoint,
            result.method,
            format!("OPTIONS advertises additional methods: {}", extra.join(", ")),
        ))
    }
}

pub struct ConnectAcceptedRule;

impl Rule for ConnectAcceptedRule {
    fn id(&self) -> RuleId {
        RuleId::ConnectAccepted
    }

    fn evaluate(&self, _row: &OutcomeRow, result: &MethodProbeResult, _config: &RuleConfig) -> Option<Finding> {
        if result.method != HttpMethod::Connect || !result.outcome.is_success() {
            return None;
        }
        let status = result.outcome.status()?;

        Some(Finding::new(
            Severity::Medium,
            self.id(),
            &result.endpoint,
            result.method,
            format!("CONNECT answered {}; the endpoint may tunnel arbitrary connections", status),
        ))
    }
}

pub struct ServerErrorRule;

impl Rule for ServerErrorRule {
    fn id(&self) -> RuleId {
        RuleId::ServerError
    }

    fn evaluate(&self, _row: &OutcomeRow, result: &MethodProbeResult, _config: &RuleConfig) -> Option<Finding> {
        let status = result.outcome.status().filter(|&s| StatusAnalyzer::is_server_error(s))?;

        Some(Finding::new(
            Severity::Low,
            self.id(),
            &result.endpoint,
            result.method,
            format!("{} caused a {} server error; the method may be unhandled", result.method, status),
        ))
    }
}

pub struct TlsFailureRule;

impl Rule for TlsFailureRule {
    fn id(&self) -> RuleId {
        RuleId::TlsVerificationFailure
    }

    fn evaluate(&self, _row: &OutcomeRow, result: &MethodProbeResult, config: &RuleConfig) -> Option<Finding> {
        if !config.flag_tls_failures {
            return None;
        }
        match &result.outcome {
            ProbeOutcome::TransportError {
                error: TransportErrorKind::Tls,
                message,
                verify_tls: true,
                ..
            } => Some(Finding::new(
                Severity::Info,
                self.id(),
                &result.endpoint,
                result.method,
                format!("TLS verification failed: {}", message),
            )),
            _ => None,
        }
    }
}

pub struct AnomalousOutcomeRule;

impl Rule for AnomalousOutcomeRule {
    fn id(&self) -> RuleId {
        RuleId::AnomalousOutcome
    }

    fn evaluate(&self, row: &OutcomeRow, result: &MethodProbeResult, _config: &RuleConfig) -> Option<Finding> {
        let rationale = if result.endpoint != row.endpoint {
            format!("Result recorded for {} under row {}", result.endpoint, row.endpoint)
        } else {
            match result.outcome.status() {
                Some(status) if !StatusAnalyzer::is_valid(status) => {
                    format!("Server answered with out-of-range status {}", status)
                }
                _ => return None,
            }
        };

        Some(Finding::new(Severity::Info, self.id(), &row.endpoint, result.method, rationale))
    }
}
