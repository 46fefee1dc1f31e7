use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Finding, HttpMethod, OutcomeTable, Severity};
use crate::error::DiscoveryFetchError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditParameters {
    pub timeout_secs: u64,
    pub ignore_ssl: bool,
    pub methods: Vec<HttpMethod>,
    pub discovery: bool,
    pub max_depth: usize,
    pub max_endpoints: usize,
    pub user_agent: String,
    pub concurrency: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditReport {
    pub target: String,
    pub parameters: AuditParameters,
    pub outcomes: OutcomeTable,
    pub findings: Vec<Finding>,
    #[serde(default)]
    pub discovery_failures: Vec<DiscoveryFetchError>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub duration_ms: u64,
    #[serde(default)]
    pub interrupted: bool,
}

impl AuditReport {
    pub fn max_severity(&self) -> Option<Severity> {
        self.findings.iter().map(|f| f.severity).max()
    }

    pub fn no_endpoints_tested(&self) -> bool {
        self.outcomes.is_empty()
    }

    pub fn summary(&self) -> AuditSummary {
        AuditSummary::from_report(self)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditSummary {
    pub total_endpoints: usize,
    pub total_probes: usize,
    pub transport_errors: usize,
    pub duration_ms: u64,
    pub critical_count: usize,
    pub high_count: usize,
    pub medium_count: usize,
    pub low_count: usize,
    pub info_count: usize,
    pub clean_endpoints: usize,
}

impl AuditSummary {
    pub fn from_report(report: &AuditReport) -> Self {
        let mut summary = Self {
            total_endpoints: report.outcomes.len(),
            total_probes: report.outcomes.probe_count(),
            transport_errors: report.outcomes.transport_error_count(),
            duration_ms: report.duration_ms,
            ..Self::default()
        };

        for finding in &report.findings {
            match finding.severity {
                Severity::Critical => summary.critical_count += 1,
                Severity::High => summary.high_count += 1,
                Severity::Medium => summary.medium_count += 1,
                Severity::Low => summary.low_count += 1,
                Severity::Info => summary.info_count += 1,
            }
        }

        summary.clean_endpoints = report
            .outcomes
            .rows()
            .iter()
            .filter(|row| {
                !report
                    .findings
                    .iter()
                    .any(|f| f.endpoint.as_ref() == Some(&row.endpoint))
            })
            .count();

        summary
    }
}
