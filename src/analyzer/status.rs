use crate::models::{HttpMethod, OutcomeRow};

pub const METHOD_NOT_ALLOWED: u16 = 405;

pub struct StatusAnalyzer;

impl StatusAnalyzer {
    pub fn is_valid(status: u16) -> bool {
        (100..=599).contains(&status)
    }

    pub fn is_server_error(status: u16) -> bool {
        (500..=599).contains(&status)
    }

    /// Whether the baseline `GET` on this row answered with one of the
    /// challenge statuses. A missing or failed baseline counts as no challenge.
    pub fn baseline_challenged(row: &OutcomeRow, challenge_statuses: &[u16]) -> bool {
        row.get(HttpMethod::Get)
            .and_then(|r| r.outcome.status())
            .is_some_and(|s| challenge_statuses.contains(&s))
    }

    /// Splits an `Allow`/`Public` header value into upper-cased method tokens.
    pub fn allowed_methods(header: &str) -> Vec<String> {
        header
            .split(',')
            .map(|m| m.trim().to_ascii_uppercase())
            .filter(|m| !m.is_empty())
            .collect()
    }
}
