use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use super::{Endpoint, HttpMethod};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransportErrorKind {
    Timeout,
    ConnectionRefused,
    ConnectionFailed,
    Dns,
    Tls,
    TooManyRedirects,
    InvalidRequest,
    Other,
}

impl fmt::Display for TransportErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TransportErrorKind::Timeout => "timeout",
            TransportErrorKind::ConnectionRefused => "connection refused",
            TransportErrorKind::ConnectionFailed => "connection failed",
            TransportErrorKind::Dns => "dns failure",
            TransportErrorKind::Tls => "tls failure",
            TransportErrorKind::TooManyRedirects => "too many redirects",
            TransportErrorKind::InvalidRequest => "invalid request",
            TransportErrorKind::Other => "transport error",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    Cancelled,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::Cancelled => write!(f, "audit cancelled before dispatch"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ProbeOutcome {
    Responded {
        status: u16,
        headers: BTreeMap<String, String>,
        body_excerpt: String,
        latency_ms: u64,
    },
    TransportError {
        error: TransportErrorKind,
        message: String,
        latency_ms: u64,
        /// Whether certificate verification was on for this request.
        #[serde(default = "verify_tls_default")]
        verify_tls: bool,
    },
    Skipped {
        reason: SkipReason,
    },
}

fn verify_tls_default() -> bool {
    true
}

impl ProbeOutcome {
    pub fn status(&self) -> Option<u16> {
        match self {
            ProbeOutcome::Responded { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Case-insensitive header lookup. Header names are stored lower-cased.
    pub fn header(&self, name: &str) -> Option<&str> {
        match self {
            ProbeOutcome::Responded { headers, .. } => {
                headers.get(&name.to_ascii_lowercase()).map(String::as_str)
            }
            _ => None,
        }
    }

    pub fn body(&self) -> Option<&str> {
        match self {
            ProbeOutcome::Responded { body_excerpt, .. } => Some(body_excerpt),
            _ => None,
        }
    }

    pub fn transport_error(&self) -> Option<TransportErrorKind> {
        match self {
            ProbeOutcome::TransportError { error, .. } => Some(*error),
            _ => None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status().is_some_and(|s| (200..300).contains(&s))
    }

    pub fn label(&self) -> String {
        match self {
            ProbeOutcome::Responded { status, .. } => status.to_string(),
            ProbeOutcome::TransportError { .. } => "ERR".to_string(),
            ProbeOutcome::Skipped { .. } => "SKIP".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodProbeResult {
    pub endpoint: Endpoint,
    pub method: HttpMethod,
    pub outcome: ProbeOutcome,
}

impl MethodProbeResult {
    pub fn new(endpoint: Endpoint, method: HttpMethod, outcome: ProbeOutcome) -> Self {
        Self {
            endpoint,
            method,
            outcome,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutcomeRow {
    pub endpoint: Endpoint,
    pub results: Vec<MethodProbeResult>,
}

impl OutcomeRow {
    pub fn new(endpoint: Endpoint, results: Vec<MethodProbeResult>) -> Self {
        Self { endpoint, results }
    }

    pub fn get(&self, method: HttpMethod) -> Option<&MethodProbeResult> {
        self.results.iter().find(|r| r.method == method)
    }
}

/// Per-endpoint probe results for one audit run, in endpoint resolution order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OutcomeTable {
    rows: Vec<OutcomeRow>,
}

impl OutcomeTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, row: OutcomeRow) {
        self.rows.push(row);
    }

    pub fn rows(&self) -> &[OutcomeRow] {
        &self.rows
    }

    pub fn get(&self, endpoint: &Endpoint) -> Option<&OutcomeRow> {
        self.rows.iter().find(|r| &r.endpoint == endpoint)
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn probe_count(&self) -> usize {
        self.rows.iter().map(|r| r.results.len()).sum()
    }

    pub fn transport_error_count(&self) -> usize {
        self.rows
            .iter()
            .flat_map(|r| &r.results)
            .filter(|r| r.outcome.transport_error().is_some())
            .count()
    }
}

impl FromIterator<OutcomeRow> for OutcomeTable {
    fn from_iter<I: IntoIterator<Item = OutcomeRow>>(iter: I) -> Self {
        Self {
            rows: iter.into_iter().collect(),
        }
    }
}
