use std::time::Duration;

use crate::analyzer::RuleConfig;
use crate::discovery::DiscoveryLimits;
use crate::error::ConfigError;
use crate::models::{AuditParameters, Endpoint, HttpMethod};
use crate::prober::ProbeSettings;

pub const DEFAULT_USER_AGENT: &str = concat!("verbaudit/", env!("CARGO_PKG_VERSION"));
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_CONCURRENCY: usize = 10;

/// Everything one audit run needs. Built by the CLI, validated by the
/// auditor before any request is sent.
#[derive(Debug, Clone)]
pub struct AuditConfig {
    pub target: String,
    /// Raw `-e` list: paths or absolute URLs, comma or whitespace separated.
    pub endpoints: Option<String>,
    pub methods: Vec<HttpMethod>,
    pub discover: bool,
    pub limits: DiscoveryLimits,
    pub user_agent: String,
    pub timeout_secs: u64,
    pub ignore_ssl: bool,
    pub concurrency: usize,
    pub rules: RuleConfig,
}

impl AuditConfig {
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            endpoints: None,
            methods: HttpMethod::ALL.to_vec(),
            discover: false,
            limits: DiscoveryLimits::default(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            ignore_ssl: false,
            concurrency: DEFAULT_CONCURRENCY,
            rules: RuleConfig::default(),
        }
    }

    /// Default method set minus `exclude`, in default order.
    pub fn methods_excluding(exclude: &[HttpMethod]) -> Vec<HttpMethod> {
        HttpMethod::ALL
            .iter()
            .copied()
            .filter(|m| !exclude.contains(m))
            .collect()
    }

    /// Returns the normalized target on success.
    pub fn validate(&self) -> Result<Endpoint, ConfigError> {
        let target = Endpoint::parse(&self.target, self.limits.query_policy)?;

        if self.methods.is_empty() {
            return Err(ConfigError::EmptyMethodSet);
        }
        if self.concurrency == 0 {
            return Err(ConfigError::InvalidBound { name: "concurrency" });
        }
        if self.timeout_secs == 0 {
            return Err(ConfigError::InvalidBound { name: "timeout" });
        }
        if self.discover && self.limits.max_endpoints == 0 {
            return Err(ConfigError::InvalidBound { name: "max endpoints" });
        }

        Ok(target)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn probe_settings(&self) -> ProbeSettings {
        ProbeSettings {
            timeout: self.timeout(),
            user_agent: self.user_agent.clone(),
            ignore_ssl: self.ignore_ssl,
        }
    }

    pub fn parameters(&self) -> AuditParameters {
        AuditParameters {
            timeout_secs: self.timeout_secs,
            ignore_ssl: self.ignore_ssl,
            methods: self.methods.clone(),
            discovery: self.discover,
            max_depth: self.limits.max_depth,
            max_endpoints: self.limits.max_endpoints,
            user_agent: self.user_agent.clone(),
            concurrency: self.concurrency,
        }
    }
}
