use clap::{Parser, Subcommand};

use crate::analyzer::RuleConfig;
use crate::config::{AuditConfig, DEFAULT_CONCURRENCY, DEFAULT_TIMEOUT_SECS, DEFAULT_USER_AGENT};
use crate::discovery::DiscoveryLimits;
use crate::error::ConfigError;
use crate::models::{HttpMethod, QueryPolicy};

#[derive(Parser)]
#[command(name = "verbaudit")]
#[command(version, about = "Audit which HTTP methods a web application accepts")]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    Audit(AuditArgs),

    Report {
        #[arg(short, long)]
        input: String,

        #[arg(short, long, default_value = "html")]
        format: String,

        #[arg(short, long)]
        output: Option<String>,
    },
}

#[derive(clap::Args)]
pub struct AuditArgs {
    #[arg(short, long)]
    pub url: String,

    /// Paths or absolute URLs, comma or space separated
    #[arg(short, long, num_args = 1.., value_delimiter = ',')]
    pub endpoints: Vec<String>,

    /// Methods to probe (default: all nine)
    #[arg(short, long, num_args = 1.., value_delimiter = ',')]
    pub methods: Vec<String>,

    /// Methods to leave out of the default set
    #[arg(short = 'x', long, num_args = 1.., value_delimiter = ',')]
    pub exclude: Vec<String>,

    #[arg(short, long)]
    pub output: Option<String>,

    /// json or html
    #[arg(short, long)]
    pub format: Option<String>,

    #[arg(long)]
    pub discover: bool,

    #[arg(long, default_value = "2")]
    pub max_depth: usize,

    #[arg(long, default_value = "100")]
    pub max_endpoints: usize,

    #[arg(long)]
    pub allow_cross_origin: bool,

    #[arg(long)]
    pub strip_query: bool,

    #[arg(long, default_value = DEFAULT_USER_AGENT)]
    pub user_agent: String,

    #[arg(short, long, default_value_t = DEFAULT_TIMEOUT_SECS)]
    pub timeout: u64,

    #[arg(long)]
    pub ignore_ssl: bool,

    #[arg(short, long, default_value_t = DEFAULT_CONCURRENCY)]
    pub concurrency: usize,

    /// JSON file overriding classification thresholds
    #[arg(long)]
    pub rules: Option<String>,

    #[arg(short, long)]
    pub verbose: bool,
}

impl AuditArgs {
    pub fn to_config(&self) -> Result<AuditConfig, ConfigError> {
        let exclude =
            HttpMethod::parse_list(&self.exclude.join(",")).map_err(ConfigError::UnknownMethod)?;
        let methods = if self.methods.is_empty() {
            AuditConfig::methods_excluding(&exclude)
        } else {
            let mut methods = HttpMethod::parse_list(&self.methods.join(","))
                .map_err(ConfigError::UnknownMethod)?;
            methods.retain(|m| !exclude.contains(m));
            methods
        };

        let rules = match &self.rules {
            Some(path) => RuleConfig::load(path)?,
            None => RuleConfig::default(),
        };

        let query_policy = if self.strip_query {
            QueryPolicy::Strip
        } else {
            QueryPolicy::Preserve
        };

        Ok(AuditConfig {
            target: self.url.clone(),
            endpoints: (!self.endpoints.is_empty()).then(|| self.endpoints.join(",")),
            methods,
            discover: self.discover,
            limits: DiscoveryLimits {
                max_depth: self.max_depth,
                max_endpoints: self.max_endpoints,
                same_origin_only: !self.allow_cross_origin,
                query_policy,
            },
            user_agent: self.user_agent.clone(),
            timeout_secs: self.timeout,
            ignore_ssl: self.ignore_ssl,
            concurrency: self.concurrency,
            rules,
        })
    }
}
