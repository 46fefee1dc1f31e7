use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use futures::future::join_all;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{info, warn};

use super::endpoint::EndpointParser;
use crate::analyzer::Classifier;
use crate::cancel::CancellationFlag;
use crate::config::AuditConfig;
use crate::discovery::Discoverer;
use crate::error::{ConfigError, DiscoveryFetchError};
use crate::http::{HttpTransport, ProbeRequest};
use crate::models::{AuditReport, Endpoint, Finding, HttpMethod, OutcomeRow, OutcomeTable};
use crate::prober::{MethodProber, ProbeSettings};

/// Runs one audit: resolve endpoints, probe, classify, assemble the report.
/// Holds no per-run state, so one auditor can run any number of audits.
pub struct Auditor {
    transport: Arc<dyn HttpTransport>,
    cancel: CancellationFlag,
    show_progress: bool,
    verbose: bool,
}

struct ResolvedEndpoints {
    endpoints: Vec<Endpoint>,
    failures: Vec<DiscoveryFetchError>,
}

impl Auditor {
    pub fn new(transport: Arc<dyn HttpTransport>) -> Self {
        Self {
            transport,
            cancel: CancellationFlag::new(),
            show_progress: false,
            verbose: false,
        }
    }

    pub fn with_cancellation(mut self, cancel: CancellationFlag) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn with_progress(mut self, show_progress: bool, verbose: bool) -> Self {
        self.show_progress = show_progress;
        self.verbose = verbose;
        self
    }

    /// Only configuration problems are errors. Unreachable targets and failed
    /// probes end up in the report.
    pub async fn run(&self, config: &AuditConfig) -> Result<AuditReport, ConfigError> {
        let target = config.validate()?;
        let started_at = Utc::now();
        let start = Instant::now();
        let settings = config.probe_settings();

        info!(
            "Auditing {} with {} methods (discovery: {})",
            target,
            config.methods.len(),
            config.discover
        );

        let resolved = self.resolve_endpoints(config, &target, &settings).await?;
        let table = self.probe_all(config, settings, resolved.endpoints).await;

        let classifier = Classifier::new(config.rules.clone());
        let mut findings = classifier.classify(&table);

        if table.is_empty() {
            let reason = resolved
                .failures
                .first()
                .map(|f| f.to_string())
                .unwrap_or_else(|| "no endpoints were resolved".to_string());
            warn!("No endpoints tested: {}", reason);
            findings.push(Finding::no_endpoints_tested(format!(
                "No endpoints were tested ({})",
                reason
            )));
        }

        let interrupted = self.cancel.is_cancelled();
        if interrupted {
            warn!("Audit interrupted; report contains partial results");
        }

        info!(
            "Audit complete: {} endpoints, {} probes, {} findings",
            table.len(),
            table.probe_count(),
            findings.len()
        );

        Ok(AuditReport {
            target: target.to_string(),
            parameters: config.parameters(),
            outcomes: table,
            findings,
            discovery_failures: resolved.failures,
            started_at,
            finished_at: Utc::now(),
            duration_ms: start.elapsed().as_millis() as u64,
            interrupted,
        })
    }

    async fn resolve_endpoints(
        &self,
        config: &AuditConfig,
        target: &Endpoint,
        settings: &ProbeSettings,
    ) -> Result<ResolvedEndpoints, ConfigError> {
        if let Some(list) = &config.endpoints {
            let endpoints = EndpointParser::parse(list, target, config.limits.query_policy)?;
            info!("Using {} explicit endpoints", endpoints.len());
            return Ok(ResolvedEndpoints {
                endpoints,
                failures: Vec::new(),
            });
        }

        if config.discover {
            let discoverer = Discoverer::new(
                self.transport.clone(),
                settings.clone(),
                config.concurrency,
                self.cancel.clone(),
            );
            let outcome = discoverer.discover(target.as_str(), &config.limits).await?;
            return Ok(ResolvedEndpoints {
                endpoints: outcome.endpoints,
                failures: outcome.failures,
            });
        }

        Ok(self.preflight(target, settings).await)
    }

    /// Reachability check for the bare target. A transport failure leaves the
    /// endpoint set empty.
    async fn preflight(&self, target: &Endpoint, settings: &ProbeSettings) -> ResolvedEndpoints {
        let request = ProbeRequest::new(
            HttpMethod::Get,
            target.url().clone(),
            settings.timeout,
            !settings.ignore_ssl,
        )
        .header("User-Agent", settings.user_agent.as_str());

        let failure = match tokio::time::timeout(settings.timeout, self.transport.send(&request)).await {
            Ok(Ok(_)) => None,
            Ok(Err(failure)) => Some(failure.to_string()),
            Err(_) => Some(format!("no response within {:?}", settings.timeout)),
        };

        match failure {
            None => ResolvedEndpoints {
                endpoints: vec![target.clone()],
                failures: Vec::new(),
            },
            Some(reason) => {
                warn!("Target {} is unreachable: {}", target, reason);
                ResolvedEndpoints {
                    endpoints: Vec::new(),
                    failures: vec![DiscoveryFetchError {
                        url: target.to_string(),
                        reason,
                    }],
                }
            }
        }
    }

    async fn probe_all(
        &self,
        config: &AuditConfig,
        settings: ProbeSettings,
        endpoints: Vec<Endpoint>,
    ) -> OutcomeTable {
        let prober = MethodProber::new(
            self.transport.clone(),
            settings,
            config.concurrency,
            self.cancel.clone(),
        );
        let pb = self.create_progress_bar(endpoints.len());

        let futures: Vec<_> = endpoints
            .into_iter()
            .map(|endpoint| {
                let prober = &prober;
                let pb = &pb;
                async move {
                    pb.set_message(endpoint.display_path());
                    let results = prober.probe(&endpoint, &config.methods).await;
                    pb.inc(1);
                    OutcomeRow::new(endpoint, results)
                }
            })
            .collect();

        let rows = join_all(futures).await;
        pb.finish_with_message("Audit complete");
        rows.into_iter().collect()
    }

    fn create_progress_bar(&self, total: usize) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }

        let pb = ProgressBar::new(total as u64);
        let template = if self.verbose {
            "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}"
        } else {
            "{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len}"
        };

        match ProgressStyle::default_bar().template(template) {
            Ok(style) => pb.set_style(style.progress_chars("#>-")),
            Err(e) => warn!("Invalid progress bar template: {}", e),
        }

        pb
    }
}
