use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::future::join_all;
use tokio::sync::Semaphore;
use tracing::debug;

use crate::cancel::CancellationFlag;
use crate::http::{HttpTransport, ProbeRequest};
use crate::models::{
    Endpoint, HttpMethod, MethodProbeResult, ProbeOutcome, SkipReason, TransportErrorKind,
};

#[derive(Debug, Clone)]
pub struct ProbeSettings {
    pub timeout: Duration,
    pub user_agent: String,
    pub ignore_ssl: bool,
}

/// Issues exactly one request per configured method. Failures are reported
/// as-is; nothing is retried.
pub struct MethodProber {
    transport: Arc<dyn HttpTransport>,
    semaphore: Arc<Semaphore>,
    settings: ProbeSettings,
    cancel: CancellationFlag,
}

impl MethodProber {
    pub fn new(
        transport: Arc<dyn HttpTransport>,
        settings: ProbeSettings,
        concurrency: usize,
        cancel: CancellationFlag,
    ) -> Self {
        Self {
            transport,
            semaphore: Arc::new(Semaphore::new(concurrency.max(1))),
            settings,
            cancel,
        }
    }

    /// Results come back in `methods` order regardless of completion order.
    pub async fn probe(&self, endpoint: &Endpoint, methods: &[HttpMethod]) -> Vec<MethodProbeResult> {
        let futures: Vec<_> = methods
            .iter()
            .map(|&method| self.probe_method(endpoint, method))
            .collect();

        join_all(futures).await
    }

    async fn probe_method(&self, endpoint: &Endpoint, method: HttpMethod) -> MethodProbeResult {
        let skipped = || {
            MethodProbeResult::new(
                endpoint.clone(),
                method,
                ProbeOutcome::Skipped {
                    reason: SkipReason::Cancelled,
                },
            )
        };

        if self.cancel.is_cancelled() {
            return skipped();
        }
        let Ok(_permit) = self.semaphore.acquire().await else {
            return skipped();
        };
        // Cancellation may have arrived while waiting for a slot.
        if self.cancel.is_cancelled() {
            return skipped();
        }

        let request = ProbeRequest::new(
            method,
            endpoint.url().clone(),
            self.settings.timeout,
            !self.settings.ignore_ssl,
        )
        .header("User-Agent", self.settings.user_agent.as_str());

        let start = Instant::now();
        let sent = tokio::time::timeout(self.settings.timeout, self.transport.send(&request)).await;
        let latency_ms = start.elapsed().as_millis() as u64;

        let outcome = match sent {
            Ok(Ok(response)) => {
                debug!(%method, url = %endpoint, status = response.status, latency_ms, "probe responded");
                ProbeOutcome::Responded {
                    status: response.status,
                    body_excerpt: response.body_text(),
                    headers: response.headers,
                    latency_ms,
                }
            }
            Ok(Err(failure)) => {
                debug!(%method, url = %endpoint, error = %failure.kind, latency_ms, "probe failed");
                ProbeOutcome::TransportError {
                    error: failure.kind,
                    message: failure.message,
                    latency_ms,
                    verify_tls: !self.settings.ignore_ssl,
                }
            }
            Err(_) => {
                debug!(%method, url = %endpoint, latency_ms, "probe timed out");
                ProbeOutcome::TransportError {
                    error: TransportErrorKind::Timeout,
                    message: format!("no response within {:?}", self.settings.timeout),
                    latency_ms,
                    verify_tls: !self.settings.ignore_ssl,
                }
            }
        };

        MethodProbeResult::new(endpoint.clone(), method, outcome)
    }
}
