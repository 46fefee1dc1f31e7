use std::collections::{BTreeSet, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};

use futures::stream::{self, StreamExt};
use tracing::{debug, info, warn};
use url::Url;

use super::links::{extract_links, is_html};
use crate::cancel::CancellationFlag;
use crate::error::{ConfigError, DiscoveryFetchError};
use crate::http::{HttpTransport, ProbeRequest};
use crate::models::{Endpoint, HttpMethod, QueryPolicy};
use crate::prober::ProbeSettings;

#[derive(Debug, Clone)]
pub struct DiscoveryLimits {
    pub max_depth: usize,
    pub max_endpoints: usize,
    pub same_origin_only: bool,
    pub query_policy: QueryPolicy,
}

impl Default for DiscoveryLimits {
    fn default() -> Self {
        Self {
            max_depth: 2,
            max_endpoints: 100,
            same_origin_only: true,
            query_policy: QueryPolicy::Preserve,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct DiscoveryOutcome {
    /// Sorted by normalized URL.
    pub endpoints: Vec<Endpoint>,
    pub failures: Vec<DiscoveryFetchError>,
    pub pages_fetched: usize,
}

/// Crawl state for one `discover` call. Every mark-and-enqueue goes through
/// the one mutex around this struct.
#[derive(Default)]
struct Frontier {
    visited: HashSet<Endpoint>,
    collected: BTreeSet<Endpoint>,
    next_level: Vec<Endpoint>,
    failures: Vec<DiscoveryFetchError>,
    pages_fetched: usize,
    full: bool,
}

impl Frontier {
    fn collect(&mut self, endpoint: &Endpoint, max_endpoints: usize) -> bool {
        if self.collected.contains(endpoint) {
            return true;
        }
        if self.collected.len() >= max_endpoints {
            self.full = true;
            return false;
        }
        self.collected.insert(endpoint.clone());
        if self.collected.len() >= max_endpoints {
            self.full = true;
        }
        true
    }
}

struct CrawlContext<'a> {
    seed: &'a Url,
    limits: &'a DiscoveryLimits,
    frontier: &'a Mutex<Frontier>,
}

impl CrawlContext<'_> {
    fn lock(&self) -> MutexGuard<'_, Frontier> {
        self.frontier.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Breadth-first same-origin crawler. Pages within one depth level are
/// fetched concurrently by up to `workers` tasks.
pub struct Discoverer {
    transport: Arc<dyn HttpTransport>,
    settings: ProbeSettings,
    workers: usize,
    cancel: CancellationFlag,
}

impl Discoverer {
    pub fn new(
        transport: Arc<dyn HttpTransport>,
        settings: ProbeSettings,
        workers: usize,
        cancel: CancellationFlag,
    ) -> Self {
        Self {
            transport,
            settings,
            workers: workers.max(1),
            cancel,
        }
    }

    /// Fails only when `seed_url` is malformed; page-level failures are
    /// recorded in the outcome.
    pub async fn discover(
        &self,
        seed_url: &str,
        limits: &DiscoveryLimits,
    ) -> Result<DiscoveryOutcome, ConfigError> {
        let seed = Endpoint::parse(seed_url, limits.query_policy)?;
        info!("Starting discovery from {} (depth {}, max {} endpoints)", seed, limits.max_depth, limits.max_endpoints);

        let frontier = Mutex::new(Frontier::default());
        let ctx = CrawlContext {
            seed: seed.url(),
            limits,
            frontier: &frontier,
        };
        ctx.lock().visited.insert(seed.clone());

        let mut level = vec![seed.clone()];
        let mut depth = 0;

        while !level.is_empty() {
            if self.cancel.is_cancelled() {
                warn!("Discovery cancelled at depth {}", depth);
                break;
            }

            debug!("Crawling {} pages at depth {}", level.len(), depth);
            let is_seed_level = depth == 0;
            stream::iter(level)
                .map(|page| self.crawl_page(page, depth, is_seed_level, &ctx))
                .buffer_unordered(self.workers)
                .collect::<Vec<()>>()
                .await;

            let mut state = ctx.lock();
            if state.full {
                info!("Reached endpoint limit ({})", limits.max_endpoints);
                break;
            }
            level = std::mem::take(&mut state.next_level);
            drop(state);
            depth += 1;
        }

        let state = frontier.into_inner().unwrap_or_else(|poisoned| poisoned.into_inner());
        info!(
            "Discovery complete: {} endpoints, {} pages fetched, {} failures",
            state.collected.len(),
            state.pages_fetched,
            state.failures.len()
        );

        Ok(DiscoveryOutcome {
            endpoints: state.collected.into_iter().collect(),
            failures: state.failures,
            pages_fetched: state.pages_fetched,
        })
    }

    async fn crawl_page(&self, page: Endpoint, depth: usize, is_seed: bool, ctx: &CrawlContext<'_>) {
        if self.cancel.is_cancelled() || ctx.lock().full {
            return;
        }

        let request = ProbeRequest::new(
            HttpMethod::Get,
            page.url().clone(),
            self.settings.timeout,
            !self.settings.ignore_ssl,
        )
        .header("User-Agent", self.settings.user_agent.as_str());

        let response = match tokio::time::timeout(self.settings.timeout, self.transport.send(&request)).await {
            Ok(Ok(response)) => response,
            Ok(Err(failure)) => {
                warn!("Failed to fetch {}: {}", page, failure);
                ctx.lock().failures.push(DiscoveryFetchError {
                    url: page.to_string(),
                    reason: failure.to_string(),
                });
                return;
            }
            Err(_) => {
                warn!("Timed out fetching {}", page);
                ctx.lock().failures.push(DiscoveryFetchError {
                    url: page.to_string(),
                    reason: format!("no response within {:?}", self.settings.timeout),
                });
                return;
            }
        };

        {
            let mut state = ctx.lock();
            state.pages_fetched += 1;
            if is_seed {
                state.collect(&page, ctx.limits.max_endpoints);
            }
            if response.status >= 400 {
                state.failures.push(DiscoveryFetchError {
                    url: page.to_string(),
                    reason: format!("HTTP {}", response.status),
                });
                return;
            }
        }

        if !is_html(response.content_type()) {
            debug!("Skipping link extraction for non-HTML page {}", page);
            return;
        }

        let links = extract_links(&response.body_text(), page.url());
        debug!("Found {} links on {} (depth {})", links.len(), page, depth);

        let mut state = ctx.lock();
        for link in links {
            let Ok(endpoint) = Endpoint::from_url(link, ctx.limits.query_policy) else {
                continue;
            };
            if ctx.limits.same_origin_only && !endpoint.is_same_origin(ctx.seed) {
                continue;
            }
            if !state.collect(&endpoint, ctx.limits.max_endpoints) {
                break;
            }
            if depth < ctx.limits.max_depth && state.visited.insert(endpoint.clone()) {
                state.next_level.push(endpoint);
            }
            if state.full {
                break;
            }
        }
    }
}
