//! Scrape orchestrator — cache cadence, regional fan-out, snapshot swap.
//!
//! Exposition requests call `collect()`. The first request after the cache
//! TTL has elapsed takes the writer lock and starts a scrape cycle; requests
//! arriving while a cycle is running get the previous snapshot right away.
//! The cycle runs on its own task holding the lock, so it completes and is
//! installed even if the request that started it goes away. A finished cycle
//! is installed with a single `ArcSwap::store`, so readers never see a
//! partially built `MetricSet`.

use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tokio::task::JoinSet;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use pricing_fetch::{CancelHandle, FetchContext, scrape_region};

use crate::metric_set::{MetricSet, ScrapeSnapshot};

/// Writer-side state, only touched while holding the lock.
#[derive(Debug)]
struct RefreshState {
    next_eligible: Instant,
    scrapes_total: u64,
}

pub struct ScrapeOrchestrator {
    inner: Arc<Inner>,
}

/// Everything a detached scrape cycle needs.
struct Inner {
    ctx: FetchContext,
    regions: Vec<String>,
    cache_ttl: Duration,
    scrape_timeout: Option<Duration>,
    current: ArcSwap<ScrapeSnapshot>,
    state: Arc<Mutex<RefreshState>>,
}

impl ScrapeOrchestrator {
    /// Regions, cache TTL, and deadline are taken from `ctx.config`. The
    /// first `collect()` always scrapes.
    pub fn new(ctx: FetchContext) -> Self {
        let mut regions: Vec<String> = Vec::with_capacity(ctx.config.regions.len());
        for region in &ctx.config.regions {
            if !regions.contains(region) {
                regions.push(region.clone());
            }
        }

        let inner = Inner {
            cache_ttl: ctx.config.cache_ttl,
            scrape_timeout: ctx.config.scrape_timeout,
            regions,
            ctx,
            current: ArcSwap::from_pointee(ScrapeSnapshot::default()),
            state: Arc::new(Mutex::new(RefreshState {
                next_eligible: Instant::now(),
                scrapes_total: 0,
            })),
        };
        Self { inner: Arc::new(inner) }
    }

    pub fn regions(&self) -> &[String] {
        &self.inner.regions
    }

    /// The most recently installed snapshot.
    pub fn snapshot(&self) -> Arc<ScrapeSnapshot> {
        self.inner.current.load_full()
    }

    /// Snapshot to serve for an exposition request, refreshing it first if
    /// the cache has expired and no other refresh is running.
    ///
    /// Dropping the returned future does not stop a refresh it started.
    pub async fn collect(&self) -> Arc<ScrapeSnapshot> {
        let Ok(state) = self.inner.state.clone().try_lock_owned() else {
            debug!("scrape in flight, serving previous snapshot");
            return self.snapshot();
        };

        if Instant::now() < state.next_eligible {
            debug!("serving cached prices");
            return self.snapshot();
        }

        let inner = self.inner.clone();
        match tokio::spawn(async move { inner.refresh(state).await }).await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!(error = %e, "scrape cycle task failed");
                self.snapshot()
            }
        }
    }
}

impl Inner {
    /// Run one cycle and install it. The lock is held until the new
    /// snapshot and the next refresh time are both in place.
    async fn refresh(&self, mut state: OwnedMutexGuard<RefreshState>) -> Arc<ScrapeSnapshot> {
        let (metrics, error_count, duration) = self.scrape().await;
        state.scrapes_total += 1;
        state.next_eligible = Instant::now() + self.cache_ttl;

        let snapshot = Arc::new(ScrapeSnapshot {
            metrics,
            error_count,
            duration_secs: duration.as_secs_f64(),
            scrapes_total: state.scrapes_total,
        });
        self.current.store(snapshot.clone());

        info!(
            series = snapshot.metrics.len(),
            errors = error_count,
            duration_ms = duration.as_millis() as u64,
            "scrape finished"
        );
        snapshot
    }

    /// One scrape cycle: a task per region, joined as they complete.
    async fn scrape(&self) -> (MetricSet, u64, Duration) {
        let start = Instant::now();
        let (cancel_handle, cancel) = CancelHandle::new();
        let ctx = self.ctx.for_cycle(cancel);

        let mut tasks = JoinSet::new();
        for region in &self.regions {
            debug!(%region, "querying ec2 prices");
            tasks.spawn(scrape_region(ctx.clone(), region.clone()));
        }
        info!(regions = self.regions.len(), "scrape started");

        let mut metrics = MetricSet::new();
        let mut deadline = self.scrape_timeout.map(|timeout| start + timeout);
        loop {
            let joined = match deadline {
                Some(at) => match tokio::time::timeout_at(at, tasks.join_next()).await {
                    Ok(joined) => joined,
                    Err(_) => {
                        warn!(
                            outstanding = tasks.len(),
                            "scrape deadline reached, cancelling outstanding regions"
                        );
                        cancel_handle.cancel();
                        deadline = None;
                        continue;
                    }
                },
                None => tasks.join_next().await,
            };

            let Some(joined) = joined else { break };
            match joined {
                Ok(region) => {
                    debug!(region = %region.region, observations = region.observations.len(), "region joined");
                    metrics.extend(region.observations);
                }
                Err(e) => {
                    warn!(error = %e, "region task failed");
                    ctx.errors.record();
                }
            }
        }

        (metrics, ctx.errors.get(), start.elapsed())
    }
}
