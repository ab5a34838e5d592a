//! Per-region scrape task.
//!
//! Runs every enabled fetcher for one region concurrently. The region
//! contributes all of its observations or none: if any fetcher fails with a
//! `FetchError`, the others are dropped, one error is counted, and the
//! region comes back empty.

use tracing::{debug, warn};

use pricing_core::{Lifecycle, PriceObservation};

use crate::context::FetchContext;
use crate::error::{FetchError, FetchResult};
use crate::ondemand::fetch_on_demand;
use crate::savings_plan::fetch_savings_plans;
use crate::spot::fetch_spot;

/// Outcome of one region task.
#[derive(Debug)]
pub struct RegionScrape {
    pub region: String,
    pub observations: Vec<PriceObservation>,
    /// Whether the region's contribution was discarded.
    pub failed: bool,
}

/// Fetch everything enabled for `region`. Never fails; failures are logged
/// and counted on `ctx.errors`.
pub async fn scrape_region(ctx: FetchContext, region: String) -> RegionScrape {
    let config = &ctx.config;

    let spot = async {
        if config.is_enabled(Lifecycle::Spot) {
            fetch_spot(&ctx, &region).await
        } else {
            Ok(Vec::new())
        }
    };
    let on_demand = async {
        if config.is_enabled(Lifecycle::OnDemand) {
            fetch_on_demand(&ctx, &region).await
        } else {
            Ok(Vec::new())
        }
    };
    let savings_plans = async {
        if config.savings_plans_enabled() {
            fetch_savings_plans(&ctx, &region).await
        } else {
            Ok(Vec::new())
        }
    };

    let result: FetchResult<_> = tokio::try_join!(spot, on_demand, savings_plans);
    match result {
        Ok((spot, on_demand, savings_plans)) => {
            let mut observations = spot;
            observations.extend(on_demand);
            observations.extend(savings_plans);
            debug!(%region, observations = observations.len(), "region scraped");
            RegionScrape {
                region,
                observations,
                failed: false,
            }
        }
        Err(e) => {
            match &e {
                FetchError::Cancelled => warn!(%region, "region scrape cancelled"),
                FetchError::ProviderUnavailable(_) => {
                    warn!(%region, error = %e, "region scrape failed, dropping its prices")
                }
            }
            ctx.errors.record();
            RegionScrape {
                region,
                observations: Vec::new(),
                failed: true,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    use pricing_core::{InstanceShape, OperatingSystem, SavingsPlanType, ScrapeConfig};

    use crate::cancel::CancelHandle;
    use crate::catalog::InstanceCatalog;
    use crate::stub::{StubSource, on_demand_document, savings_plan_rate, spot_record};

    fn source() -> StubSource {
        StubSource::new()
            .with_zones("eu-west-1", &["eu-west-1a", "eu-west-1b"])
            .with_spot("eu-west-1", spot_record("eu-west-1a", "m5.large", "0.035"))
            .with_on_demand(
                "eu-west-1",
                OperatingSystem::Linux,
                on_demand_document("SKU1", "m5.large", "Linux", "0.107"),
            )
            .with_savings_plan(
                "eu-west-1",
                SavingsPlanType::Compute,
                savings_plan_rate("m5.large", "0.067", SavingsPlanType::Compute, "No Upfront", 1),
            )
    }

    fn context(source: StubSource, config: ScrapeConfig) -> FetchContext {
        FetchContext::new(
            Arc::new(source),
            Arc::new(InstanceCatalog::from_shapes([InstanceShape::new("m5.large", 8192, 2)])),
            Arc::new(config),
        )
    }

    fn lifecycles(scrape: &RegionScrape) -> (usize, usize) {
        let spot = scrape
            .observations
            .iter()
            .filter(|o| o.labels().lifecycle == Lifecycle::Spot)
            .count();
        (spot, scrape.observations.len() - spot)
    }

    #[tokio::test]
    async fn runs_every_enabled_fetcher() {
        let config = ScrapeConfig {
            savings_plan_types: vec![SavingsPlanType::Compute],
            ..ScrapeConfig::default()
        };
        let ctx = context(source(), config);

        let scrape = scrape_region(ctx.clone(), "eu-west-1".into()).await;
        assert!(!scrape.failed);
        // spot: 1 record; on-demand: 1 SKU x 2 zones; savings plan: 1 rate
        assert_eq!(lifecycles(&scrape), (3, 9));
        assert_eq!(ctx.errors.get(), 0);
    }

    #[tokio::test]
    async fn disabled_lifecycles_are_not_queried() {
        let config = ScrapeConfig {
            lifecycles: vec![Lifecycle::Spot],
            savings_plan_types: vec![SavingsPlanType::Compute],
            ..ScrapeConfig::default()
        };
        let ctx = context(source(), config);

        let scrape = scrape_region(ctx, "eu-west-1".into()).await;
        assert_eq!(lifecycles(&scrape), (3, 0));
    }

    #[tokio::test]
    async fn savings_plans_need_plan_types() {
        let ctx = context(source(), ScrapeConfig::default());

        let scrape = scrape_region(ctx, "eu-west-1".into()).await;
        assert!(scrape.observations.iter().all(|o| o.labels().savings_plan.is_none()));
    }

    #[tokio::test]
    async fn provider_failure_counts_once_and_drops_region() {
        let ctx = context(source().with_failing_region("eu-west-1"), ScrapeConfig::default());

        let scrape = scrape_region(ctx.clone(), "eu-west-1".into()).await;
        assert!(scrape.failed);
        assert!(scrape.observations.is_empty());
        assert_eq!(ctx.errors.get(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_region_counts_once() {
        let (handle, cancel) = CancelHandle::new();
        let base = context(source().with_hanging_region("eu-west-1"), ScrapeConfig::default());
        let ctx = base.for_cycle(cancel);

        let task = tokio::spawn(scrape_region(ctx.clone(), "eu-west-1".into()));
        tokio::time::sleep(Duration::from_secs(30)).await;
        handle.cancel();

        let scrape = task.await.unwrap();
        assert!(scrape.failed);
        assert_eq!(ctx.errors.get(), 1);
    }
}
