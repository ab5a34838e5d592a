//! Shared inputs of one scrape cycle and the observation emitter.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::{debug, warn};

use pricing_core::{PriceLabels, PriceObservation, ScrapeConfig, ShapeLabels};

use crate::cancel::ScrapeCancel;
use crate::catalog::InstanceCatalog;
use crate::error::RecordError;
use crate::normalizer::CostNormalizer;
use crate::source::PricingSource;

/// Errors accumulated during one scrape cycle.
#[derive(Debug, Default)]
pub struct ErrorCounter(AtomicU64);

impl ErrorCounter {
    pub fn record(&self) {
        self.0.fetch_add(1, Ordering::Relaxed);
    }

    pub fn get(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }
}

/// Everything a region task needs. Cheap to clone.
#[derive(Clone)]
pub struct FetchContext {
    pub source: Arc<dyn PricingSource>,
    pub catalog: Arc<InstanceCatalog>,
    pub normalizer: CostNormalizer,
    pub config: Arc<ScrapeConfig>,
    pub errors: Arc<ErrorCounter>,
    pub cancel: ScrapeCancel,
}

impl FetchContext {
    pub fn new(
        source: Arc<dyn PricingSource>,
        catalog: Arc<InstanceCatalog>,
        config: Arc<ScrapeConfig>,
    ) -> Self {
        Self {
            source,
            catalog,
            normalizer: CostNormalizer::new(config.cpu_memory_ratio),
            config,
            errors: Arc::new(ErrorCounter::default()),
            cancel: ScrapeCancel::never(),
        }
    }

    /// Fresh error counter and cancellation token for a new cycle.
    pub fn for_cycle(&self, cancel: ScrapeCancel) -> Self {
        Self {
            errors: Arc::new(ErrorCounter::default()),
            cancel,
            ..self.clone()
        }
    }

    /// Emit the resource price for `labels` and, when the instance shape is
    /// known, its memory and vCPU unit prices.
    pub fn observe(&self, labels: PriceLabels, value: f64, out: &mut Vec<PriceObservation>) {
        let shape = self.catalog.lookup(&labels.instance_type);
        let units = self.normalizer.unit_prices(value, &shape);

        out.push(PriceObservation::ResourcePrice {
            labels: labels.clone(),
            shape: ShapeLabels::from_shape(&shape),
            value,
        });

        match units {
            Some(units) => {
                out.push(PriceObservation::MemoryUnitPrice {
                    labels: labels.clone(),
                    value: units.memory,
                });
                out.push(PriceObservation::VCpuUnitPrice {
                    labels,
                    value: units.vcpu,
                });
            }
            None => {
                debug!(
                    instance_type = %labels.instance_type,
                    region = %labels.region,
                    "unknown instance shape, unit prices suppressed"
                );
            }
        }
    }

    /// Log and count a record that could not be parsed.
    pub fn record_error(&self, region: &str, source: &'static str, err: &RecordError) {
        warn!(%region, source, error = %err, "skipping malformed price record");
        self.errors.record();
    }
}
