//! Cost normalizer — splits a blended hourly price into unit prices.
//!
//! AWS does not publish how an instance price divides between CPU and
//! memory, so a fixed weighting is assumed: one vCPU costs as much as
//! `ratio` GiB of memory (7.2 by default). With that assumption:
//!
//! ```text
//! memory_unit = price / (ratio * vcpus + memory_gib)
//! vcpu_unit   = ratio * memory_unit
//! ```

use pricing_core::InstanceShape;
use pricing_core::config::DEFAULT_CPU_MEMORY_RATIO;

/// Per-resource hourly prices derived from a blended price.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UnitPrices {
    /// Price of one vCPU.
    pub vcpu: f64,
    /// Price of one GiB of memory.
    pub memory: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CostNormalizer {
    ratio: f64,
}

impl CostNormalizer {
    pub fn new(ratio: f64) -> Self {
        Self { ratio }
    }

    pub fn ratio(&self) -> f64 {
        self.ratio
    }

    /// Returns `(vcpu_unit_price, memory_unit_price)`; `(0, 0)` for a zero shape.
    pub fn split(&self, blended_price: f64, shape: &InstanceShape) -> (f64, f64) {
        match self.unit_prices(blended_price, shape) {
            Some(units) => (units.vcpu, units.memory),
            None => (0.0, 0.0),
        }
    }

    /// Unit prices, or `None` when the shape carries no hardware facts and
    /// the split must be suppressed.
    pub fn unit_prices(&self, blended_price: f64, shape: &InstanceShape) -> Option<UnitPrices> {
        if shape.is_zero() {
            return None;
        }

        let denominator = self.ratio * shape.vcpu_count as f64 + shape.memory_gib();
        if denominator <= 0.0 {
            return None;
        }

        let memory = blended_price / denominator;
        Some(UnitPrices {
            vcpu: self.ratio * memory,
            memory,
        })
    }
}

impl Default for CostNormalizer {
    fn default() -> Self {
        Self::new(DEFAULT_CPU_MEMORY_RATIO)
    }
}
