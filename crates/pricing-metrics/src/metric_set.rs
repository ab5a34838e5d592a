//! Metric set — the exported gauge values of one scrape cycle.
//!
//! Built from scratch on every refresh and never patched, so label
//! combinations that disappeared upstream disappear from the exposition
//! too. Ordered maps keep rendering deterministic regardless of the order
//! in which regions finished.

use std::collections::BTreeMap;

use pricing_core::{MetricFamily, PriceLabels, PriceObservation, ShapeLabels};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetricSet {
    resource_prices: BTreeMap<(PriceLabels, ShapeLabels), f64>,
    memory_unit_prices: BTreeMap<PriceLabels, f64>,
    vcpu_unit_prices: BTreeMap<PriceLabels, f64>,
}

impl MetricSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the gauge addressed by the observation's label tuple. A repeated
    /// tuple overwrites the earlier value.
    pub fn insert(&mut self, observation: PriceObservation) {
        match observation {
            PriceObservation::ResourcePrice { labels, shape, value } => {
                self.resource_prices.insert((labels, shape), value);
            }
            PriceObservation::MemoryUnitPrice { labels, value } => {
                self.memory_unit_prices.insert(labels, value);
            }
            PriceObservation::VCpuUnitPrice { labels, value } => {
                self.vcpu_unit_prices.insert(labels, value);
            }
        }
    }

    pub fn resource_prices(&self) -> impl Iterator<Item = (&PriceLabels, &ShapeLabels, f64)> {
        self.resource_prices
            .iter()
            .map(|((labels, shape), value)| (labels, shape, *value))
    }

    /// Series of a unit price family. Empty for `ResourcePrice`, whose
    /// series carry shape labels; use `resource_prices()` for those.
    pub fn unit_prices(&self, family: MetricFamily) -> impl Iterator<Item = (&PriceLabels, f64)> {
        let map = match family {
            MetricFamily::ResourcePrice => None,
            MetricFamily::MemoryUnitPrice => Some(&self.memory_unit_prices),
            MetricFamily::VCpuUnitPrice => Some(&self.vcpu_unit_prices),
        };
        map.into_iter()
            .flatten()
            .map(|(labels, value)| (labels, *value))
    }

    pub fn family_len(&self, family: MetricFamily) -> usize {
        match family {
            MetricFamily::ResourcePrice => self.resource_prices.len(),
            MetricFamily::MemoryUnitPrice => self.memory_unit_prices.len(),
            MetricFamily::VCpuUnitPrice => self.vcpu_unit_prices.len(),
        }
    }

    /// Total number of series across all families.
    pub fn len(&self) -> usize {
        MetricFamily::ALL.iter().map(|f| self.family_len(*f)).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Extend<PriceObservation> for MetricSet {
    fn extend<I: IntoIterator<Item = PriceObservation>>(&mut self, iter: I) {
        for observation in iter {
            self.insert(observation);
        }
    }
}

impl FromIterator<PriceObservation> for MetricSet {
    fn from_iter<I: IntoIterator<Item = PriceObservation>>(iter: I) -> Self {
        let mut set = MetricSet::new();
        set.extend(iter);
        set
    }
}

/// Everything an exposition request renders: the price families plus the
/// scrape self-metrics of the cycle that produced them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScrapeSnapshot {
    pub metrics: MetricSet,
    /// Errors counted during the cycle.
    pub error_count: u64,
    pub duration_secs: f64,
    /// Completed cycles since startup, this one included.
    pub scrapes_total: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pricing_core::{InstanceShape, Lifecycle};

    fn resource(zone: &str, value: f64) -> PriceObservation {
        PriceObservation::ResourcePrice {
            labels: PriceLabels::new(Lifecycle::Spot, "m5.large", "eu-west-1").in_zone(zone),
            shape: ShapeLabels::from_shape(&InstanceShape::new("m5.large", 8192, 2)),
            value,
        }
    }

    fn memory(zone: &str, value: f64) -> PriceObservation {
        PriceObservation::MemoryUnitPrice {
            labels: PriceLabels::new(Lifecycle::Spot, "m5.large", "eu-west-1").in_zone(zone),
            value,
        }
    }

    #[test]
    fn groups_by_family() {
        let set: MetricSet = [resource("eu-west-1a", 0.04), memory("eu-west-1a", 0.001), resource("eu-west-1b", 0.05)]
            .into_iter()
            .collect();

        assert_eq!(set.family_len(MetricFamily::ResourcePrice), 2);
        assert_eq!(set.family_len(MetricFamily::MemoryUnitPrice), 1);
        assert_eq!(set.family_len(MetricFamily::VCpuUnitPrice), 0);
        assert_eq!(set.len(), 3);
        assert_eq!(set.unit_prices(MetricFamily::ResourcePrice).count(), 0);
    }

    #[test]
    fn last_write_wins() {
        let set: MetricSet = [resource("eu-west-1a", 0.04), resource("eu-west-1a", 0.06)]
            .into_iter()
            .collect();

        assert_eq!(set.len(), 1);
        assert_eq!(set.resource_prices().next().unwrap().2, 0.06);
    }

    #[test]
    fn order_of_arrival_does_not_matter() {
        let forward: MetricSet = [resource("eu-west-1a", 0.04), resource("eu-west-1c", 0.03), memory("eu-west-1b", 0.002)]
            .into_iter()
            .collect();
        let backward: MetricSet = [memory("eu-west-1b", 0.002), resource("eu-west-1c", 0.03), resource("eu-west-1a", 0.04)]
            .into_iter()
            .collect();

        assert_eq!(forward, backward);
        let zones: Vec<_> = forward
            .resource_prices()
            .map(|(labels, _, _)| labels.availability_zone.clone().unwrap())
            .collect();
        assert_eq!(zones, vec!["eu-west-1a", "eu-west-1c"]);
    }

    #[test]
    fn empty_set() {
        let set = MetricSet::new();
        assert!(set.is_empty());
        assert_eq!(ScrapeSnapshot::default().scrapes_total, 0);
    }
}
