//! In-process `PricingSource` for tests.
//!
//! Records are registered per region with builder methods; paginated calls
//! slice them into pages of `page_size` using the item index as the page
//! token. Regions can be made to fail, hang, panic, or answer slowly.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use pricing_core::{InstanceShape, OperatingSystem, ProductDescription, SavingsPlanType};

use crate::error::{SourceError, SourceResult};
use crate::source::{BoxFuture, Page, PricingSource, RateProperty, SavingsPlanRateRecord, SpotPriceRecord};

const DEFAULT_PAGE_SIZE: usize = 100;

#[derive(Debug)]
pub struct StubSource {
    regions: Vec<String>,
    shapes: Vec<InstanceShape>,
    zones: HashMap<String, Vec<String>>,
    spot: HashMap<String, Vec<SpotPriceRecord>>,
    on_demand: HashMap<(String, OperatingSystem), Vec<String>>,
    savings_plans: HashMap<(String, SavingsPlanType), Vec<SavingsPlanRateRecord>>,
    failing_regions: HashSet<String>,
    hanging_regions: HashSet<String>,
    panicking_regions: HashSet<String>,
    delays: HashMap<String, Duration>,
    catalog_fails: bool,
    page_size: usize,
    calls: AtomicUsize,
}

impl StubSource {
    pub fn new() -> Self {
        Self {
            regions: Vec::new(),
            shapes: Vec::new(),
            zones: HashMap::new(),
            spot: HashMap::new(),
            on_demand: HashMap::new(),
            savings_plans: HashMap::new(),
            failing_regions: HashSet::new(),
            hanging_regions: HashSet::new(),
            panicking_regions: HashSet::new(),
            delays: HashMap::new(),
            catalog_fails: false,
            page_size: DEFAULT_PAGE_SIZE,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn with_regions(mut self, regions: &[&str]) -> Self {
        self.regions = regions.iter().map(|r| r.to_string()).collect();
        self
    }

    pub fn with_shapes(mut self, shapes: impl IntoIterator<Item = InstanceShape>) -> Self {
        self.shapes.extend(shapes);
        self
    }

    pub fn with_zones(mut self, region: &str, zones: &[&str]) -> Self {
        self.zones
            .insert(region.to_string(), zones.iter().map(|z| z.to_string()).collect());
        self
    }

    pub fn with_spot(mut self, region: &str, record: SpotPriceRecord) -> Self {
        self.spot.entry(region.to_string()).or_default().push(record);
        self
    }

    pub fn with_on_demand(mut self, region: &str, os: OperatingSystem, document: String) -> Self {
        self.on_demand
            .entry((region.to_string(), os))
            .or_default()
            .push(document);
        self
    }

    pub fn with_savings_plan(
        mut self,
        region: &str,
        plan_type: SavingsPlanType,
        record: SavingsPlanRateRecord,
    ) -> Self {
        self.savings_plans
            .entry((region.to_string(), plan_type))
            .or_default()
            .push(record);
        self
    }

    /// Every region-scoped call for `region` returns a request error.
    pub fn with_failing_region(mut self, region: &str) -> Self {
        self.failing_regions.insert(region.to_string());
        self
    }

    /// Every region-scoped call for `region` never completes.
    pub fn with_hanging_region(mut self, region: &str) -> Self {
        self.hanging_regions.insert(region.to_string());
        self
    }

    /// Every region-scoped call for `region` panics.
    pub fn with_panicking_region(mut self, region: &str) -> Self {
        self.panicking_regions.insert(region.to_string());
        self
    }

    /// Every region-scoped call for `region` completes after `delay`.
    pub fn with_delay(mut self, region: &str, delay: Duration) -> Self {
        self.delays.insert(region.to_string(), delay);
        self
    }

    pub fn with_failing_catalog(mut self) -> Self {
        self.catalog_fails = true;
        self
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Number of provider calls made so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn page<T: Clone>(&self, items: &[T], token: Option<String>) -> SourceResult<Page<T>> {
        let start = match token {
            Some(token) => token
                .parse::<usize>()
                .map_err(|_| SourceError::Config(format!("bad page token '{token}'")))?,
            None => 0,
        };
        let end = (start + self.page_size).min(items.len());
        let next_token = (end < items.len()).then(|| end.to_string());
        Ok(Page {
            items: items.get(start..end).unwrap_or_default().to_vec(),
            next_token,
        })
    }

    fn region_call<'a, T: Send + 'a>(
        &'a self,
        region: &str,
        operation: &'static str,
        answer: impl FnOnce() -> SourceResult<T>,
    ) -> BoxFuture<'a, SourceResult<T>> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if self.panicking_regions.contains(region) {
            panic!("stub source panicked in {region}");
        }
        if self.hanging_regions.contains(region) {
            return Box::pin(std::future::pending());
        }
        let result = if self.failing_regions.contains(region) {
            Err(SourceError::request(operation, format!("{region} is unavailable")))
        } else {
            answer()
        };
        let delay = self.delays.get(region).copied();
        Box::pin(async move {
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }
            result
        })
    }
}

impl Default for StubSource {
    fn default() -> Self {
        Self::new()
    }
}

impl PricingSource for StubSource {
    fn regions(&self) -> BoxFuture<'_, SourceResult<Vec<String>>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let regions = self.regions.clone();
        Box::pin(async move { Ok(regions) })
    }

    fn instance_types(
        &self,
        next_token: Option<String>,
    ) -> BoxFuture<'_, SourceResult<Page<InstanceShape>>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let result = if self.catalog_fails {
            Err(SourceError::request("DescribeInstanceTypes", "access denied"))
        } else {
            self.page(&self.shapes, next_token)
        };
        Box::pin(async move { result })
    }

    fn availability_zones<'a>(&'a self, region: &'a str) -> BoxFuture<'a, SourceResult<Vec<String>>> {
        self.region_call(region, "DescribeAvailabilityZones", || {
            Ok(self.zones.get(region).cloned().unwrap_or_default())
        })
    }

    fn spot_prices<'a>(
        &'a self,
        region: &'a str,
        product_descriptions: &'a [ProductDescription],
        next_token: Option<String>,
    ) -> BoxFuture<'a, SourceResult<Page<SpotPriceRecord>>> {
        self.region_call(region, "DescribeSpotPriceHistory", || {
            let records: Vec<_> = self
                .spot
                .get(region)
                .into_iter()
                .flatten()
                .filter(|r| {
                    product_descriptions
                        .iter()
                        .any(|pd| pd.as_str() == r.product_description)
                })
                .cloned()
                .collect();
            self.page(&records, next_token)
        })
    }

    fn on_demand_products<'a>(
        &'a self,
        region: &'a str,
        operating_system: OperatingSystem,
        next_token: Option<String>,
    ) -> BoxFuture<'a, SourceResult<Page<String>>> {
        self.region_call(region, "GetProducts", || {
            let documents = self
                .on_demand
                .get(&(region.to_string(), operating_system))
                .map(Vec::as_slice)
                .unwrap_or_default();
            self.page(documents, next_token)
        })
    }

    fn savings_plan_rates<'a>(
        &'a self,
        region: &'a str,
        plan_type: SavingsPlanType,
        _product_descriptions: &'a [ProductDescription],
        next_token: Option<String>,
    ) -> BoxFuture<'a, SourceResult<Page<SavingsPlanRateRecord>>> {
        self.region_call(region, "DescribeSavingsPlansOfferingRates", || {
            let records = self
                .savings_plans
                .get(&(region.to_string(), plan_type))
                .map(Vec::as_slice)
                .unwrap_or_default();
            self.page(records, next_token)
        })
    }
}

// ── Record builders ────────────────────────────────────────────────

/// A Linux/UNIX spot price record.
pub fn spot_record(zone: &str, instance_type: &str, price: &str) -> SpotPriceRecord {
    SpotPriceRecord {
        availability_zone: zone.to_string(),
        instance_type: instance_type.to_string(),
        product_description: ProductDescription::LinuxUnix.to_string(),
        spot_price: price.to_string(),
    }
}

/// A Price List document carrying one hourly on-demand USD price.
pub fn on_demand_document(sku: &str, instance_type: &str, os: &str, usd: &str) -> String {
    let term = format!("{sku}.JRTCKXETXF");
    let dimension = format!("{term}.6YS6EN2CT7");
    serde_json::json!({
        "product": {
            "sku": sku,
            "productFamily": "Compute Instance",
            "attributes": {
                "instanceType": instance_type,
                "operatingSystem": os,
                "tenancy": "Shared",
                "capacitystatus": "Used",
                "preInstalledSw": "NA",
            }
        },
        "terms": {
            "OnDemand": {
                term: {
                    "offerTermCode": "JRTCKXETXF",
                    "priceDimensions": {
                        dimension: {
                            "unit": "Hrs",
                            "pricePerUnit": { "USD": usd }
                        }
                    }
                }
            }
        }
    })
    .to_string()
}

/// A shared-tenancy Linux/UNIX savings plan rate.
pub fn savings_plan_rate(
    instance_type: &str,
    rate: &str,
    plan_type: SavingsPlanType,
    payment_option: &str,
    duration_years: i64,
) -> SavingsPlanRateRecord {
    let family = instance_type.split('.').next().unwrap_or(instance_type);
    let property = |name: &str, value: &str| RateProperty {
        name: name.to_string(),
        value: value.to_string(),
    };
    SavingsPlanRateRecord {
        rate: rate.to_string(),
        properties: vec![
            property("region", "eu-west-1"),
            property("instanceType", instance_type),
            property("instanceFamily", family),
            property("productDescription", ProductDescription::LinuxUnix.as_str()),
            property("tenancy", "shared"),
        ],
        payment_option: payment_option.to_string(),
        duration_seconds: duration_years * 31_536_000,
        plan_type: plan_type.to_string(),
    }
}
