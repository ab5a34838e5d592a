//! The provider boundary.
//!
//! `PricingSource` is the only way the fetchers reach the outside world.
//! Paginated calls return one `Page` per invocation so the caller owns the
//! page loop and can stop between pages.

use std::future::Future;
use std::pin::Pin;

use pricing_core::{InstanceShape, OperatingSystem, ProductDescription, SavingsPlanType};

use crate::error::SourceResult;

/// Boxed, sendable future returned by `PricingSource` methods.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// One page of a paginated provider response.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Token for the next page; `None` (or empty) on the last page.
    pub next_token: Option<String>,
}

impl<T> Page<T> {
    pub fn last(items: Vec<T>) -> Self {
        Self {
            items,
            next_token: None,
        }
    }
}

/// A current spot price for one (zone, instance type, product description).
#[derive(Debug, Clone, PartialEq)]
pub struct SpotPriceRecord {
    pub availability_zone: String,
    pub instance_type: String,
    pub product_description: String,
    /// Hourly price as published, e.g. "0.0312".
    pub spot_price: String,
}

/// A name/value property attached to a savings plan rate.
#[derive(Debug, Clone, PartialEq)]
pub struct RateProperty {
    pub name: String,
    pub value: String,
}

/// A savings plan offering rate.
#[derive(Debug, Clone, PartialEq)]
pub struct SavingsPlanRateRecord {
    /// Hourly rate as published.
    pub rate: String,
    /// Rate properties: `region`, `instanceType`, `instanceFamily`,
    /// `productDescription`, `tenancy`.
    pub properties: Vec<RateProperty>,
    pub payment_option: String,
    pub duration_seconds: i64,
    pub plan_type: String,
}

/// Pricing and inventory queries against the cloud provider.
pub trait PricingSource: Send + Sync {
    /// Every region enabled for the account.
    fn regions(&self) -> BoxFuture<'_, SourceResult<Vec<String>>>;

    /// One page of the instance type inventory.
    fn instance_types(
        &self,
        next_token: Option<String>,
    ) -> BoxFuture<'_, SourceResult<Page<InstanceShape>>>;

    /// Availability zone names of a region.
    fn availability_zones<'a>(&'a self, region: &'a str) -> BoxFuture<'a, SourceResult<Vec<String>>>;

    /// One page of current spot prices for a region.
    fn spot_prices<'a>(
        &'a self,
        region: &'a str,
        product_descriptions: &'a [ProductDescription],
        next_token: Option<String>,
    ) -> BoxFuture<'a, SourceResult<Page<SpotPriceRecord>>>;

    /// One page of Price List JSON documents for shared-tenancy on-demand
    /// instances running `operating_system` in a region.
    fn on_demand_products<'a>(
        &'a self,
        region: &'a str,
        operating_system: OperatingSystem,
        next_token: Option<String>,
    ) -> BoxFuture<'a, SourceResult<Page<String>>>;

    /// One page of EC2 savings plan offering rates for a region.
    fn savings_plan_rates<'a>(
        &'a self,
        region: &'a str,
        plan_type: SavingsPlanType,
        product_descriptions: &'a [ProductDescription],
        next_token: Option<String>,
    ) -> BoxFuture<'a, SourceResult<Page<SavingsPlanRateRecord>>>;
}
