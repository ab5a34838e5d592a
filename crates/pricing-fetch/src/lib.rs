//! pricing-fetch — per-region price retrieval and normalization.
//!
//! Talks to a `PricingSource` (the AWS SDK in production, an in-process
//! stub in tests), turns raw spot, on-demand, and savings plan records into
//! `PriceObservation`s, and splits every blended price into per-vCPU and
//! per-GiB unit prices.
//!
//! # Architecture
//!
//! ```text
//! scrape_region(ctx, region)
//!   ├── fetch_spot()          ← DescribeSpotPriceHistory (zone level)
//!   ├── fetch_on_demand()     ← Price List GetProducts × zones
//!   └── fetch_savings_plans() ← DescribeSavingsPlansOfferingRates (region level)
//!         └── FetchContext::observe()
//!               ├── InstanceCatalog::lookup()
//!               └── CostNormalizer::unit_prices()
//! ```
//!
//! Every page fetch goes through `paginate()`, which honors the cycle's
//! `ScrapeCancel` token before and during each provider call.

pub mod cancel;
pub mod catalog;
pub mod context;
pub mod error;
pub mod normalizer;
pub mod ondemand;
pub mod region;
pub mod savings_plan;
pub mod source;
pub mod spot;

#[cfg(any(test, feature = "stub"))]
pub mod stub;

pub use cancel::{CancelHandle, ScrapeCancel};
pub use catalog::InstanceCatalog;
pub use context::{ErrorCounter, FetchContext};
pub use error::{CatalogError, FetchError, FetchResult, RecordError, SourceError, SourceResult};
pub use normalizer::{CostNormalizer, UnitPrices};
pub use region::{RegionScrape, scrape_region};
pub use source::{BoxFuture, Page, PricingSource, RateProperty, SavingsPlanRateRecord, SpotPriceRecord};
