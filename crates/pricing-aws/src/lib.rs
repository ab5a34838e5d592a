//! pricing-aws — the production `PricingSource`.
//!
//! # Architecture
//!
//! ```text
//! AwsPricingSource
//!   ├── EC2 (per region)   DescribeAvailabilityZones, DescribeSpotPriceHistory
//!   ├── EC2 (home region)  DescribeRegions, DescribeInstanceTypes
//!   ├── Price List         GetProducts            (home region only)
//!   └── Savings Plans      DescribeSavingsPlansOfferingRates (global)
//! ```
//!
//! Every call fetches exactly one page; the fetchers in `pricing-fetch` own
//! the page loop. SDK errors become `SourceError::Request` carrying the
//! operation name and the full error context.

pub mod convert;
pub mod source;

pub use source::AwsPricingSource;
