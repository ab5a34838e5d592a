//! pricing-core — shared vocabulary for the EC2 price exporter.
//!
//! Holds the domain types every other crate speaks: instance shapes,
//! lifecycles, the closed set of price observations with their typed
//! label sets, and the validated exporter configuration.
//!
//! # Architecture
//!
//! ```text
//! RawConfig (clap / TOML strings)
//!   └── validate() → ExporterConfig
//!         ├── ServerConfig   (listen address, metrics path)
//!         └── ScrapeConfig   (regions, lifecycles, filters, cache TTL)
//!
//! PriceObservation
//!   ├── ResourcePrice   { PriceLabels, ShapeLabels, value }
//!   ├── MemoryUnitPrice { PriceLabels, value }
//!   └── VCpuUnitPrice   { PriceLabels, value }
//! ```

pub mod config;
pub mod error;
pub mod filter;
pub mod types;

pub use config::{ExporterConfig, RawConfig, ScrapeConfig, ServerConfig, split_and_trim};
pub use error::{ConfigError, ConfigResult};
pub use filter::InstanceFilter;
pub use types::*;
