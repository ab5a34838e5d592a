//! pricing-metrics — scrape orchestration and Prometheus exposition.
//!
//! Decides when a refresh is due, fans the refresh out over every
//! configured region, folds the resulting observations into a `MetricSet`,
//! and renders the current snapshot in the Prometheus text format.
//!
//! # Architecture
//!
//! ```text
//! ScrapeOrchestrator
//!   ├── collect()        ← called per exposition request
//!   │     ├── cache hit / scrape in flight → current snapshot
//!   │     └── scrape()   → JoinSet of scrape_region() tasks
//!   │           └── MetricSet::extend() → ArcSwap::store()
//!   └── snapshot()       → Arc<ScrapeSnapshot>
//!
//! Prometheus exposition
//!   └── render_prometheus() → text/plain for the metrics endpoint
//! ```

pub mod metric_set;
pub mod orchestrator;
pub mod prometheus;

pub use metric_set::{MetricSet, ScrapeSnapshot};
pub use orchestrator::ScrapeOrchestrator;
pub use prometheus::{CONTENT_TYPE, NAMESPACE, render_prometheus};
