//! pricing-api — HTTP surface of the price exporter.
//!
//! # Routes
//!
//! | Method | Path | Description |
//! |---|---|---|
//! | GET | `/` | Landing page linking to the metrics path |
//! | GET | `<metrics_path>` (default `/metrics`) | Prometheus exposition |

pub mod handlers;

use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use pricing_metrics::ScrapeOrchestrator;

/// Shared state for API handlers.
#[derive(Clone)]
pub struct ApiState {
    pub orchestrator: Arc<ScrapeOrchestrator>,
    pub metrics_path: Arc<str>,
}

/// Build the exporter router. A metrics path of `/` replaces the landing page.
pub fn build_router(orchestrator: Arc<ScrapeOrchestrator>, metrics_path: &str) -> Router {
    let state = ApiState {
        orchestrator,
        metrics_path: Arc::from(metrics_path),
    };

    let router = Router::new().route(metrics_path, get(handlers::prometheus_metrics));
    let router = if metrics_path == "/" {
        router
    } else {
        router.route("/", get(handlers::landing_page))
    };
    router.with_state(state)
}
