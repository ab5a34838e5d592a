//! HTTP handlers.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse};
use tracing::debug;

use pricing_metrics::{CONTENT_TYPE, render_prometheus};

use crate::ApiState;

/// GET <metrics_path>
///
/// Always 200: serves the freshly scraped, cached, or in-flight-previous
/// snapshot, whichever the orchestrator hands back.
pub async fn prometheus_metrics(State(state): State<ApiState>) -> impl IntoResponse {
    let snapshot = state.orchestrator.collect().await;
    debug!(series = snapshot.metrics.len(), "serving metrics");

    let body = render_prometheus(&snapshot);
    (StatusCode::OK, [("content-type", CONTENT_TYPE)], body)
}

/// GET /
pub async fn landing_page(State(state): State<ApiState>) -> Html<String> {
    Html(format!(
        "<html>\n\
         <head><title>AWS EC2 Price Exporter</title></head>\n\
         <body>\n\
         <h1>AWS EC2 Price Exporter</h1>\n\
         <p><a href=\"{}\">Metrics</a></p>\n\
         </body>\n\
         </html>\n",
        state.metrics_path
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use pricing_core::{InstanceShape, ScrapeConfig};
    use pricing_fetch::stub::{StubSource, spot_record};
    use pricing_fetch::{FetchContext, InstanceCatalog};
    use pricing_metrics::ScrapeOrchestrator;

    fn test_state(metrics_path: &str) -> ApiState {
        let source = StubSource::new().with_spot("eu-west-1", spot_record("eu-west-1a", "m5.large", "0.04"));
        let ctx = FetchContext::new(
            Arc::new(source),
            Arc::new(InstanceCatalog::from_shapes([InstanceShape::new("m5.large", 8192, 2)])),
            Arc::new(ScrapeConfig::default().with_regions(["eu-west-1"])),
        );
        ApiState {
            orchestrator: Arc::new(ScrapeOrchestrator::new(ctx)),
            metrics_path: Arc::from(metrics_path),
        }
    }

    #[tokio::test]
    async fn metrics_handler_renders_snapshot() {
        let state = test_state("/metrics");
        let resp = prometheus_metrics(State(state.clone())).await.into_response();
        assert_eq!(resp.status(), StatusCode::OK);
        let content_type = resp.headers().get("content-type").unwrap().to_str().unwrap();
        assert_eq!(content_type, "text/plain; version=0.0.4");

        assert_eq!(state.orchestrator.snapshot().scrapes_total, 1);
    }

    #[tokio::test]
    async fn landing_page_links_metrics_path() {
        let Html(body) = landing_page(State(test_state("/prices"))).await;
        assert!(body.contains("<a href=\"/prices\">Metrics</a>"));
        assert!(body.contains("AWS EC2 Price Exporter"));
    }
}
