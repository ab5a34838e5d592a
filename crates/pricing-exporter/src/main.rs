//! ec2-price-exporter — Prometheus exporter for AWS EC2 prices.
//!
//! Wires the subsystems together:
//! - Configuration (flags layered over an optional TOML file)
//! - AWS pricing source
//! - Instance catalog
//! - Scrape orchestrator
//! - HTTP exposition
//!
//! # Usage
//!
//! ```text
//! ec2-price-exporter --regions eu-west-1,us-east-1 --lifecycle spot,ondemand --cache 300
//! ```

mod cli;

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use pricing_aws::AwsPricingSource;
use pricing_core::ExporterConfig;
use pricing_fetch::{FetchContext, InstanceCatalog, PricingSource};
use pricing_metrics::ScrapeOrchestrator;

use crate::cli::{Cli, LogFormat};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.log_level, cli.log_format)?;

    let config = cli.load_config().context("invalid configuration")?;
    run(config).await
}

fn init_tracing(level: &str, format: LogFormat) -> anyhow::Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(level).with_context(|| format!("invalid log level '{level}'"))?,
    };

    match format {
        LogFormat::Text => tracing_subscriber::fmt().with_env_filter(filter).init(),
        LogFormat::Json => tracing_subscriber::fmt().json().with_env_filter(filter).init(),
    }
    Ok(())
}

async fn run(config: ExporterConfig) -> anyhow::Result<()> {
    let ExporterConfig {
        server,
        mut scrape,
        home_region,
    } = config;

    info!(
        regions = ?scrape.regions,
        lifecycles = ?scrape.lifecycles,
        product_descriptions = ?scrape.product_descriptions,
        operating_systems = ?scrape.operating_systems,
        savings_plan_types = ?scrape.savings_plan_types,
        instance_regexes = ?scrape.instance_filter.patterns(),
        cache_secs = scrape.cache_ttl.as_secs(),
        "AWS EC2 price exporter starting"
    );

    // ── Provider ───────────────────────────────────────────────

    let source = Arc::new(AwsPricingSource::from_env(&home_region).await);

    if scrape.regions.is_empty() {
        let regions = source
            .regions()
            .await
            .context("listing enabled regions")?;
        info!(count = regions.len(), "discovered enabled regions");
        scrape = scrape.with_regions(regions);
    }

    // ── Instance catalog ───────────────────────────────────────

    let catalog = match InstanceCatalog::load(source.as_ref()).await {
        Ok(catalog) => catalog,
        Err(e) => {
            warn!(error = %e, "instance catalog unavailable, unit prices disabled");
            InstanceCatalog::empty()
        }
    };

    // ── Orchestrator + HTTP ────────────────────────────────────

    let ctx = FetchContext::new(source, Arc::new(catalog), Arc::new(scrape));
    let orchestrator = Arc::new(ScrapeOrchestrator::new(ctx));
    let router = pricing_api::build_router(orchestrator, &server.metrics_path);

    let listener = tokio::net::TcpListener::bind(server.listen_address)
        .await
        .with_context(|| format!("binding {}", server.listen_address))?;
    info!(addr = %server.listen_address, path = %server.metrics_path, "metrics endpoint listening");

    // Graceful shutdown on Ctrl-C.
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("AWS EC2 price exporter stopped");
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("shutdown signal received"),
        Err(e) => {
            warn!(error = %e, "failed to install Ctrl-C handler, running until killed");
            std::future::pending::<()>().await;
        }
    }
}
