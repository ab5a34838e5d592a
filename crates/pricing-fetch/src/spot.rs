//! Spot prices — zone-level, one observation set per price record.

use tracing::debug;

use pricing_core::{Lifecycle, PriceLabels, PriceObservation};

use crate::cancel::paginate;
use crate::context::FetchContext;
use crate::error::{FetchResult, RecordError};
use crate::source::SpotPriceRecord;

/// Fetch current spot prices for `region`.
pub async fn fetch_spot(ctx: &FetchContext, region: &str) -> FetchResult<Vec<PriceObservation>> {
    let source = ctx.source.as_ref();
    let product_descriptions = ctx.config.product_descriptions.as_slice();
    let records = paginate(&ctx.cancel, |token| {
        source.spot_prices(region, product_descriptions, token)
    })
    .await?;

    let mut out = Vec::with_capacity(records.len() * 3);
    for record in &records {
        if !ctx.config.instance_filter.matches(&record.instance_type) {
            debug!(instance_type = %record.instance_type, "skipping instance type");
            continue;
        }

        match parse_spot(region, record) {
            Ok((labels, value)) => {
                debug!(
                    %region,
                    az = %record.availability_zone,
                    instance_type = %record.instance_type,
                    product_description = %record.product_description,
                    value,
                    "spot price"
                );
                ctx.observe(labels, value, &mut out);
            }
            Err(e) => ctx.record_error(region, "spot", &e),
        }
    }

    debug!(%region, records = records.len(), observations = out.len(), "spot prices fetched");
    Ok(out)
}

fn parse_spot(region: &str, record: &SpotPriceRecord) -> Result<(PriceLabels, f64), RecordError> {
    if record.instance_type.is_empty() {
        return Err(RecordError::Missing("instance type"));
    }
    if record.availability_zone.is_empty() {
        return Err(RecordError::Missing("availability zone"));
    }
    let value = parse_price(&record.spot_price)?;

    let mut labels = PriceLabels::new(Lifecycle::Spot, &record.instance_type, region)
        .in_zone(&record.availability_zone);
    if !record.product_description.is_empty() {
        labels = labels.with_product_description(&record.product_description);
    }
    Ok((labels, value))
}

/// Parse a published hourly price. Rejects non-numeric, negative, and
/// non-finite values.
pub(crate) fn parse_price(raw: &str) -> Result<f64, RecordError> {
    match raw.trim().parse::<f64>() {
        Ok(v) if v.is_finite() && v >= 0.0 => Ok(v),
        _ => Err(RecordError::Price(raw.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use pricing_core::{InstanceShape, MetricFamily, ScrapeConfig};

    use crate::catalog::InstanceCatalog;
    use crate::stub::{StubSource, spot_record};

    fn context(source: StubSource, config: ScrapeConfig) -> FetchContext {
        FetchContext::new(
            Arc::new(source),
            Arc::new(InstanceCatalog::from_shapes([
                InstanceShape::new("m5.large", 8192, 2),
                InstanceShape::new("c5.large", 4096, 2),
            ])),
            Arc::new(config),
        )
    }

    #[test]
    fn parse_price_rejects_garbage() {
        assert_eq!(parse_price("0.0312").unwrap(), 0.0312);
        assert_eq!(parse_price(" 1.5 ").unwrap(), 1.5);
        assert!(parse_price("").is_err());
        assert!(parse_price("N/A").is_err());
        assert!(parse_price("NaN").is_err());
        assert!(parse_price("-1").is_err());
    }

    #[tokio::test]
    async fn single_record_yields_one_set() {
        let source = StubSource::new().with_spot("eu-west-1", spot_record("eu-west-1b", "m5.large", "0.0380"));
        let ctx = context(source, ScrapeConfig::default());

        let out = fetch_spot(&ctx, "eu-west-1").await.unwrap();
        assert_eq!(out.len(), 3);
        assert_eq!(
            out.iter().filter(|o| o.family() == MetricFamily::ResourcePrice).count(),
            1
        );

        let labels = out[0].labels();
        assert_eq!(labels.lifecycle, Lifecycle::Spot);
        assert_eq!(labels.availability_zone.as_deref(), Some("eu-west-1b"));
        assert_eq!(labels.product_description.as_deref(), Some("Linux/UNIX"));
        assert_eq!(labels.operating_system, None);
        assert_eq!(out[0].value(), 0.0380);
    }

    #[tokio::test]
    async fn filter_excludes_non_matching_types() {
        let source = StubSource::new()
            .with_spot("eu-west-1", spot_record("eu-west-1a", "m5.large", "0.04"))
            .with_spot("eu-west-1", spot_record("eu-west-1a", "c5.large", "0.03"));
        let config = ScrapeConfig {
            instance_filter: pricing_core::InstanceFilter::new(&["^c5\\."]).unwrap(),
            ..ScrapeConfig::default()
        };
        let ctx = context(source, config);

        let out = fetch_spot(&ctx, "eu-west-1").await.unwrap();
        assert!(out.iter().all(|o| o.labels().instance_type == "c5.large"));
        assert_eq!(out.len(), 3);
    }

    #[tokio::test]
    async fn bad_record_is_counted_and_skipped() {
        let source = StubSource::new()
            .with_spot("eu-west-1", spot_record("eu-west-1a", "m5.large", "not-a-price"))
            .with_spot("eu-west-1", spot_record("eu-west-1a", "", "0.02"))
            .with_spot("eu-west-1", spot_record("eu-west-1c", "c5.large", "0.03"));
        let ctx = context(source, ScrapeConfig::default());

        let out = fetch_spot(&ctx, "eu-west-1").await.unwrap();
        assert_eq!(ctx.errors.get(), 2);
        assert_eq!(out.len(), 3);
        assert_eq!(out[0].labels().instance_type, "c5.large");
    }

    #[tokio::test]
    async fn merges_every_page() {
        let mut source = StubSource::new().with_page_size(2);
        for zone in ["a", "b", "c", "d", "e"] {
            source = source.with_spot("eu-west-1", spot_record(&format!("eu-west-1{zone}"), "m5.large", "0.04"));
        }
        let ctx = context(source, ScrapeConfig::default());

        let out = fetch_spot(&ctx, "eu-west-1").await.unwrap();
        assert_eq!(out.len(), 15);
    }

    #[tokio::test]
    async fn provider_failure_propagates() {
        let source = StubSource::new()
            .with_spot("eu-west-1", spot_record("eu-west-1a", "m5.large", "0.04"))
            .with_failing_region("eu-west-1");
        let ctx = context(source, ScrapeConfig::default());

        let err = fetch_spot(&ctx, "eu-west-1").await.unwrap_err();
        assert!(matches!(err, crate::error::FetchError::ProviderUnavailable(_)));
    }
}
