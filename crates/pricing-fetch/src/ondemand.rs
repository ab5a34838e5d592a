//! On-demand prices from the AWS Price List.
//!
//! The Price List is zone-agnostic, but the exported series are
//! zone-labeled, so every priced SKU is expanded across all availability
//! zones of the region.
//!
//! Each price list entry is a JSON document; the hourly on-demand price
//! lives at
//!
//! ```text
//! terms.OnDemand["<sku>.JRTCKXETXF"]
//!      .priceDimensions["<sku>.JRTCKXETXF.6YS6EN2CT7"]
//!      .pricePerUnit.USD
//! ```

use std::collections::HashMap;

use serde::Deserialize;
use tracing::debug;

use pricing_core::{InstanceFilter, Lifecycle, OperatingSystem, PriceLabels, PriceObservation};

use crate::cancel::paginate;
use crate::context::FetchContext;
use crate::error::{FetchResult, RecordError};
use crate::spot::parse_price;

/// Offer term code of on-demand pricing.
pub const TERM_ON_DEMAND: &str = "JRTCKXETXF";
/// Rate code of the per-hour price dimension.
pub const TERM_PER_HOUR: &str = "6YS6EN2CT7";

#[derive(Debug, Deserialize)]
struct PriceDocument {
    product: Product,
    #[serde(default)]
    terms: Terms,
}

#[derive(Debug, Deserialize)]
struct Product {
    sku: String,
    #[serde(default)]
    attributes: HashMap<String, String>,
}

#[derive(Debug, Default, Deserialize)]
struct Terms {
    #[serde(rename = "OnDemand", default)]
    on_demand: HashMap<String, Term>,
}

#[derive(Debug, Deserialize)]
struct Term {
    #[serde(rename = "priceDimensions", default)]
    price_dimensions: HashMap<String, PriceDimension>,
}

#[derive(Debug, Deserialize)]
struct PriceDimension {
    #[serde(rename = "pricePerUnit", default)]
    price_per_unit: HashMap<String, String>,
}

/// A parsed on-demand SKU.
#[derive(Debug, Clone, PartialEq)]
struct OnDemandPrice {
    instance_type: String,
    operating_system: String,
    value: f64,
}

/// Fetch on-demand prices for `region`, one query per configured
/// operating system.
pub async fn fetch_on_demand(
    ctx: &FetchContext,
    region: &str,
) -> FetchResult<Vec<PriceObservation>> {
    let source = ctx.source.as_ref();
    let zones = ctx.cancel.run(source.availability_zones(region)).await??;
    if zones.is_empty() {
        debug!(%region, "region reports no availability zones");
    }

    let mut documents = Vec::new();
    for &os in &ctx.config.operating_systems {
        let page = paginate(&ctx.cancel, |token| source.on_demand_products(region, os, token)).await?;
        documents.extend(page.into_iter().map(|doc| (os, doc)));
    }

    let mut out = Vec::with_capacity(documents.len() * zones.len() * 3);
    for (os, document) in &documents {
        let price = match parse_document(document, *os, &ctx.config.instance_filter) {
            Ok(Some(price)) => price,
            Ok(None) => continue,
            Err(e) => {
                ctx.record_error(region, "ondemand", &e);
                continue;
            }
        };

        debug!(
            %region,
            instance_type = %price.instance_type,
            operating_system = %price.operating_system,
            value = price.value,
            zones = zones.len(),
            "on-demand price"
        );

        let labels = PriceLabels::new(Lifecycle::OnDemand, &price.instance_type, region)
            .with_operating_system(&price.operating_system);
        for zone in &zones {
            ctx.observe(labels.clone().in_zone(zone), price.value, &mut out);
        }
    }

    debug!(%region, documents = documents.len(), observations = out.len(), "on-demand prices fetched");
    Ok(out)
}

/// Parse one Price List entry. Entries whose instance type the filter
/// excludes yield `Ok(None)` before their terms are looked at.
fn parse_document(
    raw: &str,
    queried_os: OperatingSystem,
    filter: &InstanceFilter,
) -> Result<Option<OnDemandPrice>, RecordError> {
    let doc: PriceDocument = serde_json::from_str(raw)?;
    let attributes = &doc.product.attributes;

    let instance_type = attributes
        .get("instanceType")
        .filter(|t| !t.is_empty())
        .ok_or(RecordError::Missing("instance type"))?;
    if !filter.matches(instance_type) {
        debug!(%instance_type, "skipping instance type");
        return Ok(None);
    }

    let operating_system = attributes
        .get("operatingSystem")
        .filter(|os| !os.is_empty())
        .cloned()
        .unwrap_or_else(|| queried_os.to_string());

    let term_key = format!("{}.{TERM_ON_DEMAND}", doc.product.sku);
    let dimension_key = format!("{term_key}.{TERM_PER_HOUR}");
    let usd = doc
        .terms
        .on_demand
        .get(&term_key)
        .ok_or(RecordError::Missing("on-demand term"))?
        .price_dimensions
        .get(&dimension_key)
        .ok_or(RecordError::Missing("hourly price dimension"))?
        .price_per_unit
        .get("USD")
        .ok_or(RecordError::Missing("USD price"))?;

    Ok(Some(OnDemandPrice {
        instance_type: instance_type.clone(),
        operating_system,
        value: parse_price(usd)?,
    }))
}
