//! Savings plan rates — region level, no zone label.
//!
//! A rate is an on-demand price under a commitment, so every observation is
//! labeled with the `ondemand` lifecycle plus the plan's payment option,
//! duration, and type.

use tracing::debug;

use pricing_core::{Lifecycle, PriceLabels, PriceObservation, SavingsPlanTerms};

use crate::cancel::paginate;
use crate::context::FetchContext;
use crate::error::{FetchResult, RecordError};
use crate::source::SavingsPlanRateRecord;
use crate::spot::parse_price;

const SECONDS_PER_YEAR: i64 = 31_536_000;

/// Named properties of a rate, as far as the exporter cares.
#[derive(Debug, Default, Clone, PartialEq)]
struct RateProperties {
    region: String,
    instance_type: String,
    instance_family: String,
    product_description: String,
    tenancy: String,
}

impl RateProperties {
    fn from_record(record: &SavingsPlanRateRecord) -> Self {
        let mut props = RateProperties::default();
        for property in &record.properties {
            let slot = match property.name.as_str() {
                "region" => &mut props.region,
                "instanceType" => &mut props.instance_type,
                "instanceFamily" => &mut props.instance_family,
                "productDescription" => &mut props.product_description,
                "tenancy" => &mut props.tenancy,
                _ => continue,
            };
            *slot = property.value.clone();
        }
        props
    }
}

/// Fetch savings plan rates for `region`, one query per configured plan type.
pub async fn fetch_savings_plans(
    ctx: &FetchContext,
    region: &str,
) -> FetchResult<Vec<PriceObservation>> {
    let source = ctx.source.as_ref();
    let product_descriptions = ctx.config.product_descriptions.as_slice();

    let mut records = Vec::new();
    for &plan_type in &ctx.config.savings_plan_types {
        let page = paginate(&ctx.cancel, |token| {
            source.savings_plan_rates(region, plan_type, product_descriptions, token)
        })
        .await?;
        records.extend(page);
    }

    let mut out = Vec::with_capacity(records.len() * 3);
    for record in &records {
        let props = RateProperties::from_record(record);
        if !ctx.config.instance_filter.matches(&props.instance_type) {
            debug!(instance_type = %props.instance_type, "skipping instance type");
            continue;
        }

        match parse_rate(region, &props, record) {
            Ok((labels, value)) => {
                debug!(
                    %region,
                    instance_type = %props.instance_type,
                    instance_family = %props.instance_family,
                    tenancy = %props.tenancy,
                    plan_type = %record.plan_type,
                    value,
                    "savings plan rate"
                );
                ctx.observe(labels, value, &mut out);
            }
            Err(e) => ctx.record_error(region, "savings_plan", &e),
        }
    }

    debug!(%region, records = records.len(), observations = out.len(), "savings plan rates fetched");
    Ok(out)
}

fn parse_rate(
    region: &str,
    props: &RateProperties,
    record: &SavingsPlanRateRecord,
) -> Result<(PriceLabels, f64), RecordError> {
    if props.instance_type.is_empty() {
        return Err(RecordError::Missing("instance type"));
    }
    let value = parse_price(&record.rate)?;
    let duration_years = duration_years(record.duration_seconds)?;

    // The rate's own region property wins over the queried region.
    let rate_region = if props.region.is_empty() { region } else { &props.region };

    let mut labels = PriceLabels::new(Lifecycle::OnDemand, &props.instance_type, rate_region)
        .with_savings_plan(SavingsPlanTerms {
            payment_option: record.payment_option.clone(),
            duration_years,
            plan_type: record.plan_type.clone(),
        });
    if !props.product_description.is_empty() {
        labels = labels.with_product_description(&props.product_description);
    }
    Ok((labels, value))
}

/// Commitment length in whole years; only 1- and 3-year plans exist.
fn duration_years(seconds: i64) -> Result<u32, RecordError> {
    match seconds / SECONDS_PER_YEAR {
        1 => Ok(1),
        3 => Ok(3),
        _ => Err(RecordError::Duration(seconds)),
    }
}
