//! `PricingSource` over the AWS SDK.

use std::time::SystemTime;

use aws_config::{BehaviorVersion, SdkConfig};
use aws_sdk_ec2::config::Region;
use aws_sdk_ec2::error::DisplayErrorContext;
use aws_sdk_ec2::primitives::DateTime;
use aws_sdk_pricing::types::{Filter, FilterType};
use aws_sdk_savingsplans::types::{
    SavingsPlanOfferingRateFilterElement, SavingsPlanRateFilterAttribute,
    SavingsPlanRateServiceCode,
};
use tracing::{debug, info};

use pricing_core::{InstanceShape, OperatingSystem, ProductDescription, SavingsPlanType};
use pricing_fetch::{
    BoxFuture, Page, PricingSource, SavingsPlanRateRecord, SourceError, SourceResult,
    SpotPriceRecord,
};

use crate::convert::{
    self, MAX_RESULTS_PER_PAGE, PRICE_LIST_PAGE_SIZE, SERVICE_CODE_EC2, on_demand_filters,
};

pub struct AwsPricingSource {
    sdk_config: SdkConfig,
    home_ec2: aws_sdk_ec2::Client,
    pricing: aws_sdk_pricing::Client,
    savings_plans: aws_sdk_savingsplans::Client,
}

impl AwsPricingSource {
    /// Load credentials and settings from the environment. Global queries
    /// (regions, instance types, Price List, Savings Plans) go to
    /// `home_region`; the Price List API only answers in a few regions,
    /// `us-east-1` among them.
    pub async fn from_env(home_region: &str) -> Self {
        let sdk_config = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(home_region.to_string()))
            .load()
            .await;
        info!(%home_region, "AWS SDK configured");
        Self::new(sdk_config)
    }

    pub fn new(sdk_config: SdkConfig) -> Self {
        Self {
            home_ec2: aws_sdk_ec2::Client::new(&sdk_config),
            pricing: aws_sdk_pricing::Client::new(&sdk_config),
            savings_plans: aws_sdk_savingsplans::Client::new(&sdk_config),
            sdk_config,
        }
    }

    /// EC2 client bound to `region`. Shares the HTTP client and credentials
    /// of the home configuration.
    fn ec2(&self, region: &str) -> aws_sdk_ec2::Client {
        let config = aws_sdk_ec2::config::Builder::from(&self.sdk_config)
            .region(Region::new(region.to_string()))
            .build();
        aws_sdk_ec2::Client::from_conf(config)
    }
}

fn next_token(token: Option<&str>) -> Option<String> {
    token.filter(|t| !t.is_empty()).map(str::to_string)
}

impl PricingSource for AwsPricingSource {
    fn regions(&self) -> BoxFuture<'_, SourceResult<Vec<String>>> {
        Box::pin(async move {
            let out = self
                .home_ec2
                .describe_regions()
                .send()
                .await
                .map_err(|e| SourceError::request("DescribeRegions", DisplayErrorContext(&e)))?;
            Ok(out
                .regions()
                .iter()
                .filter_map(|r| r.region_name())
                .map(str::to_string)
                .collect())
        })
    }

    fn instance_types(
        &self,
        next: Option<String>,
    ) -> BoxFuture<'_, SourceResult<Page<InstanceShape>>> {
        Box::pin(async move {
            let out = self
                .home_ec2
                .describe_instance_types()
                .set_next_token(next)
                .send()
                .await
                .map_err(|e| {
                    SourceError::request("DescribeInstanceTypes", DisplayErrorContext(&e))
                })?;
            Ok(Page {
                items: out
                    .instance_types()
                    .iter()
                    .filter_map(convert::instance_shape)
                    .collect(),
                next_token: next_token(out.next_token()),
            })
        })
    }

    fn availability_zones<'a>(&'a self, region: &'a str) -> BoxFuture<'a, SourceResult<Vec<String>>> {
        Box::pin(async move {
            let out = self
                .ec2(region)
                .describe_availability_zones()
                .filters(convert::zone_filter(region))
                .send()
                .await
                .map_err(|e| {
                    SourceError::request("DescribeAvailabilityZones", DisplayErrorContext(&e))
                })?;
            Ok(out
                .availability_zones()
                .iter()
                .filter_map(|z| z.zone_name())
                .map(str::to_string)
                .collect())
        })
    }

    fn spot_prices<'a>(
        &'a self,
        region: &'a str,
        product_descriptions: &'a [ProductDescription],
        next: Option<String>,
    ) -> BoxFuture<'a, SourceResult<Page<SpotPriceRecord>>> {
        Box::pin(async move {
            let out = self
                .ec2(region)
                .describe_spot_price_history()
                .start_time(DateTime::from(SystemTime::now()))
                .max_results(MAX_RESULTS_PER_PAGE)
                .set_product_descriptions(Some(
                    product_descriptions.iter().map(|pd| pd.to_string()).collect(),
                ))
                .set_next_token(next)
                .send()
                .await
                .map_err(|e| {
                    SourceError::request("DescribeSpotPriceHistory", DisplayErrorContext(&e))
                })?;
            debug!(%region, records = out.spot_price_history().len(), "spot price page");
            Ok(Page {
                items: out.spot_price_history().iter().map(convert::spot_price).collect(),
                next_token: next_token(out.next_token()),
            })
        })
    }

    fn on_demand_products<'a>(
        &'a self,
        region: &'a str,
        operating_system: OperatingSystem,
        next: Option<String>,
    ) -> BoxFuture<'a, SourceResult<Page<String>>> {
        Box::pin(async move {
            let mut request = self
                .pricing
                .get_products()
                .service_code(SERVICE_CODE_EC2)
                .max_results(PRICE_LIST_PAGE_SIZE)
                .set_next_token(next);
            for (field, value) in on_demand_filters(region, operating_system) {
                let filter = Filter::builder()
                    .r#type(FilterType::TermMatch)
                    .field(field)
                    .value(value)
                    .build()
                    .map_err(|e| SourceError::Config(e.to_string()))?;
                request = request.filters(filter);
            }

            let out = request
                .send()
                .await
                .map_err(|e| SourceError::request("GetProducts", DisplayErrorContext(&e)))?;
            debug!(%region, %operating_system, documents = out.price_list().len(), "price list page");
            Ok(Page {
                items: out.price_list().to_vec(),
                next_token: next_token(out.next_token()),
            })
        })
    }

    fn savings_plan_rates<'a>(
        &'a self,
        region: &'a str,
        plan_type: SavingsPlanType,
        product_descriptions: &'a [ProductDescription],
        next: Option<String>,
    ) -> BoxFuture<'a, SourceResult<Page<SavingsPlanRateRecord>>> {
        Box::pin(async move {
            let filter = |attribute: &str, values: Vec<String>| {
                SavingsPlanOfferingRateFilterElement::builder()
                    .name(SavingsPlanRateFilterAttribute::from(attribute))
                    .set_values(Some(values))
                    .build()
            };

            let out = self
                .savings_plans
                .describe_savings_plans_offering_rates()
                .savings_plan_types(aws_sdk_savingsplans::types::SavingsPlanType::from(
                    plan_type.as_str(),
                ))
                .service_codes(SavingsPlanRateServiceCode::from(SERVICE_CODE_EC2))
                .filters(filter("region", vec![region.to_string()]))
                .filters(filter("tenancy", vec!["shared".to_string()]))
                .filters(filter(
                    "productDescription",
                    product_descriptions.iter().map(|pd| pd.to_string()).collect(),
                ))
                .max_results(MAX_RESULTS_PER_PAGE)
                .set_next_token(next)
                .send()
                .await
                .map_err(|e| {
                    SourceError::request(
                        "DescribeSavingsPlansOfferingRates",
                        aws_sdk_savingsplans::error::DisplayErrorContext(&e),
                    )
                })?;
            debug!(%region, %plan_type, rates = out.search_results().len(), "savings plan page");
            Ok(Page {
                items: out
                    .search_results()
                    .iter()
                    .map(convert::savings_plan_rate)
                    .collect(),
                next_token: next_token(out.next_token()),
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_token_ends_pagination() {
        assert_eq!(next_token(None), None);
        assert_eq!(next_token(Some("")), None);
        assert_eq!(next_token(Some("abc")), Some("abc".to_string()));
    }
}
