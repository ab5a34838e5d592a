//! SDK shapes → `pricing-fetch` records.

use aws_sdk_ec2::types::{Filter, InstanceTypeInfo, SpotPrice};
use aws_sdk_savingsplans::types::SavingsPlanOfferingRate;

use pricing_core::{InstanceShape, OperatingSystem};
use pricing_fetch::{RateProperty, SavingsPlanRateRecord, SpotPriceRecord};

/// Service code shared by the Price List and Savings Plans queries.
pub const SERVICE_CODE_EC2: &str = "AmazonEC2";

/// Largest page accepted by the spot price and savings plan queries.
pub const MAX_RESULTS_PER_PAGE: i32 = 1000;

/// Largest page accepted by the Price List query.
pub const PRICE_LIST_PAGE_SIZE: i32 = 100;

/// Term-match filters of the on-demand Price List query: shared-tenancy,
/// used capacity, no pre-installed software.
pub fn on_demand_filters(region: &str, operating_system: OperatingSystem) -> Vec<(&'static str, String)> {
    vec![
        ("regionCode", region.to_string()),
        ("capacitystatus", "Used".to_string()),
        ("tenancy", "Shared".to_string()),
        ("preInstalledSw", "NA".to_string()),
        ("operatingSystem", operating_system.to_string()),
    ]
}

/// Restricts the zone listing to the region's own availability zones.
/// Local Zones and Wavelength Zones belong to other zone groups and are
/// priced separately.
pub fn zone_filter(region: &str) -> Filter {
    Filter::builder().name("group-name").values(region).build()
}

/// `None` for entries without an instance type.
pub fn instance_shape(info: &InstanceTypeInfo) -> Option<InstanceShape> {
    let instance_type = info.instance_type()?.as_str();
    let memory_mib = info
        .memory_info()
        .and_then(|m| m.size_in_mib())
        .unwrap_or(0);
    let vcpus = info
        .v_cpu_info()
        .and_then(|v| v.default_v_cpus())
        .unwrap_or(0);
    Some(InstanceShape::new(
        instance_type,
        u64::try_from(memory_mib).unwrap_or(0),
        u32::try_from(vcpus).unwrap_or(0),
    ))
}

/// Missing fields become empty strings; the spot fetcher rejects them.
pub fn spot_price(price: &SpotPrice) -> SpotPriceRecord {
    SpotPriceRecord {
        availability_zone: price.availability_zone().unwrap_or_default().to_string(),
        instance_type: price
            .instance_type()
            .map(|t| t.as_str().to_string())
            .unwrap_or_default(),
        product_description: price
            .product_description()
            .map(|d| d.as_str().to_string())
            .unwrap_or_default(),
        spot_price: price.spot_price().unwrap_or_default().to_string(),
    }
}

pub fn savings_plan_rate(rate: &SavingsPlanOfferingRate) -> SavingsPlanRateRecord {
    let offering = rate.savings_plan_offering();
    SavingsPlanRateRecord {
        rate: rate.rate().unwrap_or_default().to_string(),
        properties: rate
            .properties()
            .iter()
            .filter_map(|p| {
                Some(RateProperty {
                    name: p.name()?.to_string(),
                    value: p.value()?.to_string(),
                })
            })
            .collect(),
        payment_option: offering
            .and_then(|o| o.payment_option())
            .map(|p| p.as_str().to_string())
            .unwrap_or_default(),
        duration_seconds: offering.map_or(0, |o| o.duration_seconds()),
        plan_type: offering
            .and_then(|o| o.plan_type())
            .map(|t| t.as_str().to_string())
            .unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aws_sdk_ec2::types::{InstanceType, MemoryInfo, RiProductDescription, VCpuInfo};
    use aws_sdk_savingsplans::types::{
        ParentSavingsPlanOffering, SavingsPlanOfferingRateProperty, SavingsPlanPaymentOption,
        SavingsPlanType,
    };

    #[test]
    fn instance_type_info_to_shape() {
        let info = InstanceTypeInfo::builder()
            .instance_type(InstanceType::from("m5.large"))
            .memory_info(MemoryInfo::builder().size_in_mib(8192).build())
            .v_cpu_info(VCpuInfo::builder().default_v_cpus(2).build())
            .build();

        assert_eq!(
            instance_shape(&info),
            Some(InstanceShape::new("m5.large", 8192, 2))
        );
        assert_eq!(instance_shape(&InstanceTypeInfo::builder().build()), None);
    }

    #[test]
    fn partial_instance_info_is_a_zero_shape() {
        let info = InstanceTypeInfo::builder()
            .instance_type(InstanceType::from("mac1.metal"))
            .build();
        assert!(instance_shape(&info).unwrap().is_zero());
    }

    #[test]
    fn spot_price_fields() {
        let price = SpotPrice::builder()
            .availability_zone("eu-west-1a")
            .instance_type(InstanceType::from("c5.large"))
            .product_description(RiProductDescription::from("Linux/UNIX"))
            .spot_price("0.036100")
            .build();

        let record = spot_price(&price);
        assert_eq!(record.availability_zone, "eu-west-1a");
        assert_eq!(record.instance_type, "c5.large");
        assert_eq!(record.product_description, "Linux/UNIX");
        assert_eq!(record.spot_price, "0.036100");
    }

    #[test]
    fn savings_plan_rate_fields() {
        let rate = SavingsPlanOfferingRate::builder()
            .rate("0.0620")
            .properties(
                SavingsPlanOfferingRateProperty::builder()
                    .name("instanceType")
                    .value("m5.large")
                    .build(),
            )
            .properties(SavingsPlanOfferingRateProperty::builder().name("orphan").build())
            .savings_plan_offering(
                ParentSavingsPlanOffering::builder()
                    .payment_option(SavingsPlanPaymentOption::from("All Upfront"))
                    .duration_seconds(94_608_000)
                    .plan_type(SavingsPlanType::from("Compute"))
                    .build(),
            )
            .build();

        let record = savings_plan_rate(&rate);
        assert_eq!(record.rate, "0.0620");
        assert_eq!(
            record.properties,
            vec![RateProperty {
                name: "instanceType".into(),
                value: "m5.large".into(),
            }]
        );
        assert_eq!(record.payment_option, "All Upfront");
        assert_eq!(record.duration_seconds, 94_608_000);
        assert_eq!(record.plan_type, "Compute");
    }

    #[test]
    fn on_demand_filter_set() {
        let filters = on_demand_filters("eu-west-1", OperatingSystem::Rhel);
        assert!(filters.contains(&("regionCode", "eu-west-1".to_string())));
        assert!(filters.contains(&("operatingSystem", "RHEL".to_string())));
        assert!(filters.contains(&("tenancy", "Shared".to_string())));
        assert_eq!(filters.len(), 5);
    }

    #[test]
    fn zone_listing_is_limited_to_the_region_group() {
        let filter = zone_filter("us-west-2");
        assert_eq!(filter.name(), Some("group-name"));
        assert_eq!(filter.values(), ["us-west-2".to_string()]);
    }
}
