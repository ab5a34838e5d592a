//! Domain types shared by the fetchers, the orchestrator, and the renderer.
//!
//! Label sets are closed structs rather than string maps; they become
//! `name="value"` pairs only when the exposition text is rendered.

use std::fmt;
use std::str::FromStr;

use crate::error::ConfigError;

/// Declares a closed string-backed enum with `as_str`, `Display`, and a
/// `FromStr` that rejects unknown values with the given `ConfigError` variant.
macro_rules! string_enum {
    ($(#[$meta:meta])* $name:ident => $err:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            /// Every accepted value, in declaration order.
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// The wire spelling of this value.
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = ConfigError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok($name::$variant),)+
                    other => Err(ConfigError::$err(other.to_string())),
                }
            }
        }
    };
}

// ── Filter vocabularies ────────────────────────────────────────────

string_enum! {
    /// Pricing model of a compute instance.
    Lifecycle => Lifecycle {
        Spot => "spot",
        OnDemand => "ondemand",
    }
}

string_enum! {
    /// Product description accepted by the spot price history and
    /// savings plan rate queries.
    ProductDescription => ProductDescription {
        LinuxUnix => "Linux/UNIX",
        SuseLinux => "SUSE Linux",
        Windows => "Windows",
        LinuxUnixVpc => "Linux/UNIX (Amazon VPC)",
        SuseLinuxVpc => "SUSE Linux (Amazon VPC)",
        WindowsVpc => "Windows (Amazon VPC)",
    }
}

string_enum! {
    /// Operating system attribute of the on-demand price list.
    OperatingSystem => OperatingSystem {
        Linux => "Linux",
        Rhel => "RHEL",
        Suse => "SUSE",
        Windows => "Windows",
    }
}

string_enum! {
    /// Savings plan family.
    SavingsPlanType => SavingsPlanType {
        Compute => "Compute",
        Ec2Instance => "EC2Instance",
        SageMaker => "SageMaker",
    }
}

// ── Instance shapes ────────────────────────────────────────────────

/// Hardware shape of an instance type, as reported by the inventory API.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct InstanceShape {
    pub instance_type: String,
    /// Memory size in MiB.
    pub memory_mib: u64,
    /// Default vCPU count.
    pub vcpu_count: u32,
}

impl InstanceShape {
    pub fn new(instance_type: impl Into<String>, memory_mib: u64, vcpu_count: u32) -> Self {
        Self {
            instance_type: instance_type.into(),
            memory_mib,
            vcpu_count,
        }
    }

    /// Placeholder shape for an instance type missing from the catalog.
    pub fn zero(instance_type: impl Into<String>) -> Self {
        Self::new(instance_type, 0, 0)
    }

    /// Whether this shape carries no hardware facts.
    pub fn is_zero(&self) -> bool {
        self.memory_mib == 0 && self.vcpu_count == 0
    }

    pub fn memory_gib(&self) -> f64 {
        self.memory_mib as f64 / 1024.0
    }
}

// ── Labels ─────────────────────────────────────────────────────────

/// Savings plan offering attached to a region-level rate.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SavingsPlanTerms {
    /// Payment option, e.g. "All Upfront".
    pub payment_option: String,
    /// Commitment length in years (1 or 3).
    pub duration_years: u32,
    /// Plan type, e.g. "Compute".
    pub plan_type: String,
}

/// Label tuple shared by every price family.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PriceLabels {
    pub lifecycle: Lifecycle,
    pub instance_type: String,
    pub region: String,
    pub availability_zone: Option<String>,
    pub product_description: Option<String>,
    pub operating_system: Option<String>,
    pub savings_plan: Option<SavingsPlanTerms>,
}

impl PriceLabels {
    pub fn new(
        lifecycle: Lifecycle,
        instance_type: impl Into<String>,
        region: impl Into<String>,
    ) -> Self {
        Self {
            lifecycle,
            instance_type: instance_type.into(),
            region: region.into(),
            availability_zone: None,
            product_description: None,
            operating_system: None,
            savings_plan: None,
        }
    }

    pub fn in_zone(mut self, zone: impl Into<String>) -> Self {
        self.availability_zone = Some(zone.into());
        self
    }

    pub fn with_product_description(mut self, description: impl Into<String>) -> Self {
        self.product_description = Some(description.into());
        self
    }

    pub fn with_operating_system(mut self, os: impl Into<String>) -> Self {
        self.operating_system = Some(os.into());
        self
    }

    pub fn with_savings_plan(mut self, terms: SavingsPlanTerms) -> Self {
        self.savings_plan = Some(terms);
        self
    }
}

/// Hardware labels of the resource price family, taken from the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ShapeLabels {
    /// Memory in MiB.
    pub memory: String,
    pub vcpu: String,
}

impl ShapeLabels {
    pub fn from_shape(shape: &InstanceShape) -> Self {
        Self {
            memory: shape.memory_mib.to_string(),
            vcpu: shape.vcpu_count.to_string(),
        }
    }
}

// ── Observations ───────────────────────────────────────────────────

/// The three exported price families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MetricFamily {
    ResourcePrice,
    MemoryUnitPrice,
    VCpuUnitPrice,
}

impl MetricFamily {
    pub const ALL: [MetricFamily; 3] = [
        MetricFamily::ResourcePrice,
        MetricFamily::MemoryUnitPrice,
        MetricFamily::VCpuUnitPrice,
    ];

    /// Metric name without the exporter namespace.
    pub fn name(&self) -> &'static str {
        match self {
            MetricFamily::ResourcePrice => "resource_price",
            MetricFamily::MemoryUnitPrice => "resource_memory_unit_price",
            MetricFamily::VCpuUnitPrice => "resource_vcpu_unit_price",
        }
    }

    pub fn help(&self) -> &'static str {
        match self {
            MetricFamily::ResourcePrice => "Current hourly price of the instance type.",
            MetricFamily::MemoryUnitPrice => "Hourly price of each GiB of memory of the instance.",
            MetricFamily::VCpuUnitPrice => "Hourly price of each vCPU of the instance.",
        }
    }
}

/// One normalized price point produced by a fetcher.
#[derive(Debug, Clone, PartialEq)]
pub enum PriceObservation {
    ResourcePrice {
        labels: PriceLabels,
        shape: ShapeLabels,
        value: f64,
    },
    MemoryUnitPrice {
        labels: PriceLabels,
        value: f64,
    },
    VCpuUnitPrice {
        labels: PriceLabels,
        value: f64,
    },
}

impl PriceObservation {
    pub fn family(&self) -> MetricFamily {
        match self {
            PriceObservation::ResourcePrice { .. } => MetricFamily::ResourcePrice,
            PriceObservation::MemoryUnitPrice { .. } => MetricFamily::MemoryUnitPrice,
            PriceObservation::VCpuUnitPrice { .. } => MetricFamily::VCpuUnitPrice,
        }
    }

    pub fn labels(&self) -> &PriceLabels {
        match self {
            PriceObservation::ResourcePrice { labels, .. }
            | PriceObservation::MemoryUnitPrice { labels, .. }
            | PriceObservation::VCpuUnitPrice { labels, .. } => labels,
        }
    }

    pub fn value(&self) -> f64 {
        match self {
            PriceObservation::ResourcePrice { value, .. }
            | PriceObservation::MemoryUnitPrice { value, .. }
            | PriceObservation::VCpuUnitPrice { value, .. } => *value,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lifecycle_round_trips_wire_names() {
        assert_eq!("spot".parse::<Lifecycle>().unwrap(), Lifecycle::Spot);
        assert_eq!("ondemand".parse::<Lifecycle>().unwrap(), Lifecycle::OnDemand);
        assert_eq!(Lifecycle::OnDemand.to_string(), "ondemand");
    }

    #[test]
    fn unknown_values_are_rejected() {
        assert!(matches!(
            "Solaris".parse::<OperatingSystem>(),
            Err(ConfigError::OperatingSystem(v)) if v == "Solaris"
        ));
        assert!(matches!(
            "linux/unix".parse::<ProductDescription>(),
            Err(ConfigError::ProductDescription(_))
        ));
        assert!(matches!(
            "Reserved".parse::<SavingsPlanType>(),
            Err(ConfigError::SavingsPlanType(_))
        ));
        assert!("reserved".parse::<Lifecycle>().is_err());
    }

    #[test]
    fn product_descriptions_accept_vpc_variants() {
        for pd in ProductDescription::ALL {
            assert_eq!(pd.as_str().parse::<ProductDescription>().unwrap(), *pd);
        }
        assert_eq!(
            "Windows (Amazon VPC)".parse::<ProductDescription>().unwrap(),
            ProductDescription::WindowsVpc
        );
    }

    #[test]
    fn zero_shape() {
        let shape = InstanceShape::zero("x9.mystery");
        assert!(shape.is_zero());
        assert_eq!(shape.instance_type, "x9.mystery");
        assert!(!InstanceShape::new("t3.micro", 1024, 2).is_zero());
    }

    #[test]
    fn memory_gib_is_fractional() {
        assert_eq!(InstanceShape::new("t3.nano", 512, 2).memory_gib(), 0.5);
        assert_eq!(InstanceShape::new("m5.large", 8192, 2).memory_gib(), 8.0);
    }

    #[test]
    fn shape_labels_use_mib_and_count() {
        let labels = ShapeLabels::from_shape(&InstanceShape::new("m5.large", 8192, 2));
        assert_eq!(labels.memory, "8192");
        assert_eq!(labels.vcpu, "2");

        let unknown = ShapeLabels::from_shape(&InstanceShape::zero("x"));
        assert_eq!(unknown.memory, "0");
        assert_eq!(unknown.vcpu, "0");
    }

    #[test]
    fn observation_accessors() {
        let labels = PriceLabels::new(Lifecycle::Spot, "m5.large", "eu-west-1").in_zone("eu-west-1a");
        let obs = PriceObservation::MemoryUnitPrice {
            labels: labels.clone(),
            value: 0.25,
        };
        assert_eq!(obs.family(), MetricFamily::MemoryUnitPrice);
        assert_eq!(obs.labels(), &labels);
        assert_eq!(obs.value(), 0.25);
        assert_eq!(obs.family().name(), "resource_memory_unit_price");
    }
}
