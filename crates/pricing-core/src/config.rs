//! Exporter configuration: raw (file / command line) and validated forms.
//!
//! `RawConfig` mirrors what an operator writes: plain strings and lists,
//! every field optional so a TOML file and command-line flags can be
//! layered. `RawConfig::validate()` turns it into an `ExporterConfig`
//! with typed filter values; any unknown value is a `ConfigError` and the
//! exporter must not start.

use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::error::{ConfigError, ConfigResult};
use crate::filter::InstanceFilter;
use crate::types::{Lifecycle, OperatingSystem, ProductDescription, SavingsPlanType};

/// One vCPU is assumed to cost as much as this many GiB of memory.
pub const DEFAULT_CPU_MEMORY_RATIO: f64 = 7.2;

pub const DEFAULT_LISTEN_ADDRESS: &str = "0.0.0.0:8080";
pub const DEFAULT_METRICS_PATH: &str = "/metrics";
pub const DEFAULT_PRODUCT_DESCRIPTION: &str = "Linux/UNIX";
pub const DEFAULT_OPERATING_SYSTEM: &str = "Linux";

/// Region that hosts the Price List API and the instance type inventory query.
pub const DEFAULT_HOME_REGION: &str = "us-east-1";

/// Unvalidated configuration, as read from a TOML file or the command line.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RawConfig {
    pub listen_address: Option<String>,
    pub metrics_path: Option<String>,
    pub regions: Option<Vec<String>>,
    pub lifecycles: Option<Vec<String>>,
    pub product_descriptions: Option<Vec<String>>,
    pub operating_systems: Option<Vec<String>>,
    pub instance_regexes: Option<Vec<String>>,
    pub savings_plan_types: Option<Vec<String>>,
    pub cache_seconds: Option<u64>,
    pub scrape_timeout_seconds: Option<u64>,
    pub cpu_memory_ratio: Option<f64>,
    pub home_region: Option<String>,
}

/// HTTP exposition settings.
#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    pub listen_address: SocketAddr,
    pub metrics_path: String,
}

/// Everything a scrape cycle needs to know.
#[derive(Debug, Clone)]
pub struct ScrapeConfig {
    /// Regions to fetch, deduplicated in configured order. Empty means
    /// "discover every enabled region" at startup.
    pub regions: Vec<String>,
    pub lifecycles: Vec<Lifecycle>,
    pub product_descriptions: Vec<ProductDescription>,
    pub operating_systems: Vec<OperatingSystem>,
    pub savings_plan_types: Vec<SavingsPlanType>,
    pub instance_filter: InstanceFilter,
    /// How long a scrape result is served before the next request refreshes it.
    pub cache_ttl: Duration,
    /// Deadline for a whole scrape cycle.
    pub scrape_timeout: Option<Duration>,
    pub cpu_memory_ratio: f64,
}

impl ScrapeConfig {
    pub fn is_enabled(&self, lifecycle: Lifecycle) -> bool {
        self.lifecycles.contains(&lifecycle)
    }

    /// Savings plan rates are on-demand prices under a commitment, so they
    /// are fetched only when on-demand pricing is enabled.
    pub fn savings_plans_enabled(&self) -> bool {
        !self.savings_plan_types.is_empty() && self.is_enabled(Lifecycle::OnDemand)
    }

    pub fn with_regions<S: Into<String>>(mut self, regions: impl IntoIterator<Item = S>) -> Self {
        self.regions = dedup(regions.into_iter().map(Into::into).collect());
        self
    }
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self {
            regions: Vec::new(),
            lifecycles: Lifecycle::ALL.to_vec(),
            product_descriptions: vec![ProductDescription::LinuxUnix],
            operating_systems: vec![OperatingSystem::Linux],
            savings_plan_types: Vec::new(),
            instance_filter: InstanceFilter::match_all(),
            cache_ttl: Duration::ZERO,
            scrape_timeout: None,
            cpu_memory_ratio: DEFAULT_CPU_MEMORY_RATIO,
        }
    }
}

/// Validated exporter configuration.
#[derive(Debug, Clone)]
pub struct ExporterConfig {
    pub server: ServerConfig,
    pub scrape: ScrapeConfig,
    pub home_region: String,
}

impl RawConfig {
    pub fn from_file(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> ConfigResult<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Layer `overrides` on top of `self`: every field set in `overrides` wins.
    pub fn merge(self, overrides: RawConfig) -> RawConfig {
        RawConfig {
            listen_address: overrides.listen_address.or(self.listen_address),
            metrics_path: overrides.metrics_path.or(self.metrics_path),
            regions: overrides.regions.or(self.regions),
            lifecycles: overrides.lifecycles.or(self.lifecycles),
            product_descriptions: overrides.product_descriptions.or(self.product_descriptions),
            operating_systems: overrides.operating_systems.or(self.operating_systems),
            instance_regexes: overrides.instance_regexes.or(self.instance_regexes),
            savings_plan_types: overrides.savings_plan_types.or(self.savings_plan_types),
            cache_seconds: overrides.cache_seconds.or(self.cache_seconds),
            scrape_timeout_seconds: overrides
                .scrape_timeout_seconds
                .or(self.scrape_timeout_seconds),
            cpu_memory_ratio: overrides.cpu_memory_ratio.or(self.cpu_memory_ratio),
            home_region: overrides.home_region.or(self.home_region),
        }
    }

    /// Check every value and produce the typed configuration.
    pub fn validate(self) -> ConfigResult<ExporterConfig> {
        let listen = self
            .listen_address
            .unwrap_or_else(|| DEFAULT_LISTEN_ADDRESS.to_string());
        let listen_address = parse_listen_address(&listen)?;

        let metrics_path = self
            .metrics_path
            .unwrap_or_else(|| DEFAULT_METRICS_PATH.to_string());
        if !metrics_path.starts_with('/') {
            return Err(ConfigError::MetricsPath(metrics_path));
        }

        let mut lifecycles: Vec<Lifecycle> = parse_all(clean(self.lifecycles.unwrap_or_default()))?;
        if lifecycles.is_empty() {
            lifecycles = Lifecycle::ALL.to_vec();
        }

        let product_descriptions = parse_all(clean(
            self.product_descriptions
                .unwrap_or_else(|| vec![DEFAULT_PRODUCT_DESCRIPTION.to_string()]),
        ))?;
        let operating_systems = parse_all(clean(
            self.operating_systems
                .unwrap_or_else(|| vec![DEFAULT_OPERATING_SYSTEM.to_string()]),
        ))?;
        let savings_plan_types = parse_all(clean(self.savings_plan_types.unwrap_or_default()))?;

        let instance_filter = InstanceFilter::new(&clean(self.instance_regexes.unwrap_or_default()))?;

        let cpu_memory_ratio = self.cpu_memory_ratio.unwrap_or(DEFAULT_CPU_MEMORY_RATIO);
        if !cpu_memory_ratio.is_finite() || cpu_memory_ratio <= 0.0 {
            return Err(ConfigError::Ratio(cpu_memory_ratio));
        }

        let scrape = ScrapeConfig {
            regions: dedup(clean(self.regions.unwrap_or_default())),
            lifecycles: dedup(lifecycles),
            product_descriptions: dedup(product_descriptions),
            operating_systems: dedup(operating_systems),
            savings_plan_types: dedup(savings_plan_types),
            instance_filter,
            cache_ttl: Duration::from_secs(self.cache_seconds.unwrap_or(0)),
            scrape_timeout: self
                .scrape_timeout_seconds
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs),
            cpu_memory_ratio,
        };

        let home_region = self
            .home_region
            .map(|r| r.trim().to_string())
            .filter(|r| !r.is_empty())
            .unwrap_or_else(|| DEFAULT_HOME_REGION.to_string());

        Ok(ExporterConfig {
            server: ServerConfig {
                listen_address,
                metrics_path,
            },
            scrape,
            home_region,
        })
    }
}

/// Split a comma separated list, trimming whitespace and dropping empty entries.
pub fn split_and_trim(s: &str) -> Vec<String> {
    s.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(str::to_string)
        .collect()
}

/// Accepts `host:port` as well as the bare `:port` shorthand.
fn parse_listen_address(s: &str) -> ConfigResult<SocketAddr> {
    let candidate = if s.starts_with(':') {
        format!("0.0.0.0{s}")
    } else {
        s.to_string()
    };
    candidate
        .parse()
        .map_err(|_| ConfigError::ListenAddress(s.to_string()))
}

fn clean(values: Vec<String>) -> Vec<String> {
    values
        .into_iter()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .collect()
}

fn parse_all<T: std::str::FromStr<Err = ConfigError>>(values: Vec<String>) -> ConfigResult<Vec<T>> {
    values.iter().map(|v| v.parse()).collect()
}

fn dedup<T: PartialEq>(values: Vec<T>) -> Vec<T> {
    let mut out: Vec<T> = Vec::with_capacity(values.len());
    for v in values {
        if !out.contains(&v) {
            out.push(v);
        }
    }
    out
}
