//! Command line surface.
//!
//! Every configuration flag is optional so that it only overrides what a
//! `--config` TOML file (or the built-in default) says.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use pricing_core::{ConfigResult, ExporterConfig, RawConfig, split_and_trim};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Parser)]
#[command(name = "ec2-price-exporter", about = "Prometheus exporter for AWS EC2 spot, on-demand, and savings plan prices")]
pub struct Cli {
    /// TOML configuration file; flags override its values.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Address to listen on for HTTP requests (default 0.0.0.0:8080).
    #[arg(long)]
    pub listen_address: Option<String>,

    /// Path of the metrics endpoint (default /metrics).
    #[arg(long)]
    pub metrics_path: Option<String>,

    /// Log filter directive; RUST_LOG takes precedence.
    #[arg(long, default_value = "info")]
    pub log_level: String,

    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,

    /// Comma separated product descriptions used to filter spot prices and
    /// savings plan rates. Accepted: Linux/UNIX, SUSE Linux, Windows,
    /// Linux/UNIX (Amazon VPC), SUSE Linux (Amazon VPC), Windows (Amazon VPC).
    #[arg(long)]
    pub product_descriptions: Option<String>,

    /// Comma separated operating systems used to filter on-demand prices.
    /// Accepted: Linux, RHEL, SUSE, Windows.
    #[arg(long)]
    pub operating_systems: Option<String>,

    /// Comma separated regions (default: every enabled region).
    #[arg(long)]
    pub regions: Option<String>,

    /// Comma separated lifecycles, spot and/or ondemand (default: both).
    #[arg(long)]
    pub lifecycle: Option<String>,

    /// Seconds a scrape result is served before the next refresh (default 0).
    #[arg(long)]
    pub cache: Option<u64>,

    /// Comma separated instance type regexes (default: all).
    #[arg(long)]
    pub instance_regexes: Option<String>,

    /// Comma separated savings plan types: Compute, EC2Instance, SageMaker
    /// (default: none).
    #[arg(long)]
    pub saving_plan_types: Option<String>,

    /// Deadline for one scrape cycle in seconds (default: none).
    #[arg(long)]
    pub scrape_timeout: Option<u64>,

    /// GiB of memory priced like one vCPU (default 7.2).
    #[arg(long)]
    pub cpu_memory_ratio: Option<f64>,

    /// Region serving the Price List and instance type queries (default us-east-1).
    #[arg(long)]
    pub home_region: Option<String>,
}

impl Cli {
    /// Flag values as a config layer.
    pub fn overrides(&self) -> RawConfig {
        let list = |value: &Option<String>| value.as_deref().map(split_and_trim);
        RawConfig {
            listen_address: self.listen_address.clone(),
            metrics_path: self.metrics_path.clone(),
            regions: list(&self.regions),
            lifecycles: list(&self.lifecycle),
            product_descriptions: list(&self.product_descriptions),
            operating_systems: list(&self.operating_systems),
            instance_regexes: list(&self.instance_regexes),
            savings_plan_types: list(&self.saving_plan_types),
            cache_seconds: self.cache,
            scrape_timeout_seconds: self.scrape_timeout,
            cpu_memory_ratio: self.cpu_memory_ratio,
            home_region: self.home_region.clone(),
        }
    }

    /// Config file (if any) merged with the flags, then validated.
    pub fn load_config(&self) -> ConfigResult<ExporterConfig> {
        let base = match &self.config {
            Some(path) => RawConfig::from_file(path)?,
            None => RawConfig::default(),
        };
        base.merge(self.overrides()).validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::time::Duration;

    use pricing_core::{ConfigError, Lifecycle, OperatingSystem, ProductDescription, SavingsPlanType};

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("ec2-price-exporter").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn no_flags_gives_defaults() {
        let cli = parse(&[]);
        assert_eq!(cli.log_level, "info");
        assert_eq!(cli.log_format, LogFormat::Text);
        assert_eq!(cli.overrides(), RawConfig::default());

        let config = cli.load_config().unwrap();
        assert_eq!(config.server.listen_address.port(), 8080);
        assert_eq!(config.server.metrics_path, "/metrics");
        assert_eq!(config.home_region, "us-east-1");
        assert!(config.scrape.regions.is_empty());
    }

    #[test]
    fn comma_lists_are_split() {
        let cli = parse(&[
            "--regions",
            "eu-west-1, us-east-1",
            "--product-descriptions",
            "Linux/UNIX,Windows (Amazon VPC)",
            "--operating-systems",
            "Linux,RHEL",
            "--lifecycle",
            "spot",
            "--saving-plan-types",
            "Compute",
            "--cache",
            "300",
        ]);
        let config = cli.load_config().unwrap().scrape;

        assert_eq!(config.regions, vec!["eu-west-1", "us-east-1"]);
        assert_eq!(
            config.product_descriptions,
            vec![ProductDescription::LinuxUnix, ProductDescription::WindowsVpc]
        );
        assert_eq!(config.operating_systems, vec![OperatingSystem::Linux, OperatingSystem::Rhel]);
        assert_eq!(config.lifecycles, vec![Lifecycle::Spot]);
        assert_eq!(config.savings_plan_types, vec![SavingsPlanType::Compute]);
        assert_eq!(config.cache_ttl, Duration::from_secs(300));
    }

    #[test]
    fn invalid_flag_value_is_a_config_error() {
        let cli = parse(&["--operating-systems", "Plan9"]);
        assert!(matches!(cli.load_config(), Err(ConfigError::OperatingSystem(_))));
    }

    #[test]
    fn flags_override_config_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "regions = [\"ap-south-1\"]\ncache_seconds = 60\nmetrics_path = \"/prices\""
        )
        .unwrap();

        let path = file.path().to_str().unwrap();
        let cli = parse(&["--config", path, "--cache", "5"]);
        let config = cli.load_config().unwrap();

        assert_eq!(config.scrape.regions, vec!["ap-south-1"]);
        assert_eq!(config.scrape.cache_ttl, Duration::from_secs(5));
        assert_eq!(config.server.metrics_path, "/prices");
    }

    #[test]
    fn missing_config_file_is_an_error() {
        let cli = parse(&["--config", "/nonexistent/exporter.toml"]);
        assert!(matches!(cli.load_config(), Err(ConfigError::Read(_))));
    }

    #[test]
    fn json_log_format() {
        assert_eq!(parse(&["--log-format", "json"]).log_format, LogFormat::Json);
    }
}
