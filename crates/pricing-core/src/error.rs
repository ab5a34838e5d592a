//! Configuration error types.

use thiserror::Error;

/// Result type alias for configuration parsing and validation.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors that prevent the exporter from starting.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error(
        "product description '{0}' is not recognized. Available product descriptions: \
         Linux/UNIX, SUSE Linux, Windows, Linux/UNIX (Amazon VPC), SUSE Linux (Amazon VPC), \
         Windows (Amazon VPC)"
    )]
    ProductDescription(String),

    #[error("operating system '{0}' is not recognized. Available operating systems: Linux, RHEL, SUSE, Windows")]
    OperatingSystem(String),

    #[error("savings plan type '{0}' is not recognized. Available savings plan types: Compute, EC2Instance, SageMaker")]
    SavingsPlanType(String),

    #[error("lifecycle '{0}' is not recognized. Available lifecycles: spot, ondemand")]
    Lifecycle(String),

    #[error("invalid regex {pattern}: {source}")]
    Regex {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("invalid listen address '{0}'")]
    ListenAddress(String),

    #[error("metrics path must start with '/': '{0}'")]
    MetricsPath(String),

    #[error("cpu/memory ratio must be a positive finite number, got {0}")]
    Ratio(f64),

    #[error("failed to read config file: {0}")]
    Read(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}
