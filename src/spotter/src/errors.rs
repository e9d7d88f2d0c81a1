use std::time::Duration;

use thiserror::Error;
use tokio::sync::Semaphore;

/// Invalid or missing run settings. Always reported before anything is dispatched.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("the instance types list is required, e.g. --instance-types t3.small,t3.micro")]
    MissingInstanceTypes,
    #[error(
        "max concurrent queries must be between 1 and {max}, got {0}",
        max = Semaphore::MAX_PERMITS
    )]
    InvalidConcurrency(usize),
    #[error("the per-region query timeout must be greater than zero and fit a deadline, got {0:?}")]
    InvalidTimeout(Duration),
    #[error("failed to load configuration")]
    Load(#[from] config::ConfigError),
}

/// The list of candidate regions could not be produced.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("could not resolve AWS credentials in {region}")]
    CredentialsUnavailable { region: String },
    #[error("region catalog unavailable: {0}")]
    Unavailable(String),
}

/// A single region's query failed. Recovered locally: the region contributes nothing.
#[derive(Debug, Error)]
pub enum RegionQueryError {
    #[error("not authorized to read spot prices in {region}: {message}")]
    Unauthorized { region: String, message: String },
    #[error("throttled while reading spot prices in {region}: {message}")]
    Throttled { region: String, message: String },
    #[error("network error while reading spot prices in {region}: {message}")]
    Network { region: String, message: String },
    #[error("spot price history request failed in {region}: {message}")]
    Service { region: String, message: String },
    #[error("spot price history request in {region} missed its deadline")]
    Timeout { region: String },
}

impl RegionQueryError {
    pub fn region(&self) -> &str {
        match self {
            RegionQueryError::Unauthorized { region, .. }
            | RegionQueryError::Throttled { region, .. }
            | RegionQueryError::Network { region, .. }
            | RegionQueryError::Service { region, .. }
            | RegionQueryError::Timeout { region } => region,
        }
    }
}

/// A returned price could not be read as a non-negative number.
#[derive(Debug, Error, PartialEq)]
#[error("malformed spot price {value:?} for {instance_type} in {zone}")]
pub struct MalformedPriceError {
    pub zone: String,
    pub instance_type: String,
    pub value: String,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum QueryError {
    #[error("no instance types to query in {region}")]
    NoInstanceTypes { region: String },
}

/// Errors that end a run. Everything region-scoped is absorbed before reaching here.
#[derive(Debug, Error)]
pub enum RunError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Catalog(#[from] CatalogError),
}
