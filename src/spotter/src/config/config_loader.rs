use std::path::Path;
use std::time::Duration;

use config::{Config as RConfig, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};

use crate::cloud_providers::aws::config::{get_aws_default_profile, AwsConfig};
use crate::constants::{
    CATALOG_REGION, DEFAULT_MAX_CONCURRENT, DEFAULT_QUERY_TIMEOUT_SECS, ENV_PREFIX,
    PRODUCT_DESCRIPTION,
};
use crate::errors::ConfigError;
use crate::spot::dispatch::check_limits;

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Config {
    pub max_concurrent: usize,
    pub query_timeout_secs: u64,
    pub exclude_region_prefixes: Vec<String>,
    pub product_description: String,
    pub catalog_region: String,

    pub aws_init_type: AwsConfig,

    /// Also write logs to `<log_dir>/spotter.log` when set.
    #[serde(default)]
    pub log_dir: Option<String>,
}

impl Config {
    pub fn query_timeout(&self) -> Duration {
        Duration::from_secs(self.query_timeout_secs)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        check_limits(self.max_concurrent, self.query_timeout())
    }
}

/// Values given on the command line; they win over every other source.
#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub max_concurrent: Option<usize>,
    pub query_timeout_secs: Option<u64>,
    pub exclude_region_prefixes: Option<Vec<String>>,
    pub aws_profile: Option<String>,
}

pub struct ConfigLoader;

impl ConfigLoader {
    pub fn load_default_config() -> Result<Config, ConfigError> {
        Self::load(None, &ConfigOverrides::default())
    }

    /// Layers defaults, the optional TOML file, `SPOTTER_*` environment
    /// variables and finally `overrides`.
    pub fn load(path: Option<&Path>, overrides: &ConfigOverrides) -> Result<Config, ConfigError> {
        let mut builder = RConfig::builder();

        // set defaults
        builder = builder
            .set_default("max_concurrent", DEFAULT_MAX_CONCURRENT as u64)?
            .set_default("query_timeout_secs", DEFAULT_QUERY_TIMEOUT_SECS)?
            .set_default::<&str, Vec<String>>("exclude_region_prefixes", vec![])?
            .set_default("product_description", PRODUCT_DESCRIPTION)?
            .set_default("catalog_region", CATALOG_REGION)?
            .set_default("aws_init_type", AwsConfig::Profile(get_aws_default_profile()))?;

        if let Some(path) = path {
            builder = builder.add_source(File::from(path).format(FileFormat::Toml).required(true));
        }

        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .try_parsing(true)
                .list_separator(",")
                .with_list_parse_key("exclude_region_prefixes"),
        );

        // set overrides
        builder = builder
            .set_override_option("max_concurrent", overrides.max_concurrent.map(|v| v as u64))?
            .set_override_option("query_timeout_secs", overrides.query_timeout_secs)?
            .set_override_option(
                "exclude_region_prefixes",
                overrides.exclude_region_prefixes.clone(),
            )?
            .set_override_option(
                "aws_init_type",
                overrides.aws_profile.clone().map(AwsConfig::Profile),
            )?;

        let config: Config = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }
}
