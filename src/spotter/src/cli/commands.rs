use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use itertools::Itertools;

use crate::config::ConfigOverrides;
use crate::errors::ConfigError;

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// One line per price: `$price [description] region zone type timestamp`
    Text,
    /// A JSON array of price rows
    Json,
}

#[derive(Parser, Debug, Clone)]
#[clap(
    name = "spotter",
    about = "Ranks current EC2 spot prices for instance types across every AWS region",
    version = env!("CARGO_PKG_VERSION")
)]
pub struct Cli {
    /// Comma-separated instance types to price, e.g. t3.small,t3.micro
    #[clap(long, short = 'i', value_name = "TYPES")]
    pub instance_types: Option<String>,

    /// Comma-separated region prefixes to skip, e.g. us-gov,cn-
    #[clap(long, short = 'x', value_name = "PREFIXES")]
    pub exclude_regions: Option<String>,

    /// Maximum number of regions queried at the same time
    #[clap(long, short = 'c')]
    pub max_concurrent: Option<usize>,

    /// Seconds each region gets to answer
    #[clap(long, short = 't')]
    pub timeout_secs: Option<u64>,

    /// AWS profile to read credentials from
    #[clap(long, short = 'p')]
    pub profile: Option<String>,

    /// Path to a TOML configuration file
    #[clap(long)]
    pub config: Option<PathBuf>,

    #[clap(long, short = 'o', value_enum, default_value_t = OutputFormat::Text)]
    pub output: OutputFormat,

    /// Enable debug logging
    #[clap(long, short)]
    pub verbose: bool,
}

impl Cli {
    /// The instance types to price, trimmed and de-duplicated in the given order.
    pub fn instance_types(&self) -> Result<Vec<String>, ConfigError> {
        let instance_types: Vec<String> = self
            .instance_types
            .as_deref()
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .unique()
            .map(str::to_string)
            .collect();

        if instance_types.is_empty() {
            return Err(ConfigError::MissingInstanceTypes);
        }
        Ok(instance_types)
    }

    /// Prefixes are kept as given, so `--exclude-regions ""` means no exclusions.
    pub fn exclude_prefixes(&self) -> Option<Vec<String>> {
        self.exclude_regions.as_deref().map(|raw| {
            raw.split(',')
                .map(|prefix| prefix.trim().to_string())
                .collect()
        })
    }

    pub fn config_overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            max_concurrent: self.max_concurrent,
            query_timeout_secs: self.timeout_secs,
            exclude_region_prefixes: self.exclude_prefixes(),
            aws_profile: self.profile.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("spotter").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn splits_instance_types() {
        let cli = parse(&["--instance-types", "t3.small, t3.micro,,t3.small"]);

        assert_eq!(cli.instance_types().unwrap(), vec!["t3.small", "t3.micro"]);
    }

    #[rstest]
    #[case::omitted(&[])]
    #[case::empty(&["--instance-types", ""])]
    #[case::only_commas(&["-i", " , ,"])]
    fn requires_instance_types(#[case] args: &[&str]) {
        let cli = parse(args);

        assert!(matches!(
            cli.instance_types(),
            Err(ConfigError::MissingInstanceTypes)
        ));
    }

    #[test]
    fn keeps_empty_exclusion_as_given() {
        assert_eq!(
            parse(&["-i", "t3.small", "-x", ""]).exclude_prefixes(),
            Some(vec![String::new()])
        );
        assert_eq!(
            parse(&["-i", "t3.small", "-x", "us-gov,cn-"]).exclude_prefixes(),
            Some(vec!["us-gov".to_string(), "cn-".to_string()])
        );
        assert_eq!(parse(&["-i", "t3.small"]).exclude_prefixes(), None);
    }

    #[test]
    fn collects_overrides() {
        let cli = parse(&["-i", "t3.small", "-c", "3", "-t", "9", "-p", "ops", "-o", "json", "-v"]);

        let overrides = cli.config_overrides();

        assert_eq!(overrides.max_concurrent, Some(3));
        assert_eq!(overrides.query_timeout_secs, Some(9));
        assert_eq!(overrides.aws_profile.as_deref(), Some("ops"));
        assert_eq!(cli.output, OutputFormat::Json);
        assert!(cli.verbose);
    }
}
