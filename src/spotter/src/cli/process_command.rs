use std::io;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::{CommandFactory, Parser};
use colored::Colorize;

use super::commands::{Cli, OutputFormat};
use crate::cloud_providers::aws::{
    resolve_available_aws_config, Ec2RegionCatalog, Ec2SpotPriceClient,
};
use crate::config::{Config, ConfigLoader};
use crate::errors::CatalogError;
use crate::logging::setup_logging;
use crate::spot::report::Reporter;
use crate::spot::{collect_spot_prices, SpotPriceRequest};
use crate::{error_message, warning_message};

/// Process the command line. Every failure exits with status 1, and nothing
/// is sent to AWS unless the instance types and configuration are valid.
pub fn process_command() -> ExitCode {
    let cli = Cli::parse();

    let instance_types = match cli.instance_types() {
        Ok(instance_types) => instance_types,
        Err(err) => {
            error_message!("{}", err);
            eprintln!("{}", Cli::command().render_usage());
            return ExitCode::FAILURE;
        }
    };

    let config = match ConfigLoader::load(cli.config.as_deref(), &cli.config_overrides()) {
        Ok(config) => config,
        Err(err) => {
            error_message!("{:#}", anyhow::Error::from(err));
            return ExitCode::FAILURE;
        }
    };

    if let Err(err) = start_logging(cli.verbose, &config) {
        error_message!("{:#}", err);
        return ExitCode::FAILURE;
    }

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(runtime) => runtime,
        Err(err) => {
            error_message!("Failed to start async runtime: {}", err);
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(run(&cli, config, instance_types)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error_message!("{:#}", err);
            ExitCode::FAILURE
        }
    }
}

/// Installs the subscriber first; events emitted before it exists are lost.
fn start_logging(verbose: bool, config: &Config) -> anyhow::Result<()> {
    setup_logging(verbose, config.log_dir.as_deref())?;
    tracing::debug!(?config, "loaded configuration");
    Ok(())
}

async fn run(cli: &Cli, config: Config, instance_types: Vec<String>) -> anyhow::Result<()> {
    let request = SpotPriceRequest::builder()
        .instance_types(instance_types)
        .exclude_prefixes(config.exclude_region_prefixes.clone())
        .product_description(config.product_description.clone())
        .max_concurrent(config.max_concurrent)
        .query_timeout(config.query_timeout())
        .build();

    let sdk_config =
        resolve_available_aws_config(config.aws_init_type.clone(), &config.catalog_region)
            .await
            .ok_or_else(|| CatalogError::CredentialsUnavailable {
                region: config.catalog_region.clone(),
            })?;

    let catalog = Ec2RegionCatalog::new(&sdk_config);
    let source = Arc::new(Ec2SpotPriceClient::new(sdk_config));

    let report = collect_spot_prices(&catalog, source, &request).await?;

    if report.regions.is_empty() {
        warning_message!("No regions left to query after applying the exclusions");
    } else if report.results.is_empty() {
        warning_message!(
            "No spot prices found for {} in {} region(s)",
            request.instance_types.join(","),
            report.regions.len()
        );
    }

    let reporter = Reporter::new(&report.regions);
    let mut out = io::stdout().lock();
    match cli.output {
        OutputFormat::Text => reporter.write_text(&mut out, report.results.points()),
        OutputFormat::Json => reporter.write_json(&mut out, report.results.points()),
    }
    .context("Failed to write report")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::LOG_FILE_NAME;
    use serial_test::serial;

    #[test]
    #[serial]
    fn loaded_configuration_reaches_the_log() {
        std::env::remove_var("RUST_LOG");
        let dir = tempfile::tempdir().unwrap();
        let mut config = ConfigLoader::load_default_config().unwrap();
        config.log_dir = Some(dir.path().to_string_lossy().into_owned());

        start_logging(true, &config).unwrap();

        let logged = std::fs::read_to_string(dir.path().join(LOG_FILE_NAME)).unwrap();
        assert!(logged.contains("loaded configuration"));
        assert!(logged.contains("product_description"));
    }
}
