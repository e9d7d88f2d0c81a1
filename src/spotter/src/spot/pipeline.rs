use std::sync::Arc;
use std::time::Duration;

use typed_builder::TypedBuilder;

use crate::constants::{DEFAULT_MAX_CONCURRENT, DEFAULT_QUERY_TIMEOUT_SECS, PRODUCT_DESCRIPTION};
use crate::errors::{ConfigError, RunError};
use crate::spot::aggregate::Aggregator;
use crate::spot::dispatch::{DispatchEngine, DispatchSummary};
use crate::spot::filter::filter_regions;
use crate::spot::query::build_queries;
use crate::spot::source::{RegionCatalog, SpotPriceSource};
use crate::spot::types::{RegionDirectory, ResultSet};

/// What to price and how to fan out.
#[derive(Debug, Clone, TypedBuilder)]
pub struct SpotPriceRequest {
    pub instance_types: Vec<String>,
    #[builder(default)]
    pub exclude_prefixes: Vec<String>,
    #[builder(default = PRODUCT_DESCRIPTION.to_string(), setter(into))]
    pub product_description: String,
    #[builder(default = DEFAULT_MAX_CONCURRENT)]
    pub max_concurrent: usize,
    #[builder(default = Duration::from_secs(DEFAULT_QUERY_TIMEOUT_SECS))]
    pub query_timeout: Duration,
}

pub struct SpotPriceReport {
    pub results: ResultSet,
    /// Regions that were queried, for labelling the results.
    pub regions: RegionDirectory,
    pub summary: DispatchSummary,
}

/// Lists regions, drops the excluded ones, queries the rest and returns the
/// merged prices, highest first. Only configuration and catalog failures end
/// the run; a region that fails simply has no prices in the report.
pub async fn collect_spot_prices<C, S>(
    catalog: &C,
    source: Arc<S>,
    request: &SpotPriceRequest,
) -> Result<SpotPriceReport, RunError>
where
    C: RegionCatalog + ?Sized,
    S: SpotPriceSource + ?Sized + 'static,
{
    if request.instance_types.is_empty() {
        return Err(ConfigError::MissingInstanceTypes.into());
    }
    let engine = DispatchEngine::new(source, request.max_concurrent, request.query_timeout)?;

    tracing::debug!(instance_types = ?request.instance_types, "pricing instance types");

    let all_regions = catalog.list_regions().await?;
    tracing::debug!(count = all_regions.len(), "regions in catalog");

    let regions = filter_regions(all_regions, &request.exclude_prefixes);
    tracing::info!(count = regions.len(), "querying regions");

    let queries = build_queries(&regions, &request.instance_types, &request.product_description);
    let (results, summary) = Aggregator::collect(engine.dispatch(queries)).await;

    tracing::info!(
        points = results.len(),
        succeeded = summary.succeeded,
        failed = summary.failed,
        timed_out = summary.timed_out,
        "spot price collection finished"
    );

    Ok(SpotPriceReport {
        results,
        regions: RegionDirectory::from_regions(&regions),
        summary,
    })
}
