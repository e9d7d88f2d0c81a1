//! Seams to the cloud provider. The AWS implementations live in
//! `cloud_providers::aws`; tests substitute their own.

use async_trait::async_trait;
use tokio::time::Instant;

use crate::errors::{CatalogError, RegionQueryError};
use crate::spot::types::{PriceQuery, Region, SpotPriceRecord};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RegionCatalog: Send + Sync {
    /// Every candidate region, called once per run.
    async fn list_regions(&self) -> Result<Vec<Region>, CatalogError>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SpotPriceSource: Send + Sync {
    /// Runs one spot price history query. Implementations should give up by
    /// `deadline`; the dispatcher cancels the call there regardless.
    async fn spot_prices(
        &self,
        query: &PriceQuery,
        deadline: Instant,
    ) -> Result<Vec<SpotPriceRecord>, RegionQueryError>;
}
