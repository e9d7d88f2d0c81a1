use std::error::Error as StdError;
use std::fmt;
use std::time::SystemTime;

use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_ec2 as ec2_client;
use aws_sdk_ec2::config::timeout::TimeoutConfig;
use aws_sdk_ec2::config::Region;
use aws_sdk_ec2::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_ec2::primitives::DateTime;
use aws_sdk_ec2::types::{Filter, SpotPrice};
use tokio::time::Instant;

use crate::cloud_providers::aws::aws_region::aws_region_name;
use crate::constants::INSTANCE_TYPE_FILTER;
use crate::errors::{CatalogError, RegionQueryError};
use crate::spot::source::{RegionCatalog, SpotPriceSource};
use crate::spot::types::{PriceQuery, Region as SpotRegion, SpotPriceRecord};

const UNAUTHORIZED_CODES: &[&str] = &[
    "AuthFailure",
    "UnauthorizedOperation",
    "OptInRequired",
    "InvalidClientTokenId",
    "ExpiredToken",
    "SignatureDoesNotMatch",
];
const THROTTLED_CODES: &[&str] = &["RequestLimitExceeded", "Throttling", "ThrottlingException"];

/// Reads spot price history, one regional EC2 client per query.
pub struct Ec2SpotPriceClient {
    sdk_config: SdkConfig,
}

impl Ec2SpotPriceClient {
    pub fn new(sdk_config: SdkConfig) -> Self {
        Self { sdk_config }
    }

    /// The operation timeout is whatever is left of the region's deadline.
    fn regional_client(&self, region: &str, deadline: Instant) -> ec2_client::Client {
        let remaining = deadline.saturating_duration_since(Instant::now());
        let conf = ec2_client::config::Builder::from(&self.sdk_config)
            .region(Region::new(region.to_string()))
            .timeout_config(TimeoutConfig::builder().operation_timeout(remaining).build())
            .build();
        ec2_client::Client::from_conf(conf)
    }
}

#[async_trait]
impl SpotPriceSource for Ec2SpotPriceClient {
    async fn spot_prices(
        &self,
        query: &PriceQuery,
        deadline: Instant,
    ) -> Result<Vec<SpotPriceRecord>, RegionQueryError> {
        let client = self.regional_client(&query.region, deadline);
        let instance_type_filter = Filter::builder()
            .name(INSTANCE_TYPE_FILTER)
            .set_values(Some(query.instance_types.clone()))
            .build();
        let start_time = DateTime::from(SystemTime::from(query.start_time));

        let mut records = Vec::new();
        let mut next_token: Option<String> = None;
        loop {
            let response = client
                .describe_spot_price_history()
                .filters(instance_type_filter.clone())
                .product_descriptions(&query.product_description)
                .start_time(start_time)
                .set_next_token(next_token.take())
                .send()
                .await
                .map_err(|err| classify_sdk_error(&query.region, err))?;

            records.extend(response.spot_price_history().iter().map(SpotPriceRecord::from));
            tracing::trace!(region = %query.region, rows = records.len(), "read spot price page");

            next_token = response
                .next_token()
                .filter(|token| !token.is_empty())
                .map(str::to_string);
            if next_token.is_none() {
                break;
            }
        }

        Ok(records)
    }
}

impl From<&SpotPrice> for SpotPriceRecord {
    fn from(price: &SpotPrice) -> Self {
        Self {
            zone: price.availability_zone().unwrap_or_default().to_string(),
            instance_type: price
                .instance_type()
                .map(|instance_type| instance_type.as_str().to_string())
                .unwrap_or_default(),
            price: price.spot_price().unwrap_or_default().to_string(),
        }
    }
}

fn classify_sdk_error<E, R>(region: &str, err: SdkError<E, R>) -> RegionQueryError
where
    E: ProvideErrorMetadata + StdError + 'static,
    R: fmt::Debug,
{
    let message = DisplayErrorContext(&err).to_string();
    match &err {
        SdkError::TimeoutError(_) => RegionQueryError::Timeout {
            region: region.to_string(),
        },
        SdkError::DispatchFailure(_) | SdkError::ResponseError(_) => RegionQueryError::Network {
            region: region.to_string(),
            message,
        },
        _ => classify_error_code(region, err.code(), message),
    }
}

fn classify_error_code(region: &str, code: Option<&str>, message: String) -> RegionQueryError {
    let region = region.to_string();
    match code {
        Some(code) if UNAUTHORIZED_CODES.contains(&code) => {
            RegionQueryError::Unauthorized { region, message }
        }
        Some(code) if THROTTLED_CODES.contains(&code) => {
            RegionQueryError::Throttled { region, message }
        }
        _ => RegionQueryError::Service { region, message },
    }
}

/// Lists the regions enabled for the account.
pub struct Ec2RegionCatalog {
    client: ec2_client::Client,
}

impl Ec2RegionCatalog {
    pub fn new(sdk_config: &SdkConfig) -> Self {
        Self {
            client: ec2_client::Client::new(sdk_config),
        }
    }
}

#[async_trait]
impl RegionCatalog for Ec2RegionCatalog {
    async fn list_regions(&self) -> Result<Vec<SpotRegion>, CatalogError> {
        let response = self
            .client
            .describe_regions()
            .send()
            .await
            .map_err(|err| CatalogError::Unavailable(DisplayErrorContext(&err).to_string()))?;

        let mut regions: Vec<SpotRegion> = response
            .regions()
            .iter()
            .filter_map(|region| region.region_name())
            .map(|code| SpotRegion::new(code, aws_region_name(code).unwrap_or(code)))
            .collect();
        regions.sort_by(|left, right| left.id.cmp(&right.id));

        tracing::debug!(count = regions.len(), "listed EC2 regions");
        Ok(regions)
    }
}
