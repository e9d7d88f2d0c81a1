pub const DEFAULT_MAX_CONCURRENT: usize = 10;
pub const DEFAULT_QUERY_TIMEOUT_SECS: u64 = 5;

/// Spot prices are only ever requested for this product class.
pub const PRODUCT_DESCRIPTION: &str = "Linux/UNIX";
pub const INSTANCE_TYPE_FILTER: &str = "instance-type";

/// Region used to list the other regions.
pub const CATALOG_REGION: &str = "us-east-1";

pub const ENV_PREFIX: &str = "SPOTTER";
pub const LOG_FILE_NAME: &str = "spotter.log";
pub const AWS_SESSION_NAME: &str = "spotter-session";
