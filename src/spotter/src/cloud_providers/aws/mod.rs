pub mod aws_region;
pub mod config;
pub mod ec2;

pub use config::{resolve_available_aws_config, AwsConfig};
pub use ec2::{Ec2RegionCatalog, Ec2SpotPriceClient};
