//! Spot price collection: region filtering, query building, the bounded
//! fan-out over regions, and the merged, price-sorted result.

pub mod aggregate;
pub mod dispatch;
pub mod filter;
pub mod pipeline;
pub mod query;
pub mod report;
pub mod source;
pub mod types;

pub use pipeline::{collect_spot_prices, SpotPriceReport, SpotPriceRequest};
pub use source::{RegionCatalog, SpotPriceSource};
pub use types::{PricePoint, PriceQuery, Region, RegionDirectory, ResultSet, SpotPriceRecord};
