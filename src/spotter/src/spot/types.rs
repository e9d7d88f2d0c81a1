use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::errors::MalformedPriceError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
    pub id: String,
    pub description: String,
}

impl Region {
    pub fn new(id: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            description: description.into(),
        }
    }
}

/// Region metadata for the current run, keyed by region id. Built once after
/// the catalog fetch and only read afterwards.
#[derive(Debug, Clone, Default)]
pub struct RegionDirectory {
    regions: HashMap<String, Region>,
}

impl RegionDirectory {
    pub fn from_regions<'a>(regions: impl IntoIterator<Item = &'a Region>) -> Self {
        Self {
            regions: regions
                .into_iter()
                .map(|region| (region.id.clone(), region.clone()))
                .collect(),
        }
    }

    pub fn get(&self, id: &str) -> Option<&Region> {
        self.regions.get(id)
    }

    /// Falls back to the id itself for regions missing from the directory.
    pub fn description<'a>(&'a self, id: &'a str) -> &'a str {
        self.get(id)
            .map(|region| region.description.as_str())
            .unwrap_or(id)
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }
}

/// Spot price history request for one region.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceQuery {
    pub region: String,
    pub instance_types: Vec<String>,
    pub product_description: String,
    /// History starts from this instant, so only current prices come back.
    pub start_time: DateTime<Utc>,
}

/// One row of spot price history as the provider returns it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpotPriceRecord {
    pub zone: String,
    pub instance_type: String,
    pub price: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PricePoint {
    pub zone: String,
    pub region: String,
    pub instance_type: String,
    pub price: f64,
}

impl PricePoint {
    pub fn from_record(
        region: &str,
        record: SpotPriceRecord,
    ) -> Result<Self, MalformedPriceError> {
        let price = match record.price.trim().parse::<f64>() {
            Ok(price) if price.is_finite() && price >= 0.0 => price,
            _ => {
                return Err(MalformedPriceError {
                    zone: record.zone,
                    instance_type: record.instance_type,
                    value: record.price,
                })
            }
        };

        Ok(Self {
            zone: record.zone,
            region: region.to_string(),
            instance_type: record.instance_type,
            price,
        })
    }
}

/// Price points gathered from every region that answered.
#[derive(Debug, Clone, Default)]
pub struct ResultSet {
    points: Vec<PricePoint>,
}

impl ResultSet {
    pub fn extend(&mut self, batch: impl IntoIterator<Item = PricePoint>) {
        self.points.extend(batch);
    }

    /// Highest price first. Equal prices keep no particular order.
    pub fn sort_by_price_desc(&mut self) {
        self.points
            .sort_unstable_by(|left, right| right.price.total_cmp(&left.price));
    }

    pub fn points(&self) -> &[PricePoint] {
        &self.points
    }

    pub fn into_points(self) -> Vec<PricePoint> {
        self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}
