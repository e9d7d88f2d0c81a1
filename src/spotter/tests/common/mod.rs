#![allow(dead_code)]

use async_trait::async_trait;
use spotter::errors::{CatalogError, RegionQueryError};
use spotter::spot::{PriceQuery, Region, RegionCatalog, SpotPriceRecord, SpotPriceSource};
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;
use tokio::time::Instant;

pub struct StaticCatalog {
    pub regions: Vec<Region>,
}

impl StaticCatalog {
    pub fn new(ids: &[&str]) -> Self {
        Self {
            regions: ids
                .iter()
                .map(|id| Region::new(*id, format!("Region {id}")))
                .collect(),
        }
    }
}

#[async_trait]
impl RegionCatalog for StaticCatalog {
    async fn list_regions(&self) -> Result<Vec<Region>, CatalogError> {
        Ok(self.regions.clone())
    }
}

/// What a scripted region answers with.
pub enum Reply {
    Prices(Vec<(&'static str, &'static str, &'static str)>),
    Fail,
    Hang(Duration),
}

/// Answers per region from a script and records every region it was asked about.
pub struct ScriptedSource {
    replies: HashMap<String, Reply>,
    pub queried: Mutex<Vec<String>>,
}

impl ScriptedSource {
    pub fn new(replies: impl IntoIterator<Item = (&'static str, Reply)>) -> Self {
        Self {
            replies: replies
                .into_iter()
                .map(|(region, reply)| (region.to_string(), reply))
                .collect(),
            queried: Mutex::new(Vec::new()),
        }
    }

    pub fn queried(&self) -> Vec<String> {
        let mut queried = self.queried.lock().unwrap().clone();
        queried.sort();
        queried
    }
}

#[async_trait]
impl SpotPriceSource for ScriptedSource {
    async fn spot_prices(
        &self,
        query: &PriceQuery,
        _deadline: Instant,
    ) -> Result<Vec<SpotPriceRecord>, RegionQueryError> {
        self.queried.lock().unwrap().push(query.region.clone());

        match self.replies.get(&query.region) {
            Some(Reply::Prices(rows)) => Ok(rows
                .iter()
                .map(|(zone, instance_type, price)| SpotPriceRecord {
                    zone: zone.to_string(),
                    instance_type: instance_type.to_string(),
                    price: price.to_string(),
                })
                .collect()),
            Some(Reply::Hang(delay)) => {
                tokio::time::sleep(*delay).await;
                Ok(vec![])
            }
            Some(Reply::Fail) | None => Err(RegionQueryError::Network {
                region: query.region.clone(),
                message: "connection reset".to_string(),
            }),
        }
    }
}
