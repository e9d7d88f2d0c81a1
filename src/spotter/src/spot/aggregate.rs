use tracing::error;

use crate::spot::dispatch::{Dispatch, DispatchSummary};
use crate::spot::types::ResultSet;

pub struct Aggregator;

impl Aggregator {
    /// Drains the dispatch until its channel closes, which only happens after
    /// every region task finished, then sorts the combined prices.
    pub async fn collect(dispatch: Dispatch) -> (ResultSet, DispatchSummary) {
        let Dispatch {
            mut results,
            coordinator,
        } = dispatch;

        let mut result_set = ResultSet::default();
        while let Some(batch) = results.recv().await {
            tracing::debug!(region = %batch.region, points = batch.points.len(), "collected region batch");
            result_set.extend(batch.points);
        }

        let summary = coordinator.await.unwrap_or_else(|err| {
            error!(error = %err, "dispatch coordinator did not finish");
            DispatchSummary::default()
        });

        result_set.sort_by_price_desc();
        (result_set, summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spot::dispatch::RegionBatch;
    use crate::spot::types::PricePoint;
    use tokio::sync::mpsc;

    fn batch(region: &str, prices: &[f64]) -> RegionBatch {
        RegionBatch {
            region: region.to_string(),
            points: prices
                .iter()
                .map(|price| PricePoint {
                    zone: format!("{region}a"),
                    region: region.to_string(),
                    instance_type: "t3.small".to_string(),
                    price: *price,
                })
                .collect(),
        }
    }

    #[tokio::test]
    async fn merges_batches_in_price_order() {
        let (sender, results) = mpsc::channel(4);
        let coordinator = tokio::spawn(async move {
            sender.send(batch("us-east-1", &[0.015, 0.032])).await.unwrap();
            sender.send(batch("eu-west-1", &[0.02])).await.unwrap();
            DispatchSummary {
                succeeded: 2,
                ..Default::default()
            }
        });

        let (result_set, summary) = Aggregator::collect(Dispatch {
            results,
            coordinator,
        })
        .await;

        let prices: Vec<f64> = result_set.points().iter().map(|p| p.price).collect();
        assert_eq!(prices, vec![0.032, 0.02, 0.015]);
        assert_eq!(summary.succeeded, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn waits_for_every_sender_before_finishing() {
        let (sender, results) = mpsc::channel(4);
        let late = sender.clone();
        tokio::spawn(async move {
            tokio::time::sleep(std::time::Duration::from_secs(3)).await;
            late.send(batch("sa-east-1", &[1.5])).await.unwrap();
        });
        let coordinator = tokio::spawn(async move {
            sender.send(batch("us-east-1", &[0.1])).await.unwrap();
            DispatchSummary::default()
        });

        let (result_set, _) = Aggregator::collect(Dispatch {
            results,
            coordinator,
        })
        .await;

        assert_eq!(result_set.len(), 2);
        assert_eq!(result_set.points()[0].region, "sa-east-1");
    }
}
