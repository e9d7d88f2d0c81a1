//! Fan-out of one spot price query per region.
//!
//! Every region gets its own task. A task waits for a slot on a shared
//! semaphore, runs its query against a deadline taken when it starts running,
//! and hands a batch to the result channel only if the query succeeded. The
//! coordinator joins every task before dropping the last sender, so the
//! channel closes exactly once and only after all regions are settled.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, Semaphore};
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::{timeout_at, Instant};
use tracing::{debug, error, warn};

use crate::errors::{ConfigError, RegionQueryError};
use crate::spot::source::SpotPriceSource;
use crate::spot::types::{PricePoint, PriceQuery, SpotPriceRecord};

/// Lifecycle of one region's task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegionTaskState {
    Pending,
    Queued,
    Running,
    Succeeded,
    Failed,
    TimedOut,
}

/// Price points of one region that answered.
#[derive(Debug, Clone)]
pub struct RegionBatch {
    pub region: String,
    pub points: Vec<PricePoint>,
}

/// How the region tasks of a run ended.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchSummary {
    pub succeeded: usize,
    pub failed: usize,
    pub timed_out: usize,
}

impl DispatchSummary {
    fn record(&mut self, state: RegionTaskState) {
        match state {
            RegionTaskState::Succeeded => self.succeeded += 1,
            RegionTaskState::TimedOut => self.timed_out += 1,
            // a task only returns a terminal state; anything else is a bug in the task
            RegionTaskState::Failed
            | RegionTaskState::Pending
            | RegionTaskState::Queued
            | RegionTaskState::Running => self.failed += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.succeeded + self.failed + self.timed_out
    }
}

/// An in-progress dispatch. `results` yields batches until every task is done.
pub struct Dispatch {
    pub results: mpsc::Receiver<RegionBatch>,
    pub coordinator: JoinHandle<DispatchSummary>,
}

/// Rejects a concurrency cap the semaphore cannot hold and a timeout that
/// cannot be turned into a deadline.
pub fn check_limits(max_concurrent: usize, query_timeout: Duration) -> Result<(), ConfigError> {
    if max_concurrent == 0 || max_concurrent > Semaphore::MAX_PERMITS {
        return Err(ConfigError::InvalidConcurrency(max_concurrent));
    }
    if query_timeout.is_zero() || Instant::now().checked_add(query_timeout).is_none() {
        return Err(ConfigError::InvalidTimeout(query_timeout));
    }
    Ok(())
}

pub struct DispatchEngine<S: ?Sized> {
    source: Arc<S>,
    max_concurrent: usize,
    query_timeout: Duration,
}

impl<S> DispatchEngine<S>
where
    S: SpotPriceSource + ?Sized + 'static,
{
    pub fn new(
        source: Arc<S>,
        max_concurrent: usize,
        query_timeout: Duration,
    ) -> Result<Self, ConfigError> {
        check_limits(max_concurrent, query_timeout)?;

        Ok(Self {
            source,
            max_concurrent,
            query_timeout,
        })
    }

    /// Spawns one task per query. Must be called from within a tokio runtime.
    pub fn dispatch(&self, queries: Vec<PriceQuery>) -> Dispatch {
        // each task sends at most one batch, so sends never wait on the reader
        let (sender, results) = mpsc::channel(queries.len().max(1));
        let semaphore = Arc::new(Semaphore::new(self.max_concurrent));
        let mut tasks = JoinSet::new();

        debug!(
            regions = queries.len(),
            max_concurrent = self.max_concurrent,
            timeout = ?self.query_timeout,
            "dispatching spot price queries"
        );

        for query in queries {
            debug!(region = %query.region, state = ?RegionTaskState::Pending);
            tasks.spawn(run_region_task(
                Arc::clone(&self.source),
                Arc::clone(&semaphore),
                sender.clone(),
                query,
                self.query_timeout,
            ));
        }

        let coordinator = tokio::spawn(async move {
            let mut summary = DispatchSummary::default();
            while let Some(joined) = tasks.join_next().await {
                match joined {
                    Ok(state) => summary.record(state),
                    Err(err) => {
                        error!(error = %err, "region task did not finish");
                        summary.record(RegionTaskState::Failed);
                    }
                }
            }
            // every task is done; closing the channel lets the reader finish
            drop(sender);
            debug!(?summary, "all region queries finished");
            summary
        });

        Dispatch {
            results,
            coordinator,
        }
    }
}

async fn run_region_task<S>(
    source: Arc<S>,
    semaphore: Arc<Semaphore>,
    sender: mpsc::Sender<RegionBatch>,
    query: PriceQuery,
    query_timeout: Duration,
) -> RegionTaskState
where
    S: SpotPriceSource + ?Sized,
{
    let region = query.region.clone();

    debug!(%region, state = ?RegionTaskState::Queued);
    // the permit is released when this function returns or unwinds
    let Ok(_permit) = semaphore.acquire_owned().await else {
        error!(%region, "query slots closed before the region could run");
        return RegionTaskState::Failed;
    };

    let Some(deadline) = Instant::now().checked_add(query_timeout) else {
        error!(%region, timeout = ?query_timeout, "query timeout does not fit a deadline");
        return RegionTaskState::Failed;
    };
    debug!(%region, state = ?RegionTaskState::Running);

    let outcome = match timeout_at(deadline, source.spot_prices(&query, deadline)).await {
        Ok(outcome) => outcome,
        Err(_elapsed) => Err(RegionQueryError::Timeout {
            region: region.clone(),
        }),
    };

    match outcome {
        Ok(records) => {
            let points = price_points(&region, records);
            debug!(%region, points = points.len(), state = ?RegionTaskState::Succeeded);
            if sender.send(RegionBatch { region: region.clone(), points }).await.is_err() {
                warn!(%region, "result channel closed, dropping region batch");
            }
            RegionTaskState::Succeeded
        }
        Err(err @ RegionQueryError::Timeout { .. }) => {
            warn!(%region, timeout = ?query_timeout, error = %err, "region query timed out");
            RegionTaskState::TimedOut
        }
        Err(err) => {
            warn!(%region, error = %err, "region query failed");
            RegionTaskState::Failed
        }
    }
}

/// Keeps every parseable row; a malformed price only costs its own row.
fn price_points(region: &str, records: Vec<SpotPriceRecord>) -> Vec<PricePoint> {
    records
        .into_iter()
        .filter_map(|record| match PricePoint::from_record(region, record) {
            Ok(point) => Some(point),
            Err(err) => {
                warn!(region, error = %err, "skipping spot price");
                None
            }
        })
        .collect()
}
