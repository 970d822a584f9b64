//! Bounded worker pool that drains the job channel.

use std::sync::Arc;

use serde_json::Value;
use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinSet;
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::client::JobQueueClient;

/// Sizing of the worker pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkerPoolConfig {
    /// Maximum number of jobs executing at once.
    pub concurrency: usize,
    /// Number of jobs that may wait for a free worker.
    pub queue_capacity: usize,
}

impl Default for WorkerPoolConfig {
    fn default() -> Self {
        Self {
            concurrency: 4,
            queue_capacity: 64,
        }
    }
}

impl WorkerPoolConfig {
    /// Zero sizes are bumped to one; a pool with no slots would never run anything.
    pub(crate) fn normalized(self) -> Self {
        Self {
            concurrency: self.concurrency.max(1),
            queue_capacity: self.queue_capacity.max(1),
        }
    }
}

/// A job waiting on the channel.
#[derive(Debug)]
pub(crate) struct QueuedJob {
    pub run_id: Uuid,
    pub job_type: String,
    pub payload: Value,
}

/// Pull jobs off `rx` and run at most `concurrency` of them at a time.
///
/// Returns once the channel is closed and every spawned job has finished.
pub(crate) async fn dispatch(
    client: JobQueueClient,
    mut rx: mpsc::Receiver<QueuedJob>,
    concurrency: usize,
) {
    let permits = Arc::new(Semaphore::new(concurrency));
    let mut running = JoinSet::new();

    // A permit is held before receiving, so waiting jobs stay in the channel
    // and the queue depth is exactly its capacity.
    loop {
        let Ok(permit) = permits.clone().acquire_owned().await else {
            break;
        };
        let Some(job) = rx.recv().await else {
            break;
        };
        let client = client.clone();
        running.spawn(async move {
            let _permit = permit;
            client.execute_queued(job).await;
        });

        while let Some(res) = running.try_join_next() {
            if let Err(e) = res {
                error!(error = %e, "job task aborted");
            }
        }
    }

    debug!(in_flight = running.len(), "job channel closed, draining");
    while let Some(res) = running.join_next().await {
        if let Err(e) = res {
            error!(error = %e, "job task aborted");
        }
    }
    info!("job worker pool stopped");
}
