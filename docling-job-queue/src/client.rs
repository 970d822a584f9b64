//! Job queue client implementation.

use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::JobQueueError;
use crate::executor::JobExecutor;
use crate::types::{EnqueueResult, JobRequest, JobRun, JobStatus};
use crate::worker::{self, QueuedJob, WorkerPoolConfig};

/// Maximum number of job runs to keep in memory.
const MAX_JOB_RUNS: usize = 1000;

/// Internal storage optimized for both iteration and lookup by ID.
#[derive(Debug, Default)]
struct JobQueueState {
    /// Ordered list of job run IDs (oldest first).
    order: VecDeque<Uuid>,
    /// Map from ID to job run for O(1) lookup.
    runs: HashMap<Uuid, JobRun>,
}

impl JobQueueState {
    /// Insert a new job run, maintaining the size limit.
    fn insert(&mut self, run: JobRun) {
        let id = run.id;
        self.runs.insert(id, run);
        self.order.push_back(id);

        while self.order.len() > MAX_JOB_RUNS {
            if let Some(old_id) = self.order.pop_front() {
                self.runs.remove(&old_id);
            }
        }
    }

    fn remove(&mut self, id: &Uuid) -> Option<JobRun> {
        let run = self.runs.remove(id)?;
        self.order.retain(|other| other != id);
        Some(run)
    }

    #[inline]
    fn get(&self, id: &Uuid) -> Option<&JobRun> {
        self.runs.get(id)
    }

    #[inline]
    fn get_mut(&mut self, id: &Uuid) -> Option<&mut JobRun> {
        self.runs.get_mut(id)
    }

    /// Iterate over all runs in reverse order (most recent first).
    fn iter_recent(&self) -> impl Iterator<Item = &JobRun> {
        self.order.iter().rev().filter_map(|id| self.runs.get(id))
    }

    /// Count runs, optionally filtered by key.
    fn count(&self, key: Option<&str>) -> usize {
        match key {
            Some(key) => self
                .runs
                .values()
                .filter(|r| r.key.as_deref() == Some(key))
                .count(),
            None => self.runs.len(),
        }
    }

    fn clear(&mut self) {
        self.order.clear();
        self.runs.clear();
    }
}

/// Interface for enqueuing jobs and tracking their execution.
///
/// Cloning is cheap; all clones share the same registry and worker pool.
#[derive(Clone)]
pub struct JobQueueClient {
    state: Arc<RwLock<JobQueueState>>,
    executors: Arc<RwLock<HashMap<String, Arc<dyn JobExecutor>>>>,
    sender: Arc<RwLock<Option<mpsc::Sender<QueuedJob>>>>,
    started: Arc<AtomicBool>,
}

impl fmt::Debug for JobQueueClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JobQueueClient")
            .field("state", &"<RwLock<JobQueueState>>")
            .field(
                "executors",
                &"<RwLock<HashMap<String, Arc<dyn JobExecutor>>>>",
            )
            .field("started", &self.started.load(Ordering::Relaxed))
            .finish()
    }
}

impl Default for JobQueueClient {
    fn default() -> Self {
        Self::new()
    }
}

impl JobQueueClient {
    /// Create an empty queue. Nothing runs until [`start`](Self::start) is called.
    pub fn new() -> Self {
        Self {
            state: Arc::new(RwLock::new(JobQueueState::default())),
            executors: Arc::new(RwLock::new(HashMap::new())),
            sender: Arc::new(RwLock::new(None)),
            started: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Register a job executor for a specific job type.
    pub async fn register_executor<E: JobExecutor + 'static>(&self, executor: E) {
        let job_type = executor.job_type().to_owned();
        let mut executors = self.executors.write().await;
        executors.insert(job_type, Arc::new(executor));
    }

    /// Spawn the worker pool. The returned handle resolves once the pool has
    /// been shut down and every in-flight job has finished.
    pub async fn start(&self, config: WorkerPoolConfig) -> Result<JoinHandle<()>, JobQueueError> {
        if self.started.swap(true, Ordering::SeqCst) {
            return Err(JobQueueError::AlreadyStarted);
        }
        let config = config.normalized();
        let (tx, rx) = mpsc::channel(config.queue_capacity);
        *self.sender.write().await = Some(tx);

        info!(
            concurrency = config.concurrency,
            queue_capacity = config.queue_capacity,
            "job worker pool started"
        );
        Ok(tokio::spawn(worker::dispatch(
            self.clone(),
            rx,
            config.concurrency,
        )))
    }

    /// Stop accepting jobs. Already queued and running jobs still complete.
    pub async fn shutdown(&self) {
        if self.sender.write().await.take().is_some() {
            info!("job queue closed to new work");
        }
    }

    /// Enqueue a job for asynchronous processing.
    ///
    /// Fails fast with [`JobQueueError::Saturated`] when the queue is full
    /// rather than waiting for room.
    pub async fn enqueue(&self, request: JobRequest) -> Result<EnqueueResult, JobQueueError> {
        if !self.executors.read().await.contains_key(&request.job_type) {
            return Err(JobQueueError::UnknownJobType(request.job_type));
        }
        let sender = self
            .sender
            .read()
            .await
            .clone()
            .ok_or(JobQueueError::Unavailable)?;

        if let Some(key) = request.key.as_deref() {
            let active = self.active_runs_for(key).await;
            if active > 0 {
                warn!(
                    key,
                    active, "job enqueued while another run for the same key is active"
                );
            }
        }

        let job_id = Uuid::new_v4();
        let run = JobRun::with_id(
            job_id,
            &request.job_type,
            request.key.clone(),
            Some(request.payload.clone()),
        );
        // Recorded before sending so the worker always finds the run.
        self.state.write().await.insert(run);

        let job = QueuedJob {
            run_id: job_id,
            job_type: request.job_type,
            payload: request.payload,
        };
        match sender.try_send(job) {
            Ok(()) => {
                debug!(%job_id, "job enqueued");
                Ok(EnqueueResult { job_id })
            }
            Err(TrySendError::Full(_)) => {
                self.state.write().await.remove(&job_id);
                Err(JobQueueError::Saturated)
            }
            Err(TrySendError::Closed(_)) => {
                self.state.write().await.remove(&job_id);
                Err(JobQueueError::Unavailable)
            }
        }
    }

    /// Run a job that was taken off the channel by the worker pool.
    pub(crate) async fn execute_queued(&self, job: QueuedJob) {
        let QueuedJob {
            run_id,
            job_type,
            payload,
        } = job;

        let executor = {
            let executors = self.executors.read().await;
            executors.get(&job_type).cloned()
        };

        self.update_run_status(run_id, JobStatus::Running, None).await;
        debug!(%run_id, job_type, "job started");

        let result = match executor {
            // A separate task so a panicking executor still yields a failed run.
            Some(executor) => match tokio::spawn(async move { executor.execute(payload).await })
                .await
            {
                Ok(result) => result,
                Err(e) => Err(JobQueueError::ExecutionFailed(format!("job panicked: {e}"))),
            },
            None => Err(JobQueueError::UnknownJobType(job_type.clone())),
        };

        match result {
            Ok(()) => {
                self.update_run_status(run_id, JobStatus::Completed, None).await;
                debug!(%run_id, job_type, "job completed");
            }
            Err(e) => {
                let message = match e {
                    JobQueueError::ExecutionFailed(message) => message,
                    other => other.to_string(),
                };
                debug!(%run_id, job_type, error = %message, "job failed");
                self.update_run_status(run_id, JobStatus::Failed, Some(message)).await;
            }
        }
    }

    /// List job runs, most recent first, optionally filtered by key.
    pub async fn list_runs(&self, key: Option<&str>, limit: usize, offset: usize) -> Vec<JobRun> {
        let state = self.state.read().await;

        let iter = state.iter_recent();

        match key {
            Some(key) => iter
                .filter(|r| r.key.as_deref() == Some(key))
                .skip(offset)
                .take(limit)
                .cloned()
                .collect(),
            None => iter.skip(offset).take(limit).cloned().collect(),
        }
    }

    /// Get total count of job runs, optionally filtered by key.
    pub async fn count_runs(&self, key: Option<&str>) -> usize {
        let state = self.state.read().await;
        state.count(key)
    }

    /// Number of pending or running jobs for `key`.
    pub async fn active_runs_for(&self, key: &str) -> usize {
        let state = self.state.read().await;
        state
            .runs
            .values()
            .filter(|r| r.key.as_deref() == Some(key) && r.status.is_active())
            .count()
    }

    /// Clear all job runs.
    pub async fn clear_runs(&self) {
        let mut state = self.state.write().await;
        state.clear();
    }

    /// Get a specific job run by ID.
    pub async fn get_run(&self, id: Uuid) -> Option<JobRun> {
        let state = self.state.read().await;
        state.get(&id).cloned()
    }

    /// Update the status of a job run.
    pub async fn update_run_status(
        &self,
        id: Uuid,
        status: JobStatus,
        error_message: Option<String>,
    ) -> Option<JobRun> {
        let mut state = self.state.write().await;
        let run = state.get_mut(&id)?;
        match status {
            JobStatus::Running => run.start(),
            JobStatus::Completed => run.complete(),
            JobStatus::Failed => run.fail(error_message.unwrap_or_default()),
            JobStatus::Pending => run.status = JobStatus::Pending,
        }
        Some(run.clone())
    }
}
