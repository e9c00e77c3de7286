//! Job scheduler
//!
//! Single-worker scan loop over the job store. Each pass claims at most
//! one job, runs its stage to completion and restarts the scan from the
//! top, so import work is always re-checked before validation work. With
//! nothing to do the loop sleeps for a fixed interval.
//!
//! Errors from a stage are not absorbed: they propagate out of `run` and
//! the process is expected to exit and be restarted by its supervisor.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tokio::time::sleep;
use tracing::{debug, info};

use reclink_common::{Job, JobState};

use crate::import::{run_import, ImportClient};
use crate::queue::QueueDriver;
use crate::store::JobStore;
use crate::validate::run_validation;

/// Scan priority: import work first, then validation, pending states after
/// their in-flight counterparts
const SCAN_ORDER: [JobState; 4] = [
    JobState::ProcessingImport,
    JobState::PendingImport,
    JobState::ProcessingValidation,
    JobState::PendingValidation,
];

/// The worker's top-level control loop
pub struct Scheduler {
    store: Arc<dyn JobStore>,
    queue: Arc<dyn QueueDriver>,
    import_client: Arc<dyn ImportClient>,
    idle_delay: Duration,
    import_retry_delay: Duration,
}

impl Scheduler {
    pub fn new(
        store: Arc<dyn JobStore>,
        queue: Arc<dyn QueueDriver>,
        import_client: Arc<dyn ImportClient>,
        idle_delay: Duration,
        import_retry_delay: Duration,
    ) -> Self {
        Self {
            store,
            queue,
            import_client,
            idle_delay,
            import_retry_delay,
        }
    }

    /// Scan forever, sleeping through idle passes
    pub async fn run(&self) -> Result<()> {
        info!("record linkage worker started");

        loop {
            if !self.scan_once().await? {
                sleep(self.idle_delay).await;
            }
        }
    }

    /// One scan pass: process at most one job, highest-priority state
    /// first; `true` when a job was processed
    pub async fn scan_once(&self) -> Result<bool> {
        for state in SCAN_ORDER {
            let Some(job) = self.store.get_one(state).await? else {
                debug!(state = %state, "no job in state");
                continue;
            };

            self.dispatch(job).await?;
            return Ok(true);
        }

        Ok(false)
    }

    async fn dispatch(&self, job: Job) -> Result<()> {
        match job.state {
            JobState::ProcessingImport | JobState::PendingImport => {
                info!(job_id = %job.job_id, state = %job.state, "running import stage");
                run_import(
                    job.job_id,
                    &job.config.import_profile_id,
                    self.store.as_ref(),
                    self.queue.as_ref(),
                    self.import_client.as_ref(),
                    self.import_retry_delay,
                )
                .await
            },
            JobState::ProcessingValidation | JobState::PendingValidation => {
                info!(job_id = %job.job_id, state = %job.state, "running validation stage");
                run_validation(&job, self.store.as_ref(), self.queue.as_ref()).await
            },
            // Terminal states are never scanned
            JobState::PendingExternal | JobState::Done => Ok(()),
        }
    }
}
