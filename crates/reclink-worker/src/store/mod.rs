//! Job document store
//!
//! The store is the single source of truth for job state; the scheduler is
//! the only writer of `state` and never touches a job's `config`. Looking
//! up a state with no job in it is a normal idle signal, not an error.

use anyhow::Result;
use async_trait::async_trait;
use uuid::Uuid;

use reclink_common::{Job, JobState};

pub mod memory;
pub mod pg;

pub use memory::MemoryJobStore;
pub use pg::PgJobStore;

/// Document store contract for linkage jobs
#[async_trait]
pub trait JobStore: Send + Sync {
    /// Look up one job in the given state, oldest first; `None` when the
    /// state holds no job
    async fn get_one(&self, state: JobState) -> Result<Option<Job>>;

    /// Move a job to a new state
    async fn set_state(&self, job_id: Uuid, state: JobState) -> Result<()>;

    /// Append import identifiers to the job document (append-only)
    async fn append_identifiers(&self, job_id: Uuid, identifiers: &[String]) -> Result<()>;
}
