//! In-memory job store for tests

use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Mutex;
use uuid::Uuid;

use reclink_common::{Job, JobState};

use super::JobStore;

/// Mutex-backed job store for tests
#[derive(Debug, Default)]
pub struct MemoryJobStore {
    jobs: Mutex<HashMap<Uuid, Job>>,
}

impl MemoryJobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store with a job
    pub fn insert(&self, job: Job) {
        self.jobs
            .lock()
            .expect("memory job store lock poisoned")
            .insert(job.job_id, job);
    }

    /// Current snapshot of a job
    pub fn get(&self, job_id: Uuid) -> Option<Job> {
        self.jobs
            .lock()
            .expect("memory job store lock poisoned")
            .get(&job_id)
            .cloned()
    }
}

#[async_trait]
impl JobStore for MemoryJobStore {
    async fn get_one(&self, state: JobState) -> Result<Option<Job>> {
        let jobs = self.jobs.lock().expect("memory job store lock poisoned");
        let mut candidates: Vec<&Job> = jobs.values().filter(|j| j.state == state).collect();
        candidates.sort_by_key(|j| j.created_at);
        Ok(candidates.first().map(|j| (*j).clone()))
    }

    async fn set_state(&self, job_id: Uuid, state: JobState) -> Result<()> {
        let mut jobs = self.jobs.lock().expect("memory job store lock poisoned");
        if let Some(job) = jobs.get_mut(&job_id) {
            job.state = state;
            job.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn append_identifiers(&self, job_id: Uuid, identifiers: &[String]) -> Result<()> {
        let mut jobs = self.jobs.lock().expect("memory job store lock poisoned");
        if let Some(job) = jobs.get_mut(&job_id) {
            job.import_ids.extend_from_slice(identifiers);
            job.updated_at = Utc::now();
        }
        Ok(())
    }
}
