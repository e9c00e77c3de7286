//! Import stage
//!
//! Drains a job's pending link data and forwards it to the batch-import
//! service. A refused batch is returned to the queue and resubmitted after
//! a fixed delay, indefinitely; this is the only retry loop in the worker.

use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{debug, info, warn};
use uuid::Uuid;

use reclink_common::{JobState, LinkData};

use crate::queue::{queue_name, QueueDriver, QueuePump};
use crate::store::JobStore;

pub mod client;

pub use client::{HttpImportClient, ImportClient};

/// Run the import stage for one job
///
/// The job ends the stage in `pending_external` once a batch was accepted;
/// the import service's own downstream process owns the final transition
/// onward. When the queue drains without anything left to submit, the
/// queue is dropped and the state stays as last set.
pub async fn run_import(
    job_id: Uuid,
    import_profile_id: &str,
    store: &dyn JobStore,
    queue: &dyn QueueDriver,
    client: &dyn ImportClient,
    retry_delay: Duration,
) -> Result<()> {
    store.set_state(job_id, JobState::ProcessingImport).await?;

    let import_queue = queue_name(JobState::PendingImport, job_id);
    let pump = QueuePump::new(queue, import_queue.clone());

    loop {
        let Some(batch) = pump.next_batch().await? else {
            debug!(job_id = %job_id, "import queue drained");
            queue.delete_queue(&import_queue).await?;
            return Ok(());
        };

        let links: Vec<LinkData> = batch.decode().context("failed to decode link data")?;

        match client.submit(import_profile_id, &links).await? {
            None => {
                warn!(
                    job_id = %job_id,
                    links = links.len(),
                    "import service refused batch, returning it to the queue"
                );
                queue.nack(&batch).await?;
                tokio::time::sleep(retry_delay).await;
            },
            Some(identifier) => {
                info!(job_id = %job_id, identifier = %identifier, "batch imported");
                store.append_identifiers(job_id, &[identifier]).await?;
                store.set_state(job_id, JobState::PendingExternal).await?;
                queue.ack(&batch).await?;
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use async_trait::async_trait;
    use reclink_common::record::{DataField, Record, Subfield};
    use reclink_common::types::{Edit, JobConfig};
    use reclink_common::Job;

    use crate::queue::MemoryQueue;
    use crate::store::MemoryJobStore;

    /// Client stub refusing the first `fail_times` submissions
    struct FlakyClient {
        fail_times: usize,
        calls: AtomicUsize,
        submissions: Mutex<Vec<Vec<LinkData>>>,
    }

    impl FlakyClient {
        fn new(fail_times: usize) -> Self {
            Self {
                fail_times,
                calls: AtomicUsize::new(0),
                submissions: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl ImportClient for FlakyClient {
        async fn submit(&self, _profile_id: &str, links: &[LinkData]) -> Result<Option<String>> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            self.submissions.lock().unwrap().push(links.to_vec());
            if call < self.fail_times {
                return Ok(None);
            }
            Ok(Some(format!("blob-{call}")))
        }
    }

    fn link_data(value: &str) -> LinkData {
        LinkData {
            source_record: Record::default(),
            changes: vec![Edit::ReplaceSubfield {
                tag: "100".to_string(),
                code: '0',
                value: value.to_string(),
            }],
            record: Record {
                fields: vec![DataField::new("100", vec![Subfield::new('a', value)])],
                ..Record::default()
            },
        }
    }

    fn seeded_job(store: &MemoryJobStore) -> Job {
        let job = Job::new(
            Uuid::new_v4(),
            JobState::PendingImport,
            JobConfig {
                source_record: Record::default(),
                filters: vec![],
                import_profile_id: "profile-1".to_string(),
            },
        );
        store.insert(job.clone());
        job
    }

    #[tokio::test]
    async fn test_refused_batch_is_nacked_and_resubmitted() {
        let store = MemoryJobStore::new();
        let queue = MemoryQueue::new(10);
        let client = FlakyClient::new(1);
        let job = seeded_job(&store);
        let import_queue = queue_name(JobState::PendingImport, job.job_id);

        for link in [link_data("one"), link_data("two")] {
            queue
                .enqueue(
                    &import_queue,
                    job.job_id,
                    &serde_json::to_value(&link).unwrap(),
                )
                .await
                .unwrap();
        }

        run_import(
            job.job_id,
            "profile-1",
            &store,
            &queue,
            &client,
            Duration::from_millis(5),
        )
        .await
        .unwrap();

        // The refused batch was redelivered with identical content
        let submissions = client.submissions.lock().unwrap();
        assert_eq!(submissions.len(), 2);
        assert_eq!(submissions[0], submissions[1]);
        assert_eq!(submissions[0].len(), 2);
        drop(submissions);

        let current = store.get(job.job_id).unwrap();
        assert_eq!(current.state, JobState::PendingExternal);
        assert_eq!(current.import_ids, vec!["blob-1"]);
        assert!(!queue.contains_queue(&import_queue));
    }

    #[tokio::test]
    async fn test_empty_queue_leaves_state_as_processing() {
        let store = MemoryJobStore::new();
        let queue = MemoryQueue::new(10);
        let client = FlakyClient::new(0);
        let job = seeded_job(&store);

        run_import(
            job.job_id,
            "profile-1",
            &store,
            &queue,
            &client,
            Duration::from_millis(5),
        )
        .await
        .unwrap();

        assert_eq!(client.calls.load(Ordering::SeqCst), 0);
        let current = store.get(job.job_id).unwrap();
        assert_eq!(current.state, JobState::ProcessingImport);
        assert!(current.import_ids.is_empty());
    }

    #[tokio::test]
    async fn test_each_accepted_batch_records_an_identifier() {
        let store = MemoryJobStore::new();
        let queue = MemoryQueue::new(1);
        let client = FlakyClient::new(0);
        let job = seeded_job(&store);
        let import_queue = queue_name(JobState::PendingImport, job.job_id);

        for link in [link_data("one"), link_data("two")] {
            queue
                .enqueue(
                    &import_queue,
                    job.job_id,
                    &serde_json::to_value(&link).unwrap(),
                )
                .await
                .unwrap();
        }

        run_import(
            job.job_id,
            "profile-1",
            &store,
            &queue,
            &client,
            Duration::from_millis(5),
        )
        .await
        .unwrap();

        // Batch size 1 forces two round-trips
        let current = store.get(job.job_id).unwrap();
        assert_eq!(current.import_ids, vec!["blob-0", "blob-1"]);
        assert_eq!(current.state, JobState::PendingExternal);
    }
}
