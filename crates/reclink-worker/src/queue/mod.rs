//! Per-job stage queues
//!
//! Candidate records and pending link data travel through named queues,
//! one per job and stage (`"<state>.<job_id>"`). The driver hands out
//! messages in batches; a batch is acknowledged or returned to the queue
//! as a whole, never partially.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use uuid::Uuid;

use reclink_common::JobState;

pub mod memory;
pub mod pg;

pub use memory::MemoryQueue;
pub use pg::PgQueue;

/// Name of the queue feeding a pipeline stage for one job
pub fn queue_name(state: JobState, job_id: Uuid) -> String {
    format!("{}.{}", state.as_str(), job_id)
}

/// One queued message with its delivery tag
#[derive(Debug, Clone)]
pub struct QueueMessage {
    pub delivery_tag: i64,
    pub content: serde_json::Value,
}

/// A non-empty group of messages fetched in one round-trip
#[derive(Debug, Clone)]
pub struct Batch {
    pub queue: String,
    pub messages: Vec<QueueMessage>,
}

impl Batch {
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Deserialize every message payload in delivery order
    pub fn decode<T: DeserializeOwned>(&self) -> Result<Vec<T>> {
        self.messages
            .iter()
            .map(|message| {
                serde_json::from_value(message.content.clone()).with_context(|| {
                    format!(
                        "failed to decode message {} from queue {}",
                        message.delivery_tag, self.queue
                    )
                })
            })
            .collect()
    }

    fn delivery_tags(&self) -> Vec<i64> {
        self.messages.iter().map(|m| m.delivery_tag).collect()
    }
}

/// Message-queue driver contract
///
/// Messages handed out by `drain_batch` stay leased until the caller
/// settles the batch: `ack` removes them, `nack` releases the lease so
/// the same messages are redelivered by a later drain.
#[async_trait]
pub trait QueueDriver: Send + Sync {
    /// Fetch the next batch; `None` when the queue is exhausted right now
    async fn drain_batch(&self, queue: &str) -> Result<Option<Batch>>;

    /// Settle a batch successfully, removing its messages
    async fn ack(&self, batch: &Batch) -> Result<()>;

    /// Return a batch to the queue for redelivery
    async fn nack(&self, batch: &Batch) -> Result<()>;

    /// Append a payload to a queue
    async fn enqueue(
        &self,
        queue: &str,
        correlation_id: Uuid,
        payload: &serde_json::Value,
    ) -> Result<()>;

    /// Drop a queue and everything still on it
    async fn delete_queue(&self, queue: &str) -> Result<()>;

    /// Number of messages currently on the queue, leased or not
    async fn message_count(&self, queue: &str) -> Result<u64>;
}

/// Restartable batch iterator over one named queue
///
/// The pump only fetches; acking or nacking each batch stays with the
/// caller, which must settle a batch before asking for the next one.
pub struct QueuePump<'a> {
    driver: &'a dyn QueueDriver,
    queue: String,
}

impl<'a> QueuePump<'a> {
    pub fn new(driver: &'a dyn QueueDriver, queue: impl Into<String>) -> Self {
        Self {
            driver,
            queue: queue.into(),
        }
    }

    pub fn queue(&self) -> &str {
        &self.queue
    }

    /// Next non-empty batch, or `None` once the queue has no deliverable
    /// messages at this instant
    pub async fn next_batch(&self) -> Result<Option<Batch>> {
        self.driver.drain_batch(&self.queue).await
    }
}
