//! In-memory queue driver
//!
//! Backs the test suites and mirrors the lease lifecycle of the real
//! driver: drained messages stay invisible until acked or nacked.

use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use uuid::Uuid;

use super::{Batch, QueueDriver, QueueMessage};

#[derive(Debug)]
struct StoredMessage {
    delivery_tag: i64,
    payload: serde_json::Value,
    leased: bool,
}

#[derive(Debug, Default)]
struct Inner {
    next_tag: i64,
    queues: HashMap<String, Vec<StoredMessage>>,
}

/// Mutex-backed queue driver for tests
#[derive(Debug)]
pub struct MemoryQueue {
    batch_size: usize,
    inner: Mutex<Inner>,
}

impl MemoryQueue {
    pub fn new(batch_size: usize) -> Self {
        Self {
            batch_size,
            inner: Mutex::new(Inner::default()),
        }
    }

    /// Whether the queue still exists (deleting removes it entirely)
    pub fn contains_queue(&self, queue: &str) -> bool {
        self.inner
            .lock()
            .expect("memory queue lock poisoned")
            .queues
            .contains_key(queue)
    }
}

impl Default for MemoryQueue {
    fn default() -> Self {
        Self::new(10)
    }
}

#[async_trait]
impl QueueDriver for MemoryQueue {
    async fn drain_batch(&self, queue: &str) -> Result<Option<Batch>> {
        let mut inner = self.inner.lock().expect("memory queue lock poisoned");
        let Some(messages) = inner.queues.get_mut(queue) else {
            return Ok(None);
        };

        let mut drained = Vec::new();
        for message in messages.iter_mut() {
            if drained.len() == self.batch_size {
                break;
            }
            if !message.leased {
                message.leased = true;
                drained.push(QueueMessage {
                    delivery_tag: message.delivery_tag,
                    content: message.payload.clone(),
                });
            }
        }

        if drained.is_empty() {
            return Ok(None);
        }

        Ok(Some(Batch {
            queue: queue.to_string(),
            messages: drained,
        }))
    }

    async fn ack(&self, batch: &Batch) -> Result<()> {
        let tags = batch.delivery_tags();
        let mut inner = self.inner.lock().expect("memory queue lock poisoned");
        if let Some(messages) = inner.queues.get_mut(&batch.queue) {
            messages.retain(|m| !tags.contains(&m.delivery_tag));
        }
        Ok(())
    }

    async fn nack(&self, batch: &Batch) -> Result<()> {
        let tags = batch.delivery_tags();
        let mut inner = self.inner.lock().expect("memory queue lock poisoned");
        if let Some(messages) = inner.queues.get_mut(&batch.queue) {
            for message in messages.iter_mut() {
                if tags.contains(&message.delivery_tag) {
                    message.leased = false;
                }
            }
        }
        Ok(())
    }

    async fn enqueue(
        &self,
        queue: &str,
        _correlation_id: Uuid,
        payload: &serde_json::Value,
    ) -> Result<()> {
        let mut inner = self.inner.lock().expect("memory queue lock poisoned");
        inner.next_tag += 1;
        let tag = inner.next_tag;
        inner
            .queues
            .entry(queue.to_string())
            .or_default()
            .push(StoredMessage {
                delivery_tag: tag,
                payload: payload.clone(),
                leased: false,
            });
        Ok(())
    }

    async fn delete_queue(&self, queue: &str) -> Result<()> {
        let mut inner = self.inner.lock().expect("memory queue lock poisoned");
        inner.queues.remove(queue);
        Ok(())
    }

    async fn message_count(&self, queue: &str) -> Result<u64> {
        let inner = self.inner.lock().expect("memory queue lock poisoned");
        Ok(inner.queues.get(queue).map_or(0, |m| m.len() as u64))
    }
}
