//! PostgreSQL queue driver
//!
//! Queues live in the `queue_messages` table. Draining leases rows with
//! `FOR UPDATE SKIP LOCKED`; acking deletes them, nacking releases the
//! lease so the rows are picked up again by a later drain.

use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::{Batch, QueueDriver, QueueMessage};

/// Queue driver over the `queue_messages` table
#[derive(Debug, Clone)]
pub struct PgQueue {
    pool: PgPool,
    batch_size: i64,
}

impl PgQueue {
    pub fn new(pool: PgPool, batch_size: u32) -> Self {
        Self {
            pool,
            batch_size: i64::from(batch_size),
        }
    }
}

#[async_trait]
impl QueueDriver for PgQueue {
    async fn drain_batch(&self, queue: &str) -> Result<Option<Batch>> {
        let rows: Vec<(i64, serde_json::Value)> = sqlx::query_as(
            r#"
            WITH next AS (
                SELECT id FROM queue_messages
                WHERE queue_name = $1 AND NOT leased
                ORDER BY id
                LIMIT $2
                FOR UPDATE SKIP LOCKED
            )
            UPDATE queue_messages m
            SET leased = TRUE
            FROM next
            WHERE m.id = next.id
            RETURNING m.id, m.payload
            "#,
        )
        .bind(queue)
        .bind(self.batch_size)
        .fetch_all(&self.pool)
        .await
        .context("Failed to drain queue batch")?;

        if rows.is_empty() {
            return Ok(None);
        }

        let mut messages: Vec<QueueMessage> = rows
            .into_iter()
            .map(|(id, payload)| QueueMessage {
                delivery_tag: id,
                content: payload,
            })
            .collect();
        // RETURNING does not guarantee row order
        messages.sort_by_key(|m| m.delivery_tag);

        Ok(Some(Batch {
            queue: queue.to_string(),
            messages,
        }))
    }

    async fn ack(&self, batch: &Batch) -> Result<()> {
        sqlx::query("DELETE FROM queue_messages WHERE id = ANY($1)")
            .bind(batch.delivery_tags())
            .execute(&self.pool)
            .await
            .context("Failed to ack queue batch")?;

        Ok(())
    }

    async fn nack(&self, batch: &Batch) -> Result<()> {
        sqlx::query("UPDATE queue_messages SET leased = FALSE WHERE id = ANY($1)")
            .bind(batch.delivery_tags())
            .execute(&self.pool)
            .await
            .context("Failed to nack queue batch")?;

        Ok(())
    }

    async fn enqueue(
        &self,
        queue: &str,
        correlation_id: Uuid,
        payload: &serde_json::Value,
    ) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO queue_messages (queue_name, correlation_id, payload)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(queue)
        .bind(correlation_id)
        .bind(payload)
        .execute(&self.pool)
        .await
        .context("Failed to enqueue message")?;

        Ok(())
    }

    async fn delete_queue(&self, queue: &str) -> Result<()> {
        sqlx::query("DELETE FROM queue_messages WHERE queue_name = $1")
            .bind(queue)
            .execute(&self.pool)
            .await
            .context("Failed to delete queue")?;

        Ok(())
    }

    async fn message_count(&self, queue: &str) -> Result<u64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM queue_messages WHERE queue_name = $1")
                .bind(queue)
                .fetch_one(&self.pool)
                .await
                .context("Failed to count queue messages")?;

        Ok(count as u64)
    }
}
