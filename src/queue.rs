//! Submission queue: an opaque FIFO of submission ids, delivered at-least-once.

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use tracing::warn;
use uuid::Uuid;

use crate::error::{JudgeError, Result};

const QUEUE_KEY: &str = "judge:queue";

/// FIFO of submission ids. The worker blocks on `dequeue` until one is
/// available; it never peeks or reorders.
#[async_trait]
pub trait SubmissionQueue: Send + Sync {
    async fn dequeue(&mut self) -> Result<Uuid>;
}

pub struct RedisQueue {
    conn: ConnectionManager,
}

impl RedisQueue {
    pub async fn connect(redis_url: &str) -> Result<Self> {
        let client = redis::Client::open(redis_url).map_err(|e| JudgeError::Queue(e.to_string()))?;
        let conn = ConnectionManager::new(client).await.map_err(|e| JudgeError::Queue(e.to_string()))?;
        Ok(Self { conn })
    }
}

#[async_trait]
impl SubmissionQueue for RedisQueue {
    async fn dequeue(&mut self) -> Result<Uuid> {
        loop {
            let popped: Option<(String, String)> = self
                .conn
                .blpop(QUEUE_KEY, 0.0)
                .await
                .map_err(|e| JudgeError::Queue(e.to_string()))?;

            let Some((_, raw_id)) = popped else { continue };

            match Uuid::parse_str(&raw_id) {
                Ok(id) => return Ok(id),
                Err(e) => {
                    warn!(raw_id, error = %e, "dropping malformed submission id from queue");
                    continue;
                }
            }
        }
    }
}
