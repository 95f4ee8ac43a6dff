//! Submission Store: the three operations the judging core needs from the
//! surrounding service's persistence layer.

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::core::{PerTestResult, Submission, SubmissionStatus, Verdict};
use crate::error::{JudgeError, Result};

const RESULT_EXPIRY_SECS: u64 = 3600;
const STATUS_CHANNEL: &str = "judge:status";
const RESULT_CHANNEL: &str = "judge:results";

/// One row of `details` as persisted by `set_result`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestDetail {
    pub test_case_id: Uuid,
    pub status: Verdict,
    pub time_ms: u32,
    pub memory_kb: u32,
    pub return_code: i32,
}

impl From<&PerTestResult> for TestDetail {
    fn from(r: &PerTestResult) -> Self {
        Self { test_case_id: r.test_case_id, status: r.verdict, time_ms: r.time_ms, memory_kb: r.memory_kb, return_code: r.return_code }
    }
}

#[async_trait]
pub trait SubmissionStore: Send + Sync {
    async fn get(&mut self, id: Uuid) -> Result<Submission>;
    async fn set_status(&mut self, id: Uuid, status: SubmissionStatus) -> Result<()>;
    async fn set_result(
        &mut self,
        id: Uuid,
        status: SubmissionStatus,
        total_score: u32,
        time_used_ms: u32,
        memory_used_kb: u32,
        details: &[PerTestResult],
    ) -> Result<()>;
}

pub struct RedisStore {
    conn: ConnectionManager,
}

impl RedisStore {
    pub async fn connect(redis_url: &str) -> Result<Self> {
        let client = redis::Client::open(redis_url).map_err(|e| JudgeError::Store(e.to_string()))?;
        let conn = ConnectionManager::new(client).await.map_err(|e| JudgeError::Store(e.to_string()))?;
        Ok(Self { conn })
    }

    fn submission_key(id: Uuid) -> String {
        format!("judge:submission:{id}")
    }
}

#[async_trait]
impl SubmissionStore for RedisStore {
    async fn get(&mut self, id: Uuid) -> Result<Submission> {
        let raw: String = self
            .conn
            .get(Self::submission_key(id))
            .await
            .map_err(|e| JudgeError::Store(format!("failed to read submission {id}: {e}")))?;
        serde_json::from_str(&raw).map_err(|e| JudgeError::Store(format!("corrupt submission record {id}: {e}")))
    }

    async fn set_status(&mut self, id: Uuid, status: SubmissionStatus) -> Result<()> {
        let mut submission = self.get(id).await?;
        submission.status = status;
        self.persist(&submission).await?;

        let payload = serde_json::json!({ "submission_id": id, "status": status });
        let _: () = self.conn.publish(STATUS_CHANNEL, payload.to_string()).await.unwrap_or(());
        Ok(())
    }

    async fn set_result(
        &mut self,
        id: Uuid,
        status: SubmissionStatus,
        total_score: u32,
        time_used_ms: u32,
        memory_used_kb: u32,
        details: &[PerTestResult],
    ) -> Result<()> {
        let mut submission = self.get(id).await?;
        submission.status = status;
        submission.total_score = total_score;
        submission.time_used_ms = time_used_ms;
        submission.memory_used_kb = memory_used_kb;
        submission.details = details.to_vec();
        self.persist(&submission).await?;

        let detail_rows: Vec<TestDetail> = details.iter().map(TestDetail::from).collect();
        let payload = serde_json::json!({
            "submission_id": id,
            "status": status,
            "total_score": total_score,
            "time_used_ms": time_used_ms,
            "memory_used_kb": memory_used_kb,
            "details": detail_rows,
        });
        let _: () = self.conn.publish(RESULT_CHANNEL, payload.to_string()).await.unwrap_or(());
        Ok(())
    }
}

impl RedisStore {
    async fn persist(&mut self, submission: &Submission) -> Result<()> {
        let json = serde_json::to_string(submission).map_err(|e| JudgeError::Store(e.to_string()))?;
        self.conn
            .set_ex::<_, _, ()>(Self::submission_key(submission.id), json, RESULT_EXPIRY_SECS)
            .await
            .map_err(|e| JudgeError::Store(format!("failed to persist submission {}: {e}", submission.id)))
    }
}
