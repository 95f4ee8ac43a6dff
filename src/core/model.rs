//! Entities the judging core reads and writes.
//!
//! The core does not own persistence for these types; the Submission Store
//! and surrounding service own the CRUD surface. This module only carries
//! the fields the pipeline actually touches.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::verdict::{SubmissionStatus, Verdict};

/// Closed set of supported languages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Python,
    Cpp,
    C,
}

/// A single test case belonging to a [`Problem`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestCase {
    pub id: Uuid,
    pub input: Vec<u8>,
    pub expected_output: Vec<u8>,
    pub is_sample: bool,
}

/// Problem resource limits and test suite.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Problem {
    pub id: Uuid,
    pub time_limit_ms: u32,
    pub memory_limit_mb: u32,
    pub test_cases: Vec<TestCase>,
    /// If set, all tests are attempted and scored proportionally regardless
    /// of earlier failures.
    pub partial: bool,
    pub special_judge: Option<SpecialJudge>,
}

/// Extension point: a problem-supplied checker program.
///
/// Invocation is not implemented by an initial build of the core; see the
/// comparator's special-judge stub.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpecialJudge {
    pub checker_source: String,
    pub checker_language: Language,
}

/// Result of running one test case through the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerTestResult {
    pub test_case_id: Uuid,
    pub verdict: Verdict,
    pub time_ms: u32,
    pub memory_kb: u32,
    pub return_code: i32,
}

/// A user-submitted program awaiting or undergoing judgment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Submission {
    pub id: Uuid,
    pub user_id: Uuid,
    pub problem_id: Uuid,
    pub language: Language,
    pub source: String,
    pub status: SubmissionStatus,
    pub total_score: u32,
    pub time_used_ms: u32,
    pub memory_used_kb: u32,
    pub details: Vec<PerTestResult>,
}

impl Submission {
    pub fn new_pending(id: Uuid, user_id: Uuid, problem_id: Uuid, language: Language, source: String) -> Self {
        Self {
            id,
            user_id,
            problem_id,
            language,
            source,
            status: SubmissionStatus::Pending,
            total_score: 0,
            time_used_ms: 0,
            memory_used_kb: 0,
            details: Vec::new(),
        }
    }
}
