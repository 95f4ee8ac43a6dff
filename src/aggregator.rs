//! Fold per-test results into a submission-level status and score.

use crate::core::{PerTestResult, SubmissionStatus, Verdict};

pub struct Aggregate {
    pub status: SubmissionStatus,
    pub total_score: u32,
    pub time_used_ms: u32,
    pub memory_used_kb: u32,
}

/// `total_score = round(100 * accepted / max(1, N))`, status per the
/// precedence rule, peaks over the tests that actually ran.
///
/// `total_test_count` is the problem's test count, not `details.len()`:
/// a run that short-circuited before the per-test loop (compile error,
/// pre-test system failure) still scores against the full suite.
pub fn aggregate(details: &[PerTestResult], total_test_count: usize) -> Aggregate {
    if total_test_count == 0 {
        return Aggregate { status: SubmissionStatus::SkippedNoTestCases, total_score: 0, time_used_ms: 0, memory_used_kb: 0 };
    }

    let accepted = details.iter().filter(|d| d.verdict == Verdict::Accepted).count();
    let total_score = (100.0 * accepted as f64 / total_test_count.max(1) as f64).round() as u32;

    let status = details
        .iter()
        .map(|d| SubmissionStatus::from_verdict(d.verdict))
        .fold(SubmissionStatus::Accepted, |acc, s| acc.prefer(s));

    let time_used_ms = details.iter().map(|d| d.time_ms).max().unwrap_or(0);
    let memory_used_kb = details.iter().map(|d| d.memory_kb).max().unwrap_or(0);

    Aggregate { status, total_score, time_used_ms, memory_used_kb }
}
