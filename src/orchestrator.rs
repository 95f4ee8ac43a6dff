//! Task Orchestrator: the per-submission state machine.
//!
//! `Pending -> Judging -> {Compilation Error | Executing -> Terminal}`.
//! Idempotent only in the weak sense that re-running the same submission
//! id overwrites the previous result; callers must not rely on
//! exactly-once delivery from the queue.

use tracing::{info, warn};
use uuid::Uuid;

use crate::aggregator;
use crate::comparator;
use crate::compiler;
use crate::config::JudgeConfig;
use crate::core::{PerTestResult, Problem, Submission, SubmissionStatus, Verdict};
use crate::error::{JudgeError, Result};
use crate::sandbox::{CommandSpec, RunLimits, RunStatus, Runner};
use crate::store::SubmissionStore;
use crate::workspace::Workspace;

pub struct Orchestrator<R, S> {
    config: JudgeConfig,
    runner: R,
    store: S,
}

impl<R: Runner, S: SubmissionStore> Orchestrator<R, S> {
    pub fn new(config: JudgeConfig, runner: R, store: S) -> Self {
        Self { config, runner, store }
    }

    /// Drive one submission from dequeue to terminal status.
    pub async fn judge(&mut self, submission_id: Uuid, problem: &Problem) -> Result<()> {
        let submission = match self.store.get(submission_id).await {
            Ok(s) => s,
            Err(e) => {
                warn!(%submission_id, error = %e, "submission not found, dropping");
                return Ok(());
            }
        };

        self.store.set_status(submission_id, SubmissionStatus::Judging).await?;

        let workspace = Workspace::open(&self.config.workspace_root, submission_id)?;

        let mut details: Vec<PerTestResult> = Vec::new();
        let outcome = self.run_until_aggregation(&submission, problem, &workspace, &mut details).await;

        let (status, total_score, time_used_ms, memory_used_kb) = match outcome {
            Ok(Some(terminal)) => (terminal, 0, 0, 0),
            Ok(None) => {
                let agg = aggregator::aggregate(&details, problem.test_cases.len());
                (agg.status, agg.total_score, agg.time_used_ms, agg.memory_used_kb)
            }
            Err(e) => {
                warn!(%submission_id, error = %e, "pipeline failed before reaching a verdict");
                let agg = aggregator::aggregate(&details, problem.test_cases.len().max(details.len()));
                (SubmissionStatus::SystemError, agg.total_score, agg.time_used_ms, agg.memory_used_kb)
            }
        };

        info!(%submission_id, %status, total_score, "judged");
        self.store.set_result(submission_id, status, total_score, time_used_ms, memory_used_kb, &details).await?;

        // `workspace` drops here regardless of which branch above ran,
        // including if `?` above had returned early.
        Ok(())
    }

    /// Compile and, if that succeeds, run every test. Returns:
    /// - `Ok(Some(status))` for a short-circuit terminal decided before
    ///   aggregation (`CompilationError`, `SkippedNoTestCases`).
    /// - `Ok(None)` once every test has a [`PerTestResult`] in `details`
    ///   and the caller should run the Aggregator.
    /// - `Err` on a failure that didn't fit in a single test's verdict.
    async fn run_until_aggregation(
        &mut self,
        submission: &Submission,
        problem: &Problem,
        workspace: &Workspace,
        details: &mut Vec<PerTestResult>,
    ) -> Result<Option<SubmissionStatus>> {
        let compile_outcome =
            compiler::compile(submission.language, &submission.source, workspace, self.config.compile_timeout_ms).await?;

        if !compile_outcome.success {
            return Ok(Some(SubmissionStatus::CompilationError));
        }

        if problem.test_cases.is_empty() {
            return Ok(Some(SubmissionStatus::SkippedNoTestCases));
        }

        // Every test is attempted regardless of the problem's `partial`
        // flag: partial scoring changes how the Aggregator folds verdicts,
        // not how many tests the worker runs.
        for (idx, test) in problem.test_cases.iter().enumerate() {
            tokio::fs::write(workspace.input_path(idx), &test.input).await.map_err(JudgeError::Spawn)?;

            let spec = CommandSpec {
                argv: compile_outcome.run_argv.clone(),
                cwd: workspace.root().to_path_buf(),
                stdin_path: workspace.input_path(idx),
                stdout_path: workspace.output_path(idx),
                stderr_path: workspace.error_path(idx),
            };
            let limits = RunLimits {
                time_limit_ms: problem.time_limit_ms,
                memory_limit_mb: problem.memory_limit_mb,
                output_size_limit_bytes: self.config.output_size_limit_bytes,
            };

            let run_outcome = self.runner.run(spec, limits).await;

            let verdict = match run_outcome.status {
                RunStatus::Ran => {
                    let actual = read_truncated(&workspace.output_path(idx), self.config.output_size_limit_bytes)
                        .await
                        .map_err(JudgeError::Spawn)?;
                    comparator::compare(&test.expected_output, &actual, problem.special_judge.as_ref())
                }
                RunStatus::TimeLimitExceeded => Verdict::TimeLimitExceeded,
                RunStatus::MemoryLimitExceeded => Verdict::MemoryLimitExceeded,
                RunStatus::OutputLimitExceeded => Verdict::OutputLimitExceeded,
                RunStatus::RuntimeErrorSignal => Verdict::RuntimeErrorSignal,
                RunStatus::RuntimeErrorForbiddenSyscall => Verdict::RuntimeErrorForbiddenSyscall,
                RunStatus::RuntimeErrorNonZeroExit => Verdict::RuntimeErrorNonZeroExit,
                RunStatus::SystemError => Verdict::SystemError,
            };

            details.push(PerTestResult {
                test_case_id: test.id,
                verdict,
                time_ms: run_outcome.time_used_ms,
                memory_kb: run_outcome.memory_used_kb,
                return_code: run_outcome.return_code,
            });
        }

        Ok(None)
    }
}

async fn read_truncated(path: &std::path::Path, limit_bytes: u64) -> std::io::Result<Vec<u8>> {
    let bytes = tokio::fs::read(path).await?;
    Ok(bytes.into_iter().take(limit_bytes as usize).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Language, TestCase};
    use crate::sandbox::{CommandSpec as Spec, RunLimits as Limits, RunOutcome};
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;

    struct FakeRunner {
        outcomes: Mutex<Vec<RunOutcome>>,
    }

    #[async_trait]
    impl Runner for FakeRunner {
        async fn run(&self, spec: Spec, _limits: Limits) -> RunOutcome {
            let outcome = self.outcomes.lock().unwrap().remove(0);
            if outcome.status == RunStatus::Ran {
                tokio::fs::write(&spec.stdout_path, b"hello\n").await.ok();
            }
            outcome
        }
    }

    fn ran(time_ms: u32, memory_kb: u32) -> RunOutcome {
        RunOutcome { status: RunStatus::Ran, time_used_ms: time_ms, memory_used_kb: memory_kb, return_code: 0 }
    }

    struct InMemoryStore {
        submissions: HashMap<Uuid, Submission>,
    }

    #[async_trait]
    impl SubmissionStore for InMemoryStore {
        async fn get(&mut self, id: Uuid) -> Result<Submission> {
            self.submissions.get(&id).cloned().ok_or_else(|| JudgeError::Store("not found".into()))
        }

        async fn set_status(&mut self, id: Uuid, status: SubmissionStatus) -> Result<()> {
            self.submissions.get_mut(&id).unwrap().status = status;
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
            let s = self.submissions.get_mut(&id).unwrap();
            s.status = status;
            s.total_score = total_score;
            s.time_used_ms = time_used_ms;
            s.memory_used_kb = memory_used_kb;
            s.details = details.to_vec();
            Ok(())
        }
    }

    fn sample_problem(expected: &[u8]) -> Problem {
        Problem {
            id: Uuid::new_v4(),
            time_limit_ms: 1000,
            memory_limit_mb: 64,
            test_cases: vec![TestCase { id: Uuid::new_v4(), input: vec![], expected_output: expected.to_vec(), is_sample: false }],
            partial: false,
            special_judge: None,
        }
    }

    #[tokio::test]
    async fn accepted_end_to_end() {
        let config = JudgeConfig { workspace_root: tempfile::tempdir().unwrap().keep(), ..JudgeConfig::default() };
        let submission = Submission::new_pending(Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4(), Language::Python, "print('hello')".into());
        let id = submission.id;
        let mut submissions = HashMap::new();
        submissions.insert(id, submission);

        let runner = FakeRunner { outcomes: Mutex::new(vec![ran(5, 1000)]) };
        let store = InMemoryStore { submissions };
        let mut orchestrator = Orchestrator::new(config, runner, store);

        let problem = sample_problem(b"hello\n");
        orchestrator.judge(id, &problem).await.unwrap();

        let result = orchestrator.store.get(id).await.unwrap();
        assert_eq!(result.status, SubmissionStatus::Accepted);
        assert_eq!(result.total_score, 100);
        assert_eq!(result.details.len(), 1);
    }

    #[tokio::test]
    async fn wrong_answer_end_to_end() {
        let config = JudgeConfig { workspace_root: tempfile::tempdir().unwrap().keep(), ..JudgeConfig::default() };
        let submission = Submission::new_pending(Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4(), Language::Python, "print('hi')".into());
        let id = submission.id;
        let mut submissions = HashMap::new();
        submissions.insert(id, submission);

        let runner = FakeRunner { outcomes: Mutex::new(vec![ran(5, 1000)]) };
        let store = InMemoryStore { submissions };
        let mut orchestrator = Orchestrator::new(config, runner, store);

        let problem = sample_problem(b"hello\n");
        orchestrator.judge(id, &problem).await.unwrap();

        let result = orchestrator.store.get(id).await.unwrap();
        assert_eq!(result.status, SubmissionStatus::WrongAnswer);
        assert_eq!(result.total_score, 0);
    }

    #[tokio::test]
    async fn compilation_error_skips_execution() {
        let config = JudgeConfig { workspace_root: tempfile::tempdir().unwrap().keep(), ..JudgeConfig::default() };
        let submission = Submission::new_pending(Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4(), Language::Cpp, "#errorX".into());
        let id = submission.id;
        let mut submissions = HashMap::new();
        submissions.insert(id, submission);

        let runner = FakeRunner { outcomes: Mutex::new(vec![]) };
        let store = InMemoryStore { submissions };
        let mut orchestrator = Orchestrator::new(config, runner, store);

        let problem = sample_problem(b"anything\n");
        orchestrator.judge(id, &problem).await.unwrap();

        let result = orchestrator.store.get(id).await.unwrap();
        assert_eq!(result.status, SubmissionStatus::CompilationError);
        assert!(result.details.is_empty());
    }

    #[tokio::test]
    async fn zero_test_cases_is_skipped() {
        let config = JudgeConfig { workspace_root: tempfile::tempdir().unwrap().keep(), ..JudgeConfig::default() };
        let submission = Submission::new_pending(Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4(), Language::Python, "print(1)".into());
        let id = submission.id;
        let mut submissions = HashMap::new();
        submissions.insert(id, submission);

        let runner = FakeRunner { outcomes: Mutex::new(vec![]) };
        let store = InMemoryStore { submissions };
        let mut orchestrator = Orchestrator::new(config, runner, store);

        let mut problem = sample_problem(b"");
        problem.test_cases.clear();
        orchestrator.judge(id, &problem).await.unwrap();

        let result = orchestrator.store.get(id).await.unwrap();
        assert_eq!(result.status, SubmissionStatus::SkippedNoTestCases);
        assert_eq!(result.total_score, 0);
    }

    #[tokio::test]
    async fn two_tests_non_partial_runs_both_and_scores_fifty() {
        let config = JudgeConfig { workspace_root: tempfile::tempdir().unwrap().keep(), ..JudgeConfig::default() };
        let submission = Submission::new_pending(Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4(), Language::Python, "print('hello')".into());
        let id = submission.id;
        let mut submissions = HashMap::new();
        submissions.insert(id, submission);

        let runner = FakeRunner { outcomes: Mutex::new(vec![ran(5, 100), ran(5, 100)]) };
        let store = InMemoryStore { submissions };
        let mut orchestrator = Orchestrator::new(config, runner, store);

        let mut problem = sample_problem(b"hello\n");
        problem.test_cases.push(TestCase { id: Uuid::new_v4(), input: vec![], expected_output: b"nope\n".to_vec(), is_sample: false });
        orchestrator.judge(id, &problem).await.unwrap();

        let result = orchestrator.store.get(id).await.unwrap();
        assert_eq!(result.status, SubmissionStatus::WrongAnswer);
        assert_eq!(result.total_score, 50);
        assert_eq!(result.details.len(), 2);
    }
}
