//! Types shared by every [`Runner`] implementation.
//!
//! The trait exists so the orchestrator can be exercised in tests with a
//! fake runner that never forks a real process.

use std::path::PathBuf;

use async_trait::async_trait;

/// What to run and where its stdio should be redirected.
#[derive(Debug, Clone)]
pub struct CommandSpec {
    pub argv: Vec<String>,
    pub cwd: PathBuf,
    pub stdin_path: PathBuf,
    pub stdout_path: PathBuf,
    pub stderr_path: PathBuf,
}

/// Resource limits enforced for one invocation.
#[derive(Debug, Clone, Copy)]
pub struct RunLimits {
    pub time_limit_ms: u32,
    pub memory_limit_mb: u32,
    /// `RLIMIT_FSIZE` placed on the child, from [`JudgeConfig::output_size_limit_bytes`](crate::config::JudgeConfig::output_size_limit_bytes).
    pub output_size_limit_bytes: u64,
}

/// Sandbox-level classification before the Comparator sees the output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    /// Ran to completion without hitting a limit. Comparator decides AC/WA.
    Ran,
    TimeLimitExceeded,
    MemoryLimitExceeded,
    OutputLimitExceeded,
    RuntimeErrorSignal,
    RuntimeErrorForbiddenSyscall,
    RuntimeErrorNonZeroExit,
    SystemError,
}

/// Raw result of one sandboxed invocation.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub status: RunStatus,
    pub time_used_ms: u32,
    pub memory_used_kb: u32,
    pub return_code: i32,
}

/// Executes one command under resource and syscall constraints.
///
/// Implemented by the real fork/exec/cgroup runner and, in tests, by a
/// fake that returns canned outcomes.
#[async_trait]
pub trait Runner: Send + Sync {
    async fn run(&self, spec: CommandSpec, limits: RunLimits) -> RunOutcome;
}
