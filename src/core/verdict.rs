//! Verdict types shared by per-test results and submission-level status.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Outcome of running a single test case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Accepted,
    WrongAnswer,
    TimeLimitExceeded,
    MemoryLimitExceeded,
    OutputLimitExceeded,
    RuntimeErrorSignal,
    RuntimeErrorForbiddenSyscall,
    RuntimeErrorNonZeroExit,
    SystemError,
}

impl Verdict {
    /// True for any of the three `Runtime Error (*)` sub-kinds.
    pub fn is_runtime_error(self) -> bool {
        matches!(
            self,
            Verdict::RuntimeErrorSignal
                | Verdict::RuntimeErrorForbiddenSyscall
                | Verdict::RuntimeErrorNonZeroExit
        )
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Verdict::Accepted => "Accepted",
            Verdict::WrongAnswer => "Wrong Answer",
            Verdict::TimeLimitExceeded => "Time Limit Exceeded",
            Verdict::MemoryLimitExceeded => "Memory Limit Exceeded",
            Verdict::OutputLimitExceeded => "Output Limit Exceeded",
            Verdict::RuntimeErrorSignal => "Runtime Error (SIGSEGV)",
            Verdict::RuntimeErrorForbiddenSyscall => "Runtime Error (Forbidden Syscall)",
            Verdict::RuntimeErrorNonZeroExit => "Runtime Error (Non-zero exit)",
            Verdict::SystemError => "System Error",
        };
        write!(f, "{s}")
    }
}

/// Submission-level terminal status.
///
/// A superset of [`Verdict`]: it adds the two statuses that only make
/// sense at the submission level (`CompilationError`, `Skipped`) and keeps
/// the ordering used by the aggregator's precedence rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionStatus {
    Pending,
    Judging,
    Accepted,
    WrongAnswer,
    CompilationError,
    TimeLimitExceeded,
    MemoryLimitExceeded,
    OutputLimitExceeded,
    RuntimeErrorSignal,
    RuntimeErrorForbiddenSyscall,
    RuntimeErrorNonZeroExit,
    SystemError,
    SkippedNoTestCases,
}

impl SubmissionStatus {
    /// A status is terminal if it is anything other than `Pending`/`Judging`.
    pub fn is_terminal(self) -> bool {
        !matches!(self, SubmissionStatus::Pending | SubmissionStatus::Judging)
    }

    pub fn from_verdict(verdict: Verdict) -> Self {
        match verdict {
            Verdict::Accepted => SubmissionStatus::Accepted,
            Verdict::WrongAnswer => SubmissionStatus::WrongAnswer,
            Verdict::TimeLimitExceeded => SubmissionStatus::TimeLimitExceeded,
            Verdict::MemoryLimitExceeded => SubmissionStatus::MemoryLimitExceeded,
            Verdict::OutputLimitExceeded => SubmissionStatus::OutputLimitExceeded,
            Verdict::RuntimeErrorSignal => SubmissionStatus::RuntimeErrorSignal,
            Verdict::RuntimeErrorForbiddenSyscall => SubmissionStatus::RuntimeErrorForbiddenSyscall,
            Verdict::RuntimeErrorNonZeroExit => SubmissionStatus::RuntimeErrorNonZeroExit,
            Verdict::SystemError => SubmissionStatus::SystemError,
        }
    }

    /// Precedence rank used by the aggregator: lower sorts first (wins).
    fn precedence_rank(self) -> u8 {
        match self {
            SubmissionStatus::SystemError => 0,
            SubmissionStatus::CompilationError => 1,
            SubmissionStatus::MemoryLimitExceeded => 2,
            SubmissionStatus::TimeLimitExceeded => 3,
            SubmissionStatus::OutputLimitExceeded => 4,
            SubmissionStatus::RuntimeErrorSignal
            | SubmissionStatus::RuntimeErrorForbiddenSyscall
            | SubmissionStatus::RuntimeErrorNonZeroExit => 5,
            SubmissionStatus::WrongAnswer => 6,
            SubmissionStatus::Accepted => 7,
            SubmissionStatus::SkippedNoTestCases => 8,
            SubmissionStatus::Pending | SubmissionStatus::Judging => 9,
        }
    }

    /// Pick the higher-priority of two statuses per the §4.5 precedence rule.
    pub fn prefer(self, other: Self) -> Self {
        if self.precedence_rank() <= other.precedence_rank() {
            self
        } else {
            other
        }
    }
}

impl fmt::Display for SubmissionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SubmissionStatus::Pending => "Pending",
            SubmissionStatus::Judging => "Judging",
            SubmissionStatus::Accepted => "Accepted",
            SubmissionStatus::WrongAnswer => "Wrong Answer",
            SubmissionStatus::CompilationError => "Compilation Error",
            SubmissionStatus::TimeLimitExceeded => "Time Limit Exceeded",
            SubmissionStatus::MemoryLimitExceeded => "Memory Limit Exceeded",
            SubmissionStatus::OutputLimitExceeded => "Output Limit Exceeded",
            SubmissionStatus::RuntimeErrorSignal => "Runtime Error (SIGSEGV)",
            SubmissionStatus::RuntimeErrorForbiddenSyscall => "Runtime Error (Forbidden Syscall)",
            SubmissionStatus::RuntimeErrorNonZeroExit => "Runtime Error (Non-zero exit)",
            SubmissionStatus::SystemError => "System Error",
            SubmissionStatus::SkippedNoTestCases => "Skipped (No Test Cases)",
        };
        write!(f, "{s}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn precedence_prefers_system_error_over_everything() {
        let statuses = [
            SubmissionStatus::Accepted,
            SubmissionStatus::WrongAnswer,
            SubmissionStatus::TimeLimitExceeded,
            SubmissionStatus::CompilationError,
        ];
        for s in statuses {
            assert_eq!(SubmissionStatus::SystemError.prefer(s), SubmissionStatus::SystemError);
            assert_eq!(s.prefer(SubmissionStatus::SystemError), SubmissionStatus::SystemError);
        }
    }

    #[test]
    fn precedence_orders_mle_above_tle() {
        assert_eq!(
            SubmissionStatus::MemoryLimitExceeded.prefer(SubmissionStatus::TimeLimitExceeded),
            SubmissionStatus::MemoryLimitExceeded
        );
    }

    #[test]
    fn precedence_wrong_answer_beats_accepted() {
        assert_eq!(
            SubmissionStatus::WrongAnswer.prefer(SubmissionStatus::Accepted),
            SubmissionStatus::WrongAnswer
        );
    }

    #[test]
    fn runtime_error_subkinds_are_recognized() {
        assert!(Verdict::RuntimeErrorSignal.is_runtime_error());
        assert!(!Verdict::WrongAnswer.is_runtime_error());
    }
}
