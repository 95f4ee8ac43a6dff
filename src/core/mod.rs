//! Core data model and verdict types.

pub mod model;
pub mod verdict;

pub use model::{Language, PerTestResult, Problem, SpecialJudge, Submission, TestCase};
pub use verdict::{SubmissionStatus, Verdict};
