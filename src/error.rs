//! Error types shared across the judging core.

use thiserror::Error;

/// Failures that prevent a submission from reaching a verdict at all.
///
/// These map directly onto the "transient system error" and "programming
/// invariant" categories from the error handling design: they are never
/// shown to the end user beyond the terminal `SystemError` status.
#[derive(Debug, Error)]
pub enum JudgeError {
    #[error("workspace error: {0}")]
    Workspace(String),

    #[error("cgroup error: {0}")]
    Cgroup(String),

    #[error("failed to spawn child process: {0}")]
    Spawn(#[from] std::io::Error),

    #[error("unsupported language: {0}")]
    UnsupportedLanguage(String),

    #[error("queue error: {0}")]
    Queue(String),

    #[error("submission store error: {0}")]
    Store(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, JudgeError>;
