//! Per-submission scratch directory, scoped for automatic cleanup.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::warn;
use uuid::Uuid;

use crate::error::{JudgeError, Result};

/// A private directory holding one submission's source, per-test input,
/// output, and error files.
///
/// `close` runs on every exit path, including panics: it is driven by
/// `Drop`, not by an explicit call the caller might skip.
pub struct Workspace {
    submission_id: Uuid,
    dir: PathBuf,
}

impl Workspace {
    /// Create the workspace directory under `root`, named after the
    /// submission id so two submissions never collide.
    pub fn open(root: &Path, submission_id: Uuid) -> Result<Self> {
        let dir = root.join(submission_id.to_string());
        fs::create_dir_all(&dir)
            .map_err(|e| JudgeError::Workspace(format!("failed to create {dir:?}: {e}")))?;
        Ok(Self { submission_id, dir })
    }

    pub fn submission_id(&self) -> Uuid {
        self.submission_id
    }

    pub fn root(&self) -> &Path {
        &self.dir
    }

    pub fn source_path(&self, file_name: &str) -> PathBuf {
        self.dir.join(file_name)
    }

    pub fn exe_path(&self) -> PathBuf {
        self.dir.join("exe")
    }

    pub fn input_path(&self, test_idx: usize) -> PathBuf {
        self.dir.join(format!("input_{test_idx}.txt"))
    }

    pub fn output_path(&self, test_idx: usize) -> PathBuf {
        self.dir.join(format!("output_{test_idx}.txt"))
    }

    pub fn error_path(&self, test_idx: usize) -> PathBuf {
        self.dir.join(format!("error_{test_idx}.txt"))
    }

    /// Remove the workspace directory now instead of waiting for drop.
    /// Idempotent; errors are logged, never returned.
    pub fn close(self) {
        // Drop does the actual work; this just makes the intent explicit
        // at call sites that want to free the directory before the
        // handle's lexical scope ends.
        drop(self);
    }
}

impl Drop for Workspace {
    fn drop(&mut self) {
        match fs::remove_dir_all(&self.dir) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => warn!(submission_id = %self.submission_id, error = %e, "failed to clean up workspace"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_creates_a_unique_directory() {
        let root = tempfile::tempdir().unwrap();
        let id = Uuid::new_v4();
        let ws = Workspace::open(root.path(), id).unwrap();
        assert!(ws.root().is_dir());
        assert_eq!(ws.root(), root.path().join(id.to_string()));
    }

    #[test]
    fn drop_removes_the_directory() {
        let root = tempfile::tempdir().unwrap();
        let dir = {
            let ws = Workspace::open(root.path(), Uuid::new_v4()).unwrap();
            ws.root().to_path_buf()
        };
        assert!(!dir.exists());
    }

    #[test]
    fn close_is_idempotent_with_drop() {
        let root = tempfile::tempdir().unwrap();
        let ws = Workspace::open(root.path(), Uuid::new_v4()).unwrap();
        let dir = ws.root().to_path_buf();
        ws.close();
        assert!(!dir.exists());
        // A second removal attempt (simulating drop firing again) must not panic.
        assert!(fs::remove_dir_all(&dir).is_err());
    }

    #[test]
    fn path_helpers_are_pure_computations() {
        let root = tempfile::tempdir().unwrap();
        let id = Uuid::new_v4();
        let ws = Workspace::open(root.path(), id).unwrap();
        assert_eq!(ws.input_path(0), ws.root().join("input_0.txt"));
        assert_eq!(ws.output_path(2), ws.root().join("output_2.txt"));
        assert_eq!(ws.error_path(1), ws.root().join("error_1.txt"));
    }
}
