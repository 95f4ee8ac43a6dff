//! Compiler Driver: language-dispatched compile step.
//!
//! Runs outside the execution sandbox — the toolchain itself is trusted —
//! bounded only by a wall-clock timeout.

use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;
use tokio::time::timeout;

use crate::core::Language;
use crate::error::{JudgeError, Result};
use crate::languages::LanguageSpec;
use crate::workspace::Workspace;

const DIAGNOSTIC_LIMIT_BYTES: usize = 64 * 1024;

pub struct CompileOutcome {
    pub success: bool,
    /// Argument vector to hand to the Sandbox Runner. Populated even on
    /// failure so callers don't need an `Option`.
    pub run_argv: Vec<String>,
    pub diagnostic: Option<String>,
}

/// Write `source` to the workspace and compile it, if the language needs
/// compiling at all.
pub async fn compile(language: Language, source: &str, workspace: &Workspace, timeout_ms: u32) -> Result<CompileOutcome> {
    let spec = LanguageSpec::for_language(language);
    let source_path = workspace.source_path(spec.source_file);
    tokio::fs::write(&source_path, source).await.map_err(JudgeError::Spawn)?;

    let exe_path = workspace.exe_path();
    let exe_str = exe_path.to_string_lossy().to_string();
    let run_argv = spec.run_argv(&exe_str);

    let Some(compile_argv) = spec.compile_argv(&exe_str) else {
        return Ok(CompileOutcome { success: true, run_argv, diagnostic: None });
    };

    let mut command = Command::new(&compile_argv[0]);
    command
        .args(&compile_argv[1..])
        .current_dir(workspace.root())
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    let child = command.spawn().map_err(JudgeError::Spawn)?;

    let output = match timeout(Duration::from_millis(timeout_ms as u64), child.wait_with_output()).await {
        Ok(result) => result.map_err(JudgeError::Spawn)?,
        Err(_elapsed) => {
            return Ok(CompileOutcome {
                success: false,
                run_argv,
                diagnostic: Some("compilation timed out".to_string()),
            });
        }
    };

    if output.status.success() {
        Ok(CompileOutcome { success: true, run_argv, diagnostic: None })
    } else {
        let mut combined = output.stderr;
        combined.extend_from_slice(&output.stdout);
        Ok(CompileOutcome { success: false, run_argv, diagnostic: Some(truncate_diagnostic(&combined)) })
    }
}

fn truncate_diagnostic(raw: &[u8]) -> String {
    let truncated = &raw[..raw.len().min(DIAGNOSTIC_LIMIT_BYTES)];
    String::from_utf8_lossy(truncated).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diagnostic_is_truncated_to_64kib() {
        let raw = vec![b'x'; 200_000];
        let truncated = truncate_diagnostic(&raw);
        assert_eq!(truncated.len(), DIAGNOSTIC_LIMIT_BYTES);
    }

    #[test]
    fn short_diagnostic_is_untouched() {
        let truncated = truncate_diagnostic(b"error: expected ';'");
        assert_eq!(truncated, "error: expected ';'");
    }

    #[tokio::test]
    async fn python_compile_step_always_succeeds() {
        let root = tempfile::tempdir().unwrap();
        let ws = Workspace::open(root.path(), uuid::Uuid::new_v4()).unwrap();
        let outcome = compile(Language::Python, "print('hi')", &ws, 15_000).await.unwrap();
        assert!(outcome.success);
        assert_eq!(outcome.run_argv, vec!["python3", "main.py"]);
    }
}
