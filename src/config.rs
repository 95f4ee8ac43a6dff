//! Judge configuration.
//!
//! Recognized options are a closed set (see the config table in the judging
//! core design). Everything else - HTTP, auth, the problem/contest data
//! model - is configured by the surrounding service, not here.

use std::path::PathBuf;

/// Judge-core configuration, loaded from environment variables.
#[derive(Debug, Clone)]
pub struct JudgeConfig {
    /// Base directory for per-submission workspaces.
    pub workspace_root: PathBuf,
    /// Mount path for the CPU cgroup controller.
    pub cgroup_cpu_root: PathBuf,
    /// Mount path for the memory cgroup controller.
    pub cgroup_memory_root: PathBuf,
    /// Compile wall-clock cap, in milliseconds.
    pub compile_timeout_ms: u32,
    /// Monitoring tick interval, in milliseconds.
    pub monitor_interval_ms: u32,
    /// Multiplier on the problem time limit used for the hard kill.
    pub wall_time_factor: u32,
    /// File-size rlimit placed on sandboxed children, in bytes.
    pub output_size_limit_bytes: u64,
}

impl Default for JudgeConfig {
    fn default() -> Self {
        Self {
            workspace_root: PathBuf::from("/tmp/judge-workspaces"),
            cgroup_cpu_root: PathBuf::from("/sys/fs/cgroup/cpu/judge"),
            cgroup_memory_root: PathBuf::from("/sys/fs/cgroup/memory/judge"),
            compile_timeout_ms: 15_000,
            monitor_interval_ms: 10,
            wall_time_factor: 2,
            output_size_limit_bytes: 64 * 1024 * 1024,
        }
    }
}

impl JudgeConfig {
    /// Load configuration, falling back to defaults for anything unset.
    pub fn from_env() -> Self {
        let default = Self::default();

        Self {
            workspace_root: env_path("JUDGE_WORKSPACE_ROOT", default.workspace_root),
            cgroup_cpu_root: env_path("JUDGE_CGROUP_CPU_ROOT", default.cgroup_cpu_root),
            cgroup_memory_root: env_path("JUDGE_CGROUP_MEMORY_ROOT", default.cgroup_memory_root),
            compile_timeout_ms: env_u32("JUDGE_COMPILE_TIMEOUT_MS", default.compile_timeout_ms),
            monitor_interval_ms: env_u32(
                "JUDGE_MONITOR_INTERVAL_MS",
                default.monitor_interval_ms,
            ),
            wall_time_factor: env_u32("JUDGE_WALL_TIME_FACTOR", default.wall_time_factor),
            output_size_limit_bytes: env_u64(
                "JUDGE_OUTPUT_SIZE_LIMIT_BYTES",
                default.output_size_limit_bytes,
            ),
        }
    }
}

fn env_path(key: &str, default: PathBuf) -> PathBuf {
    std::env::var(key).map(PathBuf::from).unwrap_or(default)
}

fn env_u32(key: &str, default: u32) -> u32 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_u64(key: &str, default: u64) -> u64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
