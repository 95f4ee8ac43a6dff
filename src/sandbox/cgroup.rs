//! Per-invocation cgroup v1 scope: CPU quota pinned to one core-equivalent,
//! a hard memory ceiling, and the kernel's own peak-usage counter.
//!
//! Directory names embed a freshly generated 128-bit token so two workers
//! never collide, even on queue-delivery retries of the same submission.

use std::fs;
use std::path::PathBuf;

use nix::unistd::Pid;
use tracing::warn;
use uuid::Uuid;

use crate::error::{JudgeError, Result};

const CPU_PERIOD_US: u64 = 100_000;
const CPU_QUOTA_US: u64 = 100_000;

pub struct CgroupScope {
    cpu_dir: PathBuf,
    memory_dir: PathBuf,
}

impl CgroupScope {
    /// Create the CPU and memory cgroups for one sandbox invocation.
    pub fn open(cpu_root: &std::path::Path, memory_root: &std::path::Path, memory_limit_mb: u32) -> Result<Self> {
        let token = Uuid::new_v4();
        let name = format!("judge-{token}");
        let cpu_dir = cpu_root.join(&name);
        let memory_dir = memory_root.join(&name);

        fs::create_dir_all(&cpu_dir)
            .map_err(|e| JudgeError::Cgroup(format!("failed to create {cpu_dir:?}: {e}")))?;
        fs::create_dir_all(&memory_dir)
            .map_err(|e| JudgeError::Cgroup(format!("failed to create {memory_dir:?}: {e}")))?;

        write_file(&cpu_dir.join("cpu.cfs_period_us"), &CPU_PERIOD_US.to_string())?;
        write_file(&cpu_dir.join("cpu.cfs_quota_us"), &CPU_QUOTA_US.to_string())?;

        let limit_bytes = memory_limit_mb as u64 * 1024 * 1024;
        write_file(&memory_dir.join("memory.limit_in_bytes"), &limit_bytes.to_string())?;

        Ok(Self { cpu_dir, memory_dir })
    }

    /// Add `pid` to both control groups. Must run before the child execs.
    pub fn join(&self, pid: Pid) -> Result<()> {
        write_file(&self.cpu_dir.join("cgroup.procs"), &pid.to_string())?;
        write_file(&self.memory_dir.join("cgroup.procs"), &pid.to_string())?;
        Ok(())
    }

    /// Peak resident memory observed by the kernel across the cgroup's
    /// lifetime, in kilobytes.
    pub fn peak_memory_kb(&self) -> u64 {
        read_u64(&self.memory_dir.join("memory.max_usage_in_bytes"))
            .map(|bytes| bytes / 1024)
            .unwrap_or(0)
    }
}

impl Drop for CgroupScope {
    fn drop(&mut self) {
        for dir in [&self.cpu_dir, &self.memory_dir] {
            if let Err(e) = fs::remove_dir(dir) {
                if e.kind() != std::io::ErrorKind::NotFound {
                    warn!(dir = %dir.display(), error = %e, "failed to remove cgroup");
                }
            }
        }
    }
}

fn write_file(path: &std::path::Path, contents: &str) -> Result<()> {
    fs::write(path, contents).map_err(|e| JudgeError::Cgroup(format!("failed to write {path:?}: {e}")))
}

fn read_u64(path: &std::path::Path) -> std::io::Result<u64> {
    let raw = fs::read_to_string(path)?;
    raw.trim()
        .parse()
        .map_err(|_| std::io::Error::new(std::io::ErrorKind::InvalidData, "not a u64"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_creates_sibling_directories_with_limits_applied() {
        let cpu_root = tempfile::tempdir().unwrap();
        let mem_root = tempfile::tempdir().unwrap();
        let scope = CgroupScope::open(cpu_root.path(), mem_root.path(), 256).unwrap();

        let quota = fs::read_to_string(scope.cpu_dir.join("cpu.cfs_quota_us")).unwrap();
        assert_eq!(quota.trim(), "100000");

        let limit = fs::read_to_string(scope.memory_dir.join("memory.limit_in_bytes")).unwrap();
        assert_eq!(limit.trim(), (256u64 * 1024 * 1024).to_string());
    }

    #[test]
    fn two_scopes_never_collide() {
        let cpu_root = tempfile::tempdir().unwrap();
        let mem_root = tempfile::tempdir().unwrap();
        let a = CgroupScope::open(cpu_root.path(), mem_root.path(), 64).unwrap();
        let b = CgroupScope::open(cpu_root.path(), mem_root.path(), 64).unwrap();
        assert_ne!(a.cpu_dir, b.cpu_dir);
    }

    #[test]
    fn drop_removes_the_directories() {
        let cpu_root = tempfile::tempdir().unwrap();
        let mem_root = tempfile::tempdir().unwrap();
        let (cpu_dir, memory_dir) = {
            let scope = CgroupScope::open(cpu_root.path(), mem_root.path(), 64).unwrap();
            (scope.cpu_dir.clone(), scope.memory_dir.clone())
        };
        assert!(!cpu_dir.exists());
        assert!(!memory_dir.exists());
    }
}
