//! Fork/exec/monitor/wait loop implementing the sandbox contract.
//!
//! Fork and wait are blocking syscalls; the whole thing runs inside
//! `spawn_blocking` so it never parks a tokio worker thread.

use std::fs;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use nix::sys::signal::{kill, Signal};
use nix::sys::wait::{waitpid, WaitPidFlag, WaitStatus};
use nix::unistd::{fork, ForkResult, Pid};
use tracing::{info, warn};

use crate::config::JudgeConfig;

use super::cgroup::CgroupScope;
use super::child::exec_in_child;
use super::types::{CommandSpec, RunLimits, RunOutcome, RunStatus, Runner};

/// Whether `libseccomp` filtering could be loaded on this host. Probed
/// once; a host without seccomp support still judges correctly, it just
/// can never produce `Runtime Error (Forbidden Syscall)`.
fn seccomp_available() -> bool {
    use libseccomp::{ScmpAction, ScmpFilterContext};
    ScmpFilterContext::new(ScmpAction::Allow).is_ok()
}

#[derive(Clone)]
pub struct SandboxRunner {
    cgroup_cpu_root: PathBuf,
    cgroup_memory_root: PathBuf,
    monitor_interval_ms: u32,
    wall_time_factor: u32,
    seccomp_enabled: bool,
}

impl SandboxRunner {
    pub fn new(config: &JudgeConfig) -> Self {
        let seccomp_enabled = seccomp_available();
        if !seccomp_enabled {
            warn!("seccomp unavailable on this host; Runtime Error (Forbidden Syscall) is unreachable");
        }
        Self {
            cgroup_cpu_root: config.cgroup_cpu_root.clone(),
            cgroup_memory_root: config.cgroup_memory_root.clone(),
            monitor_interval_ms: config.monitor_interval_ms,
            wall_time_factor: config.wall_time_factor,
            seccomp_enabled,
        }
    }
}

#[async_trait]
impl Runner for SandboxRunner {
    async fn run(&self, spec: CommandSpec, limits: RunLimits) -> RunOutcome {
        let this = self.clone();
        tokio::task::spawn_blocking(move || this.run_blocking(spec, limits))
            .await
            .unwrap_or(RunOutcome {
                status: RunStatus::SystemError,
                time_used_ms: 0,
                memory_used_kb: 0,
                return_code: -1,
            })
    }
}

impl SandboxRunner {
    fn run_blocking(&self, spec: CommandSpec, limits: RunLimits) -> RunOutcome {
        let cgroup = match CgroupScope::open(&self.cgroup_cpu_root, &self.cgroup_memory_root, limits.memory_limit_mb) {
            Ok(c) => c,
            Err(e) => {
                warn!(error = %e, "failed to set up cgroup scope");
                return system_error_outcome();
            }
        };

        match unsafe { fork() } {
            Ok(ForkResult::Child) => {
                exec_in_child(&spec, &limits, &cgroup, self.seccomp_enabled);
            }
            Ok(ForkResult::Parent { child, .. }) => self.supervise(child, &cgroup, limits),
            Err(e) => {
                warn!(error = %e, "fork failed");
                system_error_outcome()
            }
        }
    }

    fn supervise(&self, child: Pid, cgroup: &CgroupScope, limits: RunLimits) -> RunOutcome {
        let start = Instant::now();
        let wall_cap = Duration::from_millis(limits.time_limit_ms as u64 * self.wall_time_factor as u64);
        let memory_limit_kb = limits.memory_limit_mb as u64 * 1024;
        let mut peak_rss_kb: u64 = 0;
        let mut killed_for: Option<RunStatus> = None;

        let wait_status = loop {
            match waitpid(child, Some(WaitPidFlag::WNOHANG)) {
                Ok(WaitStatus::StillAlive) => {
                    peak_rss_kb = peak_rss_kb.max(read_rss_kb(child));

                    if peak_rss_kb > memory_limit_kb {
                        let _ = kill(child, Signal::SIGKILL);
                        killed_for = Some(RunStatus::MemoryLimitExceeded);
                    } else if start.elapsed() > wall_cap {
                        let _ = kill(child, Signal::SIGKILL);
                        killed_for = Some(RunStatus::TimeLimitExceeded);
                    } else {
                        std::thread::sleep(Duration::from_millis(self.monitor_interval_ms as u64));
                        continue;
                    }
                    // Reap the child we just killed.
                    match waitpid(child, None) {
                        Ok(status) => break status,
                        Err(e) => {
                            warn!(error = %e, "waitpid after kill failed");
                            return system_error_outcome();
                        }
                    }
                }
                Ok(status) => break status,
                Err(e) => {
                    warn!(error = %e, "waitpid failed");
                    return system_error_outcome();
                }
            }
        };

        let elapsed_ms = start.elapsed().as_millis() as u32;
        peak_rss_kb = peak_rss_kb.max(cgroup.peak_memory_kb());
        info!(pid = %child, elapsed_ms, peak_rss_kb, "sandbox invocation finished");

        classify(wait_status, killed_for, peak_rss_kb, memory_limit_kb, elapsed_ms)
    }
}

fn system_error_outcome() -> RunOutcome {
    RunOutcome { status: RunStatus::SystemError, time_used_ms: 0, memory_used_kb: 0, return_code: -1 }
}

/// Read `VmRSS` for `pid` from procfs, in kilobytes. Returns 0 on any
/// failure (process gone, permissions, kernel without procfs).
fn read_rss_kb(pid: Pid) -> u64 {
    let path = format!("/proc/{pid}/status");
    let Ok(contents) = fs::read_to_string(path) else {
        return 0;
    };
    for line in contents.lines() {
        if let Some(rest) = line.strip_prefix("VmRSS:") {
            if let Some(kb) = rest.trim().split_whitespace().next() {
                return kb.parse().unwrap_or(0);
            }
        }
    }
    0
}

/// Pure post-wait classification per the sandbox's exit-classification
/// table. Kept separate from [`SandboxRunner::supervise`] so it can be
/// unit tested without forking a real process.
fn classify(
    status: WaitStatus,
    killed_for: Option<RunStatus>,
    peak_memory_kb: u64,
    memory_limit_kb: u64,
    elapsed_ms: u32,
) -> RunOutcome {
    if let Some(run_status) = killed_for {
        return RunOutcome { status: run_status, time_used_ms: elapsed_ms, memory_used_kb: peak_memory_kb as u32, return_code: -1 };
    }

    match status {
        WaitStatus::Exited(_, code) => {
            let run_status = if code == 0 { RunStatus::Ran } else { RunStatus::RuntimeErrorNonZeroExit };
            RunOutcome { status: run_status, time_used_ms: elapsed_ms, memory_used_kb: peak_memory_kb as u32, return_code: code }
        }
        WaitStatus::Signaled(_, signal, _) => {
            let run_status = match signal {
                Signal::SIGKILL => {
                    if peak_memory_kb * 10 >= memory_limit_kb * 9 {
                        RunStatus::MemoryLimitExceeded
                    } else {
                        RunStatus::TimeLimitExceeded
                    }
                }
                Signal::SIGSEGV | Signal::SIGBUS | Signal::SIGFPE | Signal::SIGILL => RunStatus::RuntimeErrorSignal,
                Signal::SIGSYS => RunStatus::RuntimeErrorForbiddenSyscall,
                Signal::SIGXFSZ => RunStatus::OutputLimitExceeded,
                _ => RunStatus::RuntimeErrorNonZeroExit,
            };
            RunOutcome { status: run_status, time_used_ms: elapsed_ms, memory_used_kb: peak_memory_kb as u32, return_code: -(signal as i32) }
        }
        _ => RunOutcome { status: RunStatus::SystemError, time_used_ms: elapsed_ms, memory_used_kb: peak_memory_kb as u32, return_code: -1 },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nix::sys::signal::Signal;

    fn exited(code: i32) -> WaitStatus {
        WaitStatus::Exited(Pid::from_raw(1), code)
    }

    fn signaled(signal: Signal) -> WaitStatus {
        WaitStatus::Signaled(Pid::from_raw(1), signal, false)
    }

    #[test]
    fn exit_zero_is_ran() {
        let outcome = classify(exited(0), None, 100, 65536, 5);
        assert_eq!(outcome.status, RunStatus::Ran);
    }

    #[test]
    fn nonzero_exit_is_runtime_error() {
        let outcome = classify(exited(1), None, 100, 65536, 5);
        assert_eq!(outcome.status, RunStatus::RuntimeErrorNonZeroExit);
        assert_eq!(outcome.return_code, 1);
    }

    #[test]
    fn killed_for_memory_beats_wait_status() {
        let outcome = classify(exited(0), Some(RunStatus::MemoryLimitExceeded), 65536, 65536, 1000);
        assert_eq!(outcome.status, RunStatus::MemoryLimitExceeded);
    }

    #[test]
    fn sigsegv_is_runtime_error_signal() {
        let outcome = classify(signaled(Signal::SIGSEGV), None, 100, 65536, 5);
        assert_eq!(outcome.status, RunStatus::RuntimeErrorSignal);
    }

    #[test]
    fn sigsys_is_forbidden_syscall() {
        let outcome = classify(signaled(Signal::SIGSYS), None, 100, 65536, 5);
        assert_eq!(outcome.status, RunStatus::RuntimeErrorForbiddenSyscall);
    }

    #[test]
    fn sigkill_near_memory_limit_is_mle() {
        let outcome = classify(signaled(Signal::SIGKILL), None, 60000, 65536, 5);
        assert_eq!(outcome.status, RunStatus::MemoryLimitExceeded);
    }

    #[test]
    fn sigkill_away_from_memory_limit_is_tle() {
        let outcome = classify(signaled(Signal::SIGKILL), None, 1000, 65536, 1000);
        assert_eq!(outcome.status, RunStatus::TimeLimitExceeded);
    }

    #[test]
    fn sigxfsz_is_output_limit_exceeded() {
        let outcome = classify(signaled(Signal::SIGXFSZ), None, 100, 65536, 5);
        assert_eq!(outcome.status, RunStatus::OutputLimitExceeded);
    }
}
