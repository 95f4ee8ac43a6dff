//! Best-effort syscall filtering.
//!
//! Default-deny, with a whitelist sufficient for batch programs: I/O on
//! already-open descriptors, memory management, process exit, time
//! queries, stat. Anything else kills the process with SIGSYS, which the
//! runner classifies as `Runtime Error (Forbidden Syscall)`.
//!
//! When libseccomp is unavailable on the host, callers skip installation
//! entirely; that degradation is logged by the caller, not here.

use libseccomp::{ScmpAction, ScmpFilterContext, ScmpSyscall};

const SYSCALL_WHITELIST: &[&str] = &[
    "read",
    "write",
    "readv",
    "writev",
    "pread64",
    "pwrite64",
    "lseek",
    "close",
    "fstat",
    "newfstatat",
    "stat",
    "access",
    "brk",
    "mmap",
    "munmap",
    "mprotect",
    "arch_prctl",
    "exit",
    "exit_group",
    "clock_gettime",
    "gettimeofday",
    "rt_sigreturn",
    "rt_sigaction",
    "rt_sigprocmask",
    "futex",
    "getrandom",
    "set_tid_address",
    "set_robust_list",
    "rseq",
    "restart_syscall",
];

/// Install a default-deny filter allowing only [`SYSCALL_WHITELIST`].
/// Must be called in the child, after `fork` and before `execve`.
pub fn install_default_filter() -> anyhow::Result<()> {
    let mut filter = ScmpFilterContext::new(ScmpAction::KillProcess)?;

    for name in SYSCALL_WHITELIST {
        let syscall = ScmpSyscall::from_name(name)?;
        filter.add_rule(ScmpAction::Allow, syscall)?;
    }

    // execve itself must be allowed once, to start the target program.
    let execve = ScmpSyscall::from_name("execve")?;
    filter.add_rule(ScmpAction::Allow, execve)?;

    filter.load()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn whitelist_does_not_include_networking_or_process_creation() {
        for forbidden in ["socket", "connect", "fork", "clone", "execveat", "ptrace"] {
            assert!(!SYSCALL_WHITELIST.contains(&forbidden));
        }
    }
}
