//! Code that runs inside the forked child, between `fork` and `execve`.

use std::ffi::CString;
use std::fs::{File, OpenOptions};
use std::os::unix::io::AsRawFd;

use nix::sys::resource::{setrlimit, Resource};
use nix::unistd::{chdir, dup2, execvpe, Pid};

use super::cgroup::CgroupScope;
use super::seccomp;
use super::types::{CommandSpec, RunLimits};

/// Never returns on success: `execve` replaces the process image. On
/// failure, writes a diagnostic to stderr and exits with a distinct code
/// the parent recognizes as a pre-exec setup failure.
pub fn exec_in_child(spec: &CommandSpec, limits: &RunLimits, cgroup: &CgroupScope, seccomp_enabled: bool) -> ! {
    if let Err(e) = setup(spec, limits, cgroup, seccomp_enabled) {
        eprintln!("sandbox child setup failed: {e}");
        std::process::exit(127);
    }
    unreachable!("setup() only returns on error");
}

fn setup(spec: &CommandSpec, limits: &RunLimits, cgroup: &CgroupScope, seccomp_enabled: bool) -> anyhow::Result<()> {
    cgroup.join(Pid::this())?;

    let stack_bytes = limits.memory_limit_mb as u64 * 1024 * 1024;
    setrlimit(Resource::RLIMIT_STACK, stack_bytes, stack_bytes)?;

    setrlimit(Resource::RLIMIT_FSIZE, limits.output_size_limit_bytes, limits.output_size_limit_bytes)?;

    redirect_stdio(spec)?;
    chdir(&spec.cwd)?;

    if seccomp_enabled {
        seccomp::install_default_filter()?;
    }

    let argv: Vec<CString> = spec
        .argv
        .iter()
        .map(|a| CString::new(a.as_str()))
        .collect::<Result<_, _>>()?;
    let env: Vec<CString> = Vec::new();
    execvpe(&argv[0], &argv, &env)?;
    unreachable!("execvpe only returns on error, which is mapped by the `?` above");
}

fn redirect_stdio(spec: &CommandSpec) -> anyhow::Result<()> {
    let stdin = File::open(&spec.stdin_path)?;
    let stdout = OpenOptions::new().write(true).create(true).truncate(true).open(&spec.stdout_path)?;
    let stderr = OpenOptions::new().write(true).create(true).truncate(true).open(&spec.stderr_path)?;

    dup2(stdin.as_raw_fd(), 0)?;
    dup2(stdout.as_raw_fd(), 1)?;
    dup2(stderr.as_raw_fd(), 2)?;
    Ok(())
}
