//! Process runner interface and the host implementation.
//!
//! A [`ProcessRunner`] takes a compiled policy plus launch parameters, runs
//! exactly one child, and reports how it ended. Enforcing the policy is the
//! runner's business; the launcher only compiles and hands it over.

use crate::error::LaunchError;
use crate::output::ProcessResult;
use crate::policy::ScopePolicy;
use crate::scope::Accessibility;
use async_trait::async_trait;
use std::path::PathBuf;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::{Child, Command};

/// Receives one line of child output, without its line terminator.
pub type LineCallback<'a> = &'a mut (dyn FnMut(&str) -> std::io::Result<()> + Send);

/// Everything a runner needs to start the child.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchRequest {
    /// Absolute path of the executable.
    pub executable: PathBuf,

    /// Arguments after the executable, quoted into one command line.
    pub command_line: String,

    /// Directory the child starts in.
    pub working_dir: PathBuf,

    /// Compiled file access policy.
    pub policy: ScopePolicy,

    /// Soft-terminate the child after this long.
    pub timeout: Option<Duration>,

    /// Hard-kill this long after the soft terminate. `None` kills at the timeout.
    pub kill_delay: Option<Duration>,
}

/// Runs one child process to completion.
#[async_trait]
pub trait ProcessRunner: Send + Sync {
    /// Start the child described by `request` and wait for it.
    ///
    /// Every line the child writes is passed to the matching callback. The
    /// returned future completes only once the child has exited and both
    /// streams are drained.
    ///
    /// # Errors
    ///
    /// - `LaunchError::ExecutableNotFound` / `SpawnFailed` if the child cannot start
    /// - `LaunchError::PolicyRejected` if the policy cannot be applied
    /// - `LaunchError::OutputWrite` if a callback fails
    /// - `LaunchError::Wait` if the child cannot be waited on
    async fn run(
        &self,
        request: LaunchRequest,
        on_stdout: LineCallback<'_>,
        on_stderr: LineCallback<'_>,
    ) -> Result<ProcessResult, LaunchError>;
}

/// Runs the child directly on the host with tokio.
///
/// The compiled policy is checked for self-consistency (the executable must
/// be readable) and otherwise left to the interception layer the host
/// provides.
#[derive(Debug, Clone, Copy, Default)]
pub struct HostRunner;

#[async_trait]
impl ProcessRunner for HostRunner {
    async fn run(
        &self,
        request: LaunchRequest,
        on_stdout: LineCallback<'_>,
        on_stderr: LineCallback<'_>,
    ) -> Result<ProcessResult, LaunchError> {
        if request.policy.access(&request.executable) == Accessibility::Denied {
            return Err(LaunchError::PolicyRejected {
                reason: format!(
                    "executable {} is not readable under the policy",
                    request.executable.display()
                ),
            });
        }

        let mut cmd = Command::new(&request.executable);
        set_command_line(&mut cmd, &request.command_line);
        cmd.current_dir(&request.working_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        // Own group, so termination also reaches grandchildren holding the pipes.
        #[cfg(unix)]
        cmd.process_group(0);

        tracing::debug!(
            cwd = %request.working_dir.display(),
            scopes = request.policy.scopes().len(),
            "spawning {} {}",
            request.executable.display(),
            request.command_line
        );

        let mut child = cmd.spawn().map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => LaunchError::ExecutableNotFound {
                path: request.executable.clone(),
            },
            _ => LaunchError::SpawnFailed {
                reason: e.to_string(),
            },
        })?;
        let group = child.id();

        let stdout = child.stdout.take().ok_or_else(|| LaunchError::SpawnFailed {
            reason: "stdout not captured".to_string(),
        })?;
        let stderr = child.stderr.take().ok_or_else(|| LaunchError::SpawnFailed {
            reason: "stderr not captured".to_string(),
        })?;

        // Drain both streams while racing the child against the timeout.
        let drain = async {
            tokio::try_join!(
                forward_lines(stdout, on_stdout),
                forward_lines(stderr, on_stderr)
            )
        };
        let wait = wait_with_timeout(&mut child, group, request.timeout, request.kill_delay);
        let (drained, waited) = tokio::join!(drain, wait);

        let (status, timed_out) = waited?;
        drained?;

        tracing::info!(code = ?status.code(), timed_out, "child exited");
        Ok(ProcessResult {
            exit_code: status.code(),
            timed_out,
        })
    }
}

#[cfg(windows)]
fn set_command_line(cmd: &mut Command, command_line: &str) {
    if !command_line.is_empty() {
        cmd.raw_arg(command_line);
    }
}

#[cfg(not(windows))]
fn set_command_line(cmd: &mut Command, command_line: &str) {
    cmd.args(crate::quote::split_command_line(command_line));
}

async fn forward_lines<R>(reader: R, sink: LineCallback<'_>) -> Result<(), LaunchError>
where
    R: AsyncRead + Unpin,
{
    let mut reader = BufReader::new(reader);
    let mut buf = Vec::new();
    loop {
        buf.clear();
        let n = reader
            .read_until(b'\n', &mut buf)
            .await
            .map_err(|e| LaunchError::Wait {
                reason: format!("output read error: {e}"),
            })?;
        if n == 0 {
            return Ok(());
        }

        let line = buf
            .strip_suffix(b"\n")
            .map(|l| l.strip_suffix(b"\r").unwrap_or(l))
            .unwrap_or(&buf);
        sink(&String::from_utf8_lossy(line)).map_err(LaunchError::OutputWrite)?;
    }
}

/// Wait for the child, terminating it if `timeout` elapses first.
///
/// `group` is the child's process group. On timeout the whole group is
/// signalled, and once the child is gone any survivors are killed so the
/// output pipes reach end-of-file.
///
/// Returns the exit status and whether the timeout fired.
async fn wait_with_timeout(
    child: &mut Child,
    group: Option<u32>,
    timeout: Option<Duration>,
    kill_delay: Option<Duration>,
) -> Result<(ExitStatus, bool), LaunchError> {
    let Some(limit) = timeout else {
        return Ok((child.wait().await.map_err(wait_error)?, false));
    };

    if let Ok(status) = tokio::time::timeout(limit, child.wait()).await {
        return Ok((status.map_err(wait_error)?, false));
    }

    tracing::warn!("child still running after {limit:?}, terminating");

    if let Some(delay) = kill_delay {
        if soft_terminate(group) {
            if let Ok(status) = tokio::time::timeout(delay, child.wait()).await {
                let status = status.map_err(wait_error)?;
                hard_kill_group(group);
                return Ok((status, true));
            }
            tracing::warn!("child ignored terminate for {delay:?}, killing");
        }
    }

    hard_kill_group(group);
    if let Err(e) = child.start_kill() {
        // The child may have exited between the timeout and the kill.
        tracing::debug!("kill failed: {e}");
    }
    let status = child.wait().await.map_err(wait_error)?;
    Ok((status, true))
}

/// Send `signal` to every process in `group`.
#[cfg(unix)]
fn signal_group(group: Option<u32>, signal: nix::sys::signal::Signal) -> bool {
    use nix::sys::signal::killpg;
    use nix::unistd::Pid;

    let Some(pgid) = group.and_then(|id| i32::try_from(id).ok()) else {
        return false;
    };
    match killpg(Pid::from_raw(pgid), signal) {
        Ok(()) => true,
        Err(e) => {
            // ESRCH once every member has exited.
            tracing::debug!("{signal:?} to group {pgid} failed: {e}");
            false
        }
    }
}

/// Ask the child's group to exit. Returns `false` where there is no such request.
#[cfg(unix)]
fn soft_terminate(group: Option<u32>) -> bool {
    signal_group(group, nix::sys::signal::Signal::SIGTERM)
}

#[cfg(not(unix))]
fn soft_terminate(_group: Option<u32>) -> bool {
    false
}

#[cfg(unix)]
fn hard_kill_group(group: Option<u32>) {
    signal_group(group, nix::sys::signal::Signal::SIGKILL);
}

#[cfg(not(unix))]
fn hard_kill_group(_group: Option<u32>) {}

fn wait_error(e: std::io::Error) -> LaunchError {
    LaunchError::Wait {
        reason: e.to_string(),
    }
}
