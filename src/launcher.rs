//! Launch orchestration.
//!
//! [`Launcher`] ties the pieces together for one invocation: resolve the
//! working directory and executable, compile the policy, open the output
//! targets, quote the command line, and drive the runner to completion.

use crate::canonical::resolve_executable;
use crate::error::LaunchError;
use crate::options::SandboxOptions;
use crate::output::{Console, OutputTarget, ProcessResult};
use crate::policy::{PolicyCompiler, Posture};
use crate::quote::quote_args;
use crate::runner::{HostRunner, LaunchRequest, ProcessRunner};
use std::path::PathBuf;

/// Runs one sandboxed command per [`launch`](Self::launch) call.
///
/// The working directory fallback and the inherited streams are explicit
/// settings; nothing is read from the process environment except when
/// `current_dir` is left unset.
#[derive(Debug)]
pub struct Launcher<R = HostRunner> {
    runner: R,
    compiler: PolicyCompiler,
    current_dir: Option<PathBuf>,
    console: Console,
}

impl Launcher<HostRunner> {
    /// Launcher that runs children on the host.
    pub fn host() -> Self {
        Self::new(HostRunner)
    }
}

impl<R: ProcessRunner> Launcher<R> {
    /// Create a launcher around `runner` with the default deny-all posture.
    pub fn new(runner: R) -> Self {
        Self {
            runner,
            compiler: PolicyCompiler::default(),
            current_dir: None,
            console: Console::inherited(),
        }
    }

    /// Set the root posture of compiled policies.
    pub fn posture(mut self, posture: Posture) -> Self {
        self.compiler = PolicyCompiler::new(posture);
        self
    }

    /// Set the directory used when the options carry no working directory.
    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.current_dir = Some(dir.into());
        self
    }

    /// Set the streams used for unredirected output and debug echo.
    pub fn console(mut self, console: Console) -> Self {
        self.console = console;
        self
    }

    /// The runner.
    pub fn runner(&self) -> &R {
        &self.runner
    }

    /// Run `options.command` to completion under the compiled policy.
    ///
    /// Redirection files are created (or truncated) before the child starts
    /// and are flushed and closed on every path out of this function.
    ///
    /// # Errors
    ///
    /// Any `LaunchError`. A timeout is not an error; check
    /// [`ProcessResult::timed_out`].
    pub async fn launch(&mut self, options: &SandboxOptions) -> Result<ProcessResult, LaunchError> {
        let working_dir = self.working_dir(options)?;
        let executable = resolve_executable(options.program(), &working_dir)?;

        let echo: &mut dyn std::io::Write = &mut *self.console.stderr;
        let policy = self
            .compiler
            .compile(options, &executable, &working_dir, Some(echo))?;

        let request = LaunchRequest {
            executable,
            command_line: quote_args(options.program_args()),
            working_dir,
            policy,
            timeout: options.timeout,
            kill_delay: options.kill_delay,
        };

        tracing::info!(
            timeout = ?request.timeout,
            kill_delay = ?request.kill_delay,
            "launching {}",
            request.executable.display()
        );

        let mut stdout =
            OutputTarget::file_or(options.stdout_path.as_deref(), &mut *self.console.stdout)?;
        let mut stderr =
            match OutputTarget::file_or(options.stderr_path.as_deref(), &mut *self.console.stderr) {
                Ok(target) => target,
                Err(e) => {
                    if let Err(flush) = stdout.finish() {
                        tracing::warn!("failed to close stdout target: {flush}");
                    }
                    return Err(e);
                }
            };

        let result = {
            let mut on_stdout = |line: &str| stdout.write_line(line);
            let mut on_stderr = |line: &str| stderr.write_line(line);
            self.runner
                .run(request, &mut on_stdout, &mut on_stderr)
                .await
        };

        let closed_stdout = stdout.finish();
        let closed_stderr = stderr.finish();

        let result = result?;
        closed_stdout?;
        closed_stderr?;

        if result.timed_out {
            tracing::warn!(code = ?result.exit_code, "child was terminated after timeout");
        }
        Ok(result)
    }

    /// Blocking form of [`launch`](Self::launch).
    ///
    /// Creates a single-threaded runtime; must not be called from within an
    /// async context.
    pub fn launch_blocking(&mut self, options: &SandboxOptions) -> Result<ProcessResult, LaunchError> {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| LaunchError::SpawnFailed {
                reason: format!("failed to create runtime: {e}"),
            })?;
        rt.block_on(self.launch(options))
    }

    fn working_dir(&self, options: &SandboxOptions) -> Result<PathBuf, LaunchError> {
        if let Some(dir) = options.working_dir.as_ref().or(self.current_dir.as_ref()) {
            return Ok(dir.clone());
        }
        std::env::current_dir().map_err(|e| LaunchError::SpawnFailed {
            reason: format!("cannot determine current directory: {e}"),
        })
    }
}
