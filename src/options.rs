//! Compiled sandbox configuration.

use std::path::PathBuf;
use std::time::Duration;

/// Everything one invocation needs to compile a policy and launch the child.
///
/// Built once by the option parser and consumed immutably afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SandboxOptions {
    /// Working directory (`-W`).
    ///
    /// If `None`, the launcher's current directory is used.
    pub working_dir: Option<PathBuf>,

    /// Time after which the child is asked to terminate (`-T`).
    ///
    /// If `None`, the child runs until completion.
    pub timeout: Option<Duration>,

    /// Grace period between the soft terminate and the hard kill (`-t`).
    ///
    /// If `None`, the hard kill follows the timeout immediately.
    /// Only meaningful when `timeout` is set.
    pub kill_delay: Option<Duration>,

    /// Where to redirect child stdout (`-l`).
    pub stdout_path: Option<PathBuf>,

    /// Where to redirect child stderr (`-L`).
    pub stderr_path: Option<PathBuf>,

    /// Subtrees readable by the child (`-r`), in order given.
    pub readonly_paths: Vec<PathBuf>,

    /// Subtrees readable and writable by the child (`-w`), in order given.
    pub writable_paths: Vec<PathBuf>,

    /// Subtrees the child may not touch at all (`-b`), in order given.
    pub blocked_paths: Vec<PathBuf>,

    /// Echo every compiled scope to the error stream (`-D`).
    pub debug: bool,

    /// Executable followed by its arguments. Never empty.
    pub command: Vec<String>,
}

impl SandboxOptions {
    /// Create options that run `command` with every other setting at its default.
    pub fn new(command: Vec<String>) -> Self {
        Self {
            working_dir: None,
            timeout: None,
            kill_delay: None,
            stdout_path: None,
            stderr_path: None,
            readonly_paths: Vec::new(),
            writable_paths: Vec::new(),
            blocked_paths: Vec::new(),
            debug: false,
            command,
        }
    }

    /// The executable as given (`command[0]`).
    pub fn program(&self) -> &str {
        self.command.first().map(String::as_str).unwrap_or_default()
    }

    /// Arguments passed to the executable (`command[1..]`).
    pub fn program_args(&self) -> &[String] {
        self.command.get(1..).unwrap_or_default()
    }

    /// Set the working directory.
    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    /// Set the timeout and optional kill delay.
    pub fn with_timeout(mut self, timeout: Duration, kill_delay: Option<Duration>) -> Self {
        self.timeout = Some(timeout);
        self.kill_delay = kill_delay;
        self
    }

    /// Redirect child stdout to a file.
    pub fn with_stdout_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.stdout_path = Some(path.into());
        self
    }

    /// Redirect child stderr to a file.
    pub fn with_stderr_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.stderr_path = Some(path.into());
        self
    }

    /// Add a read-only subtree.
    pub fn with_readonly(mut self, path: impl Into<PathBuf>) -> Self {
        self.readonly_paths.push(path.into());
        self
    }

    /// Add a read/write subtree.
    pub fn with_writable(mut self, path: impl Into<PathBuf>) -> Self {
        self.writable_paths.push(path.into());
        self
    }

    /// Add a blocked subtree.
    pub fn with_blocked(mut self, path: impl Into<PathBuf>) -> Self {
        self.blocked_paths.push(path.into());
        self
    }

    /// Enable scope echoing.
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }
}
