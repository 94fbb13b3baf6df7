//! # fs_jail
//!
//! Run one process under a hierarchical file-system access policy.
//!
//! `fs_jail` turns a command-line description of what a process may read,
//! write, or never touch into an ordered list of scope declarations, then
//! launches the process with a timeout, graceful-then-forced termination,
//! and stdout/stderr routing. Enforcement of the policy belongs to the
//! [`ProcessRunner`] and the [`PolicySink`] it feeds.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use fs_jail::{parse_args, Launcher, ParseOutcome, PathResolver};
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let args: Vec<String> = ["-r", "/usr/share/dict", "-w", "/tmp/out", "-T", "30", "--", "/bin/cat", "words"]
//!     .iter()
//!     .map(|s| s.to_string())
//!     .collect();
//!
//! let resolver = PathResolver::from_current_dir()?;
//! if let ParseOutcome::Run(options) = parse_args(&args, &resolver)? {
//!     let result = Launcher::host().launch_blocking(&options)?;
//!     println!("exit code: {:?}, timed out: {}", result.exit_code, result.timed_out);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Precedence
//!
//! A path's effective access comes from the most specific scope covering
//! it; at equal specificity the later declaration wins. Declarations are
//! emitted root first, then the working directory (denied), the executable
//! (read-only), and finally the `-r`, `-w` and `-b` lists in that order.

mod arg_file;
mod canonical;
mod error;
mod launcher;
mod options;
mod output;
mod parser;
mod policy;
mod quote;
mod runner;
mod scope;

// Public API
pub use arg_file::expand_arg_files;
pub use canonical::{normalize, resolve_executable, PathResolver};
pub use error::{JailError, LaunchError, PathError, UsageError};
pub use launcher::Launcher;
pub use options::SandboxOptions;
pub use output::{Console, OutputTarget, ProcessResult};
pub use parser::{parse_args, parse_or_exit, write_usage, ParseOutcome};
pub use policy::{PolicyCompiler, PolicySink, Posture, ScopePolicy};
pub use quote::{quote_arg_into, quote_args, split_command_line};
pub use runner::{HostRunner, LaunchRequest, LineCallback, ProcessRunner};
pub use scope::{AccessMask, Accessibility, PolicyScope, ScopePath};
