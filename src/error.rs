//! Error types for fs_jail.
//!
//! This module defines three failure categories:
//! - [`UsageError`]: malformed invocation detected while parsing options - never recovered
//! - [`PathError`]: a path could not be turned into an absolute form
//! - [`LaunchError`]: the options were valid but the child could not be run to completion
//!
//! A timed-out child is *not* an error; see [`ProcessResult::timed_out`](crate::ProcessResult).

use std::path::PathBuf;
use thiserror::Error;

/// A path given on the command line could not be resolved.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PathError {
    /// Empty string where a path was expected
    #[error("cannot create absolute path from an empty string")]
    Empty,

    /// Path contains an interior NUL byte
    #[error("cannot create absolute path from '{path}': path contains a NUL byte")]
    NulByte { path: String },
}

/// Malformed invocation.
///
/// Every variant is reported together with the usage text and exit code 1.
#[derive(Debug, Error)]
pub enum UsageError {
    /// Flag letter not recognized
    #[error("Unknown option: {option}")]
    UnknownOption { option: String },

    /// Token before `--` that is not a flag
    #[error("Unknown argument: {argument}")]
    UnknownArgument { argument: String },

    /// Flag that takes a value appeared as the last token
    #[error("Missing value for option {option}")]
    MissingValue { option: String },

    /// `-T` or `-t` value is not an unsigned integer
    #[error("{value} is not valid number: {reason}")]
    InvalidNumber { value: String, reason: String },

    /// Missing `--` or nothing after it
    #[error("Command to sandbox not specified")]
    MissingCommand,

    /// Unknown `FS_JAIL_POSTURE` value
    #[error("Unknown policy posture: {value} (expected 'deny' or 'read')")]
    UnknownPosture { value: String },

    /// `@file` could not be read
    #[error("Cannot read argument file '{}': {source}", path.display())]
    ArgFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Path(#[from] PathError),
}

/// Failure to run the child to completion.
///
/// These are surfaced to the caller as a failed result; the caller decides
/// the exit code.
#[derive(Debug, Error)]
pub enum LaunchError {
    /// Executable could not be located
    #[error("executable not found: {}", path.display())]
    ExecutableNotFound { path: PathBuf },

    /// The process runner refused the compiled policy
    #[error("policy rejected: {reason}")]
    PolicyRejected { reason: String },

    /// Failed to spawn the process
    #[error("failed to spawn process: {reason}")]
    SpawnFailed { reason: String },

    /// A redirection target could not be created
    #[error("cannot open output file {}: {source}", path.display())]
    OutputFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Writing a line of child output failed
    #[error("failed to write child output: {0}")]
    OutputWrite(#[source] std::io::Error),

    /// Waiting on the child failed
    #[error("failed to wait for process: {reason}")]
    Wait { reason: String },
}

/// Combined error type for the parse-and-launch flow.
#[derive(Debug, Error)]
pub enum JailError {
    #[error(transparent)]
    Usage(#[from] UsageError),

    #[error(transparent)]
    Launch(#[from] LaunchError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_usage_messages() {
        let err = UsageError::UnknownOption {
            option: "-x".to_string(),
        };
        assert_eq!(err.to_string(), "Unknown option: -x");

        assert_eq!(
            UsageError::MissingCommand.to_string(),
            "Command to sandbox not specified"
        );
    }

    #[test]
    fn test_path_error_is_transparent() {
        let err = UsageError::from(PathError::Empty);
        assert_eq!(
            err.to_string(),
            "cannot create absolute path from an empty string"
        );
    }
}
