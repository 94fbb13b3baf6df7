//! Child output routing and process results.

use crate::error::LaunchError;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Result of a child that ran to a terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessResult {
    /// Exit code, if the child exited normally.
    ///
    /// `None` when the child was ended by a signal.
    pub exit_code: Option<i32>,

    /// The child hit the timeout and was terminated.
    pub timed_out: bool,
}

impl ProcessResult {
    /// Check if the child exited on its own with code 0.
    pub fn success(&self) -> bool {
        !self.timed_out && self.exit_code == Some(0)
    }
}

/// Streams the launcher forwards child output to when no file is given.
pub struct Console {
    pub stdout: Box<dyn Write + Send>,
    pub stderr: Box<dyn Write + Send>,
}

impl Console {
    /// The launcher's own standard streams.
    pub fn inherited() -> Self {
        Self {
            stdout: Box::new(std::io::stdout()),
            stderr: Box::new(std::io::stderr()),
        }
    }

    /// Arbitrary writers, e.g. in-memory buffers.
    pub fn new(stdout: impl Write + Send + 'static, stderr: impl Write + Send + 'static) -> Self {
        Self {
            stdout: Box::new(stdout),
            stderr: Box::new(stderr),
        }
    }
}

impl Default for Console {
    fn default() -> Self {
        Self::inherited()
    }
}

impl std::fmt::Debug for Console {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Console").finish_non_exhaustive()
    }
}

/// Destination for one child stream, written one line at a time.
pub struct OutputTarget<'a> {
    writer: Box<dyn Write + Send + 'a>,
    path: Option<PathBuf>,
}

impl<'a> OutputTarget<'a> {
    /// Create (or truncate) `path` and write lines there.
    ///
    /// # Errors
    ///
    /// `LaunchError::OutputFile` if the file cannot be created.
    pub fn file(path: &Path) -> Result<Self, LaunchError> {
        let file = File::create(path).map_err(|source| LaunchError::OutputFile {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self {
            writer: Box::new(BufWriter::new(file)),
            path: Some(path.to_path_buf()),
        })
    }

    /// Forward lines to an inherited stream.
    pub fn inherit(stream: &'a mut (dyn Write + Send)) -> Self {
        Self {
            writer: Box::new(stream),
            path: None,
        }
    }

    /// File path or, for an inherited stream, the given fallback.
    ///
    /// `Some(path)` resolves to a file target; `None` to `fallback`.
    pub fn file_or(path: Option<&Path>, fallback: &'a mut (dyn Write + Send)) -> Result<Self, LaunchError> {
        match path {
            Some(path) => Self::file(path),
            None => Ok(Self::inherit(fallback)),
        }
    }

    /// The redirection file, if any.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Write one line followed by a newline.
    pub fn write_line(&mut self, line: &str) -> std::io::Result<()> {
        writeln!(self.writer, "{line}")
    }

    /// Flush and release the target.
    pub fn finish(mut self) -> Result<(), LaunchError> {
        self.writer.flush().map_err(LaunchError::OutputWrite)
    }
}
