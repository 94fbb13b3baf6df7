//! Path resolution for sandbox options.
//!
//! Paths are made absolute against an explicit base directory and normalized
//! lexically. Symlinks are never followed: the scopes handed to the policy sink
//! name the paths exactly as the caller spelled them.

use crate::error::{LaunchError, PathError};
use std::ffi::OsStr;
use std::path::{Component, Path, PathBuf};

/// Turns command-line path tokens into absolute, normalized paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathResolver {
    base: PathBuf,
}

impl PathResolver {
    /// Create a resolver that anchors relative paths at `base`.
    ///
    /// `base` is expected to be absolute; a relative base is taken as-is.
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self {
            base: normalize(&base.into()),
        }
    }

    /// Create a resolver anchored at the process's current directory.
    pub fn from_current_dir() -> std::io::Result<Self> {
        Ok(Self::new(std::env::current_dir()?))
    }

    /// The directory relative paths are resolved against.
    pub fn base(&self) -> &Path {
        &self.base
    }

    /// Resolve a path token to an absolute, normalized path.
    ///
    /// # Errors
    ///
    /// - `PathError::Empty` if the token is empty
    /// - `PathError::NulByte` if the token contains `\0`
    pub fn resolve(&self, raw: &str) -> Result<PathBuf, PathError> {
        if raw.is_empty() {
            return Err(PathError::Empty);
        }
        if raw.contains('\0') {
            return Err(PathError::NulByte {
                path: raw.to_string(),
            });
        }

        let path = Path::new(raw);
        if path.is_absolute() {
            Ok(normalize(path))
        } else {
            Ok(normalize(&self.base.join(path)))
        }
    }
}

/// Remove `.` and `..` components without touching the file system.
///
/// `..` at the root stays at the root.
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Prefix(prefix) => out.push(prefix.as_os_str()),
            Component::RootDir => out.push(component.as_os_str()),
            Component::CurDir => {}
            Component::ParentDir => {
                if !matches!(
                    out.components().next_back(),
                    None | Some(Component::RootDir) | Some(Component::Prefix(_))
                ) {
                    out.pop();
                }
            }
            Component::Normal(name) => out.push(name),
        }
    }
    out
}

/// Resolve the executable named by `command[0]`.
///
/// - A bare name (no path separator) is looked up on `PATH`.
/// - Anything else is resolved against `working_dir`.
///
/// # Errors
///
/// `LaunchError::ExecutableNotFound` if the name is not on `PATH`, or the
/// resolved path does not exist.
pub fn resolve_executable(program: &str, working_dir: &Path) -> Result<PathBuf, LaunchError> {
    let not_found = || LaunchError::ExecutableNotFound {
        path: PathBuf::from(program),
    };

    if program.is_empty() || program.contains('\0') {
        return Err(not_found());
    }

    if is_bare_name(program) {
        let found = which::which(program).map_err(|err| {
            tracing::debug!("PATH lookup for {program} failed: {err}");
            not_found()
        })?;
        return Ok(normalize(&found));
    }

    let resolved = PathResolver::new(working_dir)
        .resolve(program)
        .map_err(|_| not_found())?;
    if !resolved.exists() {
        return Err(LaunchError::ExecutableNotFound { path: resolved });
    }
    Ok(resolved)
}

fn is_bare_name(program: &str) -> bool {
    matches!(
        Path::new(program).components().collect::<Vec<_>>().as_slice(),
        [Component::Normal(name)] if *name == OsStr::new(program)
    )
}
