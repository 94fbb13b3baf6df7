//! Scope declarations.
//!
//! A scope is a path plus an access rule covering that path and its whole
//! subtree. The implicit root scope covers the entire file system.

use std::fmt;
use std::path::{Path, PathBuf};

/// Access granted to a subtree.
///
/// Ordered from least to most permissive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Accessibility {
    /// No access at all
    Denied,
    /// Read, no write
    ReadOnly,
    /// Read and write
    ReadWrite,
}

impl Accessibility {
    /// Short tag used when echoing scopes.
    pub fn tag(self) -> &'static str {
        match self {
            Accessibility::ReadOnly => "ro",
            Accessibility::ReadWrite => "rw",
            Accessibility::Denied => "na",
        }
    }
}

impl fmt::Display for Accessibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Accessibility::Denied => write!(f, "blocked"),
            Accessibility::ReadOnly => write!(f, "read-only"),
            Accessibility::ReadWrite => write!(f, "read-write"),
        }
    }
}

/// How a scope combines with the access inherited from enclosing scopes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AccessMask {
    /// Discard inherited access; the scope's own accessibility applies.
    #[default]
    All,
    /// Keep inherited access and add the scope's accessibility to it.
    Nothing,
}

/// What a scope is anchored at.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ScopePath {
    /// The whole file system
    Root,
    /// An absolute path and its subtree
    Path(PathBuf),
}

impl ScopePath {
    /// Whether this scope covers `path`.
    pub fn covers(&self, path: &Path) -> bool {
        match self {
            ScopePath::Root => true,
            ScopePath::Path(prefix) => path.starts_with(prefix),
        }
    }

    /// Number of path components; the root has specificity 0.
    pub fn specificity(&self) -> usize {
        match self {
            ScopePath::Root => 0,
            ScopePath::Path(prefix) => prefix.components().count(),
        }
    }
}

impl fmt::Display for ScopePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScopePath::Root => write!(f, "<root>"),
            ScopePath::Path(path) => write!(f, "{}", path.display()),
        }
    }
}

/// A single declaration handed to the policy sink.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PolicyScope {
    pub path: ScopePath,
    pub mask: AccessMask,
    pub access: Accessibility,
}

impl PolicyScope {
    /// Scope over the whole file system.
    pub fn root(access: Accessibility) -> Self {
        Self {
            path: ScopePath::Root,
            mask: AccessMask::All,
            access,
        }
    }

    /// Scope over `path` and its subtree.
    pub fn path(path: impl Into<PathBuf>, access: Accessibility) -> Self {
        Self {
            path: ScopePath::Path(path.into()),
            mask: AccessMask::All,
            access,
        }
    }
}

impl fmt::Display for PolicyScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.access.tag(), self.path)
    }
}
