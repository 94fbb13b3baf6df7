//! Scope policy compilation.
//!
//! [`PolicyCompiler`] turns [`SandboxOptions`] into an ordered list of scope
//! declarations and feeds them to a [`PolicySink`]. The order is fixed:
//!
//! 1. root scope, per [`Posture`]
//! 2. working directory, denied
//! 3. executable, read-only
//! 4. `readonly_paths`, in order
//! 5. `writable_paths`, in order
//! 6. `blocked_paths`, in order
//!
//! The enforcing engine resolves a path with the most specific covering
//! scope, later declarations winning at equal specificity. [`ScopePolicy`]
//! implements the same rule so a compiled policy can be queried directly.

use crate::error::{LaunchError, UsageError};
use crate::options::SandboxOptions;
use crate::scope::{AccessMask, Accessibility, PolicyScope, ScopePath};
use std::io::Write;
use std::path::Path;
use std::str::FromStr;

/// Receives scope declarations in compilation order.
///
/// Implemented by whatever turns declarations into enforcement.
pub trait PolicySink {
    /// Declare one scope.
    ///
    /// # Errors
    ///
    /// `LaunchError::PolicyRejected` if the sink cannot accept the scope.
    fn declare_scope(
        &mut self,
        path: ScopePath,
        mask: AccessMask,
        access: Accessibility,
    ) -> Result<(), LaunchError>;
}

/// Default stance for paths no explicit scope covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Posture {
    /// Deny everything, then open exceptions (default).
    #[default]
    DenyAll,
    /// Allow reading everything, mask writes.
    ReadOnly,
}

impl Posture {
    /// Accessibility of the root scope.
    pub fn root_access(self) -> Accessibility {
        match self {
            Posture::DenyAll => Accessibility::Denied,
            Posture::ReadOnly => Accessibility::ReadOnly,
        }
    }
}

impl FromStr for Posture {
    type Err = UsageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "deny" => Ok(Posture::DenyAll),
            "read" => Ok(Posture::ReadOnly),
            _ => Err(UsageError::UnknownPosture {
                value: s.to_string(),
            }),
        }
    }
}

/// An ordered list of scope declarations.
///
/// Collects declarations as a [`PolicySink`] and answers access queries
/// with longest-prefix, most-recent-wins semantics.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScopePolicy {
    scopes: Vec<PolicyScope>,
}

impl ScopePolicy {
    /// Create an empty policy. Nothing is accessible until a scope is declared.
    pub fn new() -> Self {
        Self::default()
    }

    /// Declarations in the order they were made.
    pub fn scopes(&self) -> &[PolicyScope] {
        &self.scopes
    }

    /// Replay every declaration into another sink, in order.
    pub fn replay(&self, sink: &mut dyn PolicySink) -> Result<(), LaunchError> {
        for scope in &self.scopes {
            sink.declare_scope(scope.path.clone(), scope.mask, scope.access)?;
        }
        Ok(())
    }

    /// Effective access for `path`.
    ///
    /// Covering scopes are applied from least to most specific, in
    /// declaration order at equal specificity. A scope with
    /// [`AccessMask::All`] replaces what it inherits; one with
    /// [`AccessMask::Nothing`] only adds to it.
    pub fn access(&self, path: &Path) -> Accessibility {
        let mut covering: Vec<(usize, usize, &PolicyScope)> = self
            .scopes
            .iter()
            .enumerate()
            .filter(|(_, scope)| scope.path.covers(path))
            .map(|(order, scope)| (scope.path.specificity(), order, scope))
            .collect();
        covering.sort_by_key(|(specificity, order, _)| (*specificity, *order));

        covering
            .into_iter()
            .fold(Accessibility::Denied, |inherited, (_, _, scope)| match scope.mask {
                AccessMask::All => scope.access,
                AccessMask::Nothing => inherited.max(scope.access),
            })
    }
}

impl PolicySink for ScopePolicy {
    fn declare_scope(
        &mut self,
        path: ScopePath,
        mask: AccessMask,
        access: Accessibility,
    ) -> Result<(), LaunchError> {
        self.scopes.push(PolicyScope { path, mask, access });
        Ok(())
    }
}

/// Compiles sandbox options into scope declarations.
#[derive(Debug, Clone, Copy, Default)]
pub struct PolicyCompiler {
    posture: Posture,
}

impl PolicyCompiler {
    /// Create a compiler with the given root posture.
    pub fn new(posture: Posture) -> Self {
        Self { posture }
    }

    /// The configured posture.
    pub fn posture(&self) -> Posture {
        self.posture
    }

    /// Compile `options` into a [`ScopePolicy`].
    ///
    /// See [`compile_into`](Self::compile_into).
    pub fn compile(
        &self,
        options: &SandboxOptions,
        executable: &Path,
        working_dir: &Path,
        echo: Option<&mut dyn Write>,
    ) -> Result<ScopePolicy, LaunchError> {
        let mut policy = ScopePolicy::new();
        self.compile_into(options, executable, working_dir, &mut policy, echo)?;
        Ok(policy)
    }

    /// Emit the declarations for `options` into `sink`.
    ///
    /// When `options.debug` is set and `echo` is given, every declaration is
    /// also written to `echo` as `<tag>: <path>`, one per line.
    ///
    /// # Errors
    ///
    /// - whatever the sink returns
    /// - `LaunchError::OutputWrite` if the echo stream fails
    pub fn compile_into(
        &self,
        options: &SandboxOptions,
        executable: &Path,
        working_dir: &Path,
        sink: &mut dyn PolicySink,
        echo: Option<&mut dyn Write>,
    ) -> Result<(), LaunchError> {
        let mut emitter = Emitter {
            sink,
            echo: if options.debug { echo } else { None },
            count: 0,
        };

        emitter.declare(PolicyScope::root(self.posture.root_access()))?;

        // Nothing beside the child is reachable unless reopened below.
        emitter.declare(PolicyScope::path(working_dir, Accessibility::Denied))?;

        emitter.declare(PolicyScope::path(executable, Accessibility::ReadOnly))?;

        for path in &options.readonly_paths {
            emitter.declare(PolicyScope::path(path, Accessibility::ReadOnly))?;
        }
        for path in &options.writable_paths {
            emitter.declare(PolicyScope::path(path, Accessibility::ReadWrite))?;
        }
        for path in &options.blocked_paths {
            emitter.declare(PolicyScope::path(path, Accessibility::Denied))?;
        }

        tracing::debug!(
            posture = ?self.posture,
            scopes = emitter.count,
            "compiled file access policy"
        );
        Ok(())
    }
}

struct Emitter<'s, 'e> {
    sink: &'s mut dyn PolicySink,
    echo: Option<&'e mut dyn Write>,
    count: usize,
}

impl Emitter<'_, '_> {
    fn declare(&mut self, scope: PolicyScope) -> Result<(), LaunchError> {
        if let Some(echo) = self.echo.as_mut() {
            writeln!(echo, "{scope}").map_err(LaunchError::OutputWrite)?;
        }
        tracing::trace!(access = %scope.access, "declare scope {}", scope.path);
        self.sink.declare_scope(scope.path, scope.mask, scope.access)?;
        self.count += 1;
        Ok(())
    }
}
