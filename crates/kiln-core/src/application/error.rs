//! Application layer errors.
//!
//! These errors represent failures in orchestration: finding templates,
//! running compiled scripts and nesting includes. Compilation errors are
//! `DomainError` from `crate::domain`.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

use crate::error::{ErrorCategory, KilnError};

/// Where in a template something happened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    /// Template description (path or "given template string").
    pub template: String,
    pub source_line: Option<usize>,
    pub compiled_line: Option<usize>,
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.template)?;
        if let Some(line) = self.source_line {
            write!(f, ", template line {line}")?;
        }
        if let Some(line) = self.compiled_line {
            write!(f, ", compiled line {line}")?;
        }
        Ok(())
    }
}

/// Extra detail attached to execution failures in debug mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostics {
    /// Attributes of the native runtime error, in a stable order.
    pub attributes: Vec<(String, String)>,
    /// The compiled script with line numbers.
    pub listing: String,
}

/// A compiled template failed while running.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionFailure {
    pub location: Location,
    /// Native error class, e.g. `RuntimeError`.
    pub kind: String,
    /// Native error message.
    pub message: String,
    pub diagnostics: Option<Diagnostics>,
}

impl fmt::Display for ExecutionFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}: {}", self.location, self.kind, self.message)?;
        if let Some(diagnostics) = &self.diagnostics {
            if !diagnostics.attributes.is_empty() {
                f.write_str("\n\nerror attributes:")?;
                for (name, value) in &diagnostics.attributes {
                    write!(f, "\n  {name} = {value}")?;
                }
            }
            write!(f, "\n\ncompiled source:\n{}", diagnostics.listing)?;
        }
        Ok(())
    }
}

impl ExecutionFailure {
    /// Whether the script ended a block that was already closed, as in an
    /// `end` written deeper than its opener.
    pub fn closes_too_many_blocks(&self) -> bool {
        self.kind == "SyntaxError"
            && self.message.contains("<eof>")
            && (self.message.contains("near 'end'") || self.message.contains("near 'until'"))
    }
}

/// Errors that occur during application orchestration.
#[derive(Debug, Error, Clone)]
pub enum ApplicationError {
    /// Neither the path nor its suffixed variant exists.
    #[error("no suitable template found (tried {})", format_paths(.attempted))]
    TemplateNotFound { attempted: Vec<PathBuf> },

    /// Filesystem operation failed.
    #[error("Filesystem error at {path}: {reason}")]
    FilesystemError { path: PathBuf, reason: String },

    /// The compiled script raised an error.
    #[error("{0}")]
    Execution(Box<ExecutionFailure>),

    /// An included template failed; `inner` is its error.
    #[error("{location}: include failed\n{inner}")]
    NestedInclude {
        location: Location,
        inner: Box<KilnError>,
    },

    /// Includes nested deeper than the configured limit.
    #[error("include depth limit of {limit} exceeded while including '{path}'")]
    IncludeDepthExceeded { limit: usize, path: String },

    /// An extra builtin tried to shadow a reserved name.
    #[error("builtin name '{name}' is reserved")]
    ReservedBuiltin { name: String },

    /// Validation failed (application-level, not domain).
    #[error("Validation failed: {0}")]
    ValidationFailed(String),

    /// The in-memory filesystem's lock was poisoned by a panicking writer.
    #[error("In-memory filesystem lock poisoned")]
    FilesystemLockError,
}

fn format_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

impl ApplicationError {
    /// Get user-actionable suggestions.
    pub fn suggestions(&self) -> Vec<String> {
        match self {
            Self::TemplateNotFound { attempted } => vec![
                format!("Looked for: {}", format_paths(attempted)),
                "Include paths are relative to the including template".into(),
                "The .tpl suffix may be omitted".into(),
            ],
            Self::FilesystemError { path, .. } => vec![
                format!("Failed to access: {}", path.display()),
                "Check that the file exists and is readable".into(),
            ],
            Self::Execution(failure) => {
                let mut suggestions = vec![format!("Look at {}", failure.location)];
                if failure.closes_too_many_blocks() {
                    suggestions.push(
                        "Blocks close on dedent: an explicit end or until must be indented \
                         like the line that opened the block"
                            .into(),
                    );
                }
                suggestions.push("Run with --debug to see the compiled source".into());
                suggestions
            }
            Self::NestedInclude { inner, .. } => inner.suggestions(),
            Self::IncludeDepthExceeded { .. } => vec![
                "A template probably includes itself, directly or indirectly".into(),
                "Raise render.max_include_depth if the nesting is intended".into(),
            ],
            Self::ReservedBuiltin { name } => vec![format!(
                "Rename the builtin '{}'; print, include, str, len, json and locals are built in",
                name
            )],
            Self::ValidationFailed(_) => vec!["Check the error details above".into()],
            Self::FilesystemLockError => vec!["This is likely a bug, please report it".into()],
        }
    }

    /// Get error category.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::TemplateNotFound { .. } => ErrorCategory::NotFound,
            Self::FilesystemError { .. } | Self::FilesystemLockError => ErrorCategory::Internal,
            Self::Execution(_) | Self::IncludeDepthExceeded { .. } => ErrorCategory::Execution,
            Self::NestedInclude { inner, .. } => inner.category(),
            Self::ReservedBuiltin { .. } | Self::ValidationFailed(_) => ErrorCategory::Validation,
        }
    }
}
