//! Unified error handling for Kiln Core.
//!
//! This module provides a unified error type that wraps domain and application
//! errors, with rich context and user-actionable suggestions.

use thiserror::Error;

use crate::application::{ApplicationError, Location};
use crate::domain::DomainError;

/// Root error type for Kiln Core operations.
///
/// Include failures nest: an `ApplicationError::NestedInclude` holds the
/// error of the included template as another `KilnError`, so a failure three
/// templates deep is a chain of three.
#[derive(Debug, Error, Clone)]
pub enum KilnError {
    /// Errors from the domain layer (compilation).
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// Errors from the application layer (loading, execution, includes).
    #[error(transparent)]
    Application(#[from] ApplicationError),
}

impl KilnError {
    /// Get user-actionable suggestions for fixing this error.
    pub fn suggestions(&self) -> Vec<String> {
        match self {
            Self::Domain(e) => e.suggestions(),
            Self::Application(e) => e.suggestions(),
        }
    }

    /// Get error category for display/styling purposes.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Domain(e) => match e.category() {
                crate::domain::ErrorCategory::Syntax => ErrorCategory::Syntax,
                crate::domain::ErrorCategory::Validation => ErrorCategory::Validation,
            },
            Self::Application(e) => e.category(),
        }
    }

    /// The deepest error in an include chain.
    pub fn innermost(&self) -> &KilnError {
        match self {
            Self::Application(ApplicationError::NestedInclude { inner, .. }) => inner.innermost(),
            other => other,
        }
    }

    /// Include call sites from the outermost template inwards.
    pub fn include_frames(&self) -> Vec<&Location> {
        let mut frames = Vec::new();
        let mut current = self;
        while let Self::Application(ApplicationError::NestedInclude { location, inner }) = current
        {
            frames.push(location);
            current = inner.as_ref();
        }
        frames
    }
}

/// Error categories for UI display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Syntax,
    Validation,
    NotFound,
    Execution,
    Internal,
}

/// Convenient result type alias.
pub type KilnResult<T> = Result<T, KilnError>;
