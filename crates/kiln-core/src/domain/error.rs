// ============================================================================
// domain/error.rs - COMPILATION ERROR DOMAIN
// ============================================================================

use thiserror::Error;

/// Root domain error type.
///
/// All errors are:
/// - Cloneable (they travel back up through nested includes)
/// - Categorizable (for CLI display)
/// - Actionable (provides suggestions)
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    // ========================================================================
    // Syntax Errors
    // ========================================================================
    /// No line rule matched the remaining content.
    #[error("Template syntax error in {template} at line {line}: cannot classify '{content}'")]
    Syntax {
        template: String,
        line: usize,
        content: String,
    },

    /// A `print(` or `include(` code line never closes its parenthesis.
    #[error("Unbalanced call in {template} at line {line}: no closing parenthesis in '{content}'")]
    UnbalancedCall {
        template: String,
        line: usize,
        content: String,
    },

    // ========================================================================
    // Validation Errors
    // ========================================================================
    #[error("Invalid delimiter configuration: {0}")]
    InvalidSyntax(String),

    #[error("Invalid indent unit {0}: expected a width between 1 and 16")]
    InvalidIndentUnit(String),

    #[error("Invalid scope variable name '{name}'")]
    InvalidScopeName { name: String },
}

impl DomainError {
    /// Get user-actionable suggestions for fixing this error.
    pub fn suggestions(&self) -> Vec<String> {
        match self {
            Self::Syntax { content, .. } => vec![
                format!("Offending content: {}", content),
                "Placeholders must be closed on the same line: <% expr %>".into(),
                "Write <%% for a literal delimiter".into(),
            ],
            Self::UnbalancedCall { content, .. } => vec![
                format!("Check the parentheses in: {}", content),
                "print(...) and include(...) calls must close on the same line".into(),
            ],
            Self::InvalidSyntax(msg) => vec![
                format!("Details: {}", msg),
                "Delimiters and the escape marker must be non-empty and distinct".into(),
            ],
            Self::InvalidIndentUnit(_) => {
                vec!["Use a directive such as <% __indent__ = 2 on the first line".into()]
            }
            Self::InvalidScopeName { name } => vec![
                format!("'{}' cannot be used as a variable name", name),
                "Use letters, digits and underscores, starting with a letter".into(),
            ],
        }
    }

    /// Error category for CLI display styling.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Syntax { .. } | Self::UnbalancedCall { .. } => ErrorCategory::Syntax,
            Self::InvalidSyntax(_) | Self::InvalidIndentUnit(_) | Self::InvalidScopeName { .. } => {
                ErrorCategory::Validation
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Syntax,
    Validation,
}
