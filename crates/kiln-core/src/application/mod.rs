//! Application layer for Kiln.
//!
//! This layer contains:
//! - **Services**: Use case orchestration (RenderService)
//! - **Ports**: Interface definitions (traits) for external dependencies
//! - **Options**: Render settings and caller-supplied builtins
//! - **Errors**: Application-specific error types
//!
//! The application layer coordinates the domain layer but contains no
//! compilation logic itself. All of that lives in `crate::domain`.

pub mod error;
pub mod options;
pub mod ports;
pub mod services;

// Re-export main services
pub use services::RenderService;

// Re-export port traits (for adapter implementation)
pub use ports::{IncludeHost, ScriptFailure, ScriptRequest, ScriptRuntime, TemplateLoader};

pub use error::{ApplicationError, Diagnostics, ExecutionFailure, Location};
pub use options::{
    Builtin, Builtins, DEFAULT_MAX_INCLUDE_DEPTH, DEFAULT_TEMPLATE_SUFFIX, RESERVED_NAMES,
    RenderOptions,
};
