//! Driven (output) ports - implemented by infrastructure.
//!
//! These traits define what the application needs from external systems.
//! The `kiln-adapters` crate provides implementations.

use std::path::Path;
use std::sync::Arc;

use crate::application::options::Builtins;
use crate::domain::Scope;
use crate::error::{KilnError, KilnResult};

/// Port for reading template sources.
///
/// Implemented by:
/// - `kiln_adapters::filesystem::LocalFilesystem` (production)
/// - `kiln_adapters::filesystem::MemoryFilesystem` (testing)
#[cfg_attr(test, mockall::automock)]
pub trait TemplateLoader: Send + Sync {
    /// Read a template's full text.
    fn load_text(&self, path: &Path) -> KilnResult<String>;

    /// Whether a template file exists at `path`.
    fn exists(&self, path: &Path) -> bool;
}

/// Callback a runtime uses to render `include(...)` targets.
///
/// The render service hands one of these to the runtime for every script
/// it executes. It knows which directory relative paths resolve against
/// and how deep the include chain already is.
#[cfg_attr(test, mockall::automock)]
pub trait IncludeHost {
    /// Render the template at `path` with `scope` and return its output.
    fn include(&self, path: &str, scope: Scope) -> KilnResult<String>;
}

/// Everything a runtime needs to run one compiled template.
#[derive(Debug, Clone)]
pub struct ScriptRequest {
    /// Compiled script source.
    pub code: String,
    /// Variables to install as globals.
    pub scope: Scope,
    /// Host functions to install next to the standard builtins.
    pub builtins: Builtins,
}

/// A script failed to load or run.
///
/// Line numbers refer to the compiled script. The render service maps them
/// back to the template.
#[derive(Debug, Clone)]
pub struct ScriptFailure {
    /// Native error class, e.g. `SyntaxError` or `RuntimeError`.
    pub kind: String,
    pub message: String,
    pub line: Option<usize>,
    /// Native error attributes, shown in debug mode.
    pub attributes: Vec<(String, String)>,
    /// Set when the failure came out of an `include` call.
    pub include: Option<Box<KilnError>>,
}

impl ScriptFailure {
    pub fn new(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            message: message.into(),
            line: None,
            attributes: Vec::new(),
            include: None,
        }
    }

    /// A failure raised by a nested template.
    pub fn from_include(error: KilnError) -> Self {
        Self {
            kind: "IncludeError".into(),
            message: error.to_string(),
            line: None,
            attributes: Vec::new(),
            include: Some(Box::new(error)),
        }
    }

    pub fn at_line(mut self, line: Option<usize>) -> Self {
        self.line = line;
        self
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push((name.into(), value.into()));
        self
    }
}

/// Port for executing compiled templates.
///
/// Implemented by:
/// - `kiln_adapters::runtime::LuaRuntime`
#[cfg_attr(test, mockall::automock)]
pub trait ScriptRuntime: Send + Sync {
    /// Run a compiled script and return everything it printed.
    fn execute(
        &self,
        request: &ScriptRequest,
        host: Arc<dyn IncludeHost>,
    ) -> Result<String, ScriptFailure>;

    /// Load a script without running it, reporting syntax errors.
    fn check(&self, code: &str) -> Result<(), ScriptFailure>;
}
