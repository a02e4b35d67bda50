//! Template entity and compilation artifacts.
//!
//! ## Lifecycle
//!
//! ```text
//! Template ──compile──▶ CompiledTemplate ──execute──▶ RenderedTemplate
//! (source)              (script + shifts)             (output + script)
//! ```
//!
//! A `Template` is immutable once constructed. Compiling it never mutates
//! it, so one template can be rendered repeatedly (and concurrently) with
//! different scopes.

use std::fmt;
use std::path::{Path, PathBuf};

use crate::domain::line_shift::LineShiftTable;

// ── Template ─────────────────────────────────────────────────────────────────

/// Where a template's source came from.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TemplateOrigin {
    File(PathBuf),
    Inline,
}

impl fmt::Display for TemplateOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::File(path) => write!(f, "{}", path.display()),
            Self::Inline => f.write_str("given template string"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    source: String,
    origin: TemplateOrigin,
}

impl Template {
    pub fn from_file(path: impl Into<PathBuf>, source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            origin: TemplateOrigin::File(path.into()),
        }
    }

    pub fn inline(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            origin: TemplateOrigin::Inline,
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn origin(&self) -> &TemplateOrigin {
        &self.origin
    }

    pub fn path(&self) -> Option<&Path> {
        match &self.origin {
            TemplateOrigin::File(path) => Some(path),
            TemplateOrigin::Inline => None,
        }
    }

    /// Human-readable name used in error messages: the file path, or
    /// "given template string".
    pub fn description(&self) -> String {
        self.origin.to_string()
    }

    /// Directory that relative includes resolve against.
    ///
    /// `None` for inline templates, which resolve from the working
    /// directory.
    pub fn base_dir(&self) -> Option<&Path> {
        self.path().and_then(Path::parent)
    }
}

// ── CompiledTemplate ─────────────────────────────────────────────────────────

/// Script source produced from a template, with its line bookkeeping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledTemplate {
    code: String,
    shifts: LineShiftTable,
    indent_unit: usize,
}

impl CompiledTemplate {
    pub fn new(code: String, shifts: LineShiftTable, indent_unit: usize) -> Self {
        Self {
            code,
            shifts,
            indent_unit,
        }
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn into_code(self) -> String {
        self.code
    }

    pub fn shifts(&self) -> &LineShiftTable {
        &self.shifts
    }

    /// Indent unit in effect, after any `__indent__` directive.
    pub fn indent_unit(&self) -> usize {
        self.indent_unit
    }

    /// Map a compiled line back to its template line.
    pub fn source_line(&self, compiled_line: usize) -> usize {
        self.shifts.map_compiled_line(compiled_line)
    }

    pub fn numbered_listing(&self) -> String {
        numbered_listing(&self.code)
    }
}

/// Render code with right-aligned, 1-based line numbers.
pub fn numbered_listing(code: &str) -> String {
    let lines: Vec<&str> = code.lines().collect();
    let width = lines.len().max(1).to_string().len();
    lines
        .iter()
        .enumerate()
        .map(|(index, line)| format!("{:>width$} | {}", index + 1, line, width = width))
        .collect::<Vec<_>>()
        .join("\n")
}

// ── RenderedTemplate ─────────────────────────────────────────────────────────

/// Result of one render call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedTemplate {
    pub output: String,
    pub compiled: String,
}
