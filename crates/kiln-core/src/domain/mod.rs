//! Core domain layer for Kiln.
//!
//! This module contains the pure compilation pipeline with no I/O and no
//! script VM. A template goes through it like this:
//!
//! 1. [`Classifier`] tags every physical line (empty, code, placeholder,
//!    text) and lexes text lines into fragments.
//! 2. [`IndentTracker`] turns template indentation into block structure.
//! 3. [`Compiler`] emits one script statement per unit and records phantom
//!    lines in a [`LineShiftTable`].
//!
//! The output is a [`CompiledTemplate`] that the application layer hands to
//! a script runtime.

pub mod classifier;
pub mod compiler;
pub mod entities;
pub mod error;
pub mod indent;
pub mod lexical;
pub mod line_shift;
pub mod value_objects;

pub use classifier::{Classifier, Fragment, SourceLine, Unclassified, Unit};
pub use compiler::Compiler;
pub use entities::template::{
    CompiledTemplate, RenderedTemplate, Template, TemplateOrigin, numbered_listing,
};
pub use error::{DomainError, ErrorCategory};
pub use indent::{BlockKind, ClosedBlock, IndentContext, IndentMode, IndentTracker, Resolution};
pub use line_shift::{LineShift, LineShiftTable};
pub use value_objects::{DEFAULT_INDENT_UNIT, MAX_INDENT_UNIT, Scope, Syntax};
