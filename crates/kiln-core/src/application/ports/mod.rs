//! Application ports (traits) for external dependencies.
//!
//! In hexagonal architecture, ports define interfaces that the application
//! needs from the outside world. Adapters in `kiln-adapters` implement these.
//!
//! ## Port Types
//!
//! - **Driven (Output) Ports**: Called by application, implemented by infrastructure
//!   - `TemplateLoader`: Reading template sources
//!   - `ScriptRuntime`: Running compiled templates
//!
//! - **Callback Ports**: Handed to a runtime by the application
//!   - `IncludeHost`: Rendering `include(...)` targets

pub mod output;

pub use output::{IncludeHost, ScriptFailure, ScriptRequest, ScriptRuntime, TemplateLoader};

#[cfg(test)]
pub use output::{MockIncludeHost, MockScriptRuntime, MockTemplateLoader};
