//! Kiln Core - template compiler and render orchestration.
//!
//! This crate provides the domain and application layers for Kiln, a
//! line-oriented template engine whose templates compile into a scripting
//! language and run in a sandboxed scope. It follows hexagonal (ports and
//! adapters) architecture: everything that touches files or a script VM sits
//! behind a trait.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │            kiln-cli (CLI)               │
//! │        render / compile / check         │
//! └──────────────────┬──────────────────────┘
//!                    │ calls
//!                    ▼
//! ┌─────────────────────────────────────────┐
//! │         Application Services            │
//! │   RenderService (load, compile, run,    │
//! │   include recursion, error remapping)   │
//! └──────────────────┬──────────────────────┘
//!                    │ uses
//!                    ▼
//! ┌─────────────────────────────────────────┐
//! │      Application Ports (Traits)         │
//! │     TemplateLoader, ScriptRuntime       │
//! └──────────────────┬──────────────────────┘
//!                    │ implemented by
//!                    ▼
//! ┌─────────────────────────────────────────┐
//! │     kiln-adapters (Infrastructure)      │
//! │  LocalFilesystem, MemoryFilesystem,     │
//! │  LuaRuntime                             │
//! └─────────────────────────────────────────┘
//!                    │
//!                    ▼
//! ┌─────────────────────────────────────────┐
//! │        Domain Layer (Pure Logic)        │
//! │  Classifier, IndentTracker,             │
//! │  LineShiftTable, Compiler, Template     │
//! └─────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use kiln_core::prelude::*;
//!
//! # fn demo(loader: Arc<dyn TemplateLoader>, runtime: Arc<dyn ScriptRuntime>) -> KilnResult<()> {
//! let service = RenderService::new(loader, runtime, RenderOptions::default())?;
//! let scope = Scope::new().with("name", "world");
//! let rendered = service.render_str("hello <% name %>!", &scope)?;
//! assert_eq!(rendered.output, "hello world!");
//! # Ok(())
//! # }
//! ```

pub mod domain;

pub mod application;

pub mod error;

// Public API - what external crates should use
pub mod prelude {
    pub use crate::application::{
        Builtin, IncludeHost, RenderOptions, RenderService, ScriptFailure, ScriptRequest,
        ScriptRuntime, TemplateLoader,
    };
    pub use crate::domain::{
        CompiledTemplate, Compiler, RenderedTemplate, Scope, Syntax, Template, TemplateOrigin,
    };
    pub use crate::error::{KilnError, KilnResult};
}

// Version info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
