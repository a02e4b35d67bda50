//! Script runtime adapters.
//!
//! Compiled templates are Lua 5.4 chunks. Each execution gets a fresh,
//! sandboxed state so nothing leaks between renders.

mod builtins;
mod failure;
mod lua;

pub use lua::LuaRuntime;

/// Chunk name used in Lua error positions (`kiln:<line>: ...`).
pub const CHUNK: &str = "kiln";
