//! Translate `mlua` errors into runtime-neutral script failures.

use kiln_core::{application::ports::ScriptFailure, error::KilnError};
use mlua::Error;

use super::CHUNK;

const TRACEBACK_MARKER: &str = "\nstack traceback:";

/// Map an error from loading or running a compiled script.
pub(crate) fn script_failure(error: &Error) -> ScriptFailure {
    match error {
        Error::SyntaxError {
            message,
            incomplete_input,
        } => located("SyntaxError", message)
            .with_attribute("incomplete_input", incomplete_input.to_string()),
        Error::RuntimeError(message) => {
            let (message, traceback) = split_traceback(message);
            let failure = located("RuntimeError", message);
            match traceback {
                Some(traceback) => failure.with_attribute("traceback", traceback),
                None => failure,
            }
        }
        Error::MemoryError(message) => ScriptFailure::new("MemoryError", message.as_str()),
        Error::CallbackError { traceback, cause } => {
            callback_failure(cause).at_line(chunk_line(traceback))
        }
        other => ScriptFailure::new("RuntimeError", other.to_string()),
    }
}

/// The error a Rust builtin returned. Include failures keep their chain.
fn callback_failure(cause: &Error) -> ScriptFailure {
    match cause {
        Error::ExternalError(inner) => match inner.downcast_ref::<KilnError>() {
            Some(include) => ScriptFailure::from_include(include.clone()),
            None => ScriptFailure::new("RuntimeError", inner.to_string()),
        },
        Error::CallbackError { cause, .. } => callback_failure(cause),
        Error::RuntimeError(message) => {
            let (message, _) = split_traceback(message);
            ScriptFailure::new("RuntimeError", strip_location(message))
        }
        other => ScriptFailure::new("RuntimeError", other.to_string()),
    }
}

fn located(kind: &str, message: &str) -> ScriptFailure {
    ScriptFailure::new(kind, strip_location(message)).at_line(chunk_line(message))
}

fn split_traceback(message: &str) -> (&str, Option<&str>) {
    match message.find(TRACEBACK_MARKER) {
        Some(at) => (&message[..at], Some(message[at + 1..].trim_end())),
        None => (message, None),
    }
}

/// First `kiln:<line>:` position in `text`.
pub(crate) fn chunk_line(text: &str) -> Option<usize> {
    let marker = format!("{CHUNK}:");
    text.match_indices(&marker).find_map(|(at, _)| {
        let boundary = text[..at]
            .chars()
            .next_back()
            .is_none_or(|c| !c.is_alphanumeric() && c != '_');
        let rest = &text[at + marker.len()..];
        let digits = rest.find(|c: char| !c.is_ascii_digit()).unwrap_or(rest.len());
        if !boundary || digits == 0 || !rest[digits..].starts_with(':') {
            return None;
        }
        rest[..digits].parse().ok()
    })
}

/// Drop a leading `kiln:<line>: ` from an error message.
fn strip_location(message: &str) -> String {
    let marker = format!("{CHUNK}:");
    if let Some(rest) = message.strip_prefix(&marker) {
        let digits = rest.find(|c: char| !c.is_ascii_digit()).unwrap_or(rest.len());
        if digits > 0 {
            if let Some(text) = rest[digits..].strip_prefix(':') {
                return text.trim_start().to_string();
            }
        }
    }
    message.to_string()
}
