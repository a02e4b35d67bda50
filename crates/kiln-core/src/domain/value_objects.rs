//! Domain value objects: Syntax and Scope.
//!
//! # Design
//!
//! These are plain value types with equality-by-value and no identity.
//! `Syntax` describes the delimiter set a template is written in. `Scope`
//! holds the variables a template renders against.

use crate::domain::error::DomainError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// Spaces per nesting level in generated code when no directive overrides it.
pub const DEFAULT_INDENT_UNIT: usize = 4;

/// Upper bound accepted for an indent unit.
pub const MAX_INDENT_UNIT: usize = 16;

// ── Syntax ───────────────────────────────────────────────────────────────────

/// Delimiter configuration for a template.
///
/// The defaults are `<%`, `%>` and `%`, so a literal `<%` is written `<%%`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Syntax {
    left: String,
    right: String,
    escape: String,
}

impl Syntax {
    pub fn new(
        left: impl Into<String>,
        right: impl Into<String>,
        escape: impl Into<String>,
    ) -> Result<Self, DomainError> {
        let syntax = Self {
            left: left.into(),
            right: right.into(),
            escape: escape.into(),
        };
        syntax.validate()?;
        Ok(syntax)
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        if self.left.is_empty() || self.right.is_empty() || self.escape.is_empty() {
            return Err(DomainError::InvalidSyntax(
                "delimiters and escape marker must not be empty".into(),
            ));
        }
        if self.left == self.right {
            return Err(DomainError::InvalidSyntax(format!(
                "left and right delimiters are both '{}'",
                self.left
            )));
        }
        if [&self.left, &self.right, &self.escape]
            .iter()
            .any(|part| part.contains('\n'))
        {
            return Err(DomainError::InvalidSyntax(
                "delimiters cannot span lines".into(),
            ));
        }
        Ok(())
    }

    pub fn left(&self) -> &str {
        &self.left
    }

    pub fn right(&self) -> &str {
        &self.right
    }

    pub fn escape(&self) -> &str {
        &self.escape
    }

    /// The sequence that stands for a literal left delimiter (`<%%`).
    pub fn escaped_left(&self) -> String {
        format!("{}{}", self.left, self.escape)
    }
}

impl Default for Syntax {
    fn default() -> Self {
        Self {
            left: "<%".into(),
            right: "%>".into(),
            escape: "%".into(),
        }
    }
}

impl fmt::Display for Syntax {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} expr {} (escape {})", self.left, self.right, self.escape)
    }
}

// ── Scope ────────────────────────────────────────────────────────────────────

/// Variables visible to a template while it renders.
///
/// Values are JSON values so they cross the runtime port unchanged. Keys are
/// kept sorted, which keeps debug output stable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Scope {
    vars: BTreeMap<String, Value>,
}

impl Scope {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert. Names are not validated here.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.vars.insert(name.into(), value.into());
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.vars.insert(name.into(), value.into())
    }

    /// Insert after checking that `name` is usable as a script identifier.
    pub fn try_insert(
        &mut self,
        name: impl Into<String>,
        value: impl Into<Value>,
    ) -> Result<Option<Value>, DomainError> {
        let name = name.into();
        if !Self::is_valid_name(&name) {
            return Err(DomainError::InvalidScopeName { name });
        }
        Ok(self.vars.insert(name, value.into()))
    }

    /// Copy every variable from `other`, overwriting on conflict.
    pub fn merge(&mut self, other: &Scope) {
        for (name, value) in &other.vars {
            self.vars.insert(name.clone(), value.clone());
        }
    }

    /// Merge string variables, such as those given on the command line.
    pub fn merge_strings<I, K, V>(&mut self, vars: I) -> Result<(), DomainError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        for (name, value) in vars {
            self.try_insert(name, value.into())?;
        }
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.vars.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.vars.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.vars.iter()
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    /// Whether `name` is an identifier and not a reserved word.
    pub fn is_valid_name(name: &str) -> bool {
        let mut chars = name.chars();
        let Some(first) = chars.next() else {
            return false;
        };
        (first.is_ascii_alphabetic() || first == '_')
            && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
            && !RESERVED_WORDS.contains(&name)
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Scope {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self {
            vars: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

const RESERVED_WORDS: &[&str] = &[
    "and", "break", "do", "else", "elseif", "end", "false", "for", "function", "goto", "if", "in",
    "local", "nil", "not", "or", "repeat", "return", "then", "true", "until", "while",
];
