//! Render options and caller-supplied builtins.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::application::ApplicationError;
use crate::domain::{DEFAULT_INDENT_UNIT, MAX_INDENT_UNIT, Scope, Syntax};
use crate::error::KilnResult;

/// Names the runtime defines itself. Extra builtins may not shadow them.
pub const RESERVED_NAMES: &[&str] = &[
    "print",
    "include",
    "str",
    "len",
    "json",
    "locals",
    "__print",
    "__include",
];

/// Default nesting limit for `include`.
pub const DEFAULT_MAX_INCLUDE_DEPTH: usize = 64;

/// Default suffix tried when an include path does not exist as given.
pub const DEFAULT_TEMPLATE_SUFFIX: &str = "tpl";

type BuiltinFn = dyn Fn(&[Value]) -> Result<Value, String> + Send + Sync;

/// A host function callable from templates.
///
/// Arguments and the return value cross the runtime boundary as JSON
/// values. An `Err` becomes a runtime error inside the template.
#[derive(Clone)]
pub struct Builtin(Arc<BuiltinFn>);

impl Builtin {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&[Value]) -> Result<Value, String> + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    pub fn call(&self, args: &[Value]) -> Result<Value, String> {
        (self.0)(args)
    }
}

impl fmt::Debug for Builtin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Builtin(..)")
    }
}

pub type Builtins = BTreeMap<String, Builtin>;

/// Settings shared by every template a service renders.
#[derive(Debug, Clone)]
pub struct RenderOptions {
    pub syntax: Syntax,
    /// Spaces per block level in compiled code, unless a template's
    /// `__indent__` directive says otherwise.
    pub indent_unit: usize,
    /// Attach the compiled listing and native error attributes to
    /// execution failures.
    pub debug: bool,
    pub max_include_depth: usize,
    /// Suffix (without the dot) tried when a path does not exist.
    pub template_suffix: String,
    /// Variables visible to every template, under the caller's scope.
    pub globals: Scope,
    pub builtins: Builtins,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            syntax: Syntax::default(),
            indent_unit: DEFAULT_INDENT_UNIT,
            debug: false,
            max_include_depth: DEFAULT_MAX_INCLUDE_DEPTH,
            template_suffix: DEFAULT_TEMPLATE_SUFFIX.into(),
            globals: Scope::new(),
            builtins: Builtins::new(),
        }
    }
}

impl RenderOptions {
    pub fn with_syntax(mut self, syntax: Syntax) -> Self {
        self.syntax = syntax;
        self
    }

    pub fn with_indent_unit(mut self, indent_unit: usize) -> Self {
        self.indent_unit = indent_unit;
        self
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub fn with_max_include_depth(mut self, depth: usize) -> Self {
        self.max_include_depth = depth;
        self
    }

    pub fn with_template_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.template_suffix = suffix.into();
        self
    }

    pub fn with_globals(mut self, globals: Scope) -> Self {
        self.globals = globals;
        self
    }

    /// Register a host function under `name`.
    pub fn with_builtin<F>(mut self, name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&[Value]) -> Result<Value, String> + Send + Sync + 'static,
    {
        self.builtins.insert(name.into(), Builtin::new(f));
        self
    }

    pub fn validate(&self) -> KilnResult<()> {
        self.syntax.validate()?;
        if !(1..=MAX_INDENT_UNIT).contains(&self.indent_unit) {
            return Err(
                crate::domain::DomainError::InvalidIndentUnit(self.indent_unit.to_string()).into(),
            );
        }
        if self.max_include_depth == 0 {
            return Err(ApplicationError::ValidationFailed(
                "max_include_depth must be at least 1".into(),
            )
            .into());
        }
        if self.template_suffix.starts_with('.') {
            return Err(ApplicationError::ValidationFailed(format!(
                "template suffix '{}' must not start with a dot",
                self.template_suffix
            ))
            .into());
        }
        for name in self.builtins.keys() {
            if RESERVED_NAMES.contains(&name.as_str()) {
                return Err(ApplicationError::ReservedBuiltin { name: name.clone() }.into());
            }
            if !Scope::is_valid_name(name) {
                return Err(ApplicationError::ValidationFailed(format!(
                    "builtin name '{name}' is not an identifier"
                ))
                .into());
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::KilnError;
    use serde_json::json;

    #[test]
    fn defaults_are_valid() {
        let options = RenderOptions::default();
        assert!(options.validate().is_ok());
        assert_eq!(options.indent_unit, 4);
        assert_eq!(options.template_suffix, "tpl");
    }

    #[test]
    fn builtins_are_callable() {
        let options = RenderOptions::default().with_builtin("double", |args| {
            let n = args.first().and_then(Value::as_i64).ok_or("expected a number")?;
            Ok(json!(n * 2))
        });
        let double = &options.builtins["double"];
        assert_eq!(double.call(&[json!(21)]).unwrap(), json!(42));
        assert!(double.call(&[]).is_err());
    }

    #[test]
    fn reserved_builtin_names_are_rejected() {
        let options = RenderOptions::default().with_builtin("include", |_| Ok(Value::Null));
        let err = options.validate().unwrap_err();
        assert!(matches!(
            err,
            KilnError::Application(ApplicationError::ReservedBuiltin { .. })
        ));
    }

    #[test]
    fn zero_include_depth_is_rejected() {
        assert!(
            RenderOptions::default()
                .with_max_include_depth(0)
                .validate()
                .is_err()
        );
    }
}
