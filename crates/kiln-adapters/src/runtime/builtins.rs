//! Functions installed into every template's Lua state.

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

use kiln_core::{
    application::{Builtins, ports::IncludeHost},
    domain::Scope,
};
use mlua::{Function, Lua, LuaSerdeExt, SerializeOptions, Value, Variadic};
use tracing::trace;

/// Buffer everything a template prints into.
pub(crate) type Output = Rc<RefCell<String>>;

/// Lua has no `null`; JSON nulls become `nil`.
pub(crate) fn serialize_options() -> SerializeOptions {
    SerializeOptions::new()
        .serialize_none_to_null(false)
        .serialize_unit_to_null(false)
}

/// Install the standard builtins, then the caller's extras.
pub(crate) fn install(
    lua: &Lua,
    output: &Output,
    host: Arc<dyn IncludeHost>,
    scope: &Scope,
    extra: &Builtins,
) -> mlua::Result<()> {
    let globals = lua.globals();

    let buffer = output.clone();
    globals.set(
        "print",
        lua.create_function(move |lua, args: Variadic<Value>| {
            write_value(lua, &buffer, "", args)
        })?,
    )?;

    let buffer = output.clone();
    globals.set(
        "__print",
        lua.create_function(move |lua, (space, args): (String, Variadic<Value>)| {
            write_value(lua, &buffer, &space, args)
        })?,
    )?;

    let (buffer, include_host) = (output.clone(), host.clone());
    globals.set(
        "include",
        lua.create_function(move |lua, (path, scope, options): (String, Value, Value)| {
            write_include(lua, &buffer, include_host.as_ref(), "", path, scope, options)
        })?,
    )?;

    let buffer = output.clone();
    globals.set(
        "__include",
        lua.create_function(
            move |lua, (space, path, scope, options): (String, String, Value, Value)| {
                write_include(lua, &buffer, host.as_ref(), &space, path, scope, options)
            },
        )?,
    )?;

    globals.set("str", lua.create_function(|lua, value: Value| to_text(lua, value))?)?;

    globals.set(
        "len",
        lua.create_function(|_, value: Value| match value {
            Value::String(s) => Ok(s.to_string_lossy().chars().count() as i64),
            Value::Table(t) => Ok(t.raw_len() as i64),
            other => Err(mlua::Error::RuntimeError(format!(
                "object of type '{}' has no len()",
                other.type_name()
            ))),
        })?,
    )?;

    globals.set(
        "json",
        lua.create_function(|lua, value: Value| {
            let value: serde_json::Value = lua.from_value(value)?;
            serde_json::to_string(&value).map_err(mlua::Error::external)
        })?,
    )?;

    let variables = scope.clone();
    globals.set(
        "locals",
        lua.create_function(move |lua, ()| lua.to_value_with(&variables, serialize_options()))?,
    )?;

    for (name, builtin) in extra {
        let builtin = builtin.clone();
        let label = name.clone();
        let function = lua.create_function(move |lua, args: Variadic<Value>| {
            let args = args
                .into_iter()
                .map(|arg| lua.from_value::<serde_json::Value>(arg))
                .collect::<mlua::Result<Vec<_>>>()?;
            trace!(builtin = %label, args = args.len(), "calling builtin");
            let result = builtin.call(&args).map_err(mlua::Error::RuntimeError)?;
            lua.to_value_with(&result, serialize_options())
        })?;
        globals.set(name.as_str(), function)?;
    }

    Ok(())
}

/// `print`/`__print`: append `str(value)` and the line ending.
fn write_value(lua: &Lua, buffer: &Output, space: &str, args: Variadic<Value>) -> mlua::Result<()> {
    let mut args = args.into_iter();
    let text = match args.next() {
        Some(value) => to_text(lua, value)?,
        None => String::new(),
    };
    let options = WriteOptions::parse(args.next().unwrap_or(Value::Nil))?;

    let mut out = buffer.borrow_mut();
    out.push_str(&indent_lines(&text, options.prefix(space)));
    out.push_str(&options.eol);
    Ok(())
}

/// `include`/`__include`: render a nested template into the buffer.
fn write_include(
    lua: &Lua,
    buffer: &Output,
    host: &dyn IncludeHost,
    space: &str,
    path: String,
    scope: Value,
    options: Value,
) -> mlua::Result<()> {
    let scope: Scope = match scope {
        Value::Nil => Scope::new(),
        value => lua.from_value(value)?,
    };
    let options = WriteOptions::parse(options)?;

    let rendered = host.include(&path, scope).map_err(mlua::Error::external)?;
    let rendered = rendered.strip_suffix('\n').unwrap_or(&rendered);
    let rendered = rendered.strip_suffix('\r').unwrap_or(rendered);

    let mut out = buffer.borrow_mut();
    out.push_str(&indent_lines(rendered, options.prefix(space)));
    out.push_str(&options.eol);
    Ok(())
}

/// `tostring` semantics, except tables are JSON-encoded.
fn to_text(lua: &Lua, value: Value) -> mlua::Result<String> {
    match value {
        Value::String(s) => Ok(s.to_string_lossy()),
        Value::Table(_) => {
            let json: serde_json::Value = lua.from_value(value)?;
            Ok(json.to_string())
        }
        other => {
            let tostring: Function = lua.globals().raw_get("tostring")?;
            tostring.call(other)
        }
    }
}

/// Trailing options of `print` and `include`: an `eol` string or a table.
#[derive(Debug)]
struct WriteOptions {
    eol: String,
    indent: bool,
    indent_space: Option<String>,
}

impl WriteOptions {
    fn parse(value: Value) -> mlua::Result<Self> {
        let mut options = Self {
            eol: "\n".into(),
            indent: true,
            indent_space: None,
        };
        match value {
            Value::Nil => {}
            Value::String(eol) => options.eol = eol.to_string_lossy(),
            Value::Table(table) => {
                if let Some(eol) = table.get::<Option<String>>("eol")? {
                    options.eol = eol;
                }
                if let Some(indent) = table.get::<Option<bool>>("indent")? {
                    options.indent = indent;
                }
                options.indent_space = table.get::<Option<String>>("indent_space")?;
            }
            other => {
                return Err(mlua::Error::RuntimeError(format!(
                    "options must be an eol string or a table, got {}",
                    other.type_name()
                )));
            }
        }
        Ok(options)
    }

    /// An explicit `indent_space` wins over the injected one.
    fn prefix<'a>(&'a self, injected: &'a str) -> &'a str {
        if !self.indent {
            return "";
        }
        self.indent_space.as_deref().unwrap_or(injected)
    }
}

/// Prefix every non-empty line of `text`.
fn indent_lines(text: &str, prefix: &str) -> String {
    if prefix.is_empty() {
        return text.to_string();
    }
    text.split_inclusive('\n')
        .map(|line| {
            if line.trim_end_matches(['\n', '\r']).is_empty() {
                line.to_string()
            } else {
                format!("{prefix}{line}")
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indent_skips_empty_lines() {
        assert_eq!(indent_lines("a\n\nb", "  "), "  a\n\n  b");
        assert_eq!(indent_lines("a\r\n\r\n", "> "), "> a\r\n\r\n");
        assert_eq!(indent_lines("a\nb", ""), "a\nb");
    }

    #[test]
    fn explicit_indent_space_wins() {
        let lua = Lua::new();
        let table = lua.create_table().unwrap();
        table.set("indent_space", "--").unwrap();
        table.set("eol", "").unwrap();
        let options = WriteOptions::parse(Value::Table(table)).unwrap();
        assert_eq!(options.prefix("    "), "--");
        assert_eq!(options.eol, "");

        let plain = WriteOptions::parse(Value::Nil).unwrap();
        assert_eq!(plain.prefix("    "), "    ");
        assert_eq!(plain.eol, "\n");
    }

    #[test]
    fn indent_false_disables_prefix() {
        let lua = Lua::new();
        let table = lua.create_table().unwrap();
        table.set("indent", false).unwrap();
        let options = WriteOptions::parse(Value::Table(table)).unwrap();
        assert_eq!(options.prefix("    "), "");
    }

    #[test]
    fn non_table_options_are_rejected() {
        assert!(WriteOptions::parse(Value::Boolean(true)).is_err());
    }
}
