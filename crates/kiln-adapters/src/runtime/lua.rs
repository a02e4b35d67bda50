//! Sandboxed Lua runtime.

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

use kiln_core::application::ports::{IncludeHost, ScriptFailure, ScriptRequest, ScriptRuntime};
use mlua::{Lua, LuaOptions, LuaSerdeExt, StdLib};
use tracing::{debug, trace};

use super::{CHUNK, builtins, failure::script_failure};

/// Globals removed from every state.
const UNSAFE_GLOBALS: &[&str] = &["dofile", "loadfile", "load", "require"];

/// Reading an undefined global is an error instead of `nil`. Scope
/// variables holding `null` stay readable.
const STRICT_GLOBALS: &str = r#"
local declared = ...
setmetatable(_G, {
    __index = function(_, name)
        if declared[name] then
            return nil
        end
        error("name '" .. tostring(name) .. "' is not defined", 2)
    end,
})
"#;

/// Runs compiled templates on Lua 5.4.
///
/// Only the `string`, `table`, `math` and `utf8` libraries are loaded, on
/// top of the base library without its file and module loaders.
#[derive(Debug, Clone, Copy, Default)]
pub struct LuaRuntime;

impl LuaRuntime {
    pub fn new() -> Self {
        Self
    }

    fn sandbox(&self) -> mlua::Result<Lua> {
        let libs = StdLib::STRING | StdLib::TABLE | StdLib::MATH | StdLib::UTF8;
        let lua = Lua::new_with(libs, LuaOptions::default())?;
        let globals = lua.globals();
        for name in UNSAFE_GLOBALS {
            globals.set(*name, mlua::Value::Nil)?;
        }
        Ok(lua)
    }

    fn run(
        &self,
        request: &ScriptRequest,
        host: Arc<dyn IncludeHost>,
    ) -> mlua::Result<String> {
        let lua = self.sandbox()?;
        let globals = lua.globals();

        let declared = lua.create_table()?;
        for (name, value) in request.scope.iter() {
            globals.set(
                name.as_str(),
                lua.to_value_with(value, builtins::serialize_options())?,
            )?;
            declared.set(name.as_str(), true)?;
        }

        let output = Rc::new(RefCell::new(String::new()));
        builtins::install(&lua, &output, host, &request.scope, &request.builtins)?;
        lua.load(STRICT_GLOBALS)
            .set_name("=strict")
            .call::<()>(declared)?;

        trace!(lines = request.code.lines().count(), "running chunk");
        lua.load(&request.code).set_name(chunk_name()).exec()?;

        Ok(output.take())
    }
}

fn chunk_name() -> String {
    format!("={CHUNK}")
}

impl ScriptRuntime for LuaRuntime {
    fn execute(
        &self,
        request: &ScriptRequest,
        host: Arc<dyn IncludeHost>,
    ) -> Result<String, ScriptFailure> {
        debug!(
            vars = request.scope.len(),
            builtins = request.builtins.len(),
            "executing template script"
        );
        self.run(request, host).map_err(|e| script_failure(&e))
    }

    fn check(&self, code: &str) -> Result<(), ScriptFailure> {
        let lua = self.sandbox().map_err(|e| script_failure(&e))?;
        lua.load(code)
            .set_name(chunk_name())
            .into_function()
            .map(|_| ())
            .map_err(|e| script_failure(&e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kiln_core::application::{ApplicationError, Builtin, Builtins};
    use kiln_core::domain::Scope;
    use kiln_core::error::{KilnError, KilnResult};
    use serde_json::json;

    /// Renders every include as `<path>` followed by a newline.
    struct EchoHost;

    impl IncludeHost for EchoHost {
        fn include(&self, path: &str, scope: Scope) -> KilnResult<String> {
            match scope.get("fail") {
                Some(_) => Err(ApplicationError::TemplateNotFound {
                    attempted: vec![path.into()],
                }
                .into()),
                None => Ok(format!("<{path}>\nsecond\n")),
            }
        }
    }

    fn run(code: &str, scope: Scope) -> Result<String, ScriptFailure> {
        run_with(code, scope, Builtins::new())
    }

    fn run_with(code: &str, scope: Scope, builtins: Builtins) -> Result<String, ScriptFailure> {
        let request = ScriptRequest {
            code: code.to_string(),
            scope,
            builtins,
        };
        LuaRuntime::new().execute(&request, Arc::new(EchoHost))
    }

    #[test]
    fn print_appends_line_endings() {
        let out = run("print('a')\nprint('b', \"\")\nprint(1 + 1)", Scope::new()).unwrap();
        assert_eq!(out, "a\nb2\n");
    }

    #[test]
    fn scope_variables_are_globals() {
        let scope = Scope::new()
            .with("name", "world")
            .with("items", json!([1, 2, 3]))
            .with("nothing", json!(null));
        let out = run(
            "print(name)\nprint(#items)\nprint(str(nothing))\nprint(str(items))",
            scope,
        )
        .unwrap();
        assert_eq!(out, "world\n3\nnil\n[1,2,3]\n");
    }

    #[test]
    fn injected_indent_prefixes_each_line() {
        let out = run("__print('  ', 'a\\n\\nb')", Scope::new()).unwrap();
        assert_eq!(out, "  a\n\n  b\n");
    }

    #[test]
    fn include_drops_one_trailing_newline_and_indents() {
        let out = run("__include('    ', 'part.tpl')", Scope::new()).unwrap();
        assert_eq!(out, "    <part.tpl>\n    second\n");

        let out = run("include('part.tpl', {}, {eol = ''})", Scope::new()).unwrap();
        assert_eq!(out, "<part.tpl>\nsecond");
    }

    #[test]
    fn include_failures_carry_the_nested_error() {
        let failure = run("print('x')\ninclude('gone.tpl', {fail = true})", Scope::new())
            .unwrap_err();
        assert_eq!(failure.kind, "IncludeError");
        assert_eq!(failure.line, Some(2));
        assert!(matches!(
            failure.include.as_deref(),
            Some(KilnError::Application(ApplicationError::TemplateNotFound { .. }))
        ));
    }

    #[test]
    fn undefined_names_are_errors() {
        let failure = run("print('ok')\nprint(missing)", Scope::new()).unwrap_err();
        assert_eq!(failure.kind, "RuntimeError");
        assert_eq!(failure.line, Some(2));
        assert_eq!(failure.message, "name 'missing' is not defined");
    }

    #[test]
    fn file_and_module_loaders_are_removed() {
        for code in ["dofile('x.lua')", "require('os')", "load('return 1')"] {
            let failure = run(code, Scope::new()).unwrap_err();
            assert!(failure.message.contains("is not defined"), "{code}: {failure:?}");
        }
        assert!(run("print(io)", Scope::new()).is_err());
    }

    #[test]
    fn primitives() {
        let scope = Scope::new().with("user", json!({"name": "ada"}));
        let out = run(
            "print(len('héllo'))\nprint(len({1, 2}))\nprint(json(user))\nprint(locals().user.name)",
            scope,
        )
        .unwrap();
        assert_eq!(out, "5\n2\n{\"name\":\"ada\"}\nada\n");
    }

    #[test]
    fn extra_builtins_receive_json_values() {
        let mut builtins = Builtins::new();
        builtins.insert(
            "upper".into(),
            Builtin::new(|args| match args.first() {
                Some(serde_json::Value::String(s)) => Ok(json!(s.to_uppercase())),
                _ => Err("upper expects a string".into()),
            }),
        );

        let out = run_with("print(upper('kiln'))", Scope::new(), builtins.clone()).unwrap();
        assert_eq!(out, "KILN\n");

        let failure = run_with("print(upper(1))", Scope::new(), builtins).unwrap_err();
        assert_eq!(failure.message, "upper expects a string");
        assert_eq!(failure.line, Some(1));
    }

    #[test]
    fn check_reports_syntax_errors_without_running() {
        let runtime = LuaRuntime::new();
        assert!(runtime.check("print(undefined_is_fine_here)").is_ok());

        let failure = runtime.check("print('a')\nif then").unwrap_err();
        assert_eq!(failure.kind, "SyntaxError");
        assert_eq!(failure.line, Some(2));
    }
}
