//! End-to-end rendering through the real Lua runtime.

use std::sync::Arc;

use kiln_adapters::{LocalFilesystem, LuaRuntime, MemoryFilesystem};
use kiln_core::application::{ApplicationError, RenderOptions, RenderService};
use kiln_core::domain::Scope;
use kiln_core::error::KilnError;
use serde_json::json;

fn service(fs: MemoryFilesystem) -> RenderService {
    service_with(fs, RenderOptions::default())
}

fn service_with(fs: MemoryFilesystem, options: RenderOptions) -> RenderService {
    RenderService::new(Arc::new(fs), Arc::new(LuaRuntime::new()), options).unwrap()
}

fn render(source: &str, scope: &Scope) -> String {
    service(MemoryFilesystem::new())
        .render_str(source, scope)
        .unwrap()
        .output
}

#[test]
fn hello_world() {
    let scope = Scope::new().with("name", "world");
    assert_eq!(render("hello <% name %>!", &scope), "hello world!");
}

#[test]
fn expressions_and_escapes() {
    assert_eq!(render("<% 2+2 %>", &Scope::new()), "4");
    assert_eq!(render("<%%", &Scope::new()), "<%");
    assert_eq!(render("a <%% b", &Scope::new()), "a <% b");
}

#[test]
fn plain_text_renders_unchanged() {
    let source = "first\n  indented 'quoted' \"twice\"\n\n\tback\\slash\nlast";
    assert_eq!(render(source, &Scope::new()), source);
    assert_eq!(render("trailing\n\n", &Scope::new()), "trailing\n\n");
}

#[test]
fn carriage_returns_inside_lines_survive() {
    assert_eq!(render("a\rb\n", &Scope::new()), "a\rb\n");
    assert_eq!(render("\r\n", &Scope::new()), "\n");
    // only the last \r before a newline belongs to the terminator
    assert_eq!(render("a\r\r\nb", &Scope::new()), "a\r\nb");
    let scope = Scope::new().with("name", "ada");
    assert_eq!(render("<%% \r <% name %>\r!", &scope), "<% \r ada\r!");
}

#[test]
fn crlf_line_endings_are_normalised_to_lf() {
    assert_eq!(render("one\r\ntwo\r\n", &Scope::new()), "one\ntwo\n");
    assert_eq!(render("mixed\r\nends\nhere", &Scope::new()), "mixed\nends\nhere");
    assert_eq!(
        render("<% for i = 1, 2 do\r\n  <% i %>\r\n", &Scope::new()),
        "12"
    );
}

#[test]
fn tabs_and_other_control_characters_survive() {
    let source = "col\tcol\t'q'\n\u{7}bell \"x\" \\ \u{1b}[0m\n";
    assert_eq!(render(source, &Scope::new()), source);
}

#[test]
fn standalone_placeholders_concatenate_in_loops() {
    assert_eq!(render("<% for i = 0, 2 do\n  <% i %>\n", &Scope::new()), "012");
}

#[test]
fn blocks_close_on_dedent() {
    let source = "\
<% if flag then
  yes
<% else
  no
done
";
    let scope = Scope::new().with("flag", false);
    assert_eq!(render(source, &scope), "  no\ndone\n");
    let scope = Scope::new().with("flag", true);
    assert_eq!(render(source, &scope), "  yes\ndone\n");
}

#[test]
fn lua_functions_and_repeat_blocks() {
    let source = "\
<% local function greet(who)
  <% print('hi ' .. who)
<% greet('ada')
<% local n = 0
<% repeat
  <% n = n + 1
<% until n == 3
<% n %>
";
    assert_eq!(render(source, &Scope::new()), "  hi ada\n3");
}

#[test]
fn indent_directive_changes_compiled_indentation() {
    let rendered = service(MemoryFilesystem::new())
        .render_str("<% __indent__ = 2\n<% if true then\n  yes\n", &Scope::new())
        .unwrap();
    assert_eq!(rendered.output, "  yes\n");
    assert!(rendered.compiled.contains("\n  print('  yes')"), "{}", rendered.compiled);
}

#[test]
fn undefined_name_reports_its_template_line() {
    let source = "one\ntwo\nthree\nfour\nfive <% missing %>\n";
    let err = service(MemoryFilesystem::new())
        .render_str(source, &Scope::new())
        .unwrap_err();
    match err {
        KilnError::Application(ApplicationError::Execution(failure)) => {
            assert_eq!(failure.location.source_line, Some(5));
            assert_eq!(failure.kind, "RuntimeError");
            assert_eq!(failure.message, "name 'missing' is not defined");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn explicit_end_deeper_than_its_block_gets_a_hint() {
    let source = "<% if true then\n  yes\n  <% end\nafter\n";
    let err = service(MemoryFilesystem::new())
        .render_str(source, &Scope::new())
        .unwrap_err();
    assert!(
        err.suggestions()
            .iter()
            .any(|s| s.contains("must be indented like the line that opened the block")),
        "missing hint: {:?}",
        err.suggestions()
    );
    match err {
        KilnError::Application(ApplicationError::Execution(failure)) => {
            assert_eq!(failure.kind, "SyntaxError");
            assert_eq!(failure.location.source_line, Some(3));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn rendering_is_idempotent() {
    let service = service(MemoryFilesystem::new());
    let scope = Scope::new().with("items", json!(["a", "b"]));
    let source = "<% for _, item in ipairs(items) do\n  - <% item %>\n";

    let first = service.render_str(source, &scope).unwrap();
    let second = service.render_str(source, &scope).unwrap();
    assert_eq!(first, second);
    assert_eq!(first.output, "  - a\n  - b\n");
}

#[test]
fn includes_receive_leftover_indent() {
    let fs = MemoryFilesystem::new()
        .with_file("page.tpl", "<% for i = 1, 2 do\n    <% include('row', {i = i})\nend\n")
        .unwrap()
        .with_file("row.tpl", "row <% i %>\n")
        .unwrap();
    let rendered = service(fs).render_file("page.tpl", &Scope::new()).unwrap();
    assert_eq!(rendered.output, "    row 1\n    row 2\nend\n");
}

#[test]
fn include_paths_are_relative_to_the_including_template() {
    let fs = MemoryFilesystem::new()
        .with_file("views/page.tpl", "<% include('../shared/head.tpl', {title = 'Home'})\nbody\n")
        .unwrap()
        .with_file("shared/head.tpl", "<h1><% title %></h1>\n")
        .unwrap();
    let rendered = service(fs).render_file("views/page", &Scope::new()).unwrap();
    assert_eq!(rendered.output, "<h1>Home</h1>\nbody\n");
}

#[test]
fn missing_include_names_both_attempts() {
    let err = service(MemoryFilesystem::new())
        .render_str("<% include('missing.tpl')", &Scope::new())
        .unwrap_err();
    let text = err.to_string();
    assert!(text.contains("missing.tpl,"), "{text}");
    assert!(text.contains("missing.tpl.tpl"), "{text}");
    assert!(matches!(
        err.innermost(),
        KilnError::Application(ApplicationError::TemplateNotFound { .. })
    ));
}

#[test]
fn nested_include_errors_list_frames_outermost_first() {
    let fs = MemoryFilesystem::new()
        .with_file("a.tpl", "A\n<% include('b.tpl')\n")
        .unwrap()
        .with_file("b.tpl", "B\n<% include('c.tpl')\n")
        .unwrap()
        .with_file("c.tpl", "C\n<% missing_fn()\n")
        .unwrap();
    let err = service(fs).render_file("a.tpl", &Scope::new()).unwrap_err();

    let text = err.to_string();
    let a = text.find("a.tpl").unwrap();
    let b = text.find("b.tpl").unwrap();
    let c = text.find("c.tpl").unwrap();
    assert!(a < b && b < c, "{text}");
    assert!(text.ends_with("name 'missing_fn' is not defined"), "{text}");

    let frames = err.include_frames();
    assert_eq!(frames.len(), 2);
    assert!(frames.iter().all(|frame| frame.source_line == Some(2)));
}

#[test]
fn self_inclusion_stops_at_the_depth_limit() {
    let fs = MemoryFilesystem::new()
        .with_file("loop.tpl", "<% include('loop.tpl')\n")
        .unwrap();
    let options = RenderOptions::default().with_max_include_depth(8);
    let err = service_with(fs, options)
        .render_file("loop.tpl", &Scope::new())
        .unwrap_err();
    assert!(matches!(
        err.innermost(),
        KilnError::Application(ApplicationError::IncludeDepthExceeded { limit: 8, .. })
    ));
}

#[test]
fn globals_and_extra_builtins() {
    let options = RenderOptions::default()
        .with_globals(Scope::new().with("site", "kiln").with("name", "default"))
        .with_builtin("upper", |args| {
            let text = args.first().and_then(|v| v.as_str()).ok_or("expected a string")?;
            Ok(json!(text.to_uppercase()))
        });
    let rendered = service_with(MemoryFilesystem::new(), options)
        .render_str("site: <% upper(site) %> / <% name %>", &Scope::new().with("name", "ada"))
        .unwrap();
    assert_eq!(rendered.output, "site: KILN / ada");
}

#[test]
fn debug_mode_includes_compiled_listing() {
    let options = RenderOptions::default().with_debug(true);
    let err = service_with(MemoryFilesystem::new(), options)
        .render_str("ok\n<% error('boom')\n", &Scope::new())
        .unwrap_err();
    let text = err.to_string();
    assert!(text.contains("boom"), "{text}");
    assert!(text.contains("compiled source:"), "{text}");
    assert!(text.contains("2 | error('boom')"), "{text}");
    assert!(text.contains("traceback"), "{text}");
}

#[test]
fn check_loads_without_running() {
    let service = service(MemoryFilesystem::new());
    let ok = kiln_core::domain::Template::inline("<% undefined_call()\n");
    assert!(service.check(&ok).is_ok());

    let broken = kiln_core::domain::Template::inline("fine\n<% local = 1\n");
    let err = service.check(&broken).unwrap_err();
    match err {
        KilnError::Application(ApplicationError::Execution(failure)) => {
            assert_eq!(failure.kind, "SyntaxError");
            assert_eq!(failure.location.source_line, Some(2));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn renders_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(dir.path().join("partials")).unwrap();
    std::fs::write(
        dir.path().join("page.tpl"),
        "<% include('partials/header', {title = title})\nbody\n",
    )
    .unwrap();
    std::fs::write(dir.path().join("partials/header.tpl"), "# <% title %>\n").unwrap();

    let service = RenderService::new(
        Arc::new(LocalFilesystem::new()),
        Arc::new(LuaRuntime::new()),
        RenderOptions::default(),
    )
    .unwrap();
    let rendered = service
        .render_file(dir.path().join("page"), &Scope::new().with("title", "Kiln"))
        .unwrap();
    assert_eq!(rendered.output, "# Kiln\nbody\n");
}
