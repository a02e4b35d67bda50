//! Template compiler.
//!
//! Walks a template line by line and emits one Lua statement per unit:
//!
//! | Unit             | Statement                                   |
//! |------------------|---------------------------------------------|
//! | text fragment    | `print('literal')` / `print('literal', "")` |
//! | placeholder      | `print(str(expr), "")`                      |
//! | code             | the code itself                             |
//! | `print(...)`     | `__print('<leftover indent>', ...)`         |
//! | `include(...)`   | `__include('<leftover indent>', ...)`       |
//! | implicit closer  | `end` (or `until true` for `repeat`)        |
//!
//! Block structure comes from template indentation (see
//! [`IndentTracker`]). Whitespace-only lines are held back until the next
//! non-blank line decides their depth.

use regex::Regex;
use tracing::{debug, trace};

use crate::domain::classifier::{Classifier, Fragment, SourceLine, Unit, split_lines};
use crate::domain::entities::template::{CompiledTemplate, Template};
use crate::domain::error::DomainError;
use crate::domain::indent::{BlockKind, IndentMode, IndentTracker, Resolution};
use crate::domain::lexical::{
    ends_with_keyword, find_closing_paren, quote_literal, significant_prefix, starts_with_keyword,
};
use crate::domain::line_shift::LineShiftTable;
use crate::domain::value_objects::{MAX_INDENT_UNIT, Syntax};

/// Calls rewritten to receive the leftover indentation as first argument.
const INDENTED_CALLS: &[(&str, &str)] = &[("print", "__print"), ("include", "__include")];

// ── Compiler ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct Compiler {
    classifier: Classifier,
    indent_unit: usize,
    directive: Regex,
}

impl Compiler {
    pub fn new(syntax: &Syntax, indent_unit: usize) -> Result<Self, DomainError> {
        syntax.validate()?;
        validate_indent_unit(indent_unit)?;
        let pattern = format!(
            r"^(?:[ \t]*\r?\n)*[ \t]*{}\s*__indent__\s*=\s*(\d+)",
            regex::escape(syntax.left())
        );
        let directive =
            Regex::new(&pattern).map_err(|e| DomainError::InvalidSyntax(e.to_string()))?;
        Ok(Self {
            classifier: Classifier::new(syntax),
            indent_unit,
            directive,
        })
    }

    pub fn syntax(&self) -> &Syntax {
        self.classifier.syntax()
    }

    /// Indent unit from a leading `<% __indent__ = N` directive, if any.
    pub fn indent_directive(&self, source: &str) -> Result<Option<usize>, DomainError> {
        let Some(caps) = self.directive.captures(source) else {
            return Ok(None);
        };
        let digits = caps.get(1).map_or("", |m| m.as_str());
        let unit = digits
            .parse::<usize>()
            .map_err(|_| DomainError::InvalidIndentUnit(digits.to_string()))?;
        validate_indent_unit(unit)?;
        Ok(Some(unit))
    }

    /// Compile a template into script source.
    pub fn compile(&self, template: &Template) -> Result<CompiledTemplate, DomainError> {
        let source = template.source();
        let unit = self.indent_directive(source)?.unwrap_or(self.indent_unit);

        let mut pass = Pass {
            template,
            syntax: self.classifier.syntax(),
            tracker: IndentTracker::new(unit),
            lines: Vec::new(),
            shifts: LineShiftTable::new(),
            pending: Vec::new(),
        };

        for line in split_lines(source) {
            let unit = self
                .classifier
                .classify(line.content)
                .map_err(|unclassified| DomainError::Syntax {
                    template: template.description(),
                    line: line.number,
                    content: unclassified.0,
                })?;
            trace!(line = line.number, ?unit, "classified");
            match unit {
                Unit::Empty { content } => pass.pending.push(print_literal(content, line.has_eol)),
                Unit::Placeholder { indent, expr } => pass.placeholder(indent, expr),
                Unit::Code { indent, code } => pass.code(&line, indent, code)?,
                Unit::Text { indent, fragments } => pass.text(&line, indent, &fragments),
            }
        }

        let compiled = pass.finish();
        debug!(
            template = %template.description(),
            lines = compiled.shifts().total_lines(),
            phantoms = compiled.shifts().phantom_lines(),
            indent_unit = unit,
            "template compiled"
        );
        Ok(compiled)
    }
}

fn validate_indent_unit(unit: usize) -> Result<(), DomainError> {
    if (1..=MAX_INDENT_UNIT).contains(&unit) {
        Ok(())
    } else {
        Err(DomainError::InvalidIndentUnit(unit.to_string()))
    }
}

// ── Compilation pass ─────────────────────────────────────────────────────────

/// State for one compilation. Dropped once the script is assembled.
struct Pass<'t> {
    template: &'t Template,
    syntax: &'t Syntax,
    tracker: IndentTracker,
    lines: Vec<String>,
    shifts: LineShiftTable,
    /// Statements for blank lines not yet emitted.
    pending: Vec<String>,
}

impl Pass<'_> {
    fn real(&mut self, indent: &str, statement: &str) {
        self.lines.push(format!("{indent}{statement}"));
        self.shifts.record_real();
    }

    fn phantom(&mut self, indent: &str, statement: &str) {
        self.lines.push(format!("{indent}{statement}"));
        self.shifts.record_phantom();
    }

    /// Close popped blocks and flush pending blank lines ahead of a fresh
    /// line. With `keep_outermost`, the outermost popped block is left for
    /// the line itself to continue or close.
    fn open_line(&mut self, resolution: &Resolution, keep_outermost: bool) {
        let mut closed = resolution.closed.as_slice();
        if keep_outermost {
            closed = &closed[..closed.len().saturating_sub(1)];
        }
        for block in closed {
            let indent = self.tracker.indent_for(block.depth);
            self.phantom(&indent, block.context.kind.closer());
        }
        for statement in std::mem::take(&mut self.pending) {
            self.real(&resolution.emitted, &statement);
        }
    }

    fn placeholder(&mut self, indent: &str, expr: &str) {
        let resolution = self.tracker.resolve(indent, IndentMode::Passiv);
        self.open_line(&resolution, false);
        self.real(&resolution.emitted, &format!("print(str({expr}), \"\")"));
    }

    fn text(&mut self, line: &SourceLine<'_>, indent: &str, fragments: &[Fragment<'_>]) {
        let resolution = self.tracker.resolve(indent, IndentMode::Passiv);
        self.open_line(&resolution, false);
        let continuation = self.tracker.continuation();

        let last = fragments.len().saturating_sub(1);
        for (index, fragment) in fragments.iter().enumerate() {
            let eol = index == last && line.has_eol;
            let statement = match fragment {
                Fragment::Text(text) => print_literal(text, eol),
                Fragment::Escaped(before) => {
                    print_literal(&format!("{before}{}", self.syntax.left()), eol)
                }
                Fragment::Placeholder(expr) if eol => format!("print(str({expr}) .. \"\\n\", \"\")"),
                Fragment::Placeholder(expr) => format!("print(str({expr}), \"\")"),
            };
            if index == 0 {
                self.real(&resolution.emitted, &statement);
            } else {
                self.phantom(&continuation, &statement);
            }
        }
    }

    fn code(&mut self, line: &SourceLine<'_>, indent: &str, code: &str) -> Result<(), DomainError> {
        let mode = block_opening(code).map_or(IndentMode::Passiv, IndentMode::Activ);
        let resolution = self.tracker.resolve(indent, mode);

        let width = indent.chars().count();
        let continues_block = resolution.closed.last().is_some_and(|block| {
            block.context.width() == width && continues(code, block.context.kind)
        });
        self.open_line(&resolution, continues_block);

        let statement = inject_indent_space(code, &resolution.leftover).ok_or_else(|| {
            DomainError::UnbalancedCall {
                template: self.template.description(),
                line: line.number,
                content: code.to_string(),
            }
        })?;
        self.real(&resolution.emitted, &statement);
        Ok(())
    }

    fn finish(mut self) -> CompiledTemplate {
        for block in self.tracker.close_all() {
            let indent = self.tracker.indent_for(block.depth);
            self.phantom(&indent, block.context.kind.closer());
        }
        for statement in std::mem::take(&mut self.pending) {
            self.real("", &statement);
        }
        let code = self.lines.join("\n").trim_end().to_string();
        CompiledTemplate::new(code, self.shifts, self.tracker.unit())
    }
}

// ── Statement helpers ────────────────────────────────────────────────────────

fn print_literal(text: &str, eol: bool) -> String {
    if eol {
        format!("print({})", quote_literal(text))
    } else {
        format!("print({}, \"\")", quote_literal(text))
    }
}

/// The block a code line opens, judged by how it ends.
pub fn block_opening(code: &str) -> Option<BlockKind> {
    let code = significant_prefix(code);
    if ends_with_keyword(code, "then") || ends_with_keyword(code, "else") {
        Some(BlockKind::Conditional)
    } else if ends_with_keyword(code, "do") {
        Some(BlockKind::Loop)
    } else if ends_with_keyword(code, "repeat") {
        Some(BlockKind::Repeat)
    } else if opens_function(code) {
        Some(BlockKind::Function)
    } else {
        None
    }
}

/// `function(a, b)`, `function name(a)`, `local function m.n:o()`.
fn opens_function(code: &str) -> bool {
    let Some(head) = code.strip_suffix(')') else {
        return false;
    };
    let Some(open) = head.rfind('(') else {
        return false;
    };
    let before = head[..open].trim_end();
    if ends_with_keyword(before, "function") {
        return true;
    }
    let unnamed = before
        .trim_end_matches(|c: char| c.is_alphanumeric() || matches!(c, '_' | '.' | ':'))
        .trim_end();
    unnamed.len() < before.len() && ends_with_keyword(unnamed, "function")
}

/// Whether a code line takes over a block of `kind` at its own indentation
/// instead of having it closed implicitly.
fn continues(code: &str, kind: BlockKind) -> bool {
    if starts_with_keyword(code, "else") || starts_with_keyword(code, "elseif") {
        kind == BlockKind::Conditional
    } else if starts_with_keyword(code, "until") {
        kind == BlockKind::Repeat
    } else if starts_with_keyword(code, "end") {
        kind != BlockKind::Repeat
    } else {
        false
    }
}

/// Rewrite a leading `print(` / `include(` call to its indent-aware form.
///
/// Returns `None` when the call's parenthesis never closes.
pub fn inject_indent_space(code: &str, leftover: &str) -> Option<String> {
    for (name, target) in INDENTED_CALLS {
        let Some(after) = code.strip_prefix(name) else {
            continue;
        };
        if !after.starts_with('(') {
            continue;
        }
        let open = name.len();
        let close = find_closing_paren(code, open)?;
        let args = code[open + 1..close].trim();
        let rest = &code[close + 1..];
        let space = quote_literal(leftover);
        return Some(if args.is_empty() {
            format!("{target}({space}){rest}")
        } else {
            format!("{target}({space}, {args}){rest}")
        });
    }
    Some(code.to_string())
}
