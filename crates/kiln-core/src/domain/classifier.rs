//! Line classification.
//!
//! Templates are processed one physical line at a time. Each line is tagged
//! with exactly one [`Unit`], checked in this order:
//!
//! | Rule        | Matches                                              |
//! |-------------|------------------------------------------------------|
//! | empty       | whitespace only                                      |
//! | escaped     | `<%%` right after the indentation (kept as text)     |
//! | placeholder | the whole line is `<% expr %>`                       |
//! | code        | `<%` right after the indentation, to end of line     |
//! | text        | anything else, lexed into [`Fragment`]s              |
//!
//! Text lines may contain any mix of literal runs, escaped delimiters and
//! inline placeholders.

use crate::domain::value_objects::Syntax;

// ── Units ────────────────────────────────────────────────────────────────────

/// One piece of a text line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fragment<'a> {
    /// Literal text.
    Text(&'a str),
    /// Literal text followed by a literal left delimiter.
    Escaped(&'a str),
    /// An inline `<% expr %>`; holds the trimmed expression.
    Placeholder(&'a str),
}

/// The classification of a single physical line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Unit<'a> {
    Empty {
        content: &'a str,
    },
    Code {
        indent: &'a str,
        code: &'a str,
    },
    Placeholder {
        indent: &'a str,
        expr: &'a str,
    },
    Text {
        indent: &'a str,
        fragments: Vec<Fragment<'a>>,
    },
}

impl Unit<'_> {
    pub fn indent(&self) -> &str {
        match self {
            Self::Empty { .. } => "",
            Self::Code { indent, .. }
            | Self::Placeholder { indent, .. }
            | Self::Text { indent, .. } => indent,
        }
    }
}

/// A physical line of template source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceLine<'a> {
    /// 1-based line number.
    pub number: usize,
    /// Line content without its terminator.
    pub content: &'a str,
    /// Whether the line ended with a newline.
    pub has_eol: bool,
    /// Whether this is the final line of the template.
    pub is_last: bool,
}

/// Split source into physical lines, tracking terminators.
///
/// `"a\nb"` yields two lines, the second without a terminator. A trailing
/// newline does not produce an extra empty line. One `\r` before a `\n`
/// is part of the terminator, so `\r\n` input renders with `\n` endings.
/// Any other `\r` stays in the line content.
pub fn split_lines(source: &str) -> Vec<SourceLine<'_>> {
    let raw: Vec<&str> = source.split_inclusive('\n').collect();
    let count = raw.len();
    raw.into_iter()
        .enumerate()
        .map(|(index, line)| {
            let has_eol = line.ends_with('\n');
            let content = line.strip_suffix('\n').unwrap_or(line);
            let content = content.strip_suffix('\r').unwrap_or(content);
            SourceLine {
                number: index + 1,
                content,
                has_eol,
                is_last: index + 1 == count,
            }
        })
        .collect()
}

/// Leading whitespace of a line.
pub fn leading_indent(content: &str) -> &str {
    let rest = content.trim_start();
    &content[..content.len() - rest.len()]
}

/// Content no rule could account for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Unclassified(pub String);

// ── Classifier ───────────────────────────────────────────────────────────────

/// Tags lines according to a [`Syntax`].
#[derive(Debug, Clone)]
pub struct Classifier {
    syntax: Syntax,
    escaped_left: String,
}

impl Classifier {
    pub fn new(syntax: &Syntax) -> Self {
        Self {
            escaped_left: syntax.escaped_left(),
            syntax: syntax.clone(),
        }
    }

    pub fn syntax(&self) -> &Syntax {
        &self.syntax
    }

    /// Classify one line of content (without its terminator).
    pub fn classify<'a>(&self, content: &'a str) -> Result<Unit<'a>, Unclassified> {
        if content.trim().is_empty() {
            return Ok(Unit::Empty { content });
        }

        let indent = leading_indent(content);
        let rest = &content[indent.len()..];

        if rest.starts_with(self.escaped_left.as_str()) {
            return self.text(indent, content);
        }

        let standalone = rest
            .strip_prefix(self.syntax.left())
            .and_then(|inner| inner.trim_end().strip_suffix(self.syntax.right()));
        if let Some(inner) = standalone {
            let expr = inner.trim();
            if expr.is_empty() {
                return Err(Unclassified(rest.to_string()));
            }
            if !expr.contains(self.syntax.right()) {
                return Ok(Unit::Placeholder { indent, expr });
            }
        }

        if let Some(code) = rest.strip_prefix(self.syntax.left()) {
            return Ok(Unit::Code {
                indent,
                code: code.trim(),
            });
        }

        self.text(indent, content)
    }

    fn text<'a>(&self, indent: &'a str, content: &'a str) -> Result<Unit<'a>, Unclassified> {
        Ok(Unit::Text {
            indent,
            fragments: self.lex(content)?,
        })
    }

    /// Split a text line into literal runs, escapes and placeholders.
    pub fn lex<'a>(&self, text: &'a str) -> Result<Vec<Fragment<'a>>, Unclassified> {
        let left = self.syntax.left();
        let right = self.syntax.right();
        let escape = self.syntax.escape();

        let mut fragments = Vec::new();
        let mut rest = text;
        while !rest.is_empty() {
            let Some(pos) = rest.find(left) else {
                fragments.push(Fragment::Text(rest));
                break;
            };
            let before = &rest[..pos];
            let after = &rest[pos + left.len()..];

            if let Some(remaining) = after.strip_prefix(escape) {
                fragments.push(Fragment::Escaped(before));
                rest = remaining;
                continue;
            }

            let end = after
                .find(right)
                .ok_or_else(|| Unclassified(rest[pos..].to_string()))?;
            let expr = after[..end].trim();
            if expr.is_empty() {
                let placeholder = &rest[pos..pos + left.len() + end + right.len()];
                return Err(Unclassified(placeholder.to_string()));
            }
            if !before.is_empty() {
                fragments.push(Fragment::Text(before));
            }
            fragments.push(Fragment::Placeholder(expr));
            rest = &after[end + right.len()..];
        }
        Ok(fragments)
    }
}

impl Default for Classifier {
    fn default() -> Self {
        Self::new(&Syntax::default())
    }
}
