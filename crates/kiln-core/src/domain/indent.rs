//! Indent tracking.
//!
//! Template indentation drives block structure in the generated script. The
//! tracker keeps a stack of open contexts, one per block-opening code line,
//! and decides for every fresh line which blocks it closes and how deep the
//! emitted statement sits.
//!
//! Comparison is by raw character count of the leading whitespace. Tabs are
//! not expanded.

/// Which kind of block a context was opened by.
///
/// The kind decides which continuation keyword may take over a context
/// (`else` continues a conditional, `until` closes a `repeat`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlockKind {
    /// `if ... then`, `elseif ... then`, `else`.
    Conditional,
    /// `for ... do`, `while ... do`, bare `do`.
    Loop,
    /// `function name(...)` or `function(...)`.
    Function,
    /// `repeat`, closed by `until`.
    Repeat,
}

impl BlockKind {
    /// The statement that closes a context of this kind when the template
    /// leaves it implicitly.
    pub const fn closer(self) -> &'static str {
        match self {
            // `until` needs a condition; an implicit close repeats once.
            Self::Repeat => "until true",
            _ => "end",
        }
    }
}

/// Whether a line opens a new context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndentMode {
    /// The line opens a block; its raw indent is pushed after resolution.
    Activ(BlockKind),
    /// An ordinary line.
    Passiv,
}

/// An open block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndentContext {
    pub indent: String,
    pub kind: BlockKind,
}

impl IndentContext {
    pub fn width(&self) -> usize {
        self.indent.chars().count()
    }
}

/// A context popped while resolving a line, with the depth it was opened at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClosedBlock {
    pub depth: usize,
    pub context: IndentContext,
}

/// Outcome of resolving a fresh line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    /// Indentation for the emitted statement.
    pub emitted: String,
    /// Contexts closed by this line, innermost first.
    pub closed: Vec<ClosedBlock>,
    /// Raw indentation beyond the innermost context still open, measured
    /// after popping and before pushing.
    pub leftover: String,
}

#[derive(Debug, Clone)]
pub struct IndentTracker {
    unit: usize,
    stack: Vec<IndentContext>,
}

impl IndentTracker {
    pub fn new(unit: usize) -> Self {
        Self {
            unit,
            stack: Vec::new(),
        }
    }

    pub fn unit(&self) -> usize {
        self.unit
    }

    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stack.is_empty()
    }

    pub fn innermost(&self) -> Option<&IndentContext> {
        self.stack.last()
    }

    /// Emitted indentation for a given depth.
    pub fn indent_for(&self, depth: usize) -> String {
        " ".repeat(self.unit * depth)
    }

    /// Resolve a fresh logical line.
    ///
    /// Every context whose indentation is not shorter than `raw` is closed.
    /// The emitted indent reflects the contexts that remain. In `Activ`
    /// mode `raw` is pushed afterwards, even when contexts were just popped.
    pub fn resolve(&mut self, raw: &str, mode: IndentMode) -> Resolution {
        let width = raw.chars().count();
        let mut closed = Vec::new();
        while let Some(context) = self.stack.last() {
            if context.width() < width {
                break;
            }
            let depth = self.stack.len() - 1;
            if let Some(context) = self.stack.pop() {
                closed.push(ClosedBlock { depth, context });
            }
        }

        let consumed = self.innermost().map_or(0, IndentContext::width);
        let leftover = raw.chars().skip(consumed).collect();
        let emitted = self.indent_for(self.depth());

        if let IndentMode::Activ(kind) = mode {
            self.stack.push(IndentContext {
                indent: raw.to_string(),
                kind,
            });
        }

        Resolution {
            emitted,
            closed,
            leftover,
        }
    }

    /// Indentation for a mid-line fragment: full depth, no popping.
    pub fn continuation(&self) -> String {
        self.indent_for(self.depth())
    }

    /// Close every open context, innermost first.
    pub fn close_all(&mut self) -> Vec<ClosedBlock> {
        let mut closed = Vec::with_capacity(self.stack.len());
        while let Some(context) = self.stack.pop() {
            closed.push(ClosedBlock {
                depth: self.stack.len(),
                context,
            });
        }
        closed
    }
}

impl Default for IndentTracker {
    fn default() -> Self {
        Self::new(crate::domain::value_objects::DEFAULT_INDENT_UNIT)
    }
}
