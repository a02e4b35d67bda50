//! Line-shift bookkeeping between template source and compiled script.
//!
//! Most template lines compile to exactly one script line. Lines that do not
//! (extra fragments of a text line, implicit block closers) are *phantom*
//! lines. Every phantom appends an entry so that a line number reported by
//! the script runtime can be mapped back to the template.

/// Counters at the moment a phantom line was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineShift {
    pub real: usize,
    pub phantom: usize,
}

impl LineShift {
    /// Compiled line number of the phantom this entry records.
    pub fn position(&self) -> usize {
        self.real + self.phantom
    }
}

/// Ordered, append-only record of phantom lines.
///
/// Entries are non-decreasing in both fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LineShiftTable {
    real: usize,
    phantom: usize,
    entries: Vec<LineShift>,
}

impl LineShiftTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn record_real(&mut self) {
        self.real += 1;
    }

    pub fn record_phantom(&mut self) {
        self.phantom += 1;
        self.entries.push(LineShift {
            real: self.real,
            phantom: self.phantom,
        });
    }

    pub fn entries(&self) -> &[LineShift] {
        &self.entries
    }

    pub fn real_lines(&self) -> usize {
        self.real
    }

    pub fn phantom_lines(&self) -> usize {
        self.phantom
    }

    /// Total compiled lines recorded so far.
    pub fn total_lines(&self) -> usize {
        self.real + self.phantom
    }

    /// Map a 1-based compiled line number to its template source line.
    ///
    /// The first entry at or past `line` decides the shift. A line that is
    /// itself a phantom maps to the source line it continues; any other line
    /// is shifted by the phantoms recorded before it. Past the last entry the
    /// total phantom count applies, and an empty table maps lines unchanged.
    pub fn map_compiled_line(&self, line: usize) -> usize {
        let mut previous = 0;
        for entry in &self.entries {
            let position = entry.position();
            if position == line {
                return line.saturating_sub(entry.phantom);
            }
            if position > line {
                return line.saturating_sub(previous);
            }
            previous = entry.phantom;
        }
        line.saturating_sub(previous)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_table_maps_lines_unchanged() {
        let table = LineShiftTable::new();
        assert_eq!(table.map_compiled_line(1), 1);
        assert_eq!(table.map_compiled_line(42), 42);
    }

    #[test]
    fn phantom_lines_append_entries() {
        let mut table = LineShiftTable::new();
        table.record_real();
        table.record_real();
        table.record_phantom();
        table.record_real();
        table.record_phantom();
        assert_eq!(
            table.entries(),
            &[
                LineShift {
                    real: 2,
                    phantom: 1
                },
                LineShift {
                    real: 3,
                    phantom: 2
                }
            ]
        );
        assert_eq!(table.total_lines(), 5);
    }

    #[test]
    fn lines_after_phantoms_shift_back() {
        // source 1 -> compiled 1, source 2 -> compiled 2 plus phantom 3,
        // source 3 -> compiled 4, source 4 -> compiled 5
        let mut table = LineShiftTable::new();
        table.record_real();
        table.record_real();
        table.record_phantom();
        table.record_real();
        table.record_real();

        assert_eq!(table.map_compiled_line(1), 1);
        assert_eq!(table.map_compiled_line(2), 2);
        assert_eq!(table.map_compiled_line(3), 2);
        assert_eq!(table.map_compiled_line(4), 3);
        assert_eq!(table.map_compiled_line(5), 4);
    }

    #[test]
    fn placeholder_fragment_on_fifth_line_maps_back_to_five() {
        // Line 5 is "text <% missing %>": the text fragment is real (5) and
        // the placeholder fragment is a phantom on compiled line 6.
        let mut table = LineShiftTable::new();
        for _ in 0..5 {
            table.record_real();
        }
        table.record_phantom();
        assert_eq!(table.map_compiled_line(6), 5);
        assert_eq!(table.map_compiled_line(5), 5);
    }

    #[test]
    fn reset_clears_everything() {
        let mut table = LineShiftTable::new();
        table.record_real();
        table.record_phantom();
        table.reset();
        assert!(table.entries().is_empty());
        assert_eq!(table.total_lines(), 0);
    }
}
