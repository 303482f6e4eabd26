//! Interval edit buffer with a generated-to-original source map.
//!
//! Edits are recorded against the untouched original text and applied
//! once, in offset order. The resulting [`SourceMap`] answers "which
//! original line/column produced this generated line/column". Offsets
//! and columns are UTF-16 units.

use crate::error::CoreError;
use crate::span::{Span, line_col};

#[derive(Debug, Clone, PartialEq, Eq)]
struct Edit {
    start: usize,
    /// Exclusive. Equal to `start` for insertions.
    end: usize,
    text: String,
}

#[derive(Debug, Clone)]
pub struct EditBuffer {
    original: String,
    edits: Vec<Edit>,
}

impl EditBuffer {
    pub fn new(original: &str) -> Self {
        EditBuffer {
            original: original.to_string(),
            edits: Vec::new(),
        }
    }

    /// Replace the text covered by `span`.
    pub fn replace(&mut self, span: Span, text: impl Into<String>) {
        self.edits.push(Edit {
            start: span.start,
            end: span.end + 1,
            text: text.into(),
        });
    }

    /// Insert `text` before the unit at `at`.
    pub fn insert(&mut self, at: usize, text: impl Into<String>) {
        self.edits.push(Edit {
            start: at,
            end: at,
            text: text.into(),
        });
    }

    /// Produce the edited text and its source map. Insertions at an
    /// offset go before a replacement starting at the same offset; any
    /// other overlap is an error.
    pub fn apply(&self) -> Result<(String, SourceMap), CoreError> {
        let mut units = 0;
        let chars: Vec<(usize, char)> = self
            .original
            .chars()
            .map(|ch| {
                let at = units;
                units += ch.len_utf16();
                (at, ch)
            })
            .collect();
        // first char starting at or after a unit offset
        let index = |offset: usize| chars.partition_point(|&(at, _)| at < offset);

        let mut edits: Vec<&Edit> = self.edits.iter().collect();
        edits.sort_by_key(|edit| (edit.start, edit.end > edit.start));

        let mut out = Emitter::new(&self.original);
        let mut cursor = 0;
        for edit in edits {
            if edit.start < cursor || edit.end > units {
                return Err(CoreError::OverlappingEdit(edit.start));
            }
            out.verbatim(&chars[index(cursor)..index(edit.start)]);
            out.replacement(&edit.text, edit.start);
            cursor = edit.end;
        }
        out.verbatim(&chars[index(cursor)..]);
        Ok(out.finish())
    }
}

/// One mapping entry of a generated line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment {
    pub generated_column: usize,
    pub original_line: usize,
    pub original_column: usize,
    /// Whether the text from this column on was copied unchanged, so
    /// columns inside it map one to one.
    pub verbatim: bool,
}

/// Decoded source map: one ordered segment list per generated line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceMap {
    pub lines: Vec<Vec<Segment>>,
}

impl SourceMap {
    /// Original line and column of a generated position, using the last
    /// segment at or before `column`.
    pub fn lookup(&self, line: usize, column: usize) -> Option<(usize, usize)> {
        let segment = self
            .lines
            .get(line)?
            .iter()
            .take_while(|segment| segment.generated_column <= column)
            .last()?;
        if segment.verbatim {
            Some((
                segment.original_line,
                segment.original_column + (column - segment.generated_column),
            ))
        } else {
            Some((segment.original_line, segment.original_column))
        }
    }
}

struct Emitter<'a> {
    original: &'a str,
    text: String,
    column: usize,
    map: SourceMap,
}

impl<'a> Emitter<'a> {
    fn new(original: &'a str) -> Self {
        Emitter {
            original,
            text: String::new(),
            column: 0,
            map: SourceMap {
                lines: vec![Vec::new()],
            },
        }
    }

    fn mark(&mut self, original_offset: usize, verbatim: bool) {
        let (original_line, original_column) = line_col(self.original, original_offset);
        if let Some(line) = self.map.lines.last_mut() {
            line.push(Segment {
                generated_column: self.column,
                original_line,
                original_column,
                verbatim,
            });
        }
    }

    fn newline(&mut self) {
        self.text.push('\n');
        self.column = 0;
        self.map.lines.push(Vec::new());
    }

    /// Copy `chars`, each paired with its original offset.
    fn verbatim(&mut self, chars: &[(usize, char)]) {
        let Some(&(offset, _)) = chars.first() else {
            return;
        };
        self.mark(offset, true);
        let mut rest = chars.iter().peekable();
        while let Some(&(_, ch)) = rest.next() {
            if ch == '\n' {
                self.newline();
                if let Some(&&(next, _)) = rest.peek() {
                    self.mark(next, true);
                }
            } else {
                self.text.push(ch);
                self.column += ch.len_utf16();
            }
        }
    }

    fn replacement(&mut self, text: &str, offset: usize) {
        if text.is_empty() {
            return;
        }
        self.mark(offset, false);
        let mut chars = text.chars().peekable();
        while let Some(ch) = chars.next() {
            if ch == '\n' {
                self.newline();
                if chars.peek().is_some() {
                    self.mark(offset, false);
                }
            } else {
                self.text.push(ch);
                self.column += ch.len_utf16();
            }
        }
    }

    fn finish(self) -> (String, SourceMap) {
        (self.text, self.map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn applies_edits_in_offset_order() {
        let mut buffer = EditBuffer::new("_: ns.add(1 fee);");
        buffer.replace(Span::new(12, 14), "16");
        buffer.replace(Span::new(3, 8), "add");
        let (text, _) = buffer.apply().expect("apply");
        assert_eq!(text, "_: add(1 16);");
    }

    #[test]
    fn insert_goes_before_replacement_at_same_offset() {
        let mut buffer = EditBuffer::new("abc");
        buffer.replace(Span::new(1, 1), "X");
        buffer.insert(1, "<");
        assert_eq!(buffer.apply().expect("apply").0, "a<Xc");
    }

    #[test]
    fn rejects_overlaps() {
        let mut buffer = EditBuffer::new("abcdef");
        buffer.replace(Span::new(1, 3), "x");
        buffer.replace(Span::new(2, 4), "y");
        assert!(matches!(buffer.apply(), Err(CoreError::OverlappingEdit(2))));
    }

    #[test]
    fn maps_generated_positions_back() {
        let mut buffer = EditBuffer::new("_: ns.add(1\n  2 foo);");
        buffer.replace(Span::new(3, 8), "add");
        buffer.replace(Span::new(16, 18), "123456");
        let (text, map) = buffer.apply().expect("apply");
        assert_eq!(text, "_: add(1\n  2 123456);");

        // verbatim prefix maps one to one
        assert_eq!(map.lookup(0, 1), Some((0, 1)));
        // inside a replacement maps to its start
        assert_eq!(map.lookup(0, 4), Some((0, 3)));
        // after a shorter replacement columns shift back
        assert_eq!(map.lookup(0, 7), Some((0, 10)));
        // second line
        assert_eq!(map.lookup(1, 2), Some((1, 2)));
        assert_eq!(map.lookup(1, 8), Some((1, 4)));
        assert_eq!(map.lookup(1, 10), Some((1, 7)));
        assert_eq!(map.lookup(5, 0), None);
    }

    #[test]
    fn astral_chars_take_two_columns() {
        let mut buffer = EditBuffer::new("/*\u{1f600}*/ _: ns.add(1);");
        buffer.replace(Span::new(10, 15), "add");
        let (text, map) = buffer.apply().expect("apply");
        assert_eq!(text, "/*\u{1f600}*/ _: add(1);");
        assert_eq!(map.lookup(0, 8), Some((0, 8)));
        assert_eq!(map.lookup(0, 11), Some((0, 10)));
        assert_eq!(map.lookup(0, 13), Some((0, 16)));

        let mut buffer = EditBuffer::new("\u{1f600}");
        buffer.replace(Span::new(0, 1), "x");
        assert_eq!(buffer.apply().expect("apply").0, "x");
    }
}
