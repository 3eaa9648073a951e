#![forbid(unsafe_code)]

//! Text buffer with a single cursor/selection.
//!
//! Offsets count chars (Unicode scalar values). The cursor always satisfies
//! `index + length <= len()`, and every text mutation goes through
//! [`TextBuffer::replace`], which updates text and cursor together.

/// Caret (`length == 0`) or selection `[index, index + length)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Cursor {
    pub index: usize,
    pub length: usize,
}

impl Cursor {
    #[must_use]
    pub const fn new(index: usize, length: usize) -> Self {
        Self { index, length }
    }

    /// A zero-length cursor at `index`.
    #[must_use]
    pub const fn caret(index: usize) -> Self {
        Self { index, length: 0 }
    }

    #[must_use]
    pub const fn is_caret(&self) -> bool {
        self.length == 0
    }

    /// Exclusive end of the covered range, saturating at `usize::MAX`.
    #[must_use]
    pub const fn end(&self) -> usize {
        self.index.saturating_add(self.length)
    }
}

/// The document text and its cursor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextBuffer {
    text: String,
    cursor: Cursor,
    /// Cached char count of `text`.
    len: usize,
}

impl TextBuffer {
    /// Create a buffer with the caret at `caret` (clamped to the text).
    pub fn new(text: impl Into<String>, caret: usize) -> Self {
        let text = text.into();
        let len = text.chars().count();
        Self {
            text,
            cursor: Cursor::caret(caret.min(len)),
            len,
        }
    }

    /// Current text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Current cursor.
    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    /// Length in chars.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Text before and after the cursor index.
    pub fn split_at_cursor(&self) -> (&str, &str) {
        self.text.split_at(self.byte_offset(self.cursor.index))
    }

    /// Text covered by the current selection (empty for a caret).
    pub fn selected_text(&self) -> &str {
        let start = self.byte_offset(self.cursor.index);
        let end = self.byte_offset(self.cursor.end());
        &self.text[start..end]
    }

    // --- Text modification ---

    /// Replace `range` with `new_text` and leave a caret after the insertion.
    ///
    /// A range that overhangs the end of the buffer is clamped to it.
    pub fn replace(&mut self, range: Cursor, new_text: &str) {
        let start = range.index.min(self.len);
        let end = range.end().min(self.len);
        let byte_start = self.byte_offset(start);
        let byte_end = self.byte_offset(end);
        let inserted = new_text.chars().count();

        self.text.replace_range(byte_start..byte_end, new_text);
        self.len = self.len - (end - start) + inserted;
        self.cursor = Cursor::caret(start + inserted);
    }

    /// Backspace: delete the selection, or the char before the caret.
    ///
    /// Returns `false` (and changes nothing) for a caret at offset 0.
    pub fn delete_backward(&mut self) -> bool {
        let range = if !self.cursor.is_caret() {
            self.cursor
        } else if self.cursor.index > 0 {
            Cursor::new(self.cursor.index - 1, 1)
        } else {
            return false;
        };
        self.replace(range, "");
        true
    }

    // --- Cursor movement ---

    /// Collapse a selection to its start, or step the caret one char left.
    pub fn move_left(&mut self) -> bool {
        let before = self.cursor;
        self.cursor = if before.is_caret() {
            Cursor::caret(before.index.saturating_sub(1))
        } else {
            Cursor::caret(before.index)
        };
        self.cursor != before
    }

    /// Collapse a selection to its end, or step the caret one char right.
    pub fn move_right(&mut self) -> bool {
        let before = self.cursor;
        self.cursor = if before.is_caret() {
            Cursor::caret((before.index + 1).min(self.len))
        } else {
            Cursor::caret(before.end())
        };
        self.cursor != before
    }

    /// Select the whole buffer.
    pub fn select_all(&mut self) -> bool {
        let before = self.cursor;
        self.cursor = Cursor::new(0, self.len);
        self.cursor != before
    }

    /// Put a caret at `offset`, clamped to the buffer.
    pub fn place_caret(&mut self, offset: usize) -> bool {
        let before = self.cursor;
        self.cursor = Cursor::caret(offset.min(self.len));
        self.cursor != before
    }

    /// Adopt a native selection given as two offsets in either order.
    ///
    /// Offsets past the end of the buffer are rejected without change.
    pub fn set_selection(&mut self, start: usize, end: usize) -> bool {
        let (lo, hi) = if start <= end { (start, end) } else { (end, start) };
        if hi > self.len {
            return false;
        }
        let before = self.cursor;
        self.cursor = Cursor::new(lo, hi - lo);
        self.cursor != before
    }

    // --- Internal helpers ---

    fn byte_offset(&self, char_idx: usize) -> usize {
        self.text
            .char_indices()
            .nth(char_idx)
            .map_or(self.text.len(), |(i, _)| i)
    }
}
