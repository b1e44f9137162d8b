use crate::BufferSnapshot;
use core_text::decode_glyphs;

/// Byte range affected by a mutation, expressed in post-edit offsets.
/// Everything from `start` to the end of the longer of the old/new text may
/// have moved on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Edit {
    pub start: usize,
    pub len: usize,
}

/// Single-line edit buffer with a grapheme-aligned cursor.
#[derive(Debug, Default, Clone)]
pub struct LineBuffer {
    text: String,
    cursor: usize,
}

impl LineBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_text(text: &str) -> Self {
        Self {
            text: text.to_owned(),
            cursor: text.len(),
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn snapshot(&self) -> BufferSnapshot<'_> {
        BufferSnapshot::new(self.text.as_bytes(), self.cursor)
    }

    /// Take the committed line, leaving the buffer empty.
    pub fn take(&mut self) -> String {
        self.cursor = 0;
        std::mem::take(&mut self.text)
    }

    fn tail_edit(&self, start: usize, old_len: usize) -> Edit {
        Edit {
            start,
            len: old_len.max(self.text.len()) - start,
        }
    }

    pub fn insert_char(&mut self, ch: char) -> Edit {
        let old_len = self.text.len();
        let at = self.cursor;
        self.text.insert(at, ch);
        self.cursor = at + ch.len_utf8();
        self.tail_edit(at, old_len)
    }

    /// Remove the grapheme before the cursor.
    pub fn backspace(&mut self) -> Option<Edit> {
        let start = self.prev_boundary()?;
        let old_len = self.text.len();
        self.text.replace_range(start..self.cursor, "");
        self.cursor = start;
        Some(self.tail_edit(start, old_len))
    }

    /// Remove the grapheme under the cursor.
    pub fn delete(&mut self) -> Option<Edit> {
        let end = self.next_boundary()?;
        let old_len = self.text.len();
        self.text.replace_range(self.cursor..end, "");
        Some(self.tail_edit(self.cursor, old_len))
    }

    pub fn move_left(&mut self) -> bool {
        match self.prev_boundary() {
            Some(b) => {
                self.cursor = b;
                true
            }
            None => false,
        }
    }

    pub fn move_right(&mut self) -> bool {
        match self.next_boundary() {
            Some(b) => {
                self.cursor = b;
                true
            }
            None => false,
        }
    }

    pub fn move_home(&mut self) -> bool {
        let moved = self.cursor != 0;
        self.cursor = 0;
        moved
    }

    pub fn move_end(&mut self) -> bool {
        let moved = self.cursor != self.text.len();
        self.cursor = self.text.len();
        moved
    }

    fn prev_boundary(&self) -> Option<usize> {
        if self.cursor == 0 {
            return None;
        }
        decode_glyphs(self.text.as_bytes())
            .iter()
            .rev()
            .find(|g| g.start < self.cursor)
            .map(|g| g.start)
    }

    fn next_boundary(&self) -> Option<usize> {
        if self.cursor >= self.text.len() {
            return None;
        }
        decode_glyphs(self.text.as_bytes())
            .iter()
            .find(|g| g.start == self.cursor)
            .map(|g| g.end)
    }
}
