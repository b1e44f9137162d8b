//! Editor-side collaborators of the rendering engine.
//!
//! The renderer never owns the edited text or the color scheme; it borrows a
//! read-only view of both on every render call. This crate defines those
//! boundary types:
//!
//! * `BufferSnapshot`: command bytes, cursor byte offset and highlight spans.
//!   Borrowed, never stored by the renderer.
//! * `Theme`: stable integer identity plus a category -> color lookup. The
//!   renderer only uses colors to annotate cells; escape encoding happens in
//!   the render crate as a pure function of color and terminal capability.
//! * `LineBuffer`: the minimal single-line editing model used by the `lle`
//!   driver. Every mutation reports the byte range it touched so the caller
//!   can forward it to the renderer's dirty tracker.
//! * `highlight`: a tiny shell-ish tokenizer producing `HighlightSpan`s.
//!
//! Invariants:
//! * `BufferSnapshot::cursor` is a byte offset into `text`; values past the end
//!   are rejected by the renderer, not clamped here.
//! * `HighlightSpan` ranges are half-open byte ranges; overlapping spans are
//!   resolved first-match-wins.
//! * `LineBuffer` text is always valid UTF-8 and its cursor always sits on a
//!   grapheme boundary.

mod buffer;
pub mod highlight;
mod theme;

pub use buffer::{Edit, LineBuffer};
pub use theme::{Color, Palette, Theme, ThemeCategory};

/// Half-open byte range tagged with a theme category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HighlightSpan {
    pub start: usize,
    pub end: usize,
    pub category: ThemeCategory,
}

impl HighlightSpan {
    pub fn new(start: usize, end: usize, category: ThemeCategory) -> Self {
        Self {
            start,
            end,
            category,
        }
    }

    #[inline]
    pub fn contains(&self, offset: usize) -> bool {
        offset >= self.start && offset < self.end
    }
}

/// Read-only view of the command buffer for one render call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufferSnapshot<'a> {
    pub text: &'a [u8],
    pub cursor: usize,
    pub highlights: &'a [HighlightSpan],
}

impl<'a> BufferSnapshot<'a> {
    pub fn new(text: &'a [u8], cursor: usize) -> Self {
        Self {
            text,
            cursor,
            highlights: &[],
        }
    }

    pub fn with_highlights(mut self, highlights: &'a [HighlightSpan]) -> Self {
        self.highlights = highlights;
        self
    }

    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Category for the byte at `offset` (plain text when no span covers it).
    pub fn category_at(&self, offset: usize) -> ThemeCategory {
        self.highlights
            .iter()
            .find(|s| s.contains(offset))
            .map_or(ThemeCategory::Text, |s| s.category)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_len_and_default_category() {
        let snap = BufferSnapshot::new(b"ls -la", 2);
        assert_eq!(snap.len(), 6);
        assert!(!snap.is_empty());
        assert_eq!(snap.category_at(0), ThemeCategory::Text);
    }

    #[test]
    fn first_matching_span_wins() {
        let spans = [
            HighlightSpan::new(0, 2, ThemeCategory::Keyword),
            HighlightSpan::new(1, 4, ThemeCategory::String),
        ];
        let snap = BufferSnapshot::new(b"echo", 0).with_highlights(&spans);
        assert_eq!(snap.category_at(1), ThemeCategory::Keyword);
        assert_eq!(snap.category_at(2), ThemeCategory::String);
        assert_eq!(snap.category_at(4), ThemeCategory::Text);
    }
}
