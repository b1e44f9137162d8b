//! Lossy UTF-8 decoding + grapheme segmentation adapter.
//!
//! Contract:
//! - Input: raw bytes as supplied by the text buffer (may contain invalid UTF-8).
//! - Output: grapheme clusters in order, each carrying the byte range it was
//!   decoded from. Ranges are contiguous, non-overlapping, and cover the
//!   whole input.
//! - Every maximal invalid byte sequence becomes exactly one U+FFFD glyph with
//!   `replaced == true` (same policy as `String::from_utf8_lossy`). Recovery is
//!   local; decoding never fails.
//! - Safety: does not log content, only sizes.

use unicode_segmentation::UnicodeSegmentation;

/// Replacement glyph substituted for invalid byte sequences.
pub const REPLACEMENT: &str = "\u{FFFD}";

/// One grapheme cluster decoded from the source bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Glyph<'a> {
    pub cluster: &'a str,
    pub start: usize, // byte offset in source (inclusive)
    pub end: usize,   // byte offset in source (exclusive)
    pub replaced: bool,
}

impl Glyph<'_> {
    /// True when `offset` falls inside this glyph's source range.
    #[inline]
    pub fn covers(&self, offset: usize) -> bool {
        offset >= self.start && offset < self.end
    }
}

/// Decode `bytes` into grapheme clusters, substituting U+FFFD for each
/// invalid sequence.
pub fn decode_glyphs(bytes: &[u8]) -> Vec<Glyph<'_>> {
    let mut out = Vec::with_capacity(bytes.len());
    let mut base = 0usize;
    for chunk in bytes.utf8_chunks() {
        let valid = chunk.valid();
        for (idx, g) in valid.grapheme_indices(true) {
            out.push(Glyph {
                cluster: g,
                start: base + idx,
                end: base + idx + g.len(),
                replaced: false,
            });
        }
        base += valid.len();
        let invalid = chunk.invalid();
        if !invalid.is_empty() {
            out.push(Glyph {
                cluster: REPLACEMENT,
                start: base,
                end: base + invalid.len(),
                replaced: true,
            });
            base += invalid.len();
        }
    }
    if out.iter().any(|g| g.replaced) {
        tracing::trace!(
            target: "text.decode",
            size_bytes = bytes.len(),
            replaced = out.iter().filter(|g| g.replaced).count(),
            "invalid_utf8_recovered"
        );
    }
    out
}

/// Snap a byte offset back to the start of the glyph containing it.
/// Offsets at or past the end of input are returned unchanged.
pub fn snap_to_glyph_start(glyphs: &[Glyph<'_>], offset: usize) -> usize {
    glyphs
        .iter()
        .find(|g| g.covers(offset))
        .map_or(offset, |g| g.start)
}
