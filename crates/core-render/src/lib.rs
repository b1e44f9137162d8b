//! Differential terminal renderer for an inline line editor.
//!
//! The engine keeps a virtual model of what the terminal shows (`actual`) and
//! rebuilds the target (`desired`) from the prompt, command snapshot and theme
//! on every render. Only the difference between the two is written, using
//! relative vertical moves and absolute column moves, so the virtual origin
//! (top-left of the prompt) never has to coincide with terminal row 0. The
//! terminal is never queried.
//!
//! Cell model: one Unicode scalar per `Cell`. The first scalar of a grapheme
//! cluster carries the cluster's visual width; trailing scalars (combining
//! marks, ZWJ tails, variation selectors) are zero-width cells that stay in
//! their own slot so the row can be reconstructed byte for byte.
//!
//! Invariants:
//! - `Cell::byte_len()` equals the UTF-8 length of the stored scalar; `0`
//!   only for the empty sentinel.
//! - `visual_width` is 0, 1 or 2 and is decided solely by `core_text::width`.
//! - After a successful render `actual` equals the frame just written. After a
//!   failed write `actual` is stale and a full redraw is pending.
//!
//! Modules:
//! - `screen`: `ScreenBuffer` grid, prompt/command layout, offset mapping.
//! - `dirty`: sparse dirty offset ranges + full-redraw flag.
//! - `diff`: row-wise shared-prefix diff producing `ScreenChange`s.
//! - `cursor`: relative-row / absolute-column movement translator.
//! - `cache`: LRU of encoded frame deltas keyed by 64-bit hashes.
//! - `writer`: terminal command list + byte encoder.
//! - `style`: color downsampling and SGR encoding per color support.
//! - `render_engine`: the `Renderer` state machine tying it together.
//! - `metrics`: relaxed atomic counters and a snapshot type.

use bitflags::bitflags;
use core_model::Color;

pub mod cache;
pub mod cursor;
pub mod diff;
pub mod dirty;
pub mod error;
pub mod metrics;
pub mod render_engine;
pub mod screen;
pub mod style;
pub mod writer;

pub use cache::{CachedFrame, RenderCache};
pub use cursor::CursorTranslator;
pub use diff::{ScreenChange, diff, diff_full};
pub use dirty::DirtyTracker;
pub use error::RenderError;
pub use metrics::{RenderPathMetrics, RenderPathMetricsSnapshot};
pub use render_engine::{RenderOptions, RenderState, Renderer, SyncPolicy, fallback_dump};
pub use screen::{OffsetMap, ScreenBuffer, ScreenRow};

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct CellFlags: u8 {
        const PROMPT      = 0b0000_0001; // written by render_prompt
        const REPLACEMENT = 0b0000_0010; // U+FFFD standing in for invalid input
        const CONTROL     = 0b0000_0100; // control char or baseless mark, caret pair or U+FFFD
    }
}

/// Display attributes attached to a cell. Two cells with different styles
/// never compare equal, so a color change alone produces a diff.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct CellStyle {
    pub fg: Option<Color>,
}

impl CellStyle {
    pub const PLAIN: CellStyle = CellStyle { fg: None };

    pub fn fg(color: Option<Color>) -> Self {
        Self { fg: color }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Cell {
    utf8: [u8; 4],
    byte_len: u8,
    visual_width: u8,
    pub flags: CellFlags,
    pub style: CellStyle,
}

impl Default for Cell {
    fn default() -> Self {
        Self::EMPTY
    }
}

impl Cell {
    /// Empty sentinel (`byte_len == 0`).
    pub const EMPTY: Cell = Cell {
        utf8: [0; 4],
        byte_len: 0,
        visual_width: 0,
        flags: CellFlags::empty(),
        style: CellStyle::PLAIN,
    };

    #[inline]
    pub fn from_char(ch: char, visual_width: u8, flags: CellFlags, style: CellStyle) -> Self {
        let mut utf8 = [0u8; 4];
        let byte_len = ch.encode_utf8(&mut utf8).len() as u8;
        Self {
            utf8,
            byte_len,
            visual_width: visual_width.min(2),
            flags,
            style,
        }
    }

    /// Build a cell from raw bytes. `utf8` must hold exactly one scalar value
    /// and `visual_width` must be 0, 1 or 2.
    pub fn new(
        utf8: &[u8],
        visual_width: u8,
        flags: CellFlags,
        style: CellStyle,
    ) -> error::Result<Self> {
        let s = std::str::from_utf8(utf8)
            .map_err(|_| RenderError::InvalidInput("cell bytes are not valid UTF-8".into()))?;
        let mut chars = s.chars();
        let (Some(ch), None) = (chars.next(), chars.next()) else {
            return Err(RenderError::InvalidInput(format!(
                "cell must hold one scalar, got {} bytes",
                utf8.len()
            )));
        };
        if visual_width > 2 {
            return Err(RenderError::InvalidInput(format!(
                "visual width {visual_width} out of range"
            )));
        }
        Ok(Self::from_char(ch, visual_width, flags, style))
    }

    #[inline]
    pub fn blank(flags: CellFlags, style: CellStyle) -> Self {
        Self::from_char(' ', 1, flags, style)
    }

    #[inline]
    pub fn bytes(&self) -> &[u8] {
        &self.utf8[..self.byte_len as usize]
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        std::str::from_utf8(self.bytes()).unwrap_or(core_text::REPLACEMENT)
    }

    #[inline]
    pub fn byte_len(&self) -> usize {
        self.byte_len as usize
    }

    #[inline]
    pub fn visual_width(&self) -> usize {
        self.visual_width as usize
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.byte_len == 0
    }

    #[inline]
    pub fn is_prompt(&self) -> bool {
        self.flags.contains(CellFlags::PROMPT)
    }

    #[inline]
    pub fn is_zero_width(&self) -> bool {
        self.visual_width == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_sentinel() {
        assert!(Cell::EMPTY.is_empty());
        assert_eq!(Cell::EMPTY.byte_len(), 0);
        assert_eq!(Cell::default(), Cell::EMPTY);
    }

    #[test]
    fn width_classes_round_trip() {
        for (s, w) in [("a", 1u8), ("\u{0301}", 0), ("漢", 2), ("🚀", 2)] {
            let cell = Cell::new(s.as_bytes(), w, CellFlags::empty(), CellStyle::PLAIN).unwrap();
            assert_eq!(cell.bytes(), s.as_bytes());
            assert_eq!(cell.byte_len(), s.len());
            assert_eq!(cell.visual_width(), w as usize);
            assert_eq!(cell.as_str(), s);
        }
    }

    #[test]
    fn rejects_multi_scalar_and_bad_width() {
        assert!(Cell::new(b"ab", 1, CellFlags::empty(), CellStyle::PLAIN).is_err());
        assert!(Cell::new(b"\xff", 1, CellFlags::empty(), CellStyle::PLAIN).is_err());
        assert!(Cell::new(b"", 1, CellFlags::empty(), CellStyle::PLAIN).is_err());
        assert!(Cell::new(b"a", 3, CellFlags::empty(), CellStyle::PLAIN).is_err());
    }

    #[test]
    fn style_and_prompt_flag_participate_in_equality() {
        let a = Cell::from_char('x', 1, CellFlags::empty(), CellStyle::PLAIN);
        let b = Cell::from_char('x', 1, CellFlags::PROMPT, CellStyle::PLAIN);
        let c = Cell::from_char('x', 1, CellFlags::empty(), CellStyle::fg(Some(Color::Ansi(1))));
        assert_ne!(a, b);
        assert_ne!(a, c);
        assert!(b.is_prompt());
    }
}
