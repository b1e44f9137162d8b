//! Virtual screen model.
//!
//! A `ScreenBuffer` is a growable list of rows whose origin (0,0) is the
//! top-left of the prompt, not of the terminal. Each row holds one `Cell` per
//! Unicode scalar; a row's visual width is the sum of its cells' widths and
//! never exceeds the terminal width except for the transient "pen parked at
//! the right margin" state, which the next printable glyph resolves by
//! wrapping.
//!
//! Layout rules:
//! * A glyph that does not fit in the remaining columns wraps before
//!   placement; wide glyphs are never split across rows.
//! * Zero-width scalars attach after the cell group ending at the pen column
//!   and keep their own slot. A zero-width cluster at column 0 has nothing to
//!   attach to and renders as a one-column U+FFFD.
//! * Prompt text honors `\n`, `\r` (overwrite from column 0) and `\t`.
//!   Command text honors `\n` and `\t`; every other control renders in caret
//!   notation so no raw control byte ever reaches the terminal.
//! * The cursor column may equal the width only transiently; a cursor at the
//!   end of text that would rest on the right margin moves to column 0 of a
//!   fresh row.
//!
//! All growth goes through `try_reserve`; a failure surfaces as
//! `RenderError::AllocationFailure` and leaves the buffer partially built
//! (callers discard `desired` on error).

use crate::error::{RenderError, Result};
use crate::{Cell, CellFlags, CellStyle};
use core_model::{BufferSnapshot, Theme};
use core_text::{decode_glyphs, egc_width, snap_to_glyph_start};

pub const DEFAULT_TAB_WIDTH: usize = 8;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScreenRow {
    cells: Vec<Cell>,
}

impl ScreenRow {
    #[inline]
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    #[inline]
    pub fn get(&self, idx: usize) -> Option<&Cell> {
        self.cells.get(idx)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn visual_width(&self) -> usize {
        self.cells.iter().map(Cell::visual_width).sum()
    }

    /// Visual column at which cell `idx` starts.
    pub fn col_of(&self, idx: usize) -> usize {
        self.cells[..idx.min(self.cells.len())]
            .iter()
            .map(Cell::visual_width)
            .sum()
    }

    /// Concatenated cell text (diagnostics and tests).
    pub fn text(&self) -> String {
        self.cells.iter().map(Cell::as_str).collect()
    }

    // First cell index at or after `col` that carries width; zero-width cells
    // inserted there land behind any marks already attached to the previous
    // group.
    fn insert_index(&self, col: usize) -> usize {
        let mut c = 0;
        for (i, cell) in self.cells.iter().enumerate() {
            if c >= col && cell.visual_width() > 0 {
                return i;
            }
            c += cell.visual_width();
        }
        self.cells.len()
    }

    // Replace whatever covers [col, col + w) with `cell`. Halves of wide
    // glyphs left uncovered become blanks, matching what a terminal shows
    // after a partial overwrite.
    fn overwrite(&mut self, col: usize, cell: Cell) -> Result<()> {
        let end = col + cell.visual_width();
        let mut out: Vec<Cell> = Vec::new();
        out.try_reserve(self.cells.len() + cell.visual_width())
            .map_err(|_| RenderError::alloc("screen cells"))?;
        let mut placed = false;
        let mut c = 0;
        let mut i = 0;
        while i < self.cells.len() {
            let mut j = i + 1;
            while j < self.cells.len() && self.cells[j].is_zero_width() {
                j += 1;
            }
            let base = self.cells[i];
            let (gs, ge) = (c, c + base.visual_width());
            if ge <= col || gs >= end {
                if gs >= end && !placed {
                    out.push(cell);
                    placed = true;
                }
                out.extend_from_slice(&self.cells[i..j]);
            } else {
                let blank = Cell::blank(base.flags & CellFlags::PROMPT, base.style);
                out.extend(std::iter::repeat_n(blank, col.saturating_sub(gs)));
                if !placed {
                    out.push(cell);
                    placed = true;
                }
                out.extend(std::iter::repeat_n(blank, ge.saturating_sub(end)));
            }
            c = ge;
            i = j;
        }
        if !placed {
            out.push(cell);
        }
        self.cells = out;
        Ok(())
    }
}

/// Screen position of one command cluster.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct OffsetSpan {
    start: usize,
    end: usize,
    row: usize,
    col: usize,
}

/// Logical byte offset -> (row, col) mapping for the command text of one
/// frame. Rebuilt on every `render_command`; wrapping and wide glyphs make
/// the relation non-linear, so it is never patched incrementally.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OffsetMap {
    spans: Vec<OffsetSpan>,
    text_len: usize,
    end_pos: (usize, usize),
}

impl OffsetMap {
    fn clear(&mut self) {
        self.spans.clear();
        self.text_len = 0;
        self.end_pos = (0, 0);
    }

    /// Screen position of the cluster containing `offset`; the end-of-text
    /// offset maps to where the cursor would rest.
    pub fn position_of(&self, offset: usize) -> Option<(usize, usize)> {
        let idx = self.spans.partition_point(|s| s.end <= offset);
        match self.spans.get(idx) {
            Some(s) if s.start <= offset => Some((s.row, s.col)),
            _ if offset == self.text_len => Some(self.end_pos),
            _ => None,
        }
    }

    /// Inclusive row range touched by bytes `[start, end)`. Ranges reaching
    /// past the text end include the end-of-text row.
    pub fn rows_for_range(&self, start: usize, end: usize) -> Option<(usize, usize)> {
        if start >= end {
            return self.position_of(start).map(|(r, _)| (r, r));
        }
        let first = self.spans.partition_point(|s| s.end <= start);
        let mut rows: Option<(usize, usize)> = None;
        for s in self.spans[first..].iter().take_while(|s| s.start < end) {
            rows = Some(match rows {
                None => (s.row, s.row),
                Some((lo, hi)) => (lo.min(s.row), hi.max(s.row)),
            });
        }
        if end > self.text_len {
            let r = self.end_pos.0;
            rows = Some(match rows {
                None => (r, r),
                Some((lo, hi)) => (lo.min(r), hi.max(r)),
            });
        }
        rows
    }
}

enum Shape {
    Replacement,
    Caret(char),
    Unprintable,
    Fallback,
    Cluster(usize),
}

impl Shape {
    fn width(&self) -> usize {
        match self {
            Shape::Caret(_) => 2,
            Shape::Replacement | Shape::Unprintable | Shape::Fallback => 1,
            Shape::Cluster(w) => *w,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScreenBuffer {
    rows: Vec<ScreenRow>,
    width: usize,
    tab_width: usize,
    unicode: bool,
    pen_row: usize,
    pen_col: usize,
    cursor_row: usize,
    cursor_col: usize,
    command_start_row: usize,
    command_start_col: usize,
    offsets: OffsetMap,
    replacements: usize,
}

impl ScreenBuffer {
    pub fn new(width: u16) -> Self {
        Self {
            rows: Vec::new(),
            width: width.max(1) as usize,
            tab_width: DEFAULT_TAB_WIDTH,
            unicode: true,
            pen_row: 0,
            pen_col: 0,
            cursor_row: 0,
            cursor_col: 0,
            command_start_row: 0,
            command_start_col: 0,
            offsets: OffsetMap::default(),
            replacements: 0,
        }
    }

    pub fn with_tab_width(mut self, tab_width: usize) -> Self {
        self.tab_width = tab_width.max(1);
        self
    }

    pub fn set_tab_width(&mut self, tab_width: usize) {
        self.tab_width = tab_width.max(1);
    }

    /// When false, every non-ASCII cluster renders as `?`.
    pub fn set_unicode(&mut self, unicode: bool) {
        self.unicode = unicode;
    }

    /// Drop all content and coordinates, keeping allocations where possible.
    pub fn reset(&mut self, width: u16) {
        self.rows.clear();
        self.width = width.max(1) as usize;
        self.pen_row = 0;
        self.pen_col = 0;
        self.cursor_row = 0;
        self.cursor_col = 0;
        self.command_start_row = 0;
        self.command_start_col = 0;
        self.offsets.clear();
        self.replacements = 0;
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn rows(&self) -> &[ScreenRow] {
        &self.rows
    }

    #[inline]
    pub fn row(&self, row: usize) -> Option<&ScreenRow> {
        self.rows.get(row)
    }

    #[inline]
    pub fn cell(&self, row: usize, idx: usize) -> Option<&Cell> {
        self.rows.get(row).and_then(|r| r.get(idx))
    }

    pub fn row_text(&self, row: usize) -> String {
        self.rows.get(row).map(ScreenRow::text).unwrap_or_default()
    }

    /// Number of rows in use.
    #[inline]
    pub fn total_lines(&self) -> usize {
        self.rows.len()
    }

    #[inline]
    pub fn cursor(&self) -> (usize, usize) {
        (self.cursor_row, self.cursor_col)
    }

    #[inline]
    pub fn command_start(&self) -> (usize, usize) {
        (self.command_start_row, self.command_start_col)
    }

    pub fn offset_map(&self) -> &OffsetMap {
        &self.offsets
    }

    pub fn position_of(&self, offset: usize) -> Option<(usize, usize)> {
        self.offsets.position_of(offset)
    }

    pub fn rows_for_range(&self, start: usize, end: usize) -> Option<(usize, usize)> {
        self.offsets.rows_for_range(start, end)
    }

    /// Invalid UTF-8 sequences replaced with U+FFFD in the last command.
    pub fn replacements(&self) -> usize {
        self.replacements
    }

    /// Store one scalar at `(row, col)`. Returns the position following the
    /// glyph, which is where the next glyph would be written. A glyph that
    /// would cross the right margin is placed at the start of the next row.
    pub fn write_cell(
        &mut self,
        row: usize,
        col: usize,
        utf8: &[u8],
        visual_width: u8,
        flags: CellFlags,
        style: CellStyle,
    ) -> Result<(usize, usize)> {
        let cell = Cell::new(utf8, visual_width, flags, style)?;
        self.place(row, col, cell)
    }

    fn ensure_row(&mut self, row: usize) -> Result<()> {
        if row < self.rows.len() {
            return Ok(());
        }
        self.rows
            .try_reserve(row + 1 - self.rows.len())
            .map_err(|_| RenderError::alloc("screen rows"))?;
        self.rows.resize_with(row + 1, ScreenRow::default);
        Ok(())
    }

    fn place(&mut self, mut row: usize, mut col: usize, cell: Cell) -> Result<(usize, usize)> {
        let w = cell.visual_width();
        if w > 0 && col > 0 && col + w > self.width {
            row += 1;
            col = 0;
        }
        self.ensure_row(row)?;
        let target = &mut self.rows[row];
        if w == 0 {
            let idx = target.insert_index(col);
            target
                .cells
                .try_reserve(1)
                .map_err(|_| RenderError::alloc("screen cells"))?;
            target.cells.insert(idx, cell);
            return Ok((row, col));
        }
        let row_w = target.visual_width();
        if col >= row_w {
            let pad = col - row_w;
            target
                .cells
                .try_reserve(pad + 1)
                .map_err(|_| RenderError::alloc("screen cells"))?;
            let blank = Cell::blank(cell.flags & CellFlags::PROMPT, CellStyle::PLAIN);
            target.cells.extend(std::iter::repeat_n(blank, pad));
            target.cells.push(cell);
        } else {
            target.overwrite(col, cell)?;
        }
        Ok((row, col + w))
    }

    // Where a glyph of width `w` written at the pen would land.
    fn placement(&self, w: usize) -> (usize, usize) {
        if w > 0 && self.pen_col > 0 && self.pen_col + w > self.width {
            (self.pen_row + 1, 0)
        } else {
            (self.pen_row, self.pen_col)
        }
    }

    fn put(&mut self, cell: Cell) -> Result<()> {
        let (r, c) = self.place(self.pen_row, self.pen_col, cell)?;
        self.pen_row = r;
        self.pen_col = c;
        Ok(())
    }

    fn newline(&mut self) -> Result<()> {
        self.pen_row += 1;
        self.pen_col = 0;
        self.ensure_row(self.pen_row)
    }

    fn tab(&mut self, flags: CellFlags, style: CellStyle) -> Result<()> {
        if self.pen_col >= self.width {
            self.newline()?;
        }
        let stop = (self.pen_col / self.tab_width + 1) * self.tab_width;
        let n = stop.min(self.width) - self.pen_col;
        for _ in 0..n {
            self.put(Cell::blank(flags, style))?;
        }
        Ok(())
    }

    fn shape(&self, cluster: &str, replaced: bool) -> Shape {
        if replaced {
            return Shape::Replacement;
        }
        let mut chars = cluster.chars();
        if let (Some(c), None) = (chars.next(), chars.next())
            && c.is_control()
        {
            return if (c as u32) < 0x20 || c == '\x7f' {
                Shape::Caret(c)
            } else {
                Shape::Unprintable
            };
        }
        if !self.unicode && !cluster.is_ascii() {
            return Shape::Fallback;
        }
        let w = egc_width(cluster) as usize;
        if w > self.width {
            return Shape::Fallback;
        }
        if w == 0 && self.pen_col == 0 {
            return Shape::Unprintable;
        }
        Shape::Cluster(w)
    }

    fn put_shaped(
        &mut self,
        cluster: &str,
        shape: Shape,
        flags: CellFlags,
        style: CellStyle,
    ) -> Result<()> {
        match shape {
            Shape::Replacement => self.put(Cell::from_char(
                '\u{FFFD}',
                1,
                flags | CellFlags::REPLACEMENT,
                style,
            )),
            Shape::Unprintable => self.put(Cell::from_char(
                '\u{FFFD}',
                1,
                flags | CellFlags::CONTROL,
                style,
            )),
            Shape::Fallback => self.put(Cell::from_char('?', 1, flags, style)),
            Shape::Caret(c) => {
                // keep the two halves of the caret pair on one row
                if self.pen_col > 0 && self.pen_col + 2 > self.width {
                    self.pen_row += 1;
                    self.pen_col = 0;
                }
                let flags = flags | CellFlags::CONTROL;
                self.put(Cell::from_char('^', 1, flags, style))?;
                self.put(Cell::from_char(
                    char::from((c as u8) ^ 0x40),
                    1,
                    flags,
                    style,
                ))
            }
            Shape::Cluster(w) => {
                let mut lead = true;
                for ch in cluster.chars() {
                    let cw = if lead { w as u8 } else { 0 };
                    lead = false;
                    self.put(Cell::from_char(ch, cw, flags, style))?;
                }
                Ok(())
            }
        }
    }

    /// Lay out the prompt from the origin and record where editable content
    /// begins. Every prompt cell carries `CellFlags::PROMPT`.
    pub fn render_prompt(&mut self, prompt: &str, style: CellStyle) -> Result<()> {
        self.pen_row = 0;
        self.pen_col = 0;
        self.ensure_row(0)?;
        let flags = CellFlags::PROMPT;
        for g in decode_glyphs(prompt.as_bytes()) {
            match g.cluster {
                "\n" | "\r\n" => self.newline()?,
                "\r" => self.pen_col = 0,
                "\t" => self.tab(flags, style)?,
                text => {
                    let shape = self.shape(text, g.replaced);
                    self.put_shaped(text, shape, flags, style)?;
                }
            }
        }
        self.command_start_row = self.pen_row;
        self.command_start_col = self.pen_col;
        self.cursor_row = self.pen_row;
        self.cursor_col = self.pen_col;
        Ok(())
    }

    /// Lay out command text from the command start, recording the cursor
    /// position and the offset map. A cursor offset inside a cluster snaps to
    /// the cluster start.
    pub fn render_command(&mut self, snapshot: &BufferSnapshot<'_>, theme: &dyn Theme) -> Result<()> {
        if snapshot.cursor > snapshot.text.len() {
            return Err(RenderError::InvalidInput(format!(
                "cursor offset {} past end of {}-byte buffer",
                snapshot.cursor,
                snapshot.text.len()
            )));
        }
        self.pen_row = self.command_start_row;
        self.pen_col = self.command_start_col;
        self.ensure_row(self.pen_row)?;
        self.offsets.clear();
        self.replacements = 0;
        let glyphs = decode_glyphs(snapshot.text);
        self.offsets
            .spans
            .try_reserve(glyphs.len())
            .map_err(|_| RenderError::alloc("offset map"))?;
        let cursor = snap_to_glyph_start(&glyphs, snapshot.cursor);
        let mut cursor_pos = None;
        for g in &glyphs {
            let style = CellStyle::fg(theme.color_for(snapshot.category_at(g.start)));
            let pos = match g.cluster {
                "\n" | "\r\n" => {
                    let at = (self.pen_row, self.pen_col.min(self.width - 1));
                    self.newline()?;
                    at
                }
                "\t" => {
                    let at = self.placement(1);
                    self.tab(CellFlags::empty(), style)?;
                    at
                }
                text => {
                    let shape = self.shape(text, g.replaced);
                    let at = self.placement(shape.width());
                    if g.replaced {
                        self.replacements += 1;
                    }
                    self.put_shaped(text, shape, CellFlags::empty(), style)?;
                    at
                }
            };
            if g.start == cursor {
                cursor_pos = Some(pos);
            }
            self.offsets.spans.push(OffsetSpan {
                start: g.start,
                end: g.end,
                row: pos.0,
                col: pos.1,
            });
        }
        // never leave the resting cursor on the right margin
        if self.pen_col >= self.width && cursor_pos.is_none() {
            self.pen_row += 1;
            self.pen_col = 0;
        }
        self.ensure_row(self.pen_row)?;
        self.offsets.text_len = snapshot.text.len();
        self.offsets.end_pos = (self.pen_row, self.pen_col);
        (self.cursor_row, self.cursor_col) = cursor_pos.unwrap_or((self.pen_row, self.pen_col));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_model::{Color, HighlightSpan, Palette, ThemeCategory};

    fn build(width: u16, prompt: &str, text: &str, cursor: usize) -> ScreenBuffer {
        let mut sb = ScreenBuffer::new(width);
        sb.render_prompt(prompt, CellStyle::PLAIN).unwrap();
        sb.render_command(&BufferSnapshot::new(text.as_bytes(), cursor), &Palette::plain())
            .unwrap();
        sb
    }

    #[test]
    fn prompt_sets_command_start() {
        let sb = build(80, "lle> ", "", 0);
        assert_eq!(sb.command_start(), (0, 5));
        assert_eq!(sb.cursor(), (0, 5));
        assert_eq!(sb.total_lines(), 1);
        assert!(sb.row(0).unwrap().cells().iter().all(Cell::is_prompt));
    }

    #[test]
    fn two_line_prompt() {
        let sb = build(80, "lle\n> ", "ls", 2);
        assert_eq!(sb.command_start(), (1, 2));
        assert_eq!(sb.row_text(0), "lle");
        assert_eq!(sb.row_text(1), "> ls");
        assert_eq!(sb.cursor(), (1, 4));
    }

    #[test]
    fn wide_glyph_advances_two_columns() {
        let sb = build(80, "lle> ", "a🚀b", 0);
        let row = sb.row(0).unwrap();
        let rocket = row.get(6).unwrap();
        assert_eq!(rocket.byte_len(), 4);
        assert_eq!(rocket.visual_width(), 2);
        assert_eq!(row.col_of(7), 8);
        assert_eq!(sb.position_of(5), Some((0, 8)));
    }

    #[test]
    fn wide_glyph_wraps_instead_of_splitting() {
        let sb = build(4, "", "abc漢", 6);
        assert_eq!(sb.row_text(0), "abc");
        assert_eq!(sb.row_text(1), "漢");
        assert_eq!(sb.position_of(3), Some((1, 0)));
        assert_eq!(sb.cursor(), (1, 2));
    }

    #[test]
    fn zero_width_attaches_to_preceding_cell() {
        let sb = build(80, "", "e\u{0301}x", 0);
        let row = sb.row(0).unwrap();
        assert_eq!(row.len(), 3);
        assert_eq!(row.get(1).unwrap().visual_width(), 0);
        assert_eq!(row.visual_width(), 2);
        assert_eq!(row.text(), "e\u{0301}x");
    }

    #[test]
    fn baseless_mark_at_row_start_takes_a_column() {
        let sb = build(80, "", "\u{0301}x", 0);
        let row = sb.row(0).unwrap();
        assert_eq!(row.text(), "\u{FFFD}x");
        assert_eq!(row.visual_width(), 2);
        assert_eq!(sb.position_of(2), Some((0, 1)));
        // after the prompt there is a base to attach to
        let sb = build(80, "> ", "\u{0301}x", 0);
        assert_eq!(sb.row(0).unwrap().visual_width(), 3);
    }

    #[test]
    fn cursor_at_exact_width_moves_to_new_row() {
        let sb = build(4, "> ", "ab", 2);
        assert_eq!(sb.total_lines(), 2);
        assert_eq!(sb.cursor(), (1, 0));
        // cursor mid-text keeps the single row
        let sb = build(4, "> ", "ab", 1);
        assert_eq!(sb.total_lines(), 1);
        assert_eq!(sb.cursor(), (0, 3));
    }

    #[test]
    fn cursor_inside_cluster_snaps_to_start() {
        let sb = build(80, "", "a漢b", 2);
        assert_eq!(sb.cursor(), (0, 1));
    }

    #[test]
    fn cursor_past_end_is_invalid() {
        let mut sb = ScreenBuffer::new(80);
        sb.render_prompt("", CellStyle::PLAIN).unwrap();
        let err = sb
            .render_command(&BufferSnapshot::new(b"ab", 3), &Palette::plain())
            .unwrap_err();
        assert!(matches!(err, RenderError::InvalidInput(_)));
    }

    #[test]
    fn tabs_expand_to_stops() {
        let sb = ScreenBuffer::new(80).with_tab_width(4);
        let mut sb = sb;
        sb.render_prompt("a\tb", CellStyle::PLAIN).unwrap();
        assert_eq!(sb.row_text(0), "a   b");
        assert_eq!(sb.command_start(), (0, 5));
    }

    #[test]
    fn carriage_return_overwrites_prompt() {
        let mut sb = ScreenBuffer::new(80);
        sb.render_prompt("xx漢yy\rab", CellStyle::PLAIN).unwrap();
        assert_eq!(sb.row_text(0), "ab漢yy");
        sb.reset(80);
        sb.render_prompt("xx漢yy\rabc", CellStyle::PLAIN).unwrap();
        assert_eq!(sb.row_text(0), "abc yy");
        assert_eq!(sb.command_start(), (0, 3));
    }

    #[test]
    fn controls_render_in_caret_notation() {
        let sb = build(80, "", "a\x01\x7fb\r", 5);
        assert_eq!(sb.row_text(0), "a^A^?b^M");
        assert!(sb.cell(0, 1).unwrap().flags.contains(CellFlags::CONTROL));
        assert_eq!(sb.cursor(), (0, 8));
    }

    #[test]
    fn newline_in_command_starts_row() {
        let sb = build(80, "> ", "a\nbc", 4);
        assert_eq!(sb.row_text(0), "> a");
        assert_eq!(sb.row_text(1), "bc");
        assert_eq!(sb.cursor(), (1, 2));
        assert_eq!(sb.rows_for_range(0, 4), Some((0, 1)));
        assert_eq!(sb.rows_for_range(3, 4), Some((1, 1)));
    }

    #[test]
    fn invalid_utf8_recovered_with_replacement() {
        let mut sb = ScreenBuffer::new(80);
        sb.render_prompt("", CellStyle::PLAIN).unwrap();
        sb.render_command(&BufferSnapshot::new(b"a\xffb", 3), &Palette::plain())
            .unwrap();
        assert_eq!(sb.row_text(0), "a\u{FFFD}b");
        assert_eq!(sb.replacements(), 1);
        assert!(sb.cell(0, 1).unwrap().flags.contains(CellFlags::REPLACEMENT));
    }

    #[test]
    fn ascii_fallback_without_unicode() {
        let mut sb = ScreenBuffer::new(80);
        sb.set_unicode(false);
        sb.render_prompt("❯ ", CellStyle::PLAIN).unwrap();
        sb.render_command(&BufferSnapshot::new("漢a".as_bytes(), 0), &Palette::plain())
            .unwrap();
        assert_eq!(sb.row_text(0), "? ?a");
    }

    #[test]
    fn highlight_colors_annotate_cells() {
        let spans = [HighlightSpan::new(0, 2, ThemeCategory::Keyword)];
        let snap = BufferSnapshot::new(b"ls x", 0).with_highlights(&spans);
        let mut sb = ScreenBuffer::new(80);
        sb.render_prompt("", CellStyle::PLAIN).unwrap();
        sb.render_command(&snap, &Palette::dark()).unwrap();
        let kw = Palette::dark().color_for(ThemeCategory::Keyword);
        assert!(matches!(kw, Some(Color::Rgb { .. })));
        assert_eq!(sb.cell(0, 0).unwrap().style.fg, kw);
        assert_eq!(sb.cell(0, 3).unwrap().style.fg, None);
    }

    #[test]
    fn write_cell_wraps_and_validates() {
        let mut sb = ScreenBuffer::new(3);
        let next = sb
            .write_cell(0, 2, "漢".as_bytes(), 2, CellFlags::empty(), CellStyle::PLAIN)
            .unwrap();
        assert_eq!(next, (1, 2));
        assert_eq!(sb.row_text(0), "");
        assert_eq!(sb.row_text(1), "漢");
        assert!(
            sb.write_cell(0, 0, b"ab", 1, CellFlags::empty(), CellStyle::PLAIN)
                .is_err()
        );
    }

    #[test]
    fn end_offset_maps_to_resting_position() {
        let sb = build(80, "lle> ", "ab", 1);
        assert_eq!(sb.position_of(2), Some((0, 7)));
        assert_eq!(sb.position_of(3), None);
        assert_eq!(sb.rows_for_range(2, 3), Some((0, 0)));
    }
}
