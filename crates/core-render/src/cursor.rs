//! Cursor movement translator.
//!
//! Tracks where the physical cursor is in virtual coordinates and turns
//! target positions into terminal moves:
//! * vertical moves are relative (`CSI n A` / `CSI n B`), never absolute, so
//!   the virtual origin can sit on any terminal row;
//! * horizontal moves are absolute columns (`CSI n G`), never relative and
//!   never carriage return plus retype.
//!
//! `materialized_rows` counts virtual rows known to exist physically below
//! the origin. `CSI B` stops at the bottom margin, so reaching a row beyond
//! that extent uses line feeds (which scroll) and is always followed by an
//! explicit column move.
//!
//! Line feeds at the bottom margin scroll the terminal. Once the extent is
//! taller than the terminal, the rows above `top_row` have left the screen:
//! `CSI A` would stop at the top margin, so moves never target them.
//!
//! The translator is `Copy`: the renderer drives a scratch copy while
//! encoding a frame and commits it only once the bytes were written.

use crate::writer::Writer;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CursorTranslator {
    tracked_row: usize,
    tracked_col: usize,
    materialized_rows: usize,
    height: usize,
}

impl Default for CursorTranslator {
    fn default() -> Self {
        Self::new()
    }
}

impl CursorTranslator {
    /// Cursor at the origin with only the origin row materialized and no
    /// height bound.
    pub fn new() -> Self {
        Self {
            tracked_row: 0,
            tracked_col: 0,
            materialized_rows: 1,
            height: usize::MAX,
        }
    }

    /// Bound the visible area to `height` terminal rows.
    pub fn with_height(mut self, height: usize) -> Self {
        self.set_height(height);
        self
    }

    pub fn set_height(&mut self, height: usize) {
        self.height = height.max(1);
    }

    #[inline]
    pub fn position(&self) -> (usize, usize) {
        (self.tracked_row, self.tracked_col)
    }

    #[inline]
    pub fn materialized_rows(&self) -> usize {
        self.materialized_rows
    }

    /// First virtual row still on screen.
    #[inline]
    pub fn top_row(&self) -> usize {
        self.materialized_rows.saturating_sub(self.height)
    }

    /// Where a move to `(row, col)` lands: rows above `top_row` and columns
    /// past the last terminal column are clamped.
    pub fn reachable(&self, row: usize, col: usize, width: usize) -> (usize, usize) {
        (row.max(self.top_row()), col.min(width.saturating_sub(1)))
    }

    /// Make the first visible row the new origin, forgetting the rows that
    /// scrolled off. Returns how far the origin moved down.
    pub fn reanchor(&mut self) -> usize {
        let shift = self.top_row();
        self.tracked_row = self.tracked_row.saturating_sub(shift);
        self.materialized_rows -= shift;
        shift
    }

    /// Emit moves from the tracked position to `(row, col)`, clamped by
    /// [`reachable`](Self::reachable). `force_column` emits the column
    /// move even when the tracked column already matches (used when the
    /// physical column is not trusted, e.g. the start of a full redraw).
    pub fn move_to(
        &mut self,
        row: usize,
        col: usize,
        width: usize,
        force_column: bool,
        out: &mut Writer,
    ) {
        let (row, col) = self.reachable(row, col, width);
        let mut fed = false;
        if row > self.tracked_row {
            let last = self.materialized_rows - 1;
            out.move_down(row.min(last).saturating_sub(self.tracked_row));
            if row > last {
                out.line_feed(row - last);
                self.materialized_rows = row + 1;
                fed = true;
            }
        } else if row < self.tracked_row {
            out.move_up(self.tracked_row - row);
        }
        if force_column || fed || col != self.tracked_col {
            out.move_to_column(col);
        }
        self.tracked_row = row;
        self.tracked_col = col;
    }

    /// Account for `cols` columns of printed content. The column may reach
    /// the terminal width (pending wrap); the next move resolves it.
    #[inline]
    pub fn advance(&mut self, cols: usize) {
        self.tracked_col += cols;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::writer::Command;
    use core_terminal::ColorSupport;

    fn moves(t: &mut CursorTranslator, row: usize, col: usize) -> Vec<Command> {
        let mut w = Writer::new(ColorSupport::None);
        t.move_to(row, col, 80, false, &mut w);
        w.commands().to_vec()
    }

    #[test]
    fn same_position_emits_nothing() {
        let mut t = CursorTranslator::new();
        assert!(moves(&mut t, 0, 0).is_empty());
    }

    #[test]
    fn horizontal_is_absolute() {
        let mut t = CursorTranslator::new();
        assert_eq!(moves(&mut t, 0, 7), vec![Command::MoveToColumn(7)]);
        assert_eq!(moves(&mut t, 0, 2), vec![Command::MoveToColumn(2)]);
    }

    #[test]
    fn new_rows_use_line_feeds_then_column() {
        let mut t = CursorTranslator::new();
        assert_eq!(
            moves(&mut t, 2, 0),
            vec![Command::LineFeed(2), Command::MoveToColumn(0)]
        );
        assert_eq!(t.materialized_rows(), 3);
    }

    #[test]
    fn existing_rows_use_relative_moves() {
        let mut t = CursorTranslator::new();
        moves(&mut t, 3, 0);
        assert_eq!(moves(&mut t, 1, 0), vec![Command::MoveUp(2)]);
        assert_eq!(moves(&mut t, 3, 4), vec![Command::MoveDown(2), Command::MoveToColumn(4)]);
    }

    #[test]
    fn mixed_down_and_feed() {
        let mut t = CursorTranslator::new();
        moves(&mut t, 1, 0);
        moves(&mut t, 0, 0);
        assert_eq!(
            moves(&mut t, 3, 0),
            vec![Command::MoveDown(1), Command::LineFeed(2), Command::MoveToColumn(0)]
        );
    }

    #[test]
    fn pending_wrap_column_is_resolved() {
        let mut t = CursorTranslator::new();
        let mut w = Writer::new(ColorSupport::None);
        t.move_to(0, 75, 80, false, &mut w);
        t.advance(5);
        assert_eq!(t.position(), (0, 80));
        assert_eq!(moves(&mut t, 0, 79), vec![Command::MoveToColumn(79)]);
    }

    #[test]
    fn scrolled_rows_are_never_targeted() {
        let mut t = CursorTranslator::new().with_height(3);
        moves(&mut t, 4, 0);
        assert_eq!(t.top_row(), 2);
        assert_eq!(moves(&mut t, 0, 0), vec![Command::MoveUp(2)]);
        assert_eq!(t.position(), (2, 0));
        assert_eq!(t.reachable(1, 90, 80), (2, 79));
    }

    #[test]
    fn reanchor_moves_origin_to_first_visible_row() {
        let mut t = CursorTranslator::new().with_height(3);
        moves(&mut t, 4, 5);
        assert_eq!(t.reanchor(), 2);
        assert_eq!(t.position(), (2, 5));
        assert_eq!(t.materialized_rows(), 3);
        assert_eq!(t.top_row(), 0);
        assert_eq!(moves(&mut t, 0, 0), vec![Command::MoveUp(2), Command::MoveToColumn(0)]);
    }

    #[test]
    fn short_extent_keeps_origin_reachable() {
        let mut t = CursorTranslator::new().with_height(24);
        moves(&mut t, 5, 0);
        assert_eq!(t.top_row(), 0);
        assert_eq!(t.reanchor(), 0);
        assert_eq!(moves(&mut t, 0, 0), vec![Command::MoveUp(5)]);
    }

    #[test]
    fn forced_column_move() {
        let mut t = CursorTranslator::new();
        let mut w = Writer::new(ColorSupport::None);
        t.move_to(0, 0, 80, true, &mut w);
        assert_eq!(w.commands(), &[Command::MoveToColumn(0)]);
    }
}
