//! Row-wise shared-prefix diff between two screen buffers.
//!
//! For every row index up to the taller of the two buffers the longest run of
//! equal leading cells is skipped and the rest of the desired row becomes one
//! `ScreenChange`. Cells compare on bytes, width, flags and style, so a color
//! or prompt-flag change alone yields a change.
//!
//! Ordering: changes come out in increasing row order and each change's
//! content runs left to right from `start_col`, so the cursor translator can
//! follow them without lookahead.
//!
//! A change never starts on a zero-width cell: the prefix backs up to the
//! cell carrying the cluster's width so the whole cluster is re-emitted.

use crate::Cell;
use crate::screen::{ScreenBuffer, ScreenRow};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScreenChange {
    pub row: usize,
    /// Visual column where `new_content` begins.
    pub start_col: usize,
    /// Cell index in the desired row matching `start_col` (shared prefix length).
    pub start_index: usize,
    pub new_content: Vec<Cell>,
    /// Stale content remains to the right of the new content.
    pub clear_to_eol: bool,
}

impl ScreenChange {
    /// UTF-8 bytes of the new content (without escapes).
    pub fn content_bytes(&self) -> Vec<u8> {
        self.new_content
            .iter()
            .flat_map(|c| c.bytes().iter().copied())
            .collect()
    }
}

const NO_CELLS: &[Cell] = &[];

fn cells_of(buf: &ScreenBuffer, row: usize) -> &[Cell] {
    buf.row(row).map_or(NO_CELLS, ScreenRow::cells)
}

fn width_of(cells: &[Cell]) -> usize {
    cells.iter().map(Cell::visual_width).sum()
}

/// Diff one row. `None` when the rows are identical.
pub fn diff_row(row: usize, actual: &[Cell], desired: &[Cell]) -> Option<ScreenChange> {
    if actual == desired {
        return None;
    }
    let mut prefix = actual
        .iter()
        .zip(desired)
        .take_while(|(a, d)| a == d)
        .count();
    while prefix > 0
        && (desired.get(prefix).is_some_and(Cell::is_zero_width)
            || actual.get(prefix).is_some_and(Cell::is_zero_width))
    {
        prefix -= 1;
    }
    let start_col = width_of(&desired[..prefix]);
    Some(ScreenChange {
        row,
        start_col,
        start_index: prefix,
        new_content: desired[prefix..].to_vec(),
        clear_to_eol: width_of(actual) > width_of(desired),
    })
}

/// Minimal changes turning `actual` into `desired`.
pub fn diff(actual: &ScreenBuffer, desired: &ScreenBuffer) -> Vec<ScreenChange> {
    let rows = actual.total_lines().max(desired.total_lines());
    let changes: Vec<ScreenChange> = (0..rows)
        .filter_map(|row| diff_row(row, cells_of(actual, row), cells_of(desired, row)))
        .collect();
    tracing::trace!(
        target: "render.diff",
        rows,
        changed = changes.len(),
        "diff_computed"
    );
    changes
}

/// Full repaint of `desired`: every row from column 0 with clear-to-eol,
/// extended with blank clears up to `extent_rows` so rows left over from a
/// taller earlier frame are wiped.
pub fn diff_full(desired: &ScreenBuffer, extent_rows: usize) -> Vec<ScreenChange> {
    let rows = desired.total_lines().max(extent_rows);
    (0..rows)
        .map(|row| ScreenChange {
            row,
            start_col: 0,
            start_index: 0,
            new_content: cells_of(desired, row).to_vec(),
            clear_to_eol: true,
        })
        .collect()
}
