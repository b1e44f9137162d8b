//! Terminal command list and byte encoder.
//!
//! The renderer never writes escape sequences by hand; it records `Command`s
//! here and `encode_into` turns them into one byte buffer through crossterm's
//! `queue!`. Only the write-only subset the engine is allowed to use exists:
//! relative row moves, line feeds, absolute column moves, clear to end of
//! line, foreground color and text. Nothing here can elicit a reply from the
//! terminal.
//!
//! Batching rules:
//! * Consecutive cells with the same foreground coalesce into one `Print`.
//! * Moves and clears flush the pending text first; command order is never
//!   changed.
//! * Color changes are emitted only when the foreground actually changes and
//!   the output ends with a reset whenever a color was left active.
//!
//! `print_commands` and `cells_printed` let tests assert batching without
//! parsing bytes (`print_commands <= cells_printed` always holds).

use crate::Cell;
use crate::style::{Foreground, SetForeground, downsample};
use core_model::Color;
use core_terminal::ColorSupport;
use crossterm::{
    cursor::{MoveDown, MoveToColumn, MoveUp},
    queue,
    style::Print,
    terminal::{Clear, ClearType},
};
use std::io;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    MoveUp(usize),
    MoveDown(usize),
    /// Raw `\n`; scrolls when issued on the last terminal row.
    LineFeed(usize),
    MoveToColumn(usize),
    ClearToEol,
    SetForeground(Foreground),
    Print(String),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriterStats {
    pub print_commands: u64,
    pub cells_printed: u64,
}

#[derive(Debug)]
pub struct Writer {
    cmds: Vec<Command>,
    pending: String,
    color: ColorSupport,
    current_fg: Option<Color>,
    stats: WriterStats,
}

impl Writer {
    pub fn new(color: ColorSupport) -> Self {
        Self {
            cmds: Vec::new(),
            pending: String::new(),
            color,
            current_fg: None,
            stats: WriterStats::default(),
        }
    }

    #[inline]
    fn flush_pending(&mut self) {
        if self.pending.is_empty() {
            return;
        }
        let s = std::mem::take(&mut self.pending);
        self.cmds.push(Command::Print(s));
        self.stats.print_commands += 1;
    }

    pub fn move_up(&mut self, n: usize) {
        if n > 0 {
            self.flush_pending();
            self.cmds.push(Command::MoveUp(n));
        }
    }

    pub fn move_down(&mut self, n: usize) {
        if n > 0 {
            self.flush_pending();
            self.cmds.push(Command::MoveDown(n));
        }
    }

    pub fn line_feed(&mut self, n: usize) {
        if n > 0 {
            self.flush_pending();
            self.cmds.push(Command::LineFeed(n));
        }
    }

    pub fn move_to_column(&mut self, col: usize) {
        self.flush_pending();
        self.cmds.push(Command::MoveToColumn(col));
    }

    pub fn clear_to_eol(&mut self) {
        self.flush_pending();
        self.cmds.push(Command::ClearToEol);
    }

    fn set_fg(&mut self, fg: Option<Color>) {
        if self.color == ColorSupport::None || fg == self.current_fg {
            return;
        }
        if let Some(sgr) = downsample(fg, self.color) {
            self.flush_pending();
            self.cmds.push(Command::SetForeground(sgr));
        }
        self.current_fg = fg;
    }

    /// Queue one cell; returns the columns it advances.
    pub fn print_cell(&mut self, cell: &Cell) -> usize {
        if cell.is_empty() {
            return 0;
        }
        self.set_fg(cell.style.fg);
        self.pending.push_str(cell.as_str());
        self.stats.cells_printed += 1;
        cell.visual_width()
    }

    /// Queue a run of cells; returns the columns they advance.
    pub fn print_cells(&mut self, cells: &[Cell]) -> usize {
        cells.iter().map(|c| self.print_cell(c)).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.cmds.is_empty() && self.pending.is_empty()
    }

    /// Recorded commands (pending text not yet flushed is excluded).
    pub fn commands(&self) -> &[Command] {
        &self.cmds
    }

    /// Encode everything into `out`, resetting the foreground at the end if
    /// a color is still active.
    pub fn encode_into(mut self, out: &mut Vec<u8>) -> io::Result<WriterStats> {
        if self.current_fg.is_some() {
            self.set_fg(None);
        }
        self.flush_pending();
        for c in &self.cmds {
            match c {
                Command::MoveUp(n) => {
                    for step in chunks(*n) {
                        queue!(out, MoveUp(step))?;
                    }
                }
                Command::MoveDown(n) => {
                    for step in chunks(*n) {
                        queue!(out, MoveDown(step))?;
                    }
                }
                Command::LineFeed(n) => {
                    out.extend(std::iter::repeat_n(b'\n', *n));
                }
                Command::MoveToColumn(col) => {
                    // crossterm encodes the 1-based column, so stay below u16::MAX
                    queue!(out, MoveToColumn((*col).min(u16::MAX as usize - 1) as u16))?;
                }
                Command::ClearToEol => {
                    queue!(out, Clear(ClearType::UntilNewLine))?;
                }
                Command::SetForeground(fg) => {
                    queue!(out, SetForeground(*fg))?;
                }
                Command::Print(s) => {
                    queue!(out, Print(s))?;
                }
            }
        }
        Ok(self.stats)
    }
}

// Split a row count into u16-sized steps; zero-length moves are never emitted
// because `CSI 0 A` moves one row on most terminals.
fn chunks(mut n: usize) -> impl Iterator<Item = u16> {
    std::iter::from_fn(move || {
        if n == 0 {
            return None;
        }
        let step = n.min(u16::MAX as usize);
        n -= step;
        Some(step as u16)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{CellFlags, CellStyle};
    use pretty_assertions::assert_eq;

    fn cell(ch: char, fg: Option<Color>) -> Cell {
        Cell::from_char(ch, 1, CellFlags::empty(), CellStyle::fg(fg))
    }

    fn encode(w: Writer) -> (String, WriterStats) {
        let mut out = Vec::new();
        let stats = w.encode_into(&mut out).unwrap();
        (String::from_utf8(out).unwrap(), stats)
    }

    #[test]
    fn batches_consecutive_plain_cells() {
        let mut w = Writer::new(ColorSupport::Ansi16);
        w.move_to_column(5);
        assert_eq!(w.print_cells(&[cell('a', None), cell('b', None), cell('c', None)]), 3);
        w.clear_to_eol();
        let (s, stats) = encode(w);
        assert_eq!(s, "\x1b[6Gabc\x1b[K");
        assert_eq!(stats.print_commands, 1);
        assert_eq!(stats.cells_printed, 3);
    }

    #[test]
    fn color_change_splits_runs_and_resets() {
        let red = Some(Color::Ansi(1));
        let mut w = Writer::new(ColorSupport::Ansi16);
        w.print_cells(&[cell('a', red), cell('b', red), cell('c', None)]);
        let (s, stats) = encode(w);
        assert_eq!(s, "\x1b[31mab\x1b[39mc");
        assert_eq!(stats.print_commands, 2);
        assert!(stats.print_commands <= stats.cells_printed);
    }

    #[test]
    fn trailing_color_is_reset() {
        let mut w = Writer::new(ColorSupport::TrueColor);
        w.print_cell(&cell('x', Some(Color::Rgb { r: 1, g: 2, b: 3 })));
        let (s, _) = encode(w);
        assert_eq!(s, "\x1b[38;2;1;2;3mx\x1b[39m");
    }

    #[test]
    fn no_color_terminal_gets_no_sgr() {
        let mut w = Writer::new(ColorSupport::None);
        w.print_cell(&cell('x', Some(Color::Ansi(2))));
        let (s, _) = encode(w);
        assert_eq!(s, "x");
    }

    #[test]
    fn vertical_moves_and_line_feeds() {
        let mut w = Writer::new(ColorSupport::Ansi16);
        w.move_up(2);
        w.move_down(0);
        w.move_down(1);
        w.line_feed(2);
        w.move_to_column(0);
        let (s, _) = encode(w);
        assert_eq!(s, "\x1b[2A\x1b[1B\n\n\x1b[1G");
    }

    #[test]
    fn huge_moves_are_chunked() {
        let steps: Vec<u16> = chunks(70_000).collect();
        assert_eq!(steps, vec![u16::MAX, 4_465]);
        assert_eq!(chunks(0).count(), 0);
    }
}
