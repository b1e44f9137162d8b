//! Property tests for the diff engine and the dirty tracker.

use core_model::{BufferSnapshot, Palette};
use core_render::{CellStyle, DirtyTracker, ScreenBuffer, diff};
use proptest::prelude::*;

const ALPHABET: &[&str] = &["a", "Z", " ", "漢", "🚀", "e\u{0301}", "\t", "\n", "\u{7f}"];

fn text() -> impl Strategy<Value = String> {
    prop::collection::vec(prop::sample::select(ALPHABET), 0..30).prop_map(|v| v.concat())
}

fn screen(width: u16, prompt: &str, text: &str) -> ScreenBuffer {
    let mut sb = ScreenBuffer::new(width);
    sb.render_prompt(prompt, CellStyle::PLAIN).unwrap();
    sb.render_command(&BufferSnapshot::new(text.as_bytes(), 0), &Palette::plain())
        .unwrap();
    sb
}

proptest! {
    #[test]
    fn diff_of_identical_buffers_is_empty(width in 4u16..40, t in text()) {
        let a = screen(width, "lle> ", &t);
        prop_assert!(diff(&a, &a.clone()).is_empty());
    }

    #[test]
    fn changes_are_row_ordered_and_cover_differences(
        width in 4u16..40,
        a in text(),
        b in text(),
    ) {
        let sa = screen(width, "> ", &a);
        let sb = screen(width, "> ", &b);
        let changes = diff(&sa, &sb);
        prop_assert!(changes.windows(2).all(|w| w[0].row < w[1].row));
        let cells = |s: &ScreenBuffer, row: usize| s.row(row).map(|r| r.cells().to_vec()).unwrap_or_default();
        for row in 0..sa.total_lines().max(sb.total_lines()) {
            let differs = cells(&sa, row) != cells(&sb, row);
            prop_assert_eq!(differs, changes.iter().any(|c| c.row == row));
        }
        for c in &changes {
            let tail = cells(&sb, c.row)[c.start_index..].to_vec();
            prop_assert_eq!(&c.new_content, &tail);
            prop_assert!(c.new_content.first().is_none_or(|cell| !cell.is_zero_width()) || c.start_index == 0);
        }
    }

    #[test]
    fn appending_ascii_touches_only_the_tail(t in "[a-z ]{0,20}", ch in "[a-z]") {
        let before = screen(200, "lle> ", &t);
        let after = screen(200, "lle> ", &format!("{t}{ch}"));
        let changes = diff(&before, &after);
        prop_assert_eq!(changes.len(), 1);
        prop_assert_eq!(changes[0].start_col, 5 + t.len());
        prop_assert!(!changes[0].clear_to_eol);
        prop_assert_eq!(changes[0].content_bytes(), ch.into_bytes());
    }

    #[test]
    fn dirty_tracker_never_forgets_a_mark(
        marks in prop::collection::vec((0usize..500, 0usize..20), 1..60),
    ) {
        let mut t = DirtyTracker::new();
        t.clear();
        for &(start, len) in &marks {
            t.mark_range(start, len).unwrap();
        }
        for &(start, len) in &marks {
            for off in start..start + len.max(1) {
                prop_assert!(t.is_region_dirty(off));
            }
        }
        prop_assert!(t.ranges().windows(2).all(|w| w[0].1 < w[1].0));
        t.clear();
        prop_assert!(!t.needs_full_redraw());
        for &(start, _) in &marks {
            prop_assert!(!t.is_region_dirty(start));
        }
    }
}

#[test]
fn fresh_tracker_demands_full_redraw() {
    let mut t = DirtyTracker::new();
    assert!(t.needs_full_redraw());
    assert!(t.is_region_dirty(12_345));
    t.clear();
    assert!(!t.needs_full_redraw());
    t.mark_region(3).unwrap();
    assert!(!t.needs_full_redraw());
    assert!(t.is_region_dirty(3));
}
