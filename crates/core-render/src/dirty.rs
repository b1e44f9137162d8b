//! Dirty offset tracking.
//!
//! Records which logical byte ranges of the command buffer changed since the
//! last successful render, plus a full-redraw flag. Ranges are stored sparse
//! (boundaries only) and kept sorted and coalesced, so marking a huge paste
//! costs one entry.
//!
//! Invariants:
//! * A fresh tracker reports `needs_full_redraw() == true`; nothing has been
//!   drawn yet.
//! * `is_region_dirty` is conservative: it never returns false for an offset
//!   that was marked, and returns true for everything while a full redraw is
//!   pending.
//! * A mark is never dropped. If storage cannot grow, the tracker escalates
//!   to a full redraw before reporting `AllocationFailure`.
//! * Only `clear()` resets state, and the renderer calls it only after a
//!   frame was written successfully.
//!
//! Not thread-safe (mutably borrowed from the single edit loop).

use crate::error::{RenderError, Result};

// Past this many disjoint ranges they collapse into one covering range.
const MAX_RANGES: usize = 256;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirtyTracker {
    ranges: Vec<(usize, usize)>,
    full_redraw_needed: bool,
}

impl Default for DirtyTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl DirtyTracker {
    pub fn new() -> Self {
        Self {
            ranges: Vec::new(),
            full_redraw_needed: true,
        }
    }

    /// Mark a single logical offset dirty.
    pub fn mark_region(&mut self, offset: usize) -> Result<()> {
        self.mark_range(offset, 1)
    }

    /// Mark `[start, start + length)` dirty. Zero-length marks still record
    /// the insertion point.
    pub fn mark_range(&mut self, start: usize, length: usize) -> Result<()> {
        let end = start.saturating_add(length.max(1));
        if self.ranges.try_reserve(1).is_err() {
            self.full_redraw_needed = true;
            tracing::warn!(target: "render.dirty", start, length, "dirty_mark_escalated_full");
            return Err(RenderError::alloc("dirty ranges"));
        }
        let mut merged = (start, end);
        self.ranges.retain(|&(s, e)| {
            if s <= merged.1 && merged.0 <= e {
                merged = (merged.0.min(s), merged.1.max(e));
                false
            } else {
                true
            }
        });
        let at = self.ranges.partition_point(|&(s, _)| s < merged.0);
        self.ranges.insert(at, merged);
        if self.ranges.len() > MAX_RANGES {
            let lo = self.ranges.first().map_or(start, |r| r.0);
            let hi = self.ranges.last().map_or(end, |r| r.1);
            self.ranges.clear();
            self.ranges.push((lo, hi));
        }
        Ok(())
    }

    pub fn mark_full(&mut self) {
        self.full_redraw_needed = true;
    }

    pub fn is_region_dirty(&self, offset: usize) -> bool {
        self.full_redraw_needed
            || self
                .ranges
                .iter()
                .any(|&(s, e)| offset >= s && offset < e)
    }

    #[inline]
    pub fn needs_full_redraw(&self) -> bool {
        self.full_redraw_needed
    }

    /// Sorted, disjoint half-open ranges.
    pub fn ranges(&self) -> &[(usize, usize)] {
        &self.ranges
    }

    /// True when no range is marked and no full redraw is pending.
    pub fn is_clean(&self) -> bool {
        self.ranges.is_empty() && !self.full_redraw_needed
    }

    pub fn clear(&mut self) {
        self.ranges.clear();
        self.full_redraw_needed = false;
    }
}

/// Tracker-optional query; an absent tracker reports every offset dirty.
pub fn is_region_dirty(tracker: Option<&DirtyTracker>, offset: usize) -> bool {
    tracker.is_none_or(|t| t.is_region_dirty(offset))
}

/// Tracker-optional query; an absent tracker demands a full redraw.
pub fn needs_full_redraw(tracker: Option<&DirtyTracker>) -> bool {
    tracker.is_none_or(DirtyTracker::needs_full_redraw)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_tracker_needs_full_redraw() {
        let t = DirtyTracker::new();
        assert!(t.needs_full_redraw());
        assert!(t.is_region_dirty(12345));
    }

    #[test]
    fn clear_resets_until_next_mark() {
        let mut t = DirtyTracker::new();
        t.clear();
        assert!(!t.needs_full_redraw());
        assert!(!t.is_region_dirty(0));
        assert!(t.is_clean());
        t.mark_region(3).unwrap();
        assert!(t.is_region_dirty(3));
        assert!(!t.is_region_dirty(4));
        t.mark_full();
        assert!(t.needs_full_redraw());
    }

    #[test]
    fn ranges_coalesce_and_sort() {
        let mut t = DirtyTracker::new();
        t.clear();
        t.mark_range(10, 5).unwrap();
        t.mark_range(0, 2).unwrap();
        t.mark_range(14, 4).unwrap();
        t.mark_region(2).unwrap();
        assert_eq!(t.ranges(), &[(0, 3), (10, 18)]);
    }

    #[test]
    fn interior_offsets_of_range_are_dirty() {
        let mut t = DirtyTracker::new();
        t.clear();
        t.mark_range(100, 1000).unwrap();
        assert_eq!(t.ranges().len(), 1);
        assert!(t.is_region_dirty(100));
        assert!(t.is_region_dirty(650));
        assert!(t.is_region_dirty(1099));
        assert!(!t.is_region_dirty(1100));
    }

    #[test]
    fn many_disjoint_marks_collapse() {
        let mut t = DirtyTracker::new();
        t.clear();
        for i in 0..(MAX_RANGES + 1) {
            t.mark_region(i * 3).unwrap();
        }
        assert_eq!(t.ranges(), &[(0, MAX_RANGES * 3 + 1)]);
        assert!(t.is_region_dirty(1));
    }

    #[test]
    fn absent_tracker_is_conservative() {
        assert!(is_region_dirty(None, 7));
        assert!(needs_full_redraw(None));
        let mut t = DirtyTracker::new();
        t.clear();
        assert!(!needs_full_redraw(Some(&t)));
        assert!(!is_region_dirty(Some(&t), 7));
    }

    #[test]
    fn overflowing_range_saturates() {
        let mut t = DirtyTracker::new();
        t.clear();
        t.mark_range(usize::MAX - 1, 10).unwrap();
        assert!(t.is_region_dirty(usize::MAX - 1));
    }
}
