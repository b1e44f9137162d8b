//! Render path metrics.
//!
//! Execution counters for the render pipeline: which path each frame took,
//! how the cache behaved and how much reached the terminal. Counters are
//! relaxed atomics so a host can read a `snapshot()` from a diagnostics
//! thread without borrowing the renderer mutably.

use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Default)]
pub struct RenderPathMetrics {
    /// Frames written through the full-redraw path (first render, reset, resize, write failure, explicit request).
    pub full_frames: AtomicU64,
    /// Frames written as a diff (cache hit or miss).
    pub diff_frames: AtomicU64,
    /// Renders that found nothing to write (no row changes, cursor unmoved).
    pub skipped_frames: AtomicU64,
    /// Diff frames replayed from the render cache.
    pub cache_hits: AtomicU64,
    /// Diff frames that had to be encoded.
    pub cache_misses: AtomicU64,
    /// Encoded diff frames stored in the cache.
    pub cache_stores: AtomicU64,
    /// Entries dropped by LRU eviction (expected behavior, not an error).
    pub cache_evictions: AtomicU64,
    /// Screen rows repainted across all frames.
    pub rows_changed: AtomicU64,
    /// Bytes handed to the output sink successfully.
    pub bytes_written: AtomicU64,
    /// Frames rejected by the output sink.
    pub write_failures: AtomicU64,
    /// Invalid UTF-8 sequences rendered as U+FFFD.
    pub encoding_recoveries: AtomicU64,
    /// `mark_dirty_*` calls received.
    pub dirty_marks: AtomicU64,
    /// Screen rows derived from dirty byte ranges at render time.
    pub dirty_rows_mapped: AtomicU64,
    /// Changed rows not covered by any dirty mark (prompt or layout shifts, or a missed mark).
    pub unmarked_row_changes: AtomicU64,
    /// Calls to `reset()` (including those issued by `resize`).
    pub resets: AtomicU64,
    /// Full redraws that moved the origin to the first visible row because rows above it scrolled off.
    pub reanchors: AtomicU64,
    /// Duration (ns) of the most recent render call.
    pub last_render_ns: AtomicU64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RenderPathMetricsSnapshot {
    pub full_frames: u64,
    pub diff_frames: u64,
    pub skipped_frames: u64,
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub cache_stores: u64,
    pub cache_evictions: u64,
    pub rows_changed: u64,
    pub bytes_written: u64,
    pub write_failures: u64,
    pub encoding_recoveries: u64,
    pub dirty_marks: u64,
    pub dirty_rows_mapped: u64,
    pub unmarked_row_changes: u64,
    pub resets: u64,
    pub reanchors: u64,
    pub last_render_ns: u64,
}

impl RenderPathMetrics {
    #[inline]
    pub(crate) fn add(counter: &AtomicU64, n: u64) {
        counter.fetch_add(n, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> RenderPathMetricsSnapshot {
        RenderPathMetricsSnapshot {
            full_frames: self.full_frames.load(Ordering::Relaxed),
            diff_frames: self.diff_frames.load(Ordering::Relaxed),
            skipped_frames: self.skipped_frames.load(Ordering::Relaxed),
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            cache_misses: self.cache_misses.load(Ordering::Relaxed),
            cache_stores: self.cache_stores.load(Ordering::Relaxed),
            cache_evictions: self.cache_evictions.load(Ordering::Relaxed),
            rows_changed: self.rows_changed.load(Ordering::Relaxed),
            bytes_written: self.bytes_written.load(Ordering::Relaxed),
            write_failures: self.write_failures.load(Ordering::Relaxed),
            encoding_recoveries: self.encoding_recoveries.load(Ordering::Relaxed),
            dirty_marks: self.dirty_marks.load(Ordering::Relaxed),
            dirty_rows_mapped: self.dirty_rows_mapped.load(Ordering::Relaxed),
            unmarked_row_changes: self.unmarked_row_changes.load(Ordering::Relaxed),
            resets: self.resets.load(Ordering::Relaxed),
            reanchors: self.reanchors.load(Ordering::Relaxed),
            last_render_ns: self.last_render_ns.load(Ordering::Relaxed),
        }
    }
}
