//! Render pipeline: the `Renderer` state machine.
//!
//! One `Renderer` per editing session owns the screen model (`actual`), the
//! scratch target (`desired`), the dirty tracker, the render cache and the
//! tracked physical cursor. Every `render` call rebuilds `desired` from
//! scratch, turns the difference into bytes and writes them in one go.
//!
//! State machine:
//!
//! ```text
//!   Uninitialized --render--> Synced <--mark_*/render--> Dirty
//!        ^                                                 |
//!        +------------- reset / resize --------------------+
//! ```
//!
//! Paths per render:
//! * full: first render, after `reset`/`resize`, after a failed write or on
//!   `mark_full_redraw`. Repaints every row from the origin and clears rows
//!   left over from taller frames. The cache is not consulted.
//! * cached: the delta from the previous frame to this one was encoded before
//!   and is replayed as is.
//! * diff: row diff of `actual` vs `desired`, encoded through the cursor
//!   translator, then stored in the cache.
//!
//! Frames taller than the terminal scroll their first rows off the top.
//! Those rows cannot be reached again, so a frame that changes one of them
//! takes the full path with the origin moved to the first visible row, and
//! a cursor inside them is shown on the first visible row.
//! * skipped: nothing changed and the cursor did not move; no bytes.
//!
//! `actual` is replaced only after the sink accepted every byte. A failed
//! write leaves `actual` stale and escalates the next render to a full
//! redraw; a failure while building `desired` leaves everything untouched.

use crate::CellStyle;
use crate::cache::{DEFAULT_CAPACITY, RenderCache, frame_key, transition_key};
use crate::cursor::CursorTranslator;
use crate::diff::{ScreenChange, diff, diff_full};
use crate::dirty::DirtyTracker;
use crate::error::{RenderError, Result};
use crate::metrics::{RenderPathMetrics, RenderPathMetricsSnapshot};
use crate::screen::{DEFAULT_TAB_WIDTH, ScreenBuffer};
use crate::writer::Writer;
use core_model::{BufferSnapshot, Theme, ThemeCategory};
use core_terminal::{OutputSink, TerminalCapabilities, write_all};
use crossterm::{
    queue,
    terminal::{BeginSynchronizedUpdate, EndSynchronizedUpdate},
};
use std::collections::BTreeSet;
use std::sync::atomic::Ordering;
use std::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderState {
    /// Nothing trusted on screen; the next render repaints everything.
    Uninitialized,
    /// `actual` matches the terminal and no marks are pending.
    Synced,
    /// Marks are pending (or a write failed); the next render catches up.
    Dirty,
}

/// When to wrap frames in `CSI ? 2026 h/l` synchronized update markers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SyncPolicy {
    /// Only when the terminal is known to support them.
    #[default]
    Auto,
    Always,
    Never,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderOptions {
    pub cache_capacity: usize,
    pub tab_width: usize,
    pub sync: SyncPolicy,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            cache_capacity: DEFAULT_CAPACITY,
            tab_width: DEFAULT_TAB_WIDTH,
            sync: SyncPolicy::Auto,
        }
    }
}

/// Raw command text for hosts degrading after an unrecoverable render
/// error. Invalid UTF-8 is replaced, nothing is styled.
pub fn fallback_dump(snapshot: &BufferSnapshot<'_>) -> String {
    String::from_utf8_lossy(snapshot.text).into_owned()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FramePath {
    Full,
    Cached,
    Diff,
}

impl FramePath {
    fn as_str(self) -> &'static str {
        match self {
            FramePath::Full => "full",
            FramePath::Cached => "cached",
            FramePath::Diff => "diff",
        }
    }
}

pub struct Renderer<S: OutputSink> {
    sink: S,
    caps: TerminalCapabilities,
    options: RenderOptions,
    actual: ScreenBuffer,
    desired: ScreenBuffer,
    dirty: DirtyTracker,
    cache: RenderCache,
    translator: CursorTranslator,
    state: RenderState,
    last_key: Option<u64>,
    last_cache_key: Option<u64>,
    metrics: RenderPathMetrics,
}

impl<S: OutputSink> Renderer<S> {
    pub fn new(sink: S, caps: TerminalCapabilities) -> Self {
        Self::with_options(sink, caps, RenderOptions::default())
    }

    pub fn with_options(sink: S, caps: TerminalCapabilities, options: RenderOptions) -> Self {
        let tab_width = options.tab_width.max(1);
        Self {
            sink,
            caps,
            options: RenderOptions {
                tab_width,
                ..options
            },
            actual: ScreenBuffer::new(caps.width).with_tab_width(tab_width),
            desired: ScreenBuffer::new(caps.width).with_tab_width(tab_width),
            dirty: DirtyTracker::new(),
            cache: RenderCache::new(options.cache_capacity),
            translator: CursorTranslator::new().with_height(usize::from(caps.height)),
            state: RenderState::Uninitialized,
            last_key: None,
            last_cache_key: None,
            metrics: RenderPathMetrics::default(),
        }
    }

    /// Bring the terminal in line with `prompt` followed by the snapshot's
    /// command text, styled by `theme`.
    pub fn render(
        &mut self,
        snapshot: &BufferSnapshot<'_>,
        prompt: &str,
        theme: &dyn Theme,
    ) -> Result<()> {
        let started = Instant::now();
        let span = tracing::debug_span!(
            target: "render.engine",
            "render_cycle",
            text_len = snapshot.len(),
            cursor = snapshot.cursor,
            state = ?self.state
        );
        let _enter = span.enter();
        let result = self.render_frame(snapshot, prompt, theme);
        let elapsed = u64::try_from(started.elapsed().as_nanos()).unwrap_or(u64::MAX);
        self.metrics.last_render_ns.store(elapsed, Ordering::Relaxed);
        if let Err(e) = &result {
            tracing::debug!(target: "render.engine", error = %e, "render_failed");
        }
        result
    }

    fn render_frame(
        &mut self,
        snapshot: &BufferSnapshot<'_>,
        prompt: &str,
        theme: &dyn Theme,
    ) -> Result<()> {
        if self.caps.width == 0 {
            return Err(RenderError::InvalidInput("terminal width is zero".into()));
        }
        if snapshot.cursor > snapshot.len() {
            return Err(RenderError::InvalidInput(format!(
                "cursor offset {} past end of {}-byte buffer",
                snapshot.cursor,
                snapshot.len()
            )));
        }
        self.build_desired(snapshot, prompt, theme)?;
        let recovered = self.desired.replacements();
        if recovered > 0 {
            RenderPathMetrics::add(&self.metrics.encoding_recoveries, recovered as u64);
            tracing::debug!(target: "render.engine", recovered, "invalid_utf8_replaced");
        }

        let width = self.desired.width();
        let key = frame_key(
            snapshot.text,
            snapshot.cursor,
            snapshot.highlights,
            theme.id(),
            prompt,
            width,
        );
        let mut translator = self.translator;
        let full = self.state == RenderState::Uninitialized || self.dirty.needs_full_redraw();

        let (path, frame, cache_key) = if full {
            (FramePath::Full, self.encode_full(&mut translator)?, None)
        } else {
            let height = usize::from(self.caps.height);
            let cache_key = self
                .last_key
                .map(|prev| transition_key(prev, key, translator.materialized_rows(), height));
            let cached = cache_key
                .and_then(|k| self.cache.lookup(k))
                .map(|hit| (hit.bytes.to_vec(), hit.cursor));
            if let Some((bytes, replayed)) = cached {
                RenderPathMetrics::add(&self.metrics.cache_hits, 1);
                translator = replayed;
                (FramePath::Cached, bytes, None)
            } else {
                RenderPathMetrics::add(&self.metrics.cache_misses, 1);
                let changes = diff(&self.actual, &self.desired);
                let top = translator.top_row();
                if changes.iter().any(|c| c.row < top) {
                    tracing::debug!(target: "render.engine", top, "change_above_visible_rows");
                    (FramePath::Full, self.encode_full(&mut translator)?, None)
                } else if changes.is_empty() && self.landing(&translator) == translator.position() {
                    RenderPathMetrics::add(&self.metrics.skipped_frames, 1);
                    tracing::trace!(target: "render.engine", "frame_skipped");
                    self.commit(translator, key);
                    return Ok(());
                } else {
                    self.note_dirty_coverage(&changes);
                    RenderPathMetrics::add(&self.metrics.rows_changed, changes.len() as u64);
                    let frame = self.encode(&changes, &mut translator, false)?;
                    (FramePath::Diff, frame, cache_key)
                }
            }
        };

        if let Some(k) = cache_key {
            self.store_frame(k, &frame, translator);
        }
        self.last_cache_key = cache_key.or(self.last_cache_key);
        self.write_frame(&frame)?;

        match path {
            FramePath::Full => RenderPathMetrics::add(&self.metrics.full_frames, 1),
            FramePath::Cached | FramePath::Diff => {
                RenderPathMetrics::add(&self.metrics.diff_frames, 1)
            }
        }
        tracing::debug!(
            target: "render.engine",
            path = path.as_str(),
            bytes = frame.len(),
            rows = self.desired.total_lines(),
            "frame_written"
        );
        self.commit(translator, key);
        Ok(())
    }

    fn build_desired(
        &mut self,
        snapshot: &BufferSnapshot<'_>,
        prompt: &str,
        theme: &dyn Theme,
    ) -> Result<()> {
        let desired = &mut self.desired;
        desired.reset(self.caps.width);
        desired.set_tab_width(self.options.tab_width);
        desired.set_unicode(self.caps.supports_unicode);
        desired.render_prompt(prompt, CellStyle::fg(theme.color_for(ThemeCategory::Prompt)))?;
        desired.render_command(snapshot, theme)
    }

    // Where the desired cursor ends up once clamped to the visible rows.
    fn landing(&self, translator: &CursorTranslator) -> (usize, usize) {
        let (row, col) = self.desired.cursor();
        translator.reachable(row, col, self.desired.width())
    }

    // Repaint every row from the origin, first moving the origin down to the
    // first visible row if earlier rows scrolled off. Rows left over from
    // taller frames are cleared.
    fn encode_full(&self, translator: &mut CursorTranslator) -> Result<Vec<u8>> {
        let shifted = translator.reanchor();
        let extent = if shifted > 0 {
            RenderPathMetrics::add(&self.metrics.reanchors, 1);
            tracing::debug!(target: "render.engine", shifted, "origin_reanchored");
            translator.materialized_rows()
        } else {
            self.actual.total_lines().max(translator.materialized_rows())
        };
        let changes = diff_full(&self.desired, extent);
        RenderPathMetrics::add(&self.metrics.rows_changed, changes.len() as u64);
        self.encode(&changes, translator, true)
    }

    // Encode `changes` followed by the move to the desired cursor. The
    // translator is a scratch copy; the caller commits it after the write.
    fn encode(
        &self,
        changes: &[ScreenChange],
        translator: &mut CursorTranslator,
        full: bool,
    ) -> Result<Vec<u8>> {
        let width = self.desired.width();
        let mut writer = Writer::new(self.caps.color);
        if full {
            translator.move_to(0, 0, width, true, &mut writer);
        }
        let mut estimate = 16;
        for change in changes {
            translator.move_to(change.row, change.start_col, width, false, &mut writer);
            if change.clear_to_eol {
                writer.clear_to_eol();
            }
            translator.advance(writer.print_cells(&change.new_content));
            estimate += 16 + change.new_content.len() * 4;
        }
        let (row, col) = self.desired.cursor();
        translator.move_to(row, col, width, false, &mut writer);

        let mut out = Vec::new();
        out.try_reserve(estimate)
            .map_err(|_| RenderError::alloc("frame bytes"))?;
        let stats = writer.encode_into(&mut out)?;
        tracing::trace!(
            target: "render.engine",
            print_commands = stats.print_commands,
            cells_printed = stats.cells_printed,
            "frame_encoded"
        );
        Ok(out)
    }

    fn store_frame(&mut self, key: u64, frame: &[u8], cursor: CursorTranslator) {
        match self.cache.store(key, frame, cursor) {
            Ok(evicted) => {
                RenderPathMetrics::add(&self.metrics.cache_stores, 1);
                RenderPathMetrics::add(&self.metrics.cache_evictions, evicted as u64);
            }
            // caching is an optimization; the frame is still written
            Err(e) => tracing::warn!(target: "render.cache", error = %e, "cache_store_failed"),
        }
    }

    fn sync_enabled(&self) -> bool {
        match self.options.sync {
            SyncPolicy::Auto => self.caps.synchronized_output,
            SyncPolicy::Always => true,
            SyncPolicy::Never => false,
        }
    }

    fn write_frame(&mut self, frame: &[u8]) -> Result<()> {
        let wrapped;
        let bytes = if self.sync_enabled() {
            let mut buf = Vec::new();
            buf.try_reserve(frame.len() + 16)
                .map_err(|_| RenderError::alloc("frame bytes"))?;
            queue!(buf, BeginSynchronizedUpdate)?;
            buf.extend_from_slice(frame);
            queue!(buf, EndSynchronizedUpdate)?;
            wrapped = buf;
            &wrapped[..]
        } else {
            frame
        };
        match write_all(&mut self.sink, bytes) {
            Ok(()) => {
                RenderPathMetrics::add(&self.metrics.bytes_written, bytes.len() as u64);
                Ok(())
            }
            Err((written, err)) => {
                self.dirty.mark_full();
                if self.state == RenderState::Synced {
                    self.state = RenderState::Dirty;
                }
                RenderPathMetrics::add(&self.metrics.write_failures, 1);
                RenderPathMetrics::add(&self.metrics.bytes_written, written as u64);
                tracing::warn!(
                    target: "render.engine",
                    written,
                    total = bytes.len(),
                    error = %err,
                    "frame_write_failed"
                );
                Err(RenderError::WriteFailure(err))
            }
        }
    }

    fn commit(&mut self, translator: CursorTranslator, key: u64) {
        std::mem::swap(&mut self.actual, &mut self.desired);
        self.translator = translator;
        self.last_key = Some(key);
        self.dirty.clear();
        self.state = RenderState::Synced;
    }

    // Rows of the on-screen frame covered by the pending dirty ranges.
    fn mapped_dirty_rows(&self) -> BTreeSet<usize> {
        let map = self.actual.offset_map();
        let mut rows = BTreeSet::new();
        for &(start, end) in self.dirty.ranges() {
            if let Some((lo, hi)) = map.rows_for_range(start, end) {
                rows.extend(lo..=hi);
            }
        }
        rows
    }

    fn note_dirty_coverage(&self, changes: &[ScreenChange]) {
        if self.dirty.ranges().is_empty() {
            return;
        }
        let rows = self.mapped_dirty_rows();
        RenderPathMetrics::add(&self.metrics.dirty_rows_mapped, rows.len() as u64);
        let unmarked = changes.iter().filter(|c| !rows.contains(&c.row)).count();
        if unmarked > 0 {
            RenderPathMetrics::add(&self.metrics.unmarked_row_changes, unmarked as u64);
            tracing::debug!(target: "render.dirty", unmarked, "unmarked_row_changes");
        }
    }

    fn note_mark(&mut self) {
        RenderPathMetrics::add(&self.metrics.dirty_marks, 1);
        if self.state == RenderState::Synced {
            self.state = RenderState::Dirty;
        }
    }

    /// Record that the command byte at `offset` changed.
    pub fn mark_dirty_region(&mut self, offset: usize) -> Result<()> {
        self.note_mark();
        self.dirty.mark_region(offset)
    }

    /// Record that `length` command bytes starting at `start` changed.
    pub fn mark_dirty_range(&mut self, start: usize, length: usize) -> Result<()> {
        self.note_mark();
        self.dirty.mark_range(start, length)
    }

    pub fn mark_full_redraw(&mut self) {
        self.note_mark();
        self.dirty.mark_full();
    }

    /// Drop one cached frame delta. Returns whether it was present.
    pub fn invalidate_cache(&mut self, key: u64) -> bool {
        self.cache.invalidate(key)
    }

    /// Drop every cached delta; required after global changes such as a
    /// theme switch whose identity is not part of the key.
    pub fn invalidate_cache_all(&mut self) {
        self.cache.invalidate_all();
        self.last_cache_key = None;
    }

    /// Forget what the terminal shows; the next render repaints from the
    /// origin. The tracked cursor is kept so the repaint can find the origin.
    pub fn reset(&mut self) {
        self.state = RenderState::Uninitialized;
        self.dirty.mark_full();
        self.last_key = None;
        RenderPathMetrics::add(&self.metrics.resets, 1);
        tracing::info!(target: "render.engine", "renderer_reset");
    }

    pub fn resize(&mut self, width: u16, height: u16) {
        self.caps = self.caps.with_size(width, height);
        self.translator.set_height(usize::from(height));
        tracing::debug!(target: "render.engine", width, height, "renderer_resized");
        self.reset();
    }

    /// End the editing session: park the cursor at column 0 below the last
    /// rendered row and make that position the origin of the next session.
    pub fn finish_session(&mut self) -> Result<()> {
        let width = self.caps.width.max(1) as usize;
        let below = self.actual.total_lines().max(1);
        let mut translator = self.translator;
        let mut writer = Writer::new(self.caps.color);
        translator.move_to(below, 0, width, true, &mut writer);
        let mut out = Vec::new();
        writer.encode_into(&mut out)?;
        self.write_frame(&out)?;
        self.translator = CursorTranslator::new().with_height(usize::from(self.caps.height));
        self.actual.reset(self.caps.width);
        self.dirty = DirtyTracker::new();
        self.state = RenderState::Uninitialized;
        self.last_key = None;
        tracing::debug!(target: "render.engine", rows = below, "session_finished");
        Ok(())
    }

    #[inline]
    pub fn state(&self) -> RenderState {
        self.state
    }

    /// The model of what the terminal currently shows.
    #[inline]
    pub fn actual(&self) -> &ScreenBuffer {
        &self.actual
    }

    #[inline]
    pub fn capabilities(&self) -> TerminalCapabilities {
        self.caps
    }

    #[inline]
    pub fn options(&self) -> RenderOptions {
        self.options
    }

    #[inline]
    pub fn cursor(&self) -> &CursorTranslator {
        &self.translator
    }

    pub fn metrics_snapshot(&self) -> RenderPathMetricsSnapshot {
        self.metrics.snapshot()
    }

    pub fn cache_len(&self) -> usize {
        self.cache.len()
    }

    /// Storage key of the most recently cached frame delta.
    pub fn last_cache_key(&self) -> Option<u64> {
        self.last_cache_key
    }

    /// Rows of the on-screen frame that pending dirty marks map to. Empty
    /// when only a full redraw is pending.
    pub fn dirty_rows(&self) -> Vec<usize> {
        self.mapped_dirty_rows().into_iter().collect()
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }
}
