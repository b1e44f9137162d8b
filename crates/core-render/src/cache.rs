//! Render output cache.
//!
//! Maps a 64-bit key to the encoded bytes produced for it, together with the
//! cursor state those bytes leave behind, bounded to a fixed
//! number of entries with least-recently-used eviction. Recency uses a
//! monotonic stamp per entry plus a `(key, stamp)` queue; a popped queue item
//! evicts only if its stamp is still the entry's latest, so stale queue items
//! from earlier accesses are skipped. The queue is compacted when it grows
//! past a multiple of the capacity.
//!
//! Keys are hashes; two different frames colliding on a key would replay the
//! wrong bytes. That risk is accepted (64-bit `ahash` keys over the full
//! frame inputs) and `invalidate_all` exists for global changes the key does
//! not encode.

use crate::cursor::CursorTranslator;
use crate::error::{RenderError, Result};
use ahash::{AHashMap, AHasher};
use core_model::HighlightSpan;
use std::collections::VecDeque;
use std::hash::{Hash, Hasher};

pub const DEFAULT_CAPACITY: usize = 128;

#[derive(Debug)]
struct Entry {
    bytes: Vec<u8>,
    cursor: CursorTranslator,
    stamp: u64,
}

/// A cache hit: the bytes to replay and the cursor state after replaying them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CachedFrame<'a> {
    pub bytes: &'a [u8],
    pub cursor: CursorTranslator,
}

#[derive(Debug)]
pub struct RenderCache {
    entries: AHashMap<u64, Entry>,
    lru: VecDeque<(u64, u64)>,
    clock: u64,
    capacity: usize,
}

impl Default for RenderCache {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl RenderCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: AHashMap::new(),
            lru: VecDeque::new(),
            clock: 0,
            capacity: capacity.max(1),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn bump_clock(&mut self) -> u64 {
        let stamp = self.clock;
        self.clock = self.clock.wrapping_add(1);
        stamp
    }

    /// Cached frame for `key`, refreshing its recency.
    pub fn lookup(&mut self, key: u64) -> Option<CachedFrame<'_>> {
        if !self.entries.contains_key(&key) {
            return None;
        }
        let stamp = self.bump_clock();
        self.lru.push_back((key, stamp));
        self.compact_if_needed();
        let entry = self.entries.get_mut(&key)?;
        entry.stamp = stamp;
        Some(CachedFrame {
            bytes: &entry.bytes,
            cursor: entry.cursor,
        })
    }

    /// Insert or replace `key`, evicting the least recently used entry when
    /// full. Returns the number of evicted entries.
    pub fn store(&mut self, key: u64, bytes: &[u8], cursor: CursorTranslator) -> Result<usize> {
        let mut owned = Vec::new();
        owned
            .try_reserve_exact(bytes.len())
            .map_err(|_| RenderError::alloc("render cache entry"))?;
        owned.extend_from_slice(bytes);
        self.lru
            .try_reserve(1)
            .map_err(|_| RenderError::alloc("render cache order"))?;
        let mut evicted = 0;
        if !self.entries.contains_key(&key) {
            while self.entries.len() >= self.capacity {
                if !self.evict_one() {
                    break;
                }
                evicted += 1;
            }
        }
        let stamp = self.bump_clock();
        self.entries.insert(
            key,
            Entry {
                bytes: owned,
                cursor,
                stamp,
            },
        );
        self.lru.push_back((key, stamp));
        self.compact_if_needed();
        Ok(evicted)
    }

    pub fn invalidate(&mut self, key: u64) -> bool {
        // queue items for the key go stale and are skipped on eviction
        self.entries.remove(&key).is_some()
    }

    pub fn invalidate_all(&mut self) {
        self.entries.clear();
        self.lru.clear();
        tracing::debug!(target: "render.cache", "cache_invalidated_all");
    }

    fn evict_one(&mut self) -> bool {
        while let Some((key, stamp)) = self.lru.pop_front() {
            if self.entries.get(&key).is_some_and(|e| e.stamp == stamp) {
                self.entries.remove(&key);
                tracing::trace!(target: "render.cache", key, "cache_evicted");
                return true;
            }
        }
        false
    }

    fn compact_if_needed(&mut self) {
        if self.lru.len() <= self.capacity.saturating_mul(4) {
            return;
        }
        let entries = &self.entries;
        self.lru
            .retain(|(key, stamp)| entries.get(key).is_some_and(|e| e.stamp == *stamp));
    }
}

/// Hash of everything that determines a frame's content.
pub fn frame_key(
    text: &[u8],
    cursor: usize,
    highlights: &[HighlightSpan],
    theme_id: u64,
    prompt: &str,
    width: usize,
) -> u64 {
    let mut hasher = AHasher::default();
    text.hash(&mut hasher);
    cursor.hash(&mut hasher);
    highlights.hash(&mut hasher);
    theme_id.hash(&mut hasher);
    prompt.hash(&mut hasher);
    width.hash(&mut hasher);
    hasher.finish()
}

/// Key for the delta from frame `prev` to frame `next`. Cached bytes are
/// relative to the previous frame, the rows already on screen and the
/// terminal height that decides which of them are still reachable.
pub fn transition_key(prev: u64, next: u64, materialized_rows: usize, height: usize) -> u64 {
    let mut hasher = AHasher::default();
    prev.hash(&mut hasher);
    next.hash(&mut hasher);
    materialized_rows.hash(&mut hasher);
    height.hash(&mut hasher);
    hasher.finish()
}
