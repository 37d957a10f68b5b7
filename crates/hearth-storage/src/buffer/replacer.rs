//! LRU-K replacement policy for the buffer pool.
//!
//! LRU-K evicts the frame whose *backward k-distance* is largest: the time
//! elapsed since its k-th most recent access. A frame with fewer than `k`
//! recorded accesses has infinite backward k-distance, which makes the
//! policy scan-resistant — a page touched once by a sequential scan loses to
//! any page with an established reference history.
//!
//! The implementation uses the standard two-list split:
//!
//! - the **history list** holds frames with fewer than `k` accesses. All of
//!   them have infinite distance, so they are ordered by first access and
//!   evicted FIFO.
//! - the **cache list** holds frames with at least `k` accesses, ordered by
//!   most recent access. The least recently accessed evictable frame is the
//!   one with the largest finite backward k-distance.
//!
//! Both lists keep their oldest entry at the front; an access appends to the
//! back, and eviction scans from the front.
//!
//! Only frames marked *evictable* are eviction candidates. The buffer pool
//! clears the flag while a page is pinned and sets it when the pin count
//! drops to zero.

use std::collections::HashMap;

use hashlink::LinkedHashMap;
use parking_lot::Mutex;

use super::error::{BufferError, BufferResult};
use super::frame::FrameId;

/// Per-frame bookkeeping.
struct AccessState {
    /// Number of recorded accesses.
    count: usize,
    /// Whether the frame may be evicted.
    evictable: bool,
}

/// Mutable replacer state, guarded by the replacer latch.
struct ReplacerInner {
    /// Access count and evictable flag per known frame.
    states: HashMap<FrameId, AccessState>,
    /// Frames with fewer than `k` accesses, oldest first.
    history: LinkedHashMap<FrameId, ()>,
    /// Frames with at least `k` accesses, least recently accessed first.
    cache: LinkedHashMap<FrameId, ()>,
    /// Number of evictable frames across both lists.
    curr_size: usize,
}

/// LRU-K replacer.
///
/// Tracks access history for frame ids in `[0, replacer_size)` and selects
/// eviction victims by backward k-distance. All operations take the internal
/// latch; the buffer pool calls in while holding its own latch, and the
/// replacer never calls back out.
pub struct LruKReplacer {
    /// Exclusive upper bound on frame ids.
    replacer_size: usize,
    k: usize,
    inner: Mutex<ReplacerInner>,
}

impl LruKReplacer {
    /// Creates a replacer for frame ids in `[0, replacer_size)`.
    ///
    /// # Panics
    ///
    /// Panics if `k` is zero.
    pub fn new(replacer_size: usize, k: usize) -> Self {
        assert!(k > 0, "k must be > 0");
        Self {
            replacer_size,
            k,
            inner: Mutex::new(ReplacerInner {
                states: HashMap::new(),
                history: LinkedHashMap::new(),
                cache: LinkedHashMap::new(),
                curr_size: 0,
            }),
        }
    }

    /// Records an access to `frame_id` at the current logical timestamp.
    ///
    /// Creates the access history for a frame seen for the first time. New
    /// frames start non-evictable.
    pub fn record_access(&self, frame_id: FrameId) -> BufferResult<()> {
        self.check_bounds(frame_id)?;
        let mut guard = self.inner.lock();
        let inner = &mut *guard;

        let state = inner.states.entry(frame_id).or_insert(AccessState {
            count: 0,
            evictable: false,
        });
        state.count += 1;
        let count = state.count;

        if count < self.k {
            // Stays in (or enters) the history list at its original
            // position: all history frames tie at infinite distance and are
            // evicted in first-access order.
            if !inner.history.contains_key(&frame_id) {
                inner.history.insert(frame_id, ());
            }
        } else if count == self.k {
            // Graduates from the history list into the cache list.
            inner.history.remove(&frame_id);
            inner.cache.insert(frame_id, ());
        } else {
            // Already cached: refresh its recency position.
            inner.cache.remove(&frame_id);
            inner.cache.insert(frame_id, ());
        }

        Ok(())
    }

    /// Marks `frame_id` evictable or non-evictable, adjusting the replacer
    /// size accordingly.
    ///
    /// A frame with no recorded access history is left untouched; this never
    /// creates an access record.
    pub fn set_evictable(&self, frame_id: FrameId, evictable: bool) -> BufferResult<()> {
        self.check_bounds(frame_id)?;
        let mut inner = self.inner.lock();

        let Some(state) = inner.states.get_mut(&frame_id) else {
            return Ok(());
        };
        if state.evictable == evictable {
            return Ok(());
        }
        state.evictable = evictable;
        if evictable {
            inner.curr_size += 1;
        } else {
            inner.curr_size -= 1;
        }
        Ok(())
    }

    /// Evicts the evictable frame with the largest backward k-distance and
    /// drops its access history.
    ///
    /// History-list frames (infinite distance) win over cache-list frames;
    /// ties fall out in first-access order, and cache candidates in
    /// least-recent-access order. Returns `None` when no frame is evictable.
    pub fn evict(&self) -> Option<FrameId> {
        let mut guard = self.inner.lock();
        let inner = &mut *guard;
        if inner.curr_size == 0 {
            return None;
        }

        let victim = inner
            .history
            .keys()
            .copied()
            .find(|f| inner.states[f].evictable)
            .or_else(|| {
                inner
                    .cache
                    .keys()
                    .copied()
                    .find(|f| inner.states[f].evictable)
            })?;

        inner.history.remove(&victim);
        inner.cache.remove(&victim);
        inner.states.remove(&victim);
        inner.curr_size -= 1;
        tracing::debug!(frame_id = victim.index(), "evicted frame");
        Some(victim)
    }

    /// Removes `frame_id` and its access history regardless of its backward
    /// k-distance.
    ///
    /// Unknown frames are a no-op. Removing a non-evictable frame is an
    /// error: the buffer pool only releases frames whose pin count is zero.
    pub fn remove(&self, frame_id: FrameId) -> BufferResult<()> {
        self.check_bounds(frame_id)?;
        let mut inner = self.inner.lock();

        let Some(state) = inner.states.get(&frame_id) else {
            return Ok(());
        };
        if !state.evictable {
            return Err(BufferError::FramePinned { frame_id });
        }

        inner.history.remove(&frame_id);
        inner.cache.remove(&frame_id);
        inner.states.remove(&frame_id);
        inner.curr_size -= 1;
        Ok(())
    }

    /// Returns the number of evictable frames.
    pub fn size(&self) -> usize {
        self.inner.lock().curr_size
    }

    /// Returns the `k` this replacer was created with.
    #[inline]
    pub fn k(&self) -> usize {
        self.k
    }

    fn check_bounds(&self, frame_id: FrameId) -> BufferResult<()> {
        if frame_id.index() >= self.replacer_size {
            return Err(BufferError::InvalidFrameId { frame_id });
        }
        Ok(())
    }
}

impl std::fmt::Debug for LruKReplacer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.lock();
        f.debug_struct("LruKReplacer")
            .field("replacer_size", &self.replacer_size)
            .field("k", &self.k)
            .field("curr_size", &inner.curr_size)
            .field("tracked", &inner.states.len())
            .finish()
    }
}
