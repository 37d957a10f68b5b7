//! Buffer pool implementation.
//!
//! The buffer pool owns the frame array and free list, maps resident pages
//! to frames through an extendible hash table, and delegates victim
//! selection to the LRU-K replacer.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use hearth_common::types::PageId;
use hearth_container::ExtendibleHashTable;
use parking_lot::Mutex;

use super::config::BufferPoolConfig;
use super::error::{BufferError, BufferResult};
use super::frame::{FrameId, PageFrame};
use super::replacer::LruKReplacer;
use super::BufferPoolStats;
use crate::disk::DiskManager;

/// Bucket size of the extendible hash table backing the page table.
const PAGE_TABLE_BUCKET_SIZE: usize = hearth_common::constants::DEFAULT_BUCKET_SIZE;

/// Mutable pool state, guarded by the pool latch.
///
/// Every public pool operation acquires this latch on entry and holds it
/// across any disk I/O it performs. The page table and the replacer carry
/// their own latches, which nest strictly inside this one.
struct PoolState {
    /// Frames holding no page. A frame is here iff the page table has no
    /// entry mapping to it.
    free_list: VecDeque<FrameId>,
    /// Next page id to hand out.
    next_page_id: u64,
}

/// The buffer pool manager.
///
/// Serves pages out of a fixed set of in-memory frames, reading from and
/// writing to disk as pages move in and out of residency. Callers pin pages
/// by fetching or creating them and must unpin when done; only unpinned
/// pages are eviction candidates.
///
/// `new_page` and `fetch_page` fail with [`BufferError::PoolExhausted`]
/// rather than blocking when every frame is pinned.
pub struct BufferPool {
    config: BufferPoolConfig,
    /// Array of page frames, fixed at construction.
    frames: Vec<Arc<PageFrame>>,
    /// Page table: maps PageId -> FrameId for resident pages.
    page_table: ExtendibleHashTable<PageId, FrameId>,
    /// Victim selection.
    replacer: LruKReplacer,
    /// Backing file.
    disk: DiskManager,
    /// Pool latch.
    state: Mutex<PoolState>,
    /// Fetch counter for statistics.
    fetch_count: AtomicU64,
    /// Hit counter for statistics.
    hit_count: AtomicU64,
    /// Miss counter for statistics.
    miss_count: AtomicU64,
    /// Eviction counter for statistics.
    eviction_count: AtomicU64,
    /// Write-back counter for statistics.
    flush_count: AtomicU64,
}

impl BufferPool {
    /// Creates a buffer pool over the given disk manager.
    ///
    /// Initially every frame is in the free list.
    pub fn new(config: BufferPoolConfig, disk: DiskManager) -> BufferResult<Self> {
        config.validate().map_err(BufferError::config)?;
        if disk.page_size() != config.page_size {
            return Err(BufferError::config(
                "disk manager page size does not match pool page size",
            ));
        }

        let frames: Vec<Arc<PageFrame>> = (0..config.num_frames)
            .map(|i| Arc::new(PageFrame::new(FrameId::new(i), config.page_size)))
            .collect();
        let free_list: VecDeque<FrameId> = (0..config.num_frames).map(FrameId::new).collect();

        Ok(Self {
            replacer: LruKReplacer::new(config.num_frames, config.replacer_k),
            page_table: ExtendibleHashTable::new(PAGE_TABLE_BUCKET_SIZE),
            frames,
            disk,
            state: Mutex::new(PoolState {
                free_list,
                next_page_id: 0,
            }),
            config,
            fetch_count: AtomicU64::new(0),
            hit_count: AtomicU64::new(0),
            miss_count: AtomicU64::new(0),
            eviction_count: AtomicU64::new(0),
            flush_count: AtomicU64::new(0),
        })
    }

    /// Creates a page with a freshly allocated id, pinned, with zeroed
    /// bytes.
    ///
    /// Fails with [`BufferError::PoolExhausted`] when every frame is pinned.
    pub fn new_page(&self) -> BufferResult<Arc<PageFrame>> {
        let mut state = self.state.lock();

        let frame = self.acquire_victim_frame(&mut state)?;
        let page_id = Self::allocate_page(&mut state);

        frame.set_page_id(page_id);
        frame.set_dirty(false);
        frame.write_data().fill(0);
        frame.pin();

        self.replacer.record_access(frame.frame_id())?;
        self.replacer.set_evictable(frame.frame_id(), false)?;
        self.page_table.insert(page_id, frame.frame_id());
        tracing::trace!(page_id = page_id.as_u64(), frame_id = frame.frame_id().index(), "new page");

        Ok(frame)
    }

    /// Fetches the page `page_id`, reading it from disk if it is not
    /// resident, and pins it.
    ///
    /// Fails with [`BufferError::PoolExhausted`] when the page would need a
    /// frame and every frame is pinned.
    pub fn fetch_page(&self, page_id: PageId) -> BufferResult<Arc<PageFrame>> {
        let mut state = self.state.lock();
        self.fetch_count.fetch_add(1, Ordering::Relaxed);

        if let Some(frame_id) = self.page_table.find(&page_id) {
            self.hit_count.fetch_add(1, Ordering::Relaxed);
            let frame = Arc::clone(&self.frames[frame_id.index()]);
            frame.pin();
            self.replacer.record_access(frame_id)?;
            self.replacer.set_evictable(frame_id, false)?;
            return Ok(frame);
        }

        self.miss_count.fetch_add(1, Ordering::Relaxed);
        let frame = self.acquire_victim_frame(&mut state)?;

        self.disk.read_page(page_id, &mut frame.write_data())?;
        frame.set_page_id(page_id);
        frame.set_dirty(false);
        frame.pin();

        self.replacer.record_access(frame.frame_id())?;
        self.replacer.set_evictable(frame.frame_id(), false)?;
        self.page_table.insert(page_id, frame.frame_id());

        Ok(frame)
    }

    /// Releases one pin on `page_id`, marking the page dirty if the caller
    /// modified it.
    ///
    /// The dirty flag is only ever set here, never cleared: another holder
    /// of the same page may have written it. When the pin count reaches
    /// zero the frame becomes evictable.
    pub fn unpin_page(&self, page_id: PageId, is_dirty: bool) -> BufferResult<()> {
        let _state = self.state.lock();

        let frame_id = self
            .page_table
            .find(&page_id)
            .ok_or(BufferError::PageNotFound { page_id })?;
        let frame = &self.frames[frame_id.index()];

        if frame.pin_count() == 0 {
            return Err(BufferError::UnpinUnderflow { page_id });
        }

        if is_dirty {
            frame.set_dirty(true);
        }
        if frame.unpin() == 0 {
            self.replacer.set_evictable(frame_id, true)?;
        }
        Ok(())
    }

    /// Writes `page_id` to disk, regardless of the dirty flag, and clears
    /// the flag.
    pub fn flush_page(&self, page_id: PageId) -> BufferResult<()> {
        let _state = self.state.lock();
        self.flush_page_locked(page_id)
    }

    /// Writes every resident page to disk. Returns the number of pages
    /// flushed.
    pub fn flush_all_pages(&self) -> BufferResult<usize> {
        let _state = self.state.lock();

        let mut flushed = 0;
        for frame in &self.frames {
            let page_id = frame.page_id();
            if page_id.is_valid() {
                self.flush_page_locked(page_id)?;
                flushed += 1;
            }
        }
        Ok(flushed)
    }

    /// Drops `page_id` from the pool and returns its frame to the free
    /// list.
    ///
    /// A page that is not resident is not an error. A pinned page cannot be
    /// deleted. No disk space is reclaimed; `deallocate_page` is a
    /// bookkeeping hook.
    pub fn delete_page(&self, page_id: PageId) -> BufferResult<()> {
        let mut state = self.state.lock();

        let Some(frame_id) = self.page_table.find(&page_id) else {
            return Ok(());
        };
        let frame = &self.frames[frame_id.index()];
        if frame.is_pinned() {
            return Err(BufferError::PagePinned { page_id });
        }

        self.page_table.remove(&page_id);
        self.replacer.remove(frame_id)?;
        state.free_list.push_back(frame_id);
        frame.reset();
        self.deallocate_page(page_id);
        Ok(())
    }

    /// Returns statistics about the buffer pool.
    pub fn stats(&self) -> BufferPoolStats {
        let mut pinned = 0;
        let mut dirty = 0;
        for frame in &self.frames {
            if frame.is_pinned() {
                pinned += 1;
            }
            if frame.is_dirty() {
                dirty += 1;
            }
        }

        BufferPoolStats {
            fetches: self.fetch_count.load(Ordering::Relaxed),
            hits: self.hit_count.load(Ordering::Relaxed),
            misses: self.miss_count.load(Ordering::Relaxed),
            evictions: self.eviction_count.load(Ordering::Relaxed),
            flushes: self.flush_count.load(Ordering::Relaxed),
            pinned_frames: pinned,
            dirty_frames: dirty,
            free_frames: self.state.lock().free_list.len(),
        }
    }

    /// Returns the number of frames in the buffer pool.
    pub fn num_frames(&self) -> usize {
        self.config.num_frames
    }

    /// Returns the page size.
    pub fn page_size(&self) -> usize {
        self.config.page_size
    }

    /// Returns true if `page_id` is resident.
    pub fn contains(&self, page_id: PageId) -> bool {
        self.page_table.find(&page_id).is_some()
    }

    // -------------------------------------------------------------------------
    // Private helpers
    // -------------------------------------------------------------------------

    /// Hands out the next page id.
    fn allocate_page(state: &mut PoolState) -> PageId {
        let page_id = PageId::new(state.next_page_id);
        state.next_page_id += 1;
        page_id
    }

    /// Bookkeeping hook for page deallocation. No disk space is reclaimed.
    fn deallocate_page(&self, page_id: PageId) {
        tracing::trace!(page_id = page_id.as_u64(), "deallocated page");
    }

    /// Produces a frame for a new occupant: the free list first, else an
    /// eviction victim. An evicted occupant is written back if dirty and
    /// dropped from the page table.
    fn acquire_victim_frame(&self, state: &mut PoolState) -> BufferResult<Arc<PageFrame>> {
        if let Some(frame_id) = state.free_list.pop_front() {
            return Ok(Arc::clone(&self.frames[frame_id.index()]));
        }

        let frame_id = self.replacer.evict().ok_or(BufferError::PoolExhausted)?;
        let frame = Arc::clone(&self.frames[frame_id.index()]);
        self.eviction_count.fetch_add(1, Ordering::Relaxed);

        let old_page_id = frame.page_id();
        if old_page_id.is_valid() {
            if frame.is_dirty() {
                tracing::debug!(
                    page_id = old_page_id.as_u64(),
                    frame_id = frame_id.index(),
                    "writing back dirty page before eviction"
                );
                self.disk.write_page(old_page_id, &frame.read_data())?;
                frame.set_dirty(false);
                self.flush_count.fetch_add(1, Ordering::Relaxed);
            }
            self.page_table.remove(&old_page_id);
        }

        Ok(frame)
    }

    /// Flush with the pool latch already held.
    fn flush_page_locked(&self, page_id: PageId) -> BufferResult<()> {
        if !page_id.is_valid() {
            return Err(BufferError::PageNotFound { page_id });
        }
        let frame_id = self
            .page_table
            .find(&page_id)
            .ok_or(BufferError::PageNotFound { page_id })?;
        let frame = &self.frames[frame_id.index()];

        self.disk.write_page(page_id, &frame.read_data())?;
        frame.set_dirty(false);
        self.flush_count.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}

impl std::fmt::Debug for BufferPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BufferPool")
            .field("num_frames", &self.config.num_frames)
            .field("page_size", &self.config.page_size)
            .field("pages_resident", &self.page_table.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn create_test_pool(dir: &tempfile::TempDir, num_frames: usize) -> BufferPool {
        let config = BufferPoolConfig::new(num_frames);
        let disk = DiskManager::open(dir.path().join("test.db"), config.page_size).unwrap();
        BufferPool::new(config, disk).unwrap()
    }

    #[test]
    fn test_pool_creation() {
        let dir = tempdir().unwrap();
        let pool = create_test_pool(&dir, 10);
        assert_eq!(pool.num_frames(), 10);
        assert_eq!(pool.page_size(), hearth_common::constants::PAGE_SIZE);
        assert_eq!(pool.stats().free_frames, 10);
    }

    #[test]
    fn test_new_page_is_pinned_and_zeroed() {
        let dir = tempdir().unwrap();
        let pool = create_test_pool(&dir, 4);

        let page = pool.new_page().unwrap();
        assert_eq!(page.page_id(), PageId::new(0));
        assert_eq!(page.pin_count(), 1);
        assert!(!page.is_dirty());
        assert!(page.read_data().iter().all(|&b| b == 0));

        let next = pool.new_page().unwrap();
        assert_eq!(next.page_id(), PageId::new(1));
    }

    #[test]
    fn test_fetch_hit_increments_pin() {
        let dir = tempdir().unwrap();
        let pool = create_test_pool(&dir, 4);

        let page = pool.new_page().unwrap();
        let page_id = page.page_id();

        let again = pool.fetch_page(page_id).unwrap();
        assert_eq!(again.pin_count(), 2);
        assert!(Arc::ptr_eq(&page, &again));

        pool.unpin_page(page_id, false).unwrap();
        pool.unpin_page(page_id, false).unwrap();
        assert_eq!(page.pin_count(), 0);
    }

    #[test]
    fn test_unpin_errors() {
        let dir = tempdir().unwrap();
        let pool = create_test_pool(&dir, 4);

        assert!(matches!(
            pool.unpin_page(PageId::new(99), false),
            Err(BufferError::PageNotFound { .. })
        ));

        let page = pool.new_page().unwrap();
        let page_id = page.page_id();
        pool.unpin_page(page_id, false).unwrap();
        assert!(matches!(
            pool.unpin_page(page_id, false),
            Err(BufferError::UnpinUnderflow { .. })
        ));
    }

    #[test]
    fn test_unpin_never_clears_dirty() {
        let dir = tempdir().unwrap();
        let pool = create_test_pool(&dir, 4);

        let page = pool.new_page().unwrap();
        let page_id = page.page_id();
        let second = pool.fetch_page(page_id).unwrap();

        pool.unpin_page(page_id, true).unwrap();
        assert!(second.is_dirty());
        // A clean unpin from the second holder must not wipe the flag.
        pool.unpin_page(page_id, false).unwrap();
        assert!(second.is_dirty());
    }

    #[test]
    fn test_pool_exhausted() {
        let dir = tempdir().unwrap();
        let pool = create_test_pool(&dir, 2);

        let _p0 = pool.new_page().unwrap();
        let _p1 = pool.new_page().unwrap();

        let err = pool.new_page().unwrap_err();
        assert!(err.is_retryable());
        assert!(matches!(err, BufferError::PoolExhausted));
        assert!(matches!(
            pool.fetch_page(PageId::new(42)),
            Err(BufferError::PoolExhausted)
        ));
    }

    #[test]
    fn test_flush_page() {
        let dir = tempdir().unwrap();
        let pool = create_test_pool(&dir, 4);

        let page = pool.new_page().unwrap();
        let page_id = page.page_id();
        page.write_data()[0..4].copy_from_slice(&[1, 2, 3, 4]);
        pool.unpin_page(page_id, true).unwrap();
        assert!(page.is_dirty());

        pool.flush_page(page_id).unwrap();
        assert!(!page.is_dirty());

        assert!(matches!(
            pool.flush_page(PageId::INVALID),
            Err(BufferError::PageNotFound { .. })
        ));
        assert!(matches!(
            pool.flush_page(PageId::new(77)),
            Err(BufferError::PageNotFound { .. })
        ));
    }

    #[test]
    fn test_flush_all_pages() {
        let dir = tempdir().unwrap();
        let pool = create_test_pool(&dir, 8);

        for _ in 0..5 {
            let page = pool.new_page().unwrap();
            pool.unpin_page(page.page_id(), true).unwrap();
        }

        assert_eq!(pool.flush_all_pages().unwrap(), 5);
        assert_eq!(pool.stats().dirty_frames, 0);
    }

    #[test]
    fn test_delete_page() {
        let dir = tempdir().unwrap();
        let pool = create_test_pool(&dir, 4);

        // Absent page: fine.
        pool.delete_page(PageId::new(9)).unwrap();

        let page = pool.new_page().unwrap();
        let page_id = page.page_id();

        // Pinned page: refused.
        assert!(matches!(
            pool.delete_page(page_id),
            Err(BufferError::PagePinned { .. })
        ));

        pool.unpin_page(page_id, false).unwrap();
        pool.delete_page(page_id).unwrap();
        assert!(!pool.contains(page_id));
        assert_eq!(pool.stats().free_frames, 4);
    }

    #[test]
    fn test_no_two_frames_share_a_page() {
        let dir = tempdir().unwrap();
        let pool = create_test_pool(&dir, 4);

        let mut ids = Vec::new();
        for _ in 0..4 {
            let page = pool.new_page().unwrap();
            ids.push(page.page_id());
            pool.unpin_page(page.page_id(), false).unwrap();
        }
        // Refetch with eviction pressure mixed in.
        for &id in &ids {
            let page = pool.fetch_page(id).unwrap();
            pool.unpin_page(page.page_id(), false).unwrap();
        }

        let mut resident: Vec<u64> = pool
            .frames
            .iter()
            .map(|f| f.page_id())
            .filter(|p| p.is_valid())
            .map(|p| p.as_u64())
            .collect();
        resident.sort_unstable();
        let before = resident.len();
        resident.dedup();
        assert_eq!(before, resident.len());
    }

    #[test]
    fn test_stats_counters() {
        let dir = tempdir().unwrap();
        let pool = create_test_pool(&dir, 4);

        let page = pool.new_page().unwrap();
        let page_id = page.page_id();
        let _again = pool.fetch_page(page_id).unwrap();

        let stats = pool.stats();
        assert_eq!(stats.fetches, 1);
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.pinned_frames, 1);
        assert!((stats.hit_ratio() - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_mismatched_page_size_is_rejected() {
        let dir = tempdir().unwrap();
        let config = BufferPoolConfig::new(4);
        let disk = DiskManager::open(dir.path().join("test.db"), 8192).unwrap();
        assert!(matches!(
            BufferPool::new(config, disk),
            Err(BufferError::Config { .. })
        ));
    }
}
