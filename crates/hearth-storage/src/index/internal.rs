//! Internal (non-leaf) B+tree page operations.
//!
//! An internal page stores `n` keys and `n` child page ids in a slot array
//! laid directly over the page bytes:
//!
//! ```text
//! ---------------------------------------------------------------------
//! | HEADER | KEY(0)+CHILD(0) | KEY(1)+CHILD(1) | ... | KEY(n)+CHILD(n) |
//! ---------------------------------------------------------------------
//! ```
//!
//! Child `i` covers the key range `K(i) <= K < K(i+1)`, with `K(0) = -inf`
//! and `K(n) = +inf`. Slot 0's key bytes are present but semantically
//! invalid; every lookup ignores them.
//!
//! These operations run on pages the caller has already pinned and do not
//! take pool locks themselves. The structural moves (`move_half_to` and
//! friends) are the exception to pool independence: every child that
//! changes owner is fetched, has its parent pointer rewritten, and is
//! unpinned dirty so the new parentage reaches disk.

use std::cmp::Ordering;
use std::marker::PhantomData;

use hearth_common::types::PageId;

use super::key::KeyCodec;
use super::tree_page::{
    self, TreePageHeader, TreePageType, HEADER_SIZE, OFFSET_MAX_SIZE, OFFSET_PAGE_ID,
    OFFSET_PARENT_PAGE_ID, OFFSET_SIZE,
};
use crate::buffer::{BufferPool, BufferResult};

/// View over an internal page's bytes.
///
/// The caller owns the pin on the underlying page and is responsible for
/// unpinning with the dirty flag after mutating through this view.
pub struct InternalPage<'a, K> {
    data: &'a mut [u8],
    _key: PhantomData<K>,
}

impl<'a, K: KeyCodec> InternalPage<'a, K> {
    /// Bytes per slot: one key plus one child page id.
    pub const SLOT_WIDTH: usize = K::ENCODED_LEN + 8;

    /// Returns the number of slots a page of `page_size` bytes can hold.
    pub const fn capacity(page_size: usize) -> usize {
        (page_size - HEADER_SIZE) / Self::SLOT_WIDTH
    }

    /// Creates a view over `data`.
    ///
    /// # Panics
    ///
    /// Panics if the buffer is smaller than the page header.
    pub fn view(data: &'a mut [u8]) -> Self {
        assert!(data.len() >= HEADER_SIZE, "buffer too small for a tree page");
        Self {
            data,
            _key: PhantomData,
        }
    }

    /// Initializes the header of a freshly allocated internal page.
    pub fn init(&mut self, page_id: PageId, parent_page_id: PageId, max_size: usize) {
        debug_assert!(max_size <= Self::capacity(self.data.len()));
        TreePageHeader::new(&mut *self.data).initialize(
            TreePageType::Internal,
            page_id,
            parent_page_id,
            max_size,
        );
    }

    // =========================================================================
    // Header accessors
    // =========================================================================

    /// Returns the current number of slots.
    #[inline]
    pub fn size(&self) -> usize {
        tree_page::read_u16(self.data, OFFSET_SIZE) as usize
    }

    /// Returns the slot capacity.
    #[inline]
    pub fn max_size(&self) -> usize {
        tree_page::read_u16(self.data, OFFSET_MAX_SIZE) as usize
    }

    /// Returns the minimum slot count a non-root internal page must keep.
    #[inline]
    pub fn min_size(&self) -> usize {
        self.max_size() / 2
    }

    /// Returns this page's id.
    #[inline]
    pub fn page_id(&self) -> PageId {
        tree_page::read_page_id(self.data, OFFSET_PAGE_ID)
    }

    /// Returns the parent page id.
    #[inline]
    pub fn parent_page_id(&self) -> PageId {
        tree_page::read_page_id(self.data, OFFSET_PARENT_PAGE_ID)
    }

    /// Sets the parent page id.
    #[inline]
    pub fn set_parent_page_id(&mut self, parent: PageId) {
        tree_page::write_page_id(self.data, OFFSET_PARENT_PAGE_ID, parent);
    }

    #[inline]
    fn set_size(&mut self, size: usize) {
        tree_page::write_u16(self.data, OFFSET_SIZE, size as u16);
    }

    // =========================================================================
    // Slot accessors
    // =========================================================================

    #[inline]
    const fn slot_offset(index: usize) -> usize {
        HEADER_SIZE + index * Self::SLOT_WIDTH
    }

    /// Returns the key in slot `index`. Slot 0's key is semantically
    /// invalid.
    pub fn key_at(&self, index: usize) -> K {
        debug_assert!(index < self.size());
        K::read_from(&self.data[Self::slot_offset(index)..])
    }

    /// Writes the key in slot `index`.
    pub fn set_key_at(&mut self, index: usize, key: &K) {
        let offset = Self::slot_offset(index);
        key.write_to(&mut self.data[offset..]);
    }

    /// Returns the child page id in slot `index`.
    pub fn value_at(&self, index: usize) -> PageId {
        debug_assert!(index < self.size());
        tree_page::read_page_id(self.data, Self::slot_offset(index) + K::ENCODED_LEN)
    }

    /// Writes the child page id in slot `index`.
    pub fn set_value_at(&mut self, index: usize, value: PageId) {
        tree_page::write_page_id(self.data, Self::slot_offset(index) + K::ENCODED_LEN, value);
    }

    /// Returns the slot holding `value`, by linear scan.
    pub fn value_index(&self, value: PageId) -> Option<usize> {
        (0..self.size()).find(|&i| self.value_at(i) == value)
    }

    // =========================================================================
    // Lookup
    // =========================================================================

    /// Returns the child page id covering `key`.
    ///
    /// Binary search over slots `[1, size)` for the first key not less than
    /// `key`: an exact match returns that slot's child, otherwise the
    /// preceding slot's child covers the gap. Slot 0's key never
    /// participates.
    pub fn lookup<C>(&self, key: &K, comparator: &C) -> PageId
    where
        C: Fn(&K, &K) -> Ordering,
    {
        let size = self.size();
        debug_assert!(size >= 2, "internal page must have at least two children");

        let mut lo = 1;
        let mut hi = size;
        while lo < hi {
            let mid = lo + (hi - lo) / 2;
            if comparator(&self.key_at(mid), key) == Ordering::Less {
                lo = mid + 1;
            } else {
                hi = mid;
            }
        }

        if lo == size {
            return self.value_at(size - 1);
        }
        if comparator(&self.key_at(lo), key) == Ordering::Equal {
            return self.value_at(lo);
        }
        self.value_at(lo - 1)
    }

    // =========================================================================
    // Insertion
    // =========================================================================

    /// Populates a fresh root after a root split: `old_value` keeps the low
    /// half, `(new_key, new_value)` covers the high half.
    pub fn populate_new_root(&mut self, old_value: PageId, new_key: &K, new_value: PageId) {
        self.set_key_at(1, new_key);
        self.set_value_at(0, old_value);
        self.set_value_at(1, new_value);
        self.set_size(2);
    }

    /// Inserts `(new_key, new_value)` immediately after the slot holding
    /// `old_value`. Returns the new size.
    ///
    /// # Panics
    ///
    /// Panics if `old_value` is not in the page.
    pub fn insert_node_after(&mut self, old_value: PageId, new_key: &K, new_value: PageId) -> usize {
        let size = self.size();
        let pos = self
            .value_index(old_value)
            .expect("insert_node_after: old_value not in page")
            + 1;

        self.data.copy_within(
            Self::slot_offset(pos)..Self::slot_offset(size),
            Self::slot_offset(pos + 1),
        );
        self.set_key_at(pos, new_key);
        self.set_value_at(pos, new_value);
        self.set_size(size + 1);
        size + 1
    }

    // =========================================================================
    // Removal
    // =========================================================================

    /// Removes slot `index`, shifting the tail left.
    pub fn remove(&mut self, index: usize) {
        let size = self.size();
        debug_assert!(index < size);
        self.data.copy_within(
            Self::slot_offset(index + 1)..Self::slot_offset(size),
            Self::slot_offset(index),
        );
        self.set_size(size - 1);
    }

    /// Empties the page and returns its only remaining child.
    ///
    /// Called when the root has collapsed to a single child.
    pub fn remove_and_return_only_child(&mut self) -> PageId {
        let only_child = self.value_at(0);
        self.set_size(0);
        only_child
    }

    // =========================================================================
    // Structural moves
    // =========================================================================

    /// Moves the upper half of this page's slots to `recipient`.
    ///
    /// This page keeps its first `min_size` slots. Every moved child is
    /// re-parented to `recipient`.
    pub fn move_half_to(
        &mut self,
        recipient: &mut InternalPage<'_, K>,
        pool: &BufferPool,
    ) -> BufferResult<()> {
        let size = self.size();
        let split_at = self.min_size();
        debug_assert!(split_at < size);

        self.set_size(split_at);
        recipient.copy_n_from(
            &self.data[Self::slot_offset(split_at)..Self::slot_offset(size)],
            size - split_at,
            pool,
        )
    }

    /// Moves every slot to `recipient` and empties this page.
    ///
    /// `middle_key` is the separator between the two pages in their parent;
    /// it materializes into this page's (previously invalid) slot 0 key so
    /// the whole slot array can be appended to `recipient`.
    pub fn move_all_to(
        &mut self,
        recipient: &mut InternalPage<'_, K>,
        middle_key: &K,
        pool: &BufferPool,
    ) -> BufferResult<()> {
        let size = self.size();
        self.set_key_at(0, middle_key);
        recipient.copy_n_from(
            &self.data[Self::slot_offset(0)..Self::slot_offset(size)],
            size,
            pool,
        )?;
        self.set_size(0);
        Ok(())
    }

    /// Moves this page's first slot to the end of `recipient`
    /// (redistribution with a left sibling).
    ///
    /// The separator `middle_key` becomes the moved slot's key; the parent
    /// will take this page's new first key as the fresh separator.
    pub fn move_first_to_end_of(
        &mut self,
        recipient: &mut InternalPage<'_, K>,
        middle_key: &K,
        pool: &BufferPool,
    ) -> BufferResult<()> {
        self.set_key_at(0, middle_key);
        let first_key = self.key_at(0);
        let first_value = self.value_at(0);
        recipient.copy_last_from(&first_key, first_value, pool)?;

        let size = self.size();
        self.data.copy_within(
            Self::slot_offset(1)..Self::slot_offset(size),
            Self::slot_offset(0),
        );
        self.set_size(size - 1);
        Ok(())
    }

    /// Moves this page's last slot to the front of `recipient`
    /// (redistribution with a right sibling).
    ///
    /// The separator `middle_key` becomes the key of `recipient`'s old
    /// first slot; the moved slot's key is invalid in its new slot 0
    /// position.
    pub fn move_last_to_front_of(
        &mut self,
        recipient: &mut InternalPage<'_, K>,
        middle_key: &K,
        pool: &BufferPool,
    ) -> BufferResult<()> {
        let size = self.size();
        let last_key = self.key_at(size - 1);
        let last_value = self.value_at(size - 1);

        recipient.set_key_at(0, middle_key);
        recipient.copy_first_from(&last_key, last_value, pool)?;

        self.set_size(size - 1);
        Ok(())
    }

    /// Appends `count` slots (raw slot bytes in `items`) and re-parents the
    /// children they carry.
    fn copy_n_from(&mut self, items: &[u8], count: usize, pool: &BufferPool) -> BufferResult<()> {
        debug_assert_eq!(items.len(), count * Self::SLOT_WIDTH);
        let size = self.size();
        let start = Self::slot_offset(size);
        self.data[start..start + items.len()].copy_from_slice(items);

        let my_id = self.page_id();
        for i in 0..count {
            let child = tree_page::read_page_id(
                self.data,
                Self::slot_offset(size + i) + K::ENCODED_LEN,
            );
            adopt_child(pool, child, my_id)?;
        }
        self.set_size(size + count);
        Ok(())
    }

    /// Appends one slot and re-parents its child.
    fn copy_last_from(&mut self, key: &K, value: PageId, pool: &BufferPool) -> BufferResult<()> {
        let size = self.size();
        self.set_key_at(size, key);
        self.set_value_at(size, value);
        self.set_size(size + 1);
        adopt_child(pool, value, self.page_id())
    }

    /// Prepends one slot (shifting everything right) and re-parents its
    /// child.
    fn copy_first_from(&mut self, key: &K, value: PageId, pool: &BufferPool) -> BufferResult<()> {
        let size = self.size();
        self.data.copy_within(
            Self::slot_offset(0)..Self::slot_offset(size),
            Self::slot_offset(1),
        );
        self.set_key_at(0, key);
        self.set_value_at(0, value);
        self.set_size(size + 1);
        adopt_child(pool, value, self.page_id())
    }
}

/// Rewrites `child`'s parent pointer to `parent` and unpins it dirty.
fn adopt_child(pool: &BufferPool, child: PageId, parent: PageId) -> BufferResult<()> {
    let frame = pool.fetch_page(child)?;
    {
        let mut data = frame.write_data();
        TreePageHeader::new(&mut data).set_parent_page_id(parent);
    }
    pool.unpin_page(child, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::{BufferPool, BufferPoolConfig};
    use crate::disk::DiskManager;
    use crate::index::key::Key8;
    use tempfile::tempdir;

    const PAGE_SIZE: usize = hearth_common::constants::PAGE_SIZE;

    fn k(v: u64) -> Key8 {
        Key8::from_u64(v)
    }

    fn pid(v: u64) -> PageId {
        PageId::new(v)
    }

    /// Builds the four-slot page [(-, 10), (5, 20), (9, 30), (14, 40)].
    fn build_lookup_page(buf: &mut [u8]) -> InternalPage<'_, Key8> {
        let mut page = InternalPage::<Key8>::view(buf);
        page.init(pid(1), PageId::INVALID, 8);
        page.populate_new_root(pid(10), &k(5), pid(20));
        page.insert_node_after(pid(20), &k(9), pid(30));
        page.insert_node_after(pid(30), &k(14), pid(40));
        page
    }

    #[test]
    fn test_capacity_per_key_width() {
        // (4096 - 24) / (len + 8)
        assert_eq!(InternalPage::<Key8>::capacity(PAGE_SIZE), 254);
        assert_eq!(InternalPage::<crate::index::Key4>::capacity(PAGE_SIZE), 339);
        assert_eq!(InternalPage::<crate::index::Key64>::capacity(PAGE_SIZE), 56);
    }

    #[test]
    fn test_init_and_header_accessors() {
        let mut buf = vec![0u8; PAGE_SIZE];
        let mut page = InternalPage::<Key8>::view(&mut buf);
        page.init(pid(3), pid(1), 100);

        assert_eq!(page.page_id(), pid(3));
        assert_eq!(page.parent_page_id(), pid(1));
        assert_eq!(page.size(), 0);
        assert_eq!(page.max_size(), 100);
        assert_eq!(page.min_size(), 50);
    }

    #[test]
    fn test_populate_new_root() {
        let mut buf = vec![0u8; PAGE_SIZE];
        let mut page = InternalPage::<Key8>::view(&mut buf);
        page.init(pid(1), PageId::INVALID, 8);
        page.populate_new_root(pid(10), &k(5), pid(20));

        assert_eq!(page.size(), 2);
        assert_eq!(page.value_at(0), pid(10));
        assert_eq!(page.key_at(1), k(5));
        assert_eq!(page.value_at(1), pid(20));
    }

    #[test]
    fn test_insert_node_after_keeps_order() {
        let mut buf = vec![0u8; PAGE_SIZE];
        let page = build_lookup_page(&mut buf);

        assert_eq!(page.size(), 4);
        assert_eq!(page.value_at(0), pid(10));
        assert_eq!(page.key_at(1), k(5));
        assert_eq!(page.key_at(2), k(9));
        assert_eq!(page.key_at(3), k(14));
        assert_eq!(page.value_at(3), pid(40));
    }

    #[test]
    fn test_insert_node_after_in_the_middle() {
        let mut buf = vec![0u8; PAGE_SIZE];
        let mut page = build_lookup_page(&mut buf);

        let new_size = page.insert_node_after(pid(20), &k(7), pid(25));
        assert_eq!(new_size, 5);
        assert_eq!(page.key_at(2), k(7));
        assert_eq!(page.value_at(2), pid(25));
        // The tail shifted right intact.
        assert_eq!(page.key_at(3), k(9));
        assert_eq!(page.value_at(4), pid(40));
    }

    #[test]
    fn test_lookup_boundaries() {
        let mut buf = vec![0u8; PAGE_SIZE];
        let page = build_lookup_page(&mut buf);
        let cmp = Key8::compare;

        assert_eq!(page.lookup(&k(4), &cmp), pid(10));
        assert_eq!(page.lookup(&k(5), &cmp), pid(20));
        assert_eq!(page.lookup(&k(8), &cmp), pid(20));
        assert_eq!(page.lookup(&k(9), &cmp), pid(30));
        assert_eq!(page.lookup(&k(100), &cmp), pid(40));
    }

    #[test]
    fn test_value_index() {
        let mut buf = vec![0u8; PAGE_SIZE];
        let page = build_lookup_page(&mut buf);

        assert_eq!(page.value_index(pid(10)), Some(0));
        assert_eq!(page.value_index(pid(30)), Some(2));
        assert_eq!(page.value_index(pid(99)), None);
    }

    #[test]
    fn test_remove() {
        let mut buf = vec![0u8; PAGE_SIZE];
        let mut page = build_lookup_page(&mut buf);

        page.remove(2);
        assert_eq!(page.size(), 3);
        assert_eq!(page.key_at(1), k(5));
        assert_eq!(page.key_at(2), k(14));
        assert_eq!(page.value_at(2), pid(40));
    }

    #[test]
    fn test_remove_and_return_only_child() {
        let mut buf = vec![0u8; PAGE_SIZE];
        let mut page = InternalPage::<Key8>::view(&mut buf);
        page.init(pid(1), PageId::INVALID, 8);
        page.populate_new_root(pid(10), &k(5), pid(20));
        page.remove(1);

        assert_eq!(page.remove_and_return_only_child(), pid(10));
        assert_eq!(page.size(), 0);
    }

    // Pool-backed fixtures for the structural moves.

    fn test_pool(dir: &tempfile::TempDir, frames: usize) -> BufferPool {
        let config = BufferPoolConfig::new(frames);
        let disk = DiskManager::open(dir.path().join("index.db"), config.page_size).unwrap();
        BufferPool::new(config, disk).unwrap()
    }

    /// Allocates a pool page initialized as a leaf whose parent is
    /// `parent`, returning its id (unpinned, dirty).
    fn make_child(pool: &BufferPool, parent: PageId) -> PageId {
        let frame = pool.new_page().unwrap();
        let child = frame.page_id();
        {
            let mut data = frame.write_data();
            TreePageHeader::new(&mut data).initialize(TreePageType::Leaf, child, parent, 16);
        }
        pool.unpin_page(child, true).unwrap();
        child
    }

    fn parent_of(pool: &BufferPool, child: PageId) -> PageId {
        let frame = pool.fetch_page(child).unwrap();
        let parent = {
            let mut data = frame.write_data();
            TreePageHeader::new(&mut data).parent_page_id()
        };
        pool.unpin_page(child, false).unwrap();
        parent
    }

    #[test]
    fn test_move_half_to_reparents_children() {
        let dir = tempdir().unwrap();
        let pool = test_pool(&dir, 16);

        let src_frame = pool.new_page().unwrap();
        let dst_frame = pool.new_page().unwrap();
        let src_id = src_frame.page_id();
        let dst_id = dst_frame.page_id();

        let children: Vec<PageId> = (0..4).map(|_| make_child(&pool, src_id)).collect();

        let mut src_buf = src_frame.write_data();
        let mut dst_buf = dst_frame.write_data();
        let mut src = InternalPage::<Key8>::view(&mut src_buf);
        let mut dst = InternalPage::<Key8>::view(&mut dst_buf);
        src.init(src_id, PageId::INVALID, 4);
        dst.init(dst_id, PageId::INVALID, 4);

        src.populate_new_root(children[0], &k(10), children[1]);
        src.insert_node_after(children[1], &k(20), children[2]);
        src.insert_node_after(children[2], &k(30), children[3]);
        assert_eq!(src.size(), 4);

        src.move_half_to(&mut dst, &pool).unwrap();

        // min_size = 2: the upper two slots moved.
        assert_eq!(src.size(), 2);
        assert_eq!(dst.size(), 2);
        assert_eq!(dst.key_at(0), k(20));
        assert_eq!(dst.value_at(0), children[2]);
        assert_eq!(dst.value_at(1), children[3]);

        drop(src);
        drop(dst);
        drop(src_buf);
        drop(dst_buf);
        pool.unpin_page(src_id, true).unwrap();
        pool.unpin_page(dst_id, true).unwrap();

        // Moved children now report the recipient as parent; kept children
        // are untouched.
        assert_eq!(parent_of(&pool, children[0]), src_id);
        assert_eq!(parent_of(&pool, children[1]), src_id);
        assert_eq!(parent_of(&pool, children[2]), dst_id);
        assert_eq!(parent_of(&pool, children[3]), dst_id);
    }

    #[test]
    fn test_move_all_to_materializes_middle_key() {
        let dir = tempdir().unwrap();
        let pool = test_pool(&dir, 16);

        let src_frame = pool.new_page().unwrap();
        let dst_frame = pool.new_page().unwrap();
        let src_id = src_frame.page_id();
        let dst_id = dst_frame.page_id();

        let left: Vec<PageId> = (0..2).map(|_| make_child(&pool, dst_id)).collect();
        let right: Vec<PageId> = (0..2).map(|_| make_child(&pool, src_id)).collect();

        let mut src_buf = src_frame.write_data();
        let mut dst_buf = dst_frame.write_data();
        let mut src = InternalPage::<Key8>::view(&mut src_buf);
        let mut dst = InternalPage::<Key8>::view(&mut dst_buf);
        src.init(src_id, PageId::INVALID, 8);
        dst.init(dst_id, PageId::INVALID, 8);

        dst.populate_new_root(left[0], &k(10), left[1]);
        src.populate_new_root(right[0], &k(40), right[1]);

        // Merge src into dst; 30 separates the two pages in their parent.
        src.move_all_to(&mut dst, &k(30), &pool).unwrap();

        assert_eq!(src.size(), 0);
        assert_eq!(dst.size(), 4);
        assert_eq!(dst.key_at(2), k(30));
        assert_eq!(dst.value_at(2), right[0]);
        assert_eq!(dst.key_at(3), k(40));
        assert_eq!(dst.value_at(3), right[1]);

        drop(src);
        drop(dst);
        drop(src_buf);
        drop(dst_buf);
        pool.unpin_page(src_id, true).unwrap();
        pool.unpin_page(dst_id, true).unwrap();

        assert_eq!(parent_of(&pool, right[0]), dst_id);
        assert_eq!(parent_of(&pool, right[1]), dst_id);
    }

    #[test]
    fn test_move_first_to_end_of() {
        let dir = tempdir().unwrap();
        let pool = test_pool(&dir, 16);

        let src_frame = pool.new_page().unwrap();
        let dst_frame = pool.new_page().unwrap();
        let src_id = src_frame.page_id();
        let dst_id = dst_frame.page_id();

        let left: Vec<PageId> = (0..2).map(|_| make_child(&pool, dst_id)).collect();
        let right: Vec<PageId> = (0..3).map(|_| make_child(&pool, src_id)).collect();

        let mut src_buf = src_frame.write_data();
        let mut dst_buf = dst_frame.write_data();
        let mut src = InternalPage::<Key8>::view(&mut src_buf);
        let mut dst = InternalPage::<Key8>::view(&mut dst_buf);
        src.init(src_id, PageId::INVALID, 8);
        dst.init(dst_id, PageId::INVALID, 8);

        dst.populate_new_root(left[0], &k(10), left[1]);
        src.populate_new_root(right[0], &k(40), right[1]);
        src.insert_node_after(right[1], &k(50), right[2]);

        // Shift src's first child into dst; 30 was the old separator.
        src.move_first_to_end_of(&mut dst, &k(30), &pool).unwrap();

        assert_eq!(src.size(), 2);
        assert_eq!(src.value_at(0), right[1]);
        assert_eq!(dst.size(), 3);
        assert_eq!(dst.key_at(2), k(30));
        assert_eq!(dst.value_at(2), right[0]);

        drop(src);
        drop(dst);
        drop(src_buf);
        drop(dst_buf);
        pool.unpin_page(src_id, true).unwrap();
        pool.unpin_page(dst_id, true).unwrap();

        assert_eq!(parent_of(&pool, right[0]), dst_id);
        assert_eq!(parent_of(&pool, right[1]), src_id);
    }

    #[test]
    fn test_move_last_to_front_of() {
        let dir = tempdir().unwrap();
        let pool = test_pool(&dir, 16);

        let src_frame = pool.new_page().unwrap();
        let dst_frame = pool.new_page().unwrap();
        let src_id = src_frame.page_id();
        let dst_id = dst_frame.page_id();

        let left: Vec<PageId> = (0..3).map(|_| make_child(&pool, src_id)).collect();
        let right: Vec<PageId> = (0..2).map(|_| make_child(&pool, dst_id)).collect();

        let mut src_buf = src_frame.write_data();
        let mut dst_buf = dst_frame.write_data();
        let mut src = InternalPage::<Key8>::view(&mut src_buf);
        let mut dst = InternalPage::<Key8>::view(&mut dst_buf);
        src.init(src_id, PageId::INVALID, 8);
        dst.init(dst_id, PageId::INVALID, 8);

        src.populate_new_root(left[0], &k(10), left[1]);
        src.insert_node_after(left[1], &k(20), left[2]);
        dst.populate_new_root(right[0], &k(40), right[1]);

        // Shift src's last child into dst; 30 was the old separator.
        src.move_last_to_front_of(&mut dst, &k(30), &pool).unwrap();

        assert_eq!(src.size(), 2);
        assert_eq!(dst.size(), 3);
        // The moved child sits in slot 0; the old first child now carries
        // the separator key.
        assert_eq!(dst.value_at(0), left[2]);
        assert_eq!(dst.key_at(1), k(30));
        assert_eq!(dst.value_at(1), right[0]);
        assert_eq!(dst.key_at(2), k(40));

        drop(src);
        drop(dst);
        drop(src_buf);
        drop(dst_buf);
        pool.unpin_page(src_id, true).unwrap();
        pool.unpin_page(dst_id, true).unwrap();

        assert_eq!(parent_of(&pool, left[2]), dst_id);
        assert_eq!(parent_of(&pool, left[1]), src_id);
    }
}
