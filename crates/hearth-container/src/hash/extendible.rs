//! Extendible hash table.
//!
//! An extendible hash table grows incrementally: a directory of
//! `2^global_depth` slots points at buckets, and each bucket discriminates
//! on its own `local_depth` low bits of the hash. When a bucket overflows it
//! is split in two, and only when a bucket's local depth catches up with the
//! global depth does the directory itself double. A single bucket may be
//! shared by `2^(global_depth - local_depth)` directory slots.
//!
//! # Structure
//!
//! ```text
//! directory (global_depth = 2)      buckets
//! +------+
//! | 00   |------------------------> [ bucket A, local_depth = 2 ]
//! +------+
//! | 01   |------+----------------> [ bucket B, local_depth = 1 ]
//! +------+      |
//! | 10   |------|----------------> [ bucket C, local_depth = 2 ]
//! +------+      |
//! | 11   |------+
//! +------+
//! ```
//!
//! Buckets live in an arena (`Vec<Bucket>`) and the directory stores arena
//! indices, so doubling the directory is a plain vector extension and a
//! split retargets only the slots whose new discriminating bit is set.

use std::collections::hash_map::RandomState;
use std::hash::{BuildHasher, Hash};

use parking_lot::Mutex;

/// A bucket holds at most `bucket_size` key-value pairs at a given local
/// depth. Pairs within a bucket are unordered.
struct Bucket<K, V> {
    items: Vec<(K, V)>,
    local_depth: usize,
}

impl<K, V> Bucket<K, V> {
    fn new(local_depth: usize) -> Self {
        Self {
            items: Vec::new(),
            local_depth,
        }
    }
}

/// Mutable table state, guarded by the table latch.
struct TableInner<K, V> {
    /// Directory of arena indices, length `2^global_depth`.
    dir: Vec<usize>,
    /// Bucket arena. Every bucket is reachable from the directory.
    buckets: Vec<Bucket<K, V>>,
    global_depth: usize,
    bucket_size: usize,
    /// Distinct buckets reachable from the directory.
    num_buckets: usize,
    /// Total key-value pairs in the table.
    len: usize,
}

impl<K, V> TableInner<K, V> {
    #[inline]
    fn index_of(&self, hash: u64) -> usize {
        let mask = (1usize << self.global_depth) - 1;
        (hash as usize) & mask
    }
}

/// A thread-safe extendible hash table.
///
/// Grows by splitting overflowing buckets rather than rehashing the whole
/// table, so insertion cost stays bounded as the table grows. The hasher is
/// pluggable the same way it is for `std::collections::HashMap`; the default
/// is [`RandomState`].
///
/// # Example
///
/// ```
/// use hearth_container::ExtendibleHashTable;
///
/// let table: ExtendibleHashTable<u64, String> = ExtendibleHashTable::new(4);
/// table.insert(1, "one".to_string());
/// assert_eq!(table.find(&1), Some("one".to_string()));
/// assert!(table.remove(&1));
/// assert_eq!(table.find(&1), None);
/// ```
pub struct ExtendibleHashTable<K, V, S = RandomState> {
    inner: Mutex<TableInner<K, V>>,
    hasher: S,
}

impl<K: Hash + Eq, V> ExtendibleHashTable<K, V, RandomState> {
    /// Creates a table whose buckets hold at most `bucket_size` pairs.
    ///
    /// # Panics
    ///
    /// Panics if `bucket_size` is zero.
    pub fn new(bucket_size: usize) -> Self {
        Self::with_hasher(bucket_size, RandomState::new())
    }
}

impl<K: Hash + Eq, V, S: BuildHasher> ExtendibleHashTable<K, V, S> {
    /// Creates a table with a caller-supplied hasher.
    ///
    /// # Panics
    ///
    /// Panics if `bucket_size` is zero.
    pub fn with_hasher(bucket_size: usize, hasher: S) -> Self {
        assert!(bucket_size > 0, "bucket_size must be > 0");
        Self {
            inner: Mutex::new(TableInner {
                dir: vec![0],
                buckets: vec![Bucket::new(0)],
                global_depth: 0,
                bucket_size,
                num_buckets: 1,
                len: 0,
            }),
            hasher,
        }
    }

    /// Looks up the value stored under `key`.
    pub fn find(&self, key: &K) -> Option<V>
    where
        V: Clone,
    {
        let hash = self.hasher.hash_one(key);
        let inner = self.inner.lock();
        let bucket = &inner.buckets[inner.dir[inner.index_of(hash)]];
        bucket
            .items
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.clone())
    }

    /// Inserts `value` under `key`, overwriting any previous value.
    ///
    /// When the target bucket is full the bucket is split and the insert is
    /// retried; a pathological key distribution may force several splits for
    /// one key, but each split strictly lengthens the discriminating hash
    /// prefix, so the loop terminates.
    pub fn insert(&self, key: K, value: V) {
        let hash = self.hasher.hash_one(&key);
        let mut inner = self.inner.lock();

        loop {
            let dir_index = inner.index_of(hash);
            let target = inner.dir[dir_index];

            // Update in place if the key is already present.
            if let Some(slot) = inner.buckets[target]
                .items
                .iter_mut()
                .find(|(k, _)| *k == key)
            {
                slot.1 = value;
                return;
            }

            // Room left in the bucket.
            if inner.buckets[target].items.len() < inner.bucket_size {
                inner.buckets[target].items.push((key, value));
                inner.len += 1;
                return;
            }

            // Overflow. Double the directory first if this bucket already
            // discriminates on every global bit.
            if inner.buckets[target].local_depth == inner.global_depth {
                inner.dir.extend_from_within(..);
                inner.global_depth += 1;
                tracing::trace!(
                    global_depth = inner.global_depth,
                    dir_len = inner.dir.len(),
                    "directory doubled"
                );
            }

            // Split: this bucket keeps the slots whose new bit is 0, a fresh
            // sibling takes the slots whose new bit is 1.
            inner.buckets[target].local_depth += 1;
            let new_depth = inner.buckets[target].local_depth;
            let split_bit = 1usize << (new_depth - 1);

            let sibling = inner.buckets.len();
            inner.buckets.push(Bucket::new(new_depth));
            inner.num_buckets += 1;

            for i in 0..inner.dir.len() {
                if inner.dir[i] == target && (i & split_bit) != 0 {
                    inner.dir[i] = sibling;
                }
            }

            // Redistribute the overflowing bucket's pairs across the pair of
            // buckets, then retry the original insert.
            let spilled = std::mem::take(&mut inner.buckets[target].items);
            for (k, v) in spilled {
                let h = self.hasher.hash_one(&k);
                let slot = inner.dir[inner.index_of(h)];
                inner.buckets[slot].items.push((k, v));
            }
        }
    }

    /// Removes the pair stored under `key`. Returns whether a pair was
    /// removed. The directory never shrinks.
    pub fn remove(&self, key: &K) -> bool {
        let hash = self.hasher.hash_one(key);
        let mut inner = self.inner.lock();
        let target = inner.dir[inner.index_of(hash)];
        let bucket = &mut inner.buckets[target];
        match bucket.items.iter().position(|(k, _)| k == key) {
            Some(i) => {
                bucket.items.remove(i);
                inner.len -= 1;
                true
            }
            None => false,
        }
    }

    /// Returns the number of hash bits the directory discriminates on.
    pub fn global_depth(&self) -> usize {
        self.inner.lock().global_depth
    }

    /// Returns the local depth of the bucket behind directory slot
    /// `dir_index`.
    ///
    /// # Panics
    ///
    /// Panics if `dir_index` is outside the directory.
    pub fn local_depth(&self, dir_index: usize) -> usize {
        let inner = self.inner.lock();
        inner.buckets[inner.dir[dir_index]].local_depth
    }

    /// Returns the number of distinct buckets reachable from the directory.
    pub fn num_buckets(&self) -> usize {
        self.inner.lock().num_buckets
    }

    /// Returns the number of key-value pairs in the table.
    pub fn len(&self) -> usize {
        self.inner.lock().len
    }

    /// Returns true if the table holds no pairs.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<K, V, S> std::fmt::Debug for ExtendibleHashTable<K, V, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.lock();
        f.debug_struct("ExtendibleHashTable")
            .field("global_depth", &inner.global_depth)
            .field("num_buckets", &inner.num_buckets)
            .field("len", &inner.len)
            .finish()
    }
}
