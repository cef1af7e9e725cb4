//! Concurrent extendible hash table.
//!
//! The buffer pool uses this as its page table, mapping `PageId` to
//! `FrameId`. The directory holds `2^global_depth` slots; each slot
//! refers to a bucket with `local_depth <= global_depth`, and several
//! slots share one bucket exactly when its local depth is below the
//! global depth. An insert into a full bucket splits it, doubling the
//! directory first when the bucket is already at the global depth.

use parking_lot::Mutex;
use std::collections::hash_map::RandomState;
use std::hash::{BuildHasher, Hash};

/// A bounded bucket of key-value pairs.
struct Bucket<K, V> {
    /// Number of low hash bits this bucket is responsible for.
    depth: usize,
    items: Vec<(K, V)>,
}

impl<K: Eq, V> Bucket<K, V> {
    fn new(depth: usize) -> Self {
        Self {
            depth,
            items: Vec::new(),
        }
    }

    fn find(&self, key: &K) -> Option<&V> {
        self.items.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Removes the first entry matching `key`. Returns true iff one was
    /// removed.
    fn remove(&mut self, key: &K) -> bool {
        match self.items.iter().position(|(k, _)| k == key) {
            Some(idx) => {
                self.items.remove(idx);
                true
            }
            None => false,
        }
    }
}

/// Directory state guarded by the table mutex.
struct Directory<K, V> {
    global_depth: usize,
    /// Count of live buckets (slots may alias).
    num_buckets: usize,
    /// Directory slots; values index into `buckets`.
    slots: Vec<usize>,
    /// Bucket slab. A split reuses the old bucket's slot for the low
    /// half and appends the high half.
    buckets: Vec<Bucket<K, V>>,
}

/// A mutex-serialized extendible hash table.
///
/// The hasher is a type parameter (defaulting to the std `RandomState`)
/// so tests can substitute a deterministic hash function.
pub struct ExtendibleHashTable<K, V, S = RandomState> {
    bucket_size: usize,
    hasher: S,
    dir: Mutex<Directory<K, V>>,
}

impl<K, V> ExtendibleHashTable<K, V, RandomState>
where
    K: Hash + Eq,
{
    /// Creates a table whose buckets hold up to `bucket_size` entries.
    pub fn new(bucket_size: usize) -> Self {
        Self::with_hasher(bucket_size, RandomState::new())
    }
}

impl<K, V, S> ExtendibleHashTable<K, V, S>
where
    K: Hash + Eq,
    S: BuildHasher,
{
    /// Creates a table with an explicit hasher.
    pub fn with_hasher(bucket_size: usize, hasher: S) -> Self {
        assert!(bucket_size > 0, "bucket_size must be positive");
        Self {
            bucket_size,
            hasher,
            dir: Mutex::new(Directory {
                global_depth: 0,
                num_buckets: 1,
                slots: vec![0],
                buckets: vec![Bucket::new(0)],
            }),
        }
    }

    #[inline]
    fn slot_index(&self, key: &K, global_depth: usize) -> usize {
        let mask = (1usize << global_depth) - 1;
        (self.hasher.hash_one(key) as usize) & mask
    }

    /// Looks up `key`, returning a copy of its value.
    pub fn find(&self, key: &K) -> Option<V>
    where
        V: Clone,
    {
        let dir = self.dir.lock();
        let slot = dir.slots[self.slot_index(key, dir.global_depth)];
        dir.buckets[slot].find(key).cloned()
    }

    /// Removes `key` if present. Returns true iff an entry was removed.
    pub fn remove(&self, key: &K) -> bool {
        let mut dir = self.dir.lock();
        let slot = dir.slots[self.slot_index(key, dir.global_depth)];
        dir.buckets[slot].remove(key)
    }

    /// Inserts `key -> value`, overwriting any existing entry for the
    /// key. Never fails: full buckets split until the entry fits.
    pub fn insert(&self, key: K, value: V) {
        let mut dir = self.dir.lock();
        loop {
            let slot = dir.slots[self.slot_index(&key, dir.global_depth)];
            let bucket = &mut dir.buckets[slot];
            if let Some(entry) = bucket.items.iter_mut().find(|(k, _)| *k == key) {
                entry.1 = value;
                return;
            }
            if bucket.items.len() < self.bucket_size {
                bucket.items.push((key, value));
                return;
            }
            self.split_bucket(&mut dir, slot);
            // retry: each split raises the bucket's local depth, so the
            // loop terminates once the colliding keys separate
        }
    }

    /// Splits the full bucket at slab index `slot` into a low and a
    /// high half one level deeper, doubling the directory first if the
    /// bucket is already at the global depth.
    fn split_bucket(&self, dir: &mut Directory<K, V>, slot: usize) {
        let old_depth = dir.buckets[slot].depth;
        if old_depth == dir.global_depth {
            // double the directory: the new upper half mirrors the old
            let len = dir.slots.len();
            dir.slots.extend_from_within(..len);
            dir.global_depth += 1;
        }

        let items = std::mem::take(&mut dir.buckets[slot].items);
        dir.buckets[slot].depth = old_depth + 1;
        let high = dir.buckets.len();
        dir.buckets.push(Bucket::new(old_depth + 1));
        dir.num_buckets += 1;

        // Slots referencing the old bucket all share its low old_depth
        // bits; the next bit up decides which half they follow.
        for (i, s) in dir.slots.iter_mut().enumerate() {
            if *s == slot && (i >> old_depth) & 1 == 1 {
                *s = high;
            }
        }

        for (k, v) in items {
            let target = dir.slots[self.slot_index(&k, dir.global_depth)];
            dir.buckets[target].items.push((k, v));
        }
    }

    /// Current global depth of the directory.
    pub fn global_depth(&self) -> usize {
        self.dir.lock().global_depth
    }

    /// Local depth of the bucket referenced by directory slot
    /// `dir_index`.
    pub fn local_depth(&self, dir_index: usize) -> usize {
        let dir = self.dir.lock();
        dir.buckets[dir.slots[dir_index]].depth
    }

    /// Number of live buckets.
    pub fn num_buckets(&self) -> usize {
        self.dir.lock().num_buckets
    }

    /// Total number of entries.
    pub fn len(&self) -> usize {
        let dir = self.dir.lock();
        let mut seen = vec![false; dir.buckets.len()];
        let mut count = 0;
        for &slot in &dir.slots {
            if !seen[slot] {
                seen[slot] = true;
                count += dir.buckets[slot].items.len();
            }
        }
        count
    }

    /// Returns true if the table holds no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
