//! Extendible hash table used as the buffer pool's page table.

use parking_lot::Mutex;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// Default number of entries a bucket holds before it splits.
pub const DEFAULT_BUCKET_CAPACITY: usize = 50;

/// One hash bucket: a local depth plus its entries.
///
/// Entries keep the full key alongside its hash so that lookups compare
/// keys, not hashes; uniqueness survives 64-bit hash collisions.
struct Bucket<K, V> {
    local_depth: u32,
    entries: Vec<(u64, K, V)>,
}

struct HashInner<K, V> {
    /// Directory length is always `1 << global_depth`. Each slot holds an
    /// index into `buckets`; slots whose low `local_depth` bits agree
    /// share a bucket.
    global_depth: u32,
    directory: Vec<usize>,
    buckets: Vec<Bucket<K, V>>,
}

/// Dynamically growing hash table with directory doubling.
///
/// A directory of `2^G` slots maps the low `G` bits of a key's hash to a
/// bucket with local depth `L <= G`. A bucket that overflows is split in
/// two; when its local depth already equals the global depth, the
/// directory doubles first. Removal may leave empty buckets; the table
/// never shrinks.
pub struct ExtendibleHashTable<K, V> {
    bucket_capacity: usize,
    inner: Mutex<HashInner<K, V>>,
}

impl<K, V> ExtendibleHashTable<K, V>
where
    K: Hash + Eq + Clone,
    V: Clone,
{
    /// Creates a table whose buckets split past `bucket_capacity` entries.
    pub fn new(bucket_capacity: usize) -> Self {
        assert!(bucket_capacity > 0, "bucket capacity must be positive");
        Self {
            bucket_capacity,
            inner: Mutex::new(HashInner {
                global_depth: 0,
                directory: vec![0],
                buckets: vec![Bucket {
                    local_depth: 0,
                    entries: Vec::new(),
                }],
            }),
        }
    }

    fn hash_of(key: &K) -> u64 {
        let mut hasher = DefaultHasher::new();
        key.hash(&mut hasher);
        hasher.finish()
    }

    fn dir_index(global_depth: u32, hash: u64) -> usize {
        (hash as usize) & ((1usize << global_depth) - 1)
    }

    /// Looks up the value associated with `key`.
    pub fn find(&self, key: &K) -> Option<V> {
        let hash = Self::hash_of(key);
        let inner = self.inner.lock();
        let bucket = &inner.buckets[inner.directory[Self::dir_index(inner.global_depth, hash)]];
        bucket
            .entries
            .iter()
            .find(|(h, k, _)| *h == hash && k == key)
            .map(|(_, _, v)| v.clone())
    }

    /// Returns true if `key` is present.
    pub fn contains(&self, key: &K) -> bool {
        self.find(key).is_some()
    }

    /// Inserts or replaces the entry for `key`, splitting on overflow.
    pub fn insert(&self, key: K, value: V) {
        let hash = Self::hash_of(&key);
        let mut inner = self.inner.lock();

        let bucket_idx = inner.directory[Self::dir_index(inner.global_depth, hash)];
        let bucket = &mut inner.buckets[bucket_idx];
        if let Some(entry) = bucket
            .entries
            .iter_mut()
            .find(|(h, k, _)| *h == hash && *k == key)
        {
            entry.2 = value;
            return;
        }

        bucket.entries.push((hash, key, value));
        if inner.buckets[bucket_idx].entries.len() > self.bucket_capacity {
            Self::split(&mut inner, self.bucket_capacity, bucket_idx);
        }
    }

    /// Removes the entry for `key`, returning true if it was present.
    pub fn remove(&self, key: &K) -> bool {
        let hash = Self::hash_of(key);
        let mut inner = self.inner.lock();
        let bucket_idx = inner.directory[Self::dir_index(inner.global_depth, hash)];
        let bucket = &mut inner.buckets[bucket_idx];

        match bucket
            .entries
            .iter()
            .position(|(h, k, _)| *h == hash && k == key)
        {
            Some(pos) => {
                bucket.entries.remove(pos);
                true
            }
            None => false,
        }
    }

    /// Splits `buckets[bucket_idx]`, doubling the directory if its local
    /// depth already equals the global depth. Recurses while either half
    /// still overflows (all redistributed entries may share low bits).
    fn split(inner: &mut HashInner<K, V>, capacity: usize, bucket_idx: usize) {
        let local = inner.buckets[bucket_idx].local_depth;

        if local == inner.global_depth {
            // Double the directory; each new slot mirrors its low-bit twin.
            let len = inner.directory.len();
            inner.directory.extend_from_within(0..len);
            inner.global_depth += 1;
        }

        let new_idx = inner.buckets.len();
        inner.buckets.push(Bucket {
            local_depth: local + 1,
            entries: Vec::new(),
        });
        inner.buckets[bucket_idx].local_depth = local + 1;

        // Directory slots pointing at the old bucket whose newly
        // significant bit is set move to the new bucket.
        for i in 0..inner.directory.len() {
            if inner.directory[i] == bucket_idx && (i >> local) & 1 == 1 {
                inner.directory[i] = new_idx;
            }
        }

        // Redistribute entries by the newly significant hash bit.
        let moved: Vec<(u64, K, V)> = {
            let bucket = &mut inner.buckets[bucket_idx];
            let (stay, moved): (Vec<_>, Vec<_>) = bucket
                .entries
                .drain(..)
                .partition(|(h, _, _)| (*h >> local) & 1 == 0);
            bucket.entries = stay;
            moved
        };
        inner.buckets[new_idx].entries = moved;

        if inner.buckets[bucket_idx].entries.len() > capacity {
            Self::split(inner, capacity, bucket_idx);
        }
        if inner.buckets[new_idx].entries.len() > capacity {
            Self::split(inner, capacity, new_idx);
        }
    }

    /// Returns the global depth of the directory.
    pub fn global_depth(&self) -> u32 {
        self.inner.lock().global_depth
    }

    /// Returns the local depth of the bucket behind directory slot `i`.
    pub fn local_depth(&self, directory_index: usize) -> u32 {
        let inner = self.inner.lock();
        inner.buckets[inner.directory[directory_index]].local_depth
    }

    /// Returns the number of buckets allocated so far.
    pub fn num_buckets(&self) -> usize {
        self.inner.lock().buckets.len()
    }

    /// Returns the total number of entries.
    pub fn len(&self) -> usize {
        let inner = self.inner.lock();
        inner.buckets.iter().map(|b| b.entries.len()).sum()
    }

    /// Returns true if the table holds no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of (global depth, directory, per-bucket local depths) for
    /// structural assertions.
    #[cfg(test)]
    pub(crate) fn snapshot(&self) -> (u32, Vec<usize>, Vec<u32>) {
        let inner = self.inner.lock();
        (
            inner.global_depth,
            inner.directory.clone(),
            inner.buckets.iter().map(|b| b.local_depth).collect(),
        )
    }
}
