//! Page replacement policy for the buffer pool.

use crate::hash::ExtendibleHashTable;
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::hash::Hash;

/// Trait for victim-selection policies.
pub trait Replacer<T>: Send + Sync {
    /// Records `value` as most recently used, replacing any prior entry.
    fn insert(&self, value: T);

    /// Removes and returns the least recently used value, if any.
    fn victim(&self) -> Option<T>;

    /// Removes `value` if present. Returns true on removal.
    fn erase(&self, value: &T) -> bool;

    /// Returns the number of tracked values.
    fn size(&self) -> usize;
}

struct LruInner<T> {
    /// Monotonic access clock.
    clock: u64,
    /// Values ordered by access time; the min entry is the victim.
    queue: BTreeMap<u64, T>,
}

/// LRU replacement policy.
///
/// An ordered set keyed by access timestamp gives O(log n) insert/erase
/// and O(log n) min extraction; a companion extendible-hash map locates
/// the live timestamp of a value so re-inserts and erases can drop the
/// stale queue entry.
pub struct LruReplacer<T>
where
    T: Clone + Eq + Hash + Send + Sync,
{
    timestamps: ExtendibleHashTable<T, u64>,
    inner: Mutex<LruInner<T>>,
}

impl<T> LruReplacer<T>
where
    T: Clone + Eq + Hash + Send + Sync,
{
    /// Bucket capacity of the companion hash map.
    const MAP_BUCKET_CAPACITY: usize = 5;

    /// Creates an empty replacer.
    pub fn new() -> Self {
        Self {
            timestamps: ExtendibleHashTable::new(Self::MAP_BUCKET_CAPACITY),
            inner: Mutex::new(LruInner {
                clock: 0,
                queue: BTreeMap::new(),
            }),
        }
    }
}

impl<T> Default for LruReplacer<T>
where
    T: Clone + Eq + Hash + Send + Sync,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Replacer<T> for LruReplacer<T>
where
    T: Clone + Eq + Hash + Send + Sync,
{
    fn insert(&self, value: T) {
        let mut inner = self.inner.lock();

        if let Some(old_ts) = self.timestamps.find(&value) {
            inner.queue.remove(&old_ts);
        }

        inner.clock += 1;
        let ts = inner.clock;
        inner.queue.insert(ts, value.clone());
        self.timestamps.insert(value, ts);
    }

    fn victim(&self) -> Option<T> {
        let mut inner = self.inner.lock();
        let (_, value) = inner.queue.pop_first()?;
        self.timestamps.remove(&value);
        Some(value)
    }

    fn erase(&self, value: &T) -> bool {
        let mut inner = self.inner.lock();
        match self.timestamps.find(value) {
            Some(ts) => {
                inner.queue.remove(&ts);
                self.timestamps.remove(value);
                true
            }
            None => false,
        }
    }

    fn size(&self) -> usize {
        self.inner.lock().queue.len()
    }
}
