//! Forward iterator over B+ tree leaves.

use crate::key::NodeKey;
use crate::node::LeafNode;
use granite_buffer::{BufferPoolManager, PageReadGuard};
use granite_common::RecordId;
use log::error;
use std::marker::PhantomData;

/// Forward iterator over `(key, record_id)` entries in ascending key
/// order.
///
/// The iterator holds the current leaf pinned under a read latch plus an
/// offset. Crossing to the next leaf latches it before the current one
/// is released, so a concurrent merge can never slip between the two.
/// Dropping the iterator releases the latch and pin (via the guard).
pub struct TreeIterator<'a, K: NodeKey> {
    pool: &'a BufferPoolManager,
    leaf: Option<PageReadGuard<'a>>,
    offset: usize,
    _key: PhantomData<K>,
}

impl<'a, K: NodeKey> TreeIterator<'a, K> {
    pub(crate) fn new(pool: &'a BufferPoolManager, leaf: PageReadGuard<'a>, offset: usize) -> Self {
        Self {
            pool,
            leaf: Some(leaf),
            offset,
            _key: PhantomData,
        }
    }

    pub(crate) fn exhausted(pool: &'a BufferPoolManager) -> Self {
        Self {
            pool,
            leaf: None,
            offset: 0,
            _key: PhantomData,
        }
    }

    /// True once every entry has been yielded.
    pub fn is_end(&self) -> bool {
        match &self.leaf {
            None => true,
            Some(guard) => {
                let leaf = LeafNode::<_, K>::attach(guard.data());
                !leaf.next_page_id().is_valid() && self.offset >= leaf.size()
            }
        }
    }
}

impl<K: NodeKey> Iterator for TreeIterator<'_, K> {
    type Item = (K, RecordId);

    fn next(&mut self) -> Option<Self::Item> {
        let (item, size, next_id) = {
            let guard = self.leaf.as_ref()?;
            let leaf = LeafNode::<_, K>::attach(guard.data());
            let size = leaf.size();
            let item = if self.offset < size {
                Some((leaf.key_at(self.offset), leaf.record_at(self.offset)))
            } else {
                None
            };
            (item, size, leaf.next_page_id())
        };

        let Some(item) = item else {
            self.leaf = None;
            return None;
        };

        self.offset += 1;
        if self.offset >= size {
            if next_id.is_valid() {
                // Latch-then-release leaf transition.
                match self.pool.read_page(next_id) {
                    Ok(next_guard) => {
                        self.leaf = Some(next_guard);
                        self.offset = 0;
                    }
                    Err(e) => {
                        error!("iterator cannot reach leaf {}: {}", next_id, e);
                        self.leaf = None;
                    }
                }
            } else {
                self.leaf = None;
            }
        }

        Some(item)
    }
}
