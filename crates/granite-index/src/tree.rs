//! Concurrent B+ tree index stored through the buffer pool.
//!
//! Every node lives in a page owned by the buffer pool; the tree itself
//! holds only the root page id (under its own latch), the index name,
//! and a key comparator. Descent uses latch crabbing: each node is
//! fetched and latched top-down, and the ancestor chain is released as
//! soon as the current node is "safe" for the running operation (cannot
//! split for inserts, cannot underflow for removes). The root-id latch
//! participates as the topmost ancestor.

use crate::header::HeaderPage;
use crate::iterator::TreeIterator;
use crate::key::{KeyComparator, NodeKey};
use crate::node::{self, InternalNode, LeafNode, NodeType};
use granite_buffer::{BufferPoolManager, PageReadGuard, PageWriteGuard};
use granite_common::page::{PageId, HEADER_PAGE_ID};
use granite_common::{GraniteError, RecordId, Result};
use parking_lot::{RwLock, RwLockWriteGuard};
use std::marker::PhantomData;
use std::sync::Arc;

const MAX_INDEX_NAME_LEN: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WriteMode {
    Insert,
    Remove,
}

#[derive(Clone, Copy)]
enum LeafTarget<'k, K> {
    Leftmost,
    Key(&'k K),
}

/// Concurrent B+ tree mapping fixed-width keys to record ids.
///
/// Keys are unique; `insert` rejects duplicates. The tree persists its
/// root page id in the header page under its index name on every root
/// change, so an index can be reopened against the same file.
pub struct BPlusTree<K: NodeKey, C: KeyComparator<K>> {
    index_name: String,
    pool: Arc<BufferPoolManager>,
    comparator: C,
    /// Current root page id; INVALID while the tree is empty.
    root_page_id: RwLock<PageId>,
    leaf_max_size: u32,
    internal_max_size: u32,
    _key: PhantomData<K>,
}

impl<K: NodeKey, C: KeyComparator<K>> BPlusTree<K, C> {
    /// Opens (or creates) the index named `index_name`, with node
    /// capacities derived from the page size.
    pub fn new(
        index_name: impl Into<String>,
        pool: Arc<BufferPoolManager>,
        comparator: C,
    ) -> Result<Self> {
        Self::with_max_sizes(
            index_name,
            pool,
            comparator,
            node::leaf_max_size::<K>(),
            node::internal_max_size::<K>(),
        )
    }

    /// Opens the index with explicit node capacities. Small capacities
    /// keep trees shallow enough to inspect structurally.
    pub fn with_max_sizes(
        index_name: impl Into<String>,
        pool: Arc<BufferPoolManager>,
        comparator: C,
        leaf_max_size: u32,
        internal_max_size: u32,
    ) -> Result<Self> {
        let index_name = index_name.into();
        if index_name.is_empty() {
            return Err(GraniteError::ConfigError(
                "index name must not be empty".to_string(),
            ));
        }
        if index_name.len() > MAX_INDEX_NAME_LEN {
            return Err(GraniteError::IndexNameTooLong(
                index_name.len(),
                MAX_INDEX_NAME_LEN,
            ));
        }
        if leaf_max_size < 2 || internal_max_size < 3 {
            return Err(GraniteError::ConfigError(format!(
                "node capacities too small: leaf {}, internal {}",
                leaf_max_size, internal_max_size
            )));
        }

        ensure_header_page(&pool)?;
        let root = {
            let guard = pool.read_page(HEADER_PAGE_ID)?;
            HeaderPage::attach(guard.data())
                .get_root_id(&index_name)
                .unwrap_or(PageId::INVALID)
        };

        Ok(Self {
            index_name,
            pool,
            comparator,
            root_page_id: RwLock::new(root),
            leaf_max_size,
            internal_max_size,
            _key: PhantomData,
        })
    }

    /// Returns the index name.
    pub fn name(&self) -> &str {
        &self.index_name
    }

    /// Returns the current root page id (INVALID while empty).
    pub fn root_page_id(&self) -> PageId {
        *self.root_page_id.read()
    }

    /// Returns true if the tree holds no entries.
    pub fn is_empty(&self) -> bool {
        !self.root_page_id.read().is_valid()
    }

    /// Point lookup. Returns the values stored under `key` (at most one;
    /// keys are unique).
    pub fn get_value(&self, key: &K) -> Result<Vec<RecordId>> {
        let Some(guard) = self.find_leaf_read(LeafTarget::Key(key))? else {
            return Ok(Vec::new());
        };
        let leaf = LeafNode::<_, K>::attach(guard.data());
        Ok(leaf.lookup(key, &self.comparator).into_iter().collect())
    }

    /// Inserts `(key, value)`. Returns false (leaving the tree
    /// untouched) when the key is already present.
    pub fn insert(&self, key: &K, value: RecordId) -> Result<bool> {
        let mut root_guard = self.root_page_id.write();
        if !root_guard.is_valid() {
            self.start_new_tree(&mut root_guard, key, value)?;
            return Ok(true);
        }

        let (path, mut leaf_guard, token) =
            self.find_leaf_write(root_guard, key, WriteMode::Insert)?;

        // Re-check membership under the leaf's write latch.
        {
            let leaf = LeafNode::<_, K>::attach(leaf_guard.data());
            if leaf.lookup(key, &self.comparator).is_some() {
                return Ok(false);
            }
        }

        let (new_size, max) = {
            let mut leaf = LeafNode::<_, K>::attach(leaf_guard.data_mut());
            let n = leaf.insert(key, value, &self.comparator);
            (n, leaf.max_size())
        };
        if new_size <= max {
            return Ok(true);
        }

        // Leaf overflow: split off a right sibling and push the
        // separator into the parent.
        let mut sibling_guard = self.pool.new_page_write()?;
        let sibling_id = sibling_guard.page_id();
        let separator = {
            let mut leaf = LeafNode::<_, K>::attach(leaf_guard.data_mut());
            let separator = leaf.key_at(leaf.min_size());
            let mut sibling = LeafNode::<_, K>::init(
                sibling_guard.data_mut(),
                sibling_id,
                leaf.parent_page_id(),
                self.leaf_max_size,
            );
            leaf.move_half_to(&mut sibling);
            separator
        };
        self.insert_into_parent(path, token, leaf_guard, separator, sibling_guard)?;
        Ok(true)
    }

    /// Removes `key` if present, repairing underflow by redistribution
    /// or coalescing.
    pub fn remove(&self, key: &K) -> Result<()> {
        let root_guard = self.root_page_id.write();
        if !root_guard.is_valid() {
            return Ok(());
        }

        let (path, mut leaf_guard, token) =
            self.find_leaf_write(root_guard, key, WriteMode::Remove)?;

        {
            let leaf = LeafNode::<_, K>::attach(leaf_guard.data());
            if leaf.lookup(key, &self.comparator).is_none() {
                return Ok(());
            }
        }

        let (new_size, min) = {
            let mut leaf = LeafNode::<_, K>::attach(leaf_guard.data_mut());
            let n = leaf.remove_and_delete(key, &self.comparator);
            (n, leaf.min_size())
        };

        if node::node_is_root(leaf_guard.data()) {
            if new_size == 0 {
                return self.adjust_root(token, leaf_guard);
            }
            return Ok(());
        }
        if new_size < min {
            return self.coalesce_or_redistribute(path, token, leaf_guard);
        }
        Ok(())
    }

    /// Forward iterator over all entries in key order.
    pub fn iter(&self) -> Result<TreeIterator<'_, K>> {
        match self.find_leaf_read(LeafTarget::Leftmost)? {
            Some(guard) => Ok(TreeIterator::new(&self.pool, guard, 0)),
            None => Ok(TreeIterator::exhausted(&self.pool)),
        }
    }

    /// Forward iterator positioned at the first entry >= `key`.
    pub fn iter_from(&self, key: &K) -> Result<TreeIterator<'_, K>> {
        match self.find_leaf_read(LeafTarget::Key(key))? {
            Some(guard) => {
                let offset =
                    LeafNode::<_, K>::attach(guard.data()).key_index(key, &self.comparator);
                Ok(TreeIterator::new(&self.pool, guard, offset))
            }
            None => Ok(TreeIterator::exhausted(&self.pool)),
        }
    }

    /// Bootstraps an empty tree: a fresh leaf becomes the root and the
    /// root record is persisted in the header page.
    fn start_new_tree(
        &self,
        root_guard: &mut RwLockWriteGuard<'_, PageId>,
        key: &K,
        value: RecordId,
    ) -> Result<()> {
        let mut guard = self.pool.new_page_write()?;
        let page_id = guard.page_id();
        {
            let mut leaf = LeafNode::<_, K>::init(
                guard.data_mut(),
                page_id,
                PageId::INVALID,
                self.leaf_max_size,
            );
            leaf.insert(key, value, &self.comparator);
        }
        **root_guard = page_id;
        self.persist_root(page_id)
    }

    /// Read-latched descent to the leaf for `target`.
    ///
    /// Crabbing: the child's latch is acquired before the parent's guard
    /// is released. Returns None when the tree is empty.
    fn find_leaf_read(&self, target: LeafTarget<'_, K>) -> Result<Option<PageReadGuard<'_>>> {
        let root_guard = self.root_page_id.read();
        if !root_guard.is_valid() {
            return Ok(None);
        }
        let mut guard = self.pool.read_page(*root_guard)?;
        drop(root_guard);

        loop {
            match node::node_type(guard.data()) {
                NodeType::Leaf => return Ok(Some(guard)),
                NodeType::Internal => {
                    let child = {
                        let internal = InternalNode::<_, K>::attach(guard.data());
                        match target {
                            LeafTarget::Leftmost => internal.value_at(0),
                            LeafTarget::Key(key) => internal.lookup(key, &self.comparator),
                        }
                    };
                    guard = self.pool.read_page(child)?;
                }
                NodeType::Invalid => {
                    return Err(GraniteError::InvalidNodeType {
                        page_id: guard.page_id().0,
                    })
                }
            }
        }
    }

    /// Write-latched descent to the leaf for `key`.
    ///
    /// Ancestors stay latched only while the current node is unsafe for
    /// `mode`; once a safe node is reached, the retained chain (and the
    /// root-id latch) is released bottom-up. Returns the retained
    /// ancestor chain, the latched leaf, and the root-id latch when it
    /// is still held.
    #[allow(clippy::type_complexity)]
    fn find_leaf_write<'a>(
        &'a self,
        root_guard: RwLockWriteGuard<'a, PageId>,
        key: &K,
        mode: WriteMode,
    ) -> Result<(
        Vec<PageWriteGuard<'a>>,
        PageWriteGuard<'a>,
        Option<RwLockWriteGuard<'a, PageId>>,
    )> {
        let root_id = *root_guard;
        let mut token = Some(root_guard);
        let mut path: Vec<PageWriteGuard<'a>> = Vec::new();
        let mut guard = self.pool.write_page(root_id)?;

        loop {
            let (ntype, size, max, is_root) = {
                let d = guard.data();
                (
                    node::node_type(d),
                    node::node_size(d),
                    node::node_max_size(d),
                    node::node_is_root(d),
                )
            };
            if ntype == NodeType::Invalid {
                return Err(GraniteError::InvalidNodeType {
                    page_id: guard.page_id().0,
                });
            }

            let safe = match mode {
                WriteMode::Insert => size < max,
                WriteMode::Remove => {
                    if is_root {
                        if ntype == NodeType::Leaf {
                            size > 1
                        } else {
                            size > 2
                        }
                    } else {
                        size > (max + 1) / 2
                    }
                }
            };
            if safe {
                token = None;
                while let Some(ancestor) = path.pop() {
                    drop(ancestor);
                }
            }

            if ntype == NodeType::Leaf {
                return Ok((path, guard, token));
            }

            let child = InternalNode::<_, K>::attach(guard.data()).lookup(key, &self.comparator);
            let child_guard = self.pool.write_page(child)?;
            path.push(guard);
            guard = child_guard;
        }
    }

    /// Inserts the separator for a freshly split node into its parent,
    /// splitting upward as long as parents overflow.
    fn insert_into_parent<'a>(
        &'a self,
        mut path: Vec<PageWriteGuard<'a>>,
        token: Option<RwLockWriteGuard<'a, PageId>>,
        mut old: PageWriteGuard<'a>,
        mut separator: K,
        mut new: PageWriteGuard<'a>,
    ) -> Result<()> {
        loop {
            let Some(mut parent_guard) = path.pop() else {
                // The split reached the root: grow the tree by a level.
                let mut root_guard = self.pool.new_page_write()?;
                let root_id = root_guard.page_id();
                {
                    let mut root = InternalNode::<_, K>::init(
                        root_guard.data_mut(),
                        root_id,
                        PageId::INVALID,
                        self.internal_max_size,
                    );
                    root.populate_new_root(old.page_id(), &separator, new.page_id());
                }
                node::set_node_parent_id(old.data_mut(), root_id);
                node::set_node_parent_id(new.data_mut(), root_id);

                debug_assert!(token.is_some());
                if let Some(mut t) = token {
                    *t = root_id;
                }
                return self.persist_root(root_id);
            };

            let (new_size, max) = {
                let mut parent = InternalNode::<_, K>::attach(parent_guard.data_mut());
                let n = parent.insert_after(old.page_id(), &separator, new.page_id());
                (n, parent.max_size())
            };
            // The split children must be released before a parent split
            // re-parents pages through the pool.
            drop(old);
            drop(new);
            if new_size <= max {
                return Ok(());
            }

            let mut sibling_guard = self.pool.new_page_write()?;
            let sibling_id = sibling_guard.page_id();
            separator = {
                let mut parent = InternalNode::<_, K>::attach(parent_guard.data_mut());
                let separator = parent.key_at(parent.min_size());
                let mut sibling = InternalNode::<_, K>::init(
                    sibling_guard.data_mut(),
                    sibling_id,
                    parent.parent_page_id(),
                    self.internal_max_size,
                );
                parent.move_half_to(&mut sibling, &self.pool)?;
                separator
            };
            old = parent_guard;
            new = sibling_guard;
        }
    }

    /// Repairs an underflowed node: redistribute one entry from a
    /// sibling when their combined size exceeds one node, otherwise
    /// merge the right node into the left and recurse on the parent.
    fn coalesce_or_redistribute<'a>(
        &'a self,
        mut path: Vec<PageWriteGuard<'a>>,
        token: Option<RwLockWriteGuard<'a, PageId>>,
        mut node_guard: PageWriteGuard<'a>,
    ) -> Result<()> {
        loop {
            let Some(mut parent_guard) = path.pop() else {
                return self.adjust_root(token, node_guard);
            };

            let node_id = node_guard.page_id();
            let node_is_leaf = node::node_type(node_guard.data()) == NodeType::Leaf;

            // Prefer the right sibling; fall back to the left at the end
            // of the parent.
            let (node_index, sibling_index, sibling_id) = {
                let parent = InternalNode::<_, K>::attach(parent_guard.data());
                let Some(node_index) = parent.value_index(node_id) else {
                    return Err(GraniteError::IndexCorrupted(format!(
                        "{} missing from its parent {}",
                        node_id,
                        parent.page_id()
                    )));
                };
                let sibling_index = if node_index + 1 < parent.size() {
                    node_index + 1
                } else {
                    node_index - 1
                };
                (node_index, sibling_index, parent.value_at(sibling_index))
            };

            let mut sibling_guard = self.pool.write_page(sibling_id)?;
            let node_size = node::node_size(node_guard.data());
            let sibling_size = node::node_size(sibling_guard.data());
            let max = node::node_max_size(node_guard.data());

            if sibling_size + node_size > max {
                // Redistribute one entry across the boundary.
                if node_is_leaf {
                    let mut this = LeafNode::<_, K>::attach(node_guard.data_mut());
                    let mut sibling = LeafNode::<_, K>::attach(sibling_guard.data_mut());
                    let mut parent = InternalNode::<_, K>::attach(parent_guard.data_mut());
                    if sibling_index > node_index {
                        sibling.move_first_to_end_of(&mut this, &mut parent);
                    } else {
                        sibling.move_last_to_front_of(&mut this, &mut parent);
                    }
                } else {
                    let mut this = InternalNode::<_, K>::attach(node_guard.data_mut());
                    let mut sibling = InternalNode::<_, K>::attach(sibling_guard.data_mut());
                    let mut parent = InternalNode::<_, K>::attach(parent_guard.data_mut());
                    if sibling_index > node_index {
                        sibling.move_first_to_end_of(&mut this, &mut parent, &self.pool)?;
                    } else {
                        sibling.move_last_to_front_of(&mut this, &mut parent, &self.pool)?;
                    }
                }
                return Ok(());
            }

            // Coalesce: data always flows right-to-left so that leaf
            // sibling links stay correct.
            let (mut left_guard, mut right_guard, right_index) = if sibling_index < node_index {
                (sibling_guard, node_guard, node_index)
            } else {
                (node_guard, sibling_guard, sibling_index)
            };
            if node_is_leaf {
                let mut right = LeafNode::<_, K>::attach(right_guard.data_mut());
                let mut left = LeafNode::<_, K>::attach(left_guard.data_mut());
                let mut parent = InternalNode::<_, K>::attach(parent_guard.data_mut());
                right.move_all_to(&mut left, &mut parent, right_index);
            } else {
                let mut right = InternalNode::<_, K>::attach(right_guard.data_mut());
                let mut left = InternalNode::<_, K>::attach(left_guard.data_mut());
                let mut parent = InternalNode::<_, K>::attach(parent_guard.data_mut());
                right.move_all_to(&mut left, &mut parent, right_index, &self.pool)?;
            }
            right_guard.delete();
            drop(left_guard);

            let parent_size = node::node_size(parent_guard.data());
            let parent_floor = if node::node_is_root(parent_guard.data()) {
                2
            } else {
                node::node_min_size(parent_guard.data())
            };
            if parent_size < parent_floor {
                node_guard = parent_guard;
                continue;
            }
            return Ok(());
        }
    }

    /// Handles underflow at the root: an internal root left with a
    /// single child hands the root role to that child; an empty leaf
    /// root empties the tree.
    fn adjust_root<'a>(
        &'a self,
        token: Option<RwLockWriteGuard<'a, PageId>>,
        root_guard: PageWriteGuard<'a>,
    ) -> Result<()> {
        debug_assert!(token.is_some(), "root repair without the root-id latch");
        let Some(mut root_id_guard) = token else {
            return Ok(());
        };

        let ntype = node::node_type(root_guard.data());
        let size = node::node_size(root_guard.data());

        if ntype == NodeType::Internal && size == 1 {
            let child = InternalNode::<_, K>::attach(root_guard.data()).value_at(0);
            *root_id_guard = child;
            self.persist_root(child)?;
            {
                let mut child_guard = self.pool.write_page(child)?;
                node::set_node_parent_id(child_guard.data_mut(), PageId::INVALID);
            }
            root_guard.delete();
        } else if ntype == NodeType::Leaf && size == 0 {
            *root_id_guard = PageId::INVALID;
            self.persist_root(PageId::INVALID)?;
            root_guard.delete();
        }
        Ok(())
    }

    /// Writes the `(index_name -> root)` record into the header page,
    /// creating it on first use.
    fn persist_root(&self, root_id: PageId) -> Result<()> {
        let mut guard = self.pool.write_page(HEADER_PAGE_ID)?;
        let mut header = HeaderPage::attach(guard.data_mut());
        if !header.update_record(&self.index_name, root_id)
            && !header.insert_record(&self.index_name, root_id)
        {
            return Err(GraniteError::Internal(format!(
                "header page cannot record index {:?}",
                self.index_name
            )));
        }
        Ok(())
    }
}

/// Allocates and formats the header page on a fresh database file.
fn ensure_header_page(pool: &BufferPoolManager) -> Result<()> {
    if pool.disk().num_allocated_pages() == 0 {
        let mut guard = pool.new_page_write()?;
        debug_assert_eq!(guard.page_id(), HEADER_PAGE_ID);
        HeaderPage::init(guard.data_mut());
    }
    Ok(())
}
