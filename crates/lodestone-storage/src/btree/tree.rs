//! B+ tree operations: lookup, insertion with split propagation, and
//! removal with merge/redistribution.

use super::iterator::TreeIter;
use super::key::IndexKey;
use super::node::{
    InternalNode, LeafNode, Node, CHILD_ENCODED_LEN, NODE_HEADER_LEN, RID_ENCODED_LEN,
};
use crate::header::{HeaderPage, HEADER_PAGE_ID, MAX_INDEX_NAME_LEN};
use lodestone_buffer::{BufferFrame, BufferPoolManager};
use lodestone_common::page::{PageId, PAGE_SIZE};
use lodestone_common::{LodestoneError, Result, Rid};
use parking_lot::Mutex;
use std::marker::PhantomData;
use std::path::Path;
use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::Arc;

/// Largest leaf entry count that fits a page for key type `K`.
pub fn max_leaf_entries<K: IndexKey>() -> usize {
    (PAGE_SIZE - NODE_HEADER_LEN) / (K::ENCODED_LEN + RID_ENCODED_LEN)
}

/// Largest internal entry count that fits a page for key type `K`.
pub fn max_internal_entries<K: IndexKey>() -> usize {
    (PAGE_SIZE - NODE_HEADER_LEN) / (K::ENCODED_LEN + CHILD_ENCODED_LEN)
}

/// A B+ tree index persisted through the buffer pool.
///
/// Leaves hold `(key, Rid)` entries and stay strictly below
/// `leaf_max_size`: an insert that fills a leaf splits it before
/// returning. Internal nodes hold up to `internal_max_size` children
/// and split when they exceed it. Nodes carry parent page ids, so
/// splits and merges re-parent migrated children.
///
/// A single tree-level mutex serializes insert, remove, get, and
/// iterator advance. Lock order on every path is tree latch, then pool
/// latch, then pool-internal locks, so the coarse scheme is deadlock
/// free.
pub struct BPlusTree<K: IndexKey> {
    name: String,
    pool: Arc<BufferPoolManager>,
    leaf_max_size: usize,
    internal_max_size: usize,
    root_page_id: AtomicI32,
    latch: Mutex<()>,
    _marker: PhantomData<K>,
}

impl<K: IndexKey> BPlusTree<K> {
    /// Opens the named index, registering it in the header page on
    /// first use. An existing registration restores the recorded root.
    pub fn create(
        name: &str,
        pool: Arc<BufferPoolManager>,
        leaf_max_size: usize,
        internal_max_size: usize,
    ) -> Result<Self> {
        if name.len() > MAX_INDEX_NAME_LEN {
            return Err(LodestoneError::IndexNameTooLong {
                len: name.len(),
                max: MAX_INDEX_NAME_LEN,
            });
        }
        if leaf_max_size < 2 || leaf_max_size > max_leaf_entries::<K>() {
            return Err(LodestoneError::InvalidParameter {
                name: "leaf_max_size".to_string(),
                value: leaf_max_size.to_string(),
            });
        }
        if internal_max_size < 3 || internal_max_size > max_internal_entries::<K>() {
            return Err(LodestoneError::InvalidParameter {
                name: "internal_max_size".to_string(),
                value: internal_max_size.to_string(),
            });
        }

        let frame = pool.fetch_page(HEADER_PAGE_ID)?;
        let mut header = HeaderPage::from_bytes(&frame.read_data());
        let (root, registered) = match header.get_root(name) {
            Some(root) => (root, false),
            None => {
                if let Err(e) = header.insert_record(name, PageId::INVALID) {
                    pool.unpin_page(HEADER_PAGE_ID, false);
                    return Err(e);
                }
                (PageId::INVALID, true)
            }
        };
        if registered {
            header.to_bytes(&mut frame.write_data());
        }
        pool.unpin_page(HEADER_PAGE_ID, registered);
        if registered {
            pool.flush_page(HEADER_PAGE_ID)?;
        }

        Ok(Self {
            name: name.to_string(),
            pool,
            leaf_max_size,
            internal_max_size,
            root_page_id: AtomicI32::new(root.0),
            latch: Mutex::new(()),
            _marker: PhantomData,
        })
    }

    /// Returns the index name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the current root page id.
    pub fn root_page_id(&self) -> PageId {
        PageId(self.root_page_id.load(Ordering::Acquire))
    }

    /// Returns true if the tree holds no entries.
    pub fn is_empty(&self) -> bool {
        !self.root_page_id().is_valid()
    }

    // =========================================================================
    // Search
    // =========================================================================

    /// Point lookup.
    pub fn get(&self, key: &K) -> Result<Option<Rid>> {
        let _guard = self.latch.lock();
        if self.is_empty() {
            return Ok(None);
        }
        let (_frame, leaf) = self.find_leaf(key)?;
        let result = leaf.lookup(key);
        self.unpin(leaf.page_id, false);
        Ok(result)
    }

    /// Descends to the leaf responsible for `key`, pinning each child
    /// before releasing its parent. The returned leaf stays pinned.
    fn find_leaf(&self, key: &K) -> Result<(&BufferFrame, LeafNode<K>)> {
        self.descend(|internal| internal.child_for(key))
    }

    /// Descends to the leftmost leaf. The returned leaf stays pinned.
    fn find_leftmost_leaf(&self) -> Result<(&BufferFrame, LeafNode<K>)> {
        self.descend(|internal| internal.entries[0].1)
    }

    fn descend(
        &self,
        mut pick_child: impl FnMut(&InternalNode<K>) -> PageId,
    ) -> Result<(&BufferFrame, LeafNode<K>)> {
        let mut current_id = self.root_page_id();
        let (mut frame, mut node) = self.fetch_node(current_id)?;
        loop {
            match node {
                Node::Leaf(leaf) => return Ok((frame, leaf)),
                Node::Internal(internal) => {
                    let child_id = pick_child(&internal);
                    match self.fetch_node(child_id) {
                        Ok((child_frame, child_node)) => {
                            self.unpin(current_id, false);
                            current_id = child_id;
                            frame = child_frame;
                            node = child_node;
                        }
                        Err(e) => {
                            self.unpin(current_id, false);
                            return Err(e);
                        }
                    }
                }
            }
        }
    }

    // =========================================================================
    // Insertion
    // =========================================================================

    /// Inserts a key. Returns Ok(false) on a duplicate; pool
    /// exhaustion and I/O failures surface as errors.
    pub fn insert(&self, key: K, rid: Rid) -> Result<bool> {
        let _guard = self.latch.lock();

        if self.is_empty() {
            self.start_new_tree(key, rid)?;
            return Ok(true);
        }

        let (leaf_frame, mut leaf) = self.find_leaf(&key)?;
        let leaf_id = leaf.page_id;
        if !leaf.insert(key, rid) {
            self.unpin(leaf_id, false);
            return Ok(false);
        }

        if leaf.size() < self.leaf_max_size {
            Self::save_leaf(leaf_frame, &leaf);
            self.unpin(leaf_id, true);
            return Ok(true);
        }

        // the insert filled the leaf: split before returning
        let (right_id, right_frame) = match self.pool.new_page() {
            Ok(page) => page,
            Err(e) => {
                self.unpin(leaf_id, false);
                return Err(e);
            }
        };
        tracing::trace!(index = %self.name, leaf = %leaf_id, right = %right_id, "leaf split");

        let (separator, mut right) = leaf.split_off_upper(right_id);
        right.next_page_id = leaf.next_page_id;
        leaf.next_page_id = right_id;
        let parent_id = leaf.parent_page_id;

        if parent_id.is_valid() {
            Self::save_leaf(leaf_frame, &leaf);
            Self::save_leaf(right_frame, &right);
            self.unpin(leaf_id, true);
            self.unpin(right_id, true);
            self.insert_into_internal(parent_id, separator, right_id)?;
        } else {
            // the root leaf split: grow the tree by one level
            let (root_id, root_frame) = match self.pool.new_page() {
                Ok(page) => page,
                Err(e) => {
                    self.unpin(leaf_id, false);
                    self.unpin(right_id, false);
                    return Err(e);
                }
            };
            let mut root = InternalNode::new(root_id, PageId::INVALID, self.internal_max_size);
            root.entries.push((K::default(), leaf_id));
            root.entries.push((separator, right_id));
            leaf.parent_page_id = root_id;
            right.parent_page_id = root_id;

            Self::save_leaf(leaf_frame, &leaf);
            Self::save_leaf(right_frame, &right);
            Self::save_internal(root_frame, &root);
            self.unpin(leaf_id, true);
            self.unpin(right_id, true);
            self.unpin(root_id, true);
            self.set_root(root_id)?;
        }
        Ok(true)
    }

    fn start_new_tree(&self, key: K, rid: Rid) -> Result<()> {
        let (page_id, frame) = self.pool.new_page()?;
        let mut leaf = LeafNode::new(page_id, PageId::INVALID, self.leaf_max_size);
        leaf.insert(key, rid);
        Self::save_leaf(frame, &leaf);
        self.unpin(page_id, true);
        self.set_root(page_id)
    }

    /// Inserts a separator and right child into an internal node,
    /// splitting upward while nodes overflow.
    fn insert_into_internal(&self, node_id: PageId, key: K, child_id: PageId) -> Result<()> {
        let (frame, mut node) = self.fetch_internal_node(node_id)?;
        node.insert_pair(key, child_id);

        if node.size() <= self.internal_max_size {
            Self::save_internal(frame, &node);
            self.unpin(node_id, true);
            return Ok(());
        }

        let (right_id, right_frame) = match self.pool.new_page() {
            Ok(page) => page,
            Err(e) => {
                self.unpin(node_id, false);
                return Err(e);
            }
        };
        tracing::trace!(index = %self.name, node = %node_id, right = %right_id, "internal split");

        let (promoted, mut right) = node.split_off_upper(right_id);
        for i in 0..right.entries.len() {
            let child = right.entries[i].1;
            if let Err(e) = self.set_parent(child, right_id) {
                self.unpin(node_id, false);
                self.unpin(right_id, false);
                return Err(e);
            }
        }

        let parent_id = node.parent_page_id;
        if parent_id.is_valid() {
            Self::save_internal(frame, &node);
            Self::save_internal(right_frame, &right);
            self.unpin(node_id, true);
            self.unpin(right_id, true);
            self.insert_into_internal(parent_id, promoted, right_id)
        } else {
            // the root split
            let (root_id, root_frame) = match self.pool.new_page() {
                Ok(page) => page,
                Err(e) => {
                    self.unpin(node_id, false);
                    self.unpin(right_id, false);
                    return Err(e);
                }
            };
            let mut root = InternalNode::new(root_id, PageId::INVALID, self.internal_max_size);
            root.entries.push((K::default(), node_id));
            root.entries.push((promoted, right_id));
            node.parent_page_id = root_id;
            right.parent_page_id = root_id;

            Self::save_internal(frame, &node);
            Self::save_internal(right_frame, &right);
            Self::save_internal(root_frame, &root);
            self.unpin(node_id, true);
            self.unpin(right_id, true);
            self.unpin(root_id, true);
            self.set_root(root_id)
        }
    }

    // =========================================================================
    // Removal
    // =========================================================================

    /// Removes a key. Returns Ok(false) if the key is absent.
    pub fn remove(&self, key: &K) -> Result<bool> {
        let _guard = self.latch.lock();
        if self.is_empty() {
            return Ok(false);
        }

        let (leaf_frame, mut leaf) = self.find_leaf(key)?;
        let leaf_id = leaf.page_id;
        if !leaf.remove(key) {
            self.unpin(leaf_id, false);
            return Ok(false);
        }

        if !leaf.parent_page_id.is_valid() {
            // root leaf: an emptied root resets the tree
            if leaf.size() == 0 {
                self.unpin(leaf_id, false);
                self.pool.delete_page(leaf_id)?;
                self.set_root(PageId::INVALID)?;
            } else {
                Self::save_leaf(leaf_frame, &leaf);
                self.unpin(leaf_id, true);
            }
            return Ok(true);
        }

        if leaf.size() >= leaf.min_size() {
            Self::save_leaf(leaf_frame, &leaf);
            self.unpin(leaf_id, true);
            return Ok(true);
        }

        self.rebalance_leaf(leaf_frame, leaf)?;
        Ok(true)
    }

    /// Fixes an underfull non-root leaf by merging with or borrowing
    /// from a sibling. Prefers the left sibling; the leftmost child
    /// uses its right sibling.
    fn rebalance_leaf(&self, node_frame: &BufferFrame, mut node: LeafNode<K>) -> Result<()> {
        let node_id = node.page_id;
        let parent_id = node.parent_page_id;
        let (parent_frame, mut parent) = match self.fetch_internal_node(parent_id) {
            Ok(fetched) => fetched,
            Err(e) => {
                self.unpin(node_id, true);
                return Err(e);
            }
        };
        let (node_idx, sibling_idx, node_is_left) = match self.pick_sibling(&parent, node_id) {
            Ok(choice) => choice,
            Err(e) => {
                self.unpin(node_id, true);
                self.unpin(parent_id, false);
                return Err(e);
            }
        };
        let sibling_id = parent.entries[sibling_idx].1;
        let (sibling_frame, mut sibling) = match self.fetch_leaf_node(sibling_id) {
            Ok(fetched) => fetched,
            Err(e) => {
                self.unpin(node_id, true);
                self.unpin(parent_id, false);
                return Err(e);
            }
        };

        if node.size() + sibling.size() <= self.leaf_max_size - 1 {
            // merge the right node into the left
            let (left_frame, mut left, mut right, right_idx) = if node_is_left {
                (node_frame, node, sibling, sibling_idx)
            } else {
                (sibling_frame, sibling, node, node_idx)
            };
            tracing::trace!(index = %self.name, left = %left.page_id, right = %right.page_id, "leaf merge");

            left.entries.append(&mut right.entries);
            left.next_page_id = right.next_page_id;
            let right_id = right.page_id;

            Self::save_leaf(left_frame, &left);
            self.unpin(left.page_id, true);
            self.unpin(right_id, false);
            if let Err(e) = self.pool.delete_page(right_id) {
                self.unpin(parent_id, false);
                return Err(e);
            }

            parent.entries.remove(right_idx);
            self.finish_parent(parent_frame, parent)
        } else {
            // redistribute one entry across the boundary
            if node_is_left {
                let (k, v) = sibling.entries.remove(0);
                node.entries.push((k, v));
                parent.entries[sibling_idx].0 = sibling.entries[0].0;
            } else {
                let Some((k, v)) = sibling.entries.pop() else {
                    self.unpin(node_id, true);
                    self.unpin(sibling_id, false);
                    self.unpin(parent_id, false);
                    return Err(LodestoneError::TreeCorrupted(
                        "empty sibling chosen for redistribution".to_string(),
                    ));
                };
                node.entries.insert(0, (k, v));
                parent.entries[node_idx].0 = k;
            }
            Self::save_leaf(node_frame, &node);
            Self::save_leaf(sibling_frame, &sibling);
            Self::save_internal(parent_frame, &parent);
            self.unpin(node_id, true);
            self.unpin(sibling_id, true);
            self.unpin(parent_id, true);
            Ok(())
        }
    }

    /// Handles a parent that just lost a separator: collapse the root
    /// when it routes to a single child, or rebalance a non-root node
    /// that fell to its minimum.
    fn finish_parent(&self, frame: &BufferFrame, parent: InternalNode<K>) -> Result<()> {
        let parent_id = parent.page_id;

        if !parent.parent_page_id.is_valid() {
            if parent.size() == 1 {
                // promote the only child to root
                let child = parent.entries[0].1;
                tracing::debug!(index = %self.name, old_root = %parent_id, new_root = %child, "root collapse");
                self.unpin(parent_id, false);
                self.pool.delete_page(parent_id)?;
                self.set_parent(child, PageId::INVALID)?;
                return self.set_root(child);
            }
            Self::save_internal(frame, &parent);
            self.unpin(parent_id, true);
            return Ok(());
        }

        if parent.size() > parent.min_size() {
            Self::save_internal(frame, &parent);
            self.unpin(parent_id, true);
            return Ok(());
        }

        self.rebalance_internal(frame, parent)
    }

    /// Fixes an internal node at or below its minimum, merging with or
    /// rotating through the parent separator.
    fn rebalance_internal(&self, node_frame: &BufferFrame, mut node: InternalNode<K>) -> Result<()> {
        let node_id = node.page_id;
        let parent_id = node.parent_page_id;
        let (parent_frame, mut parent) = match self.fetch_internal_node(parent_id) {
            Ok(fetched) => fetched,
            Err(e) => {
                self.unpin(node_id, true);
                return Err(e);
            }
        };
        let (node_idx, sibling_idx, node_is_left) = match self.pick_sibling(&parent, node_id) {
            Ok(choice) => choice,
            Err(e) => {
                self.unpin(node_id, true);
                self.unpin(parent_id, false);
                return Err(e);
            }
        };
        let sibling_id = parent.entries[sibling_idx].1;
        let (sibling_frame, mut sibling) = match self.fetch_internal_node(sibling_id) {
            Ok(fetched) => fetched,
            Err(e) => {
                self.unpin(node_id, true);
                self.unpin(parent_id, false);
                return Err(e);
            }
        };

        if node.size() + sibling.size() <= self.internal_max_size {
            // merge right into left; the parent separator comes down as
            // the right node's slot-0 key
            let (left_frame, mut left, mut right, right_idx) = if node_is_left {
                (node_frame, node, sibling, sibling_idx)
            } else {
                (sibling_frame, sibling, node, node_idx)
            };
            tracing::trace!(index = %self.name, left = %left.page_id, right = %right.page_id, "internal merge");

            let separator = parent.entries[right_idx].0;
            let mut moved = std::mem::take(&mut right.entries);
            moved[0].0 = separator;
            for i in 0..moved.len() {
                let child = moved[i].1;
                if let Err(e) = self.set_parent(child, left.page_id) {
                    self.unpin(left.page_id, true);
                    self.unpin(right.page_id, false);
                    self.unpin(parent_id, false);
                    return Err(e);
                }
            }
            left.entries.extend(moved);
            let right_id = right.page_id;

            Self::save_internal(left_frame, &left);
            self.unpin(left.page_id, true);
            self.unpin(right_id, false);
            if let Err(e) = self.pool.delete_page(right_id) {
                self.unpin(parent_id, false);
                return Err(e);
            }

            parent.entries.remove(right_idx);
            self.finish_parent(parent_frame, parent)
        } else {
            // rotate one entry: the parent separator comes down, the
            // sibling's boundary key goes up, and the moved child is
            // re-parented
            let stolen_child;
            if node_is_left {
                let sep_idx = sibling_idx;
                stolen_child = sibling.entries[0].1;
                let down_key = parent.entries[sep_idx].0;
                sibling.entries.remove(0);
                let up_key = sibling.entries[0].0;
                sibling.entries[0].0 = K::default();
                parent.entries[sep_idx].0 = up_key;
                node.entries.push((down_key, stolen_child));
            } else {
                let Some((up_key, child)) = sibling.entries.pop() else {
                    self.unpin(node_id, true);
                    self.unpin(sibling_id, false);
                    self.unpin(parent_id, false);
                    return Err(LodestoneError::TreeCorrupted(
                        "empty sibling chosen for redistribution".to_string(),
                    ));
                };
                stolen_child = child;
                let down_key = parent.entries[node_idx].0;
                node.entries[0].0 = down_key;
                node.entries.insert(0, (K::default(), stolen_child));
                parent.entries[node_idx].0 = up_key;
            }
            if let Err(e) = self.set_parent(stolen_child, node_id) {
                self.unpin(node_id, true);
                self.unpin(sibling_id, false);
                self.unpin(parent_id, false);
                return Err(e);
            }
            Self::save_internal(node_frame, &node);
            Self::save_internal(sibling_frame, &sibling);
            Self::save_internal(parent_frame, &parent);
            self.unpin(node_id, true);
            self.unpin(sibling_id, true);
            self.unpin(parent_id, true);
            Ok(())
        }
    }

    /// Chooses the rebalancing sibling: the left one, unless the node
    /// is the parent's slot-0 child.
    fn pick_sibling(
        &self,
        parent: &InternalNode<K>,
        node_id: PageId,
    ) -> Result<(usize, usize, bool)> {
        let node_idx = parent.child_index(node_id).ok_or_else(|| {
            LodestoneError::TreeCorrupted(format!("{node_id} missing from its parent"))
        })?;
        if node_idx == 0 {
            if parent.size() < 2 {
                return Err(LodestoneError::TreeCorrupted(format!(
                    "{node_id} has no sibling to rebalance with"
                )));
            }
            Ok((node_idx, 1, true))
        } else {
            Ok((node_idx, node_idx - 1, false))
        }
    }

    // =========================================================================
    // Iteration
    // =========================================================================

    /// Iterates over all entries in ascending key order.
    pub fn iter(&self) -> Result<TreeIter<'_, K>> {
        let _guard = self.latch.lock();
        if self.is_empty() {
            return Ok(TreeIter::exhausted(self));
        }
        let (_frame, leaf) = self.find_leftmost_leaf()?;
        Ok(TreeIter::new(self, leaf, 0))
    }

    /// Iterates starting from the first key >= `key`.
    pub fn iter_from(&self, key: &K) -> Result<TreeIter<'_, K>> {
        let _guard = self.latch.lock();
        if self.is_empty() {
            return Ok(TreeIter::exhausted(self));
        }
        let (_frame, leaf) = self.find_leaf(key)?;
        let index = leaf.lower_bound(key);
        Ok(TreeIter::new(self, leaf, index))
    }

    // =========================================================================
    // Buffer pool plumbing
    // =========================================================================

    fn fetch_node(&self, page_id: PageId) -> Result<(&BufferFrame, Node<K>)> {
        let frame = self.pool.fetch_page(page_id)?;
        let decoded = {
            let data = frame.read_data();
            Node::decode(&data)
        };
        match decoded {
            Ok(node) => Ok((frame, node)),
            Err(e) => {
                self.unpin(page_id, false);
                Err(e)
            }
        }
    }

    fn fetch_leaf_node(&self, page_id: PageId) -> Result<(&BufferFrame, LeafNode<K>)> {
        match self.fetch_node(page_id)? {
            (frame, Node::Leaf(leaf)) => Ok((frame, leaf)),
            (_, Node::Internal(_)) => {
                self.unpin(page_id, false);
                Err(LodestoneError::TreeCorrupted(format!(
                    "{page_id} is not a leaf"
                )))
            }
        }
    }

    fn fetch_internal_node(&self, page_id: PageId) -> Result<(&BufferFrame, InternalNode<K>)> {
        match self.fetch_node(page_id)? {
            (frame, Node::Internal(node)) => Ok((frame, node)),
            (_, Node::Leaf(_)) => {
                self.unpin(page_id, false);
                Err(LodestoneError::TreeCorrupted(format!(
                    "{page_id} is not an internal node"
                )))
            }
        }
    }

    /// Fetches and decodes a leaf, leaving it pinned for the iterator.
    pub(crate) fn fetch_leaf_pinned(&self, page_id: PageId) -> Result<LeafNode<K>> {
        let (_frame, leaf) = self.fetch_leaf_node(page_id)?;
        Ok(leaf)
    }

    pub(crate) fn latch(&self) -> &Mutex<()> {
        &self.latch
    }

    pub(crate) fn unpin(&self, page_id: PageId, dirty: bool) {
        self.pool.unpin_page(page_id, dirty);
    }

    fn save_leaf(frame: &BufferFrame, leaf: &LeafNode<K>) {
        leaf.encode(&mut frame.write_data());
    }

    fn save_internal(frame: &BufferFrame, node: &InternalNode<K>) {
        node.encode(&mut frame.write_data());
    }

    /// Rewrites a node's parent pointer in place.
    fn set_parent(&self, page_id: PageId, parent: PageId) -> Result<()> {
        let (frame, mut node) = self.fetch_node(page_id)?;
        node.set_parent_page_id(parent);
        node.encode(&mut frame.write_data());
        self.unpin(page_id, true);
        Ok(())
    }

    /// Records a root change in memory and in the header page, then
    /// flushes the header.
    fn set_root(&self, root: PageId) -> Result<()> {
        self.root_page_id.store(root.0, Ordering::Release);
        tracing::debug!(index = %self.name, root = %root, "persisting root");

        let frame = self.pool.fetch_page(HEADER_PAGE_ID)?;
        {
            let mut header = HeaderPage::from_bytes(&frame.read_data());
            if !header.update_record(&self.name, root) {
                self.pool.unpin_page(HEADER_PAGE_ID, false);
                return Err(LodestoneError::Internal(format!(
                    "index {} missing from the header page",
                    self.name
                )));
            }
            header.to_bytes(&mut frame.write_data());
        }
        self.pool.unpin_page(HEADER_PAGE_ID, true);
        self.pool.flush_page(HEADER_PAGE_ID)?;
        Ok(())
    }
}

impl<K: IndexKey + From<i64>> BPlusTree<K> {
    /// Test helper: inserts every whitespace-separated integer key in
    /// the file, with a row id derived from the key. Returns the count
    /// of keys actually inserted.
    pub fn insert_from_file(&self, path: impl AsRef<Path>) -> Result<usize> {
        let text = std::fs::read_to_string(path)?;
        let mut inserted = 0;
        for token in text.split_whitespace() {
            let key: i64 = token
                .parse()
                .map_err(|_| LodestoneError::ParseError(format!("bad integer key: {token}")))?;
            if self.insert(K::from(key), Rid::from_key(key))? {
                inserted += 1;
            }
        }
        Ok(inserted)
    }

    /// Test helper: removes every whitespace-separated integer key in
    /// the file. Returns the count of keys actually removed.
    pub fn remove_from_file(&self, path: impl AsRef<Path>) -> Result<usize> {
        let text = std::fs::read_to_string(path)?;
        let mut removed = 0;
        for token in text.split_whitespace() {
            let key: i64 = token
                .parse()
                .map_err(|_| LodestoneError::ParseError(format!("bad integer key: {token}")))?;
            if self.remove(&K::from(key))? {
                removed += 1;
            }
        }
        Ok(removed)
    }
}
