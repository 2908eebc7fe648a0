//! Append-only AVL tree whose nodes live in an arena and link by index.
//!
//! Each node holds one key and the ascending, duplicate-free list of user ids
//! stored under it. Rotations rewrite child indices; nothing is ever freed.

use social_types::UserId;
use std::cmp::Ordering;
use std::ops::Bound;

type NodeIdx = u32;

#[derive(Debug, Clone)]
struct Node<K> {
    key: K,
    ids: Vec<UserId>,
    left: Option<NodeIdx>,
    right: Option<NodeIdx>,
    height: u8,
}

/// Balanced ordered map from `K` to a set of user ids.
#[derive(Debug, Clone)]
pub struct AvlTree<K> {
    nodes: Vec<Node<K>>,
    root: Option<NodeIdx>,
    entries: usize,
}

impl<K: Ord> Default for AvlTree<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Ord> AvlTree<K> {
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Preallocate room for `distinct_keys` nodes.
    pub fn with_capacity(distinct_keys: usize) -> Self {
        Self {
            nodes: Vec::with_capacity(distinct_keys),
            root: None,
            entries: 0,
        }
    }

    /// Number of distinct keys.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Total (key, id) pairs stored.
    pub fn entry_count(&self) -> usize {
        self.entries
    }

    /// Height of the tree (0 when empty).
    pub fn height(&self) -> usize {
        self.height_of(self.root) as usize
    }

    /// Add `id` under `key`. Returns false when the pair was already present.
    pub fn insert(&mut self, key: K, id: UserId) -> bool {
        let before = self.entries;
        let root = self.root;
        let new_root = self.insert_at(root, key, id);
        self.root = Some(new_root);
        self.entries > before
    }

    /// Ids stored under `key`; empty when absent.
    pub fn get(&self, key: &K) -> &[UserId] {
        let mut cursor = self.root;
        while let Some(idx) = cursor {
            let node = self.node(idx);
            cursor = match key.cmp(&node.key) {
                Ordering::Less => node.left,
                Ordering::Greater => node.right,
                Ordering::Equal => return &node.ids,
            };
        }
        &[]
    }

    /// Entries with `low <= key <= high` (per bound kind), ascending by key.
    ///
    /// Positioning on the first entry costs O(log n); every further step is
    /// amortised O(1), so callers can stop early.
    pub fn range<'a>(&'a self, low: Bound<&'a K>, high: Bound<&'a K>) -> Range<'a, K> {
        let mut range = Range {
            tree: self,
            stack: Vec::with_capacity(self.height()),
            high,
        };
        let mut cursor = self.root;
        while let Some(idx) = cursor {
            let node = self.node(idx);
            let above_low = match low {
                Bound::Unbounded => true,
                Bound::Included(l) => node.key >= *l,
                Bound::Excluded(l) => node.key > *l,
            };
            if above_low {
                range.stack.push(idx);
                cursor = node.left;
            } else {
                cursor = node.right;
            }
        }
        range
    }

    /// All entries in key order.
    pub fn iter(&self) -> Range<'_, K> {
        self.range(Bound::Unbounded, Bound::Unbounded)
    }

    /// Checks the AVL invariant and the stored heights of every node.
    pub fn is_balanced(&self) -> bool {
        self.check_subtree(self.root).is_some()
    }

    fn check_subtree(&self, at: Option<NodeIdx>) -> Option<u8> {
        let Some(idx) = at else { return Some(0) };
        let node = self.node(idx);
        let lh = self.check_subtree(node.left)?;
        let rh = self.check_subtree(node.right)?;
        let h = 1 + lh.max(rh);
        (lh.abs_diff(rh) <= 1 && node.height == h).then_some(h)
    }

    fn node(&self, idx: NodeIdx) -> &Node<K> {
        &self.nodes[idx as usize]
    }

    fn node_mut(&mut self, idx: NodeIdx) -> &mut Node<K> {
        &mut self.nodes[idx as usize]
    }

    fn alloc(&mut self, key: K, id: UserId) -> NodeIdx {
        let idx = self.nodes.len() as NodeIdx;
        self.nodes.push(Node {
            key,
            ids: vec![id],
            left: None,
            right: None,
            height: 1,
        });
        self.entries += 1;
        idx
    }

    fn insert_at(&mut self, at: Option<NodeIdx>, key: K, id: UserId) -> NodeIdx {
        let Some(idx) = at else {
            return self.alloc(key, id);
        };
        match key.cmp(&self.node(idx).key) {
            Ordering::Less => {
                let left = self.node(idx).left;
                let child = self.insert_at(left, key, id);
                self.node_mut(idx).left = Some(child);
            }
            Ordering::Greater => {
                let right = self.node(idx).right;
                let child = self.insert_at(right, key, id);
                self.node_mut(idx).right = Some(child);
            }
            Ordering::Equal => {
                let ids = &mut self.node_mut(idx).ids;
                // Ids usually arrive ascending, so this is an append.
                let added = match ids.binary_search(&id) {
                    Ok(_) => false,
                    Err(pos) => {
                        ids.insert(pos, id);
                        true
                    }
                };
                if added {
                    self.entries += 1;
                }
                return idx;
            }
        }
        self.rebalance(idx)
    }

    fn height_of(&self, at: Option<NodeIdx>) -> u8 {
        at.map_or(0, |idx| self.node(idx).height)
    }

    fn update_height(&mut self, idx: NodeIdx) {
        let node = self.node(idx);
        let h = 1 + self.height_of(node.left).max(self.height_of(node.right));
        self.node_mut(idx).height = h;
    }

    fn balance_factor(&self, idx: NodeIdx) -> i16 {
        let node = self.node(idx);
        i16::from(self.height_of(node.left)) - i16::from(self.height_of(node.right))
    }

    fn rebalance(&mut self, idx: NodeIdx) -> NodeIdx {
        self.update_height(idx);
        let bf = self.balance_factor(idx);
        if bf > 1 {
            if let Some(left) = self.node(idx).left {
                if self.balance_factor(left) < 0 {
                    let new_left = self.rotate_left(left);
                    self.node_mut(idx).left = Some(new_left);
                }
            }
            return self.rotate_right(idx);
        }
        if bf < -1 {
            if let Some(right) = self.node(idx).right {
                if self.balance_factor(right) > 0 {
                    let new_right = self.rotate_right(right);
                    self.node_mut(idx).right = Some(new_right);
                }
            }
            return self.rotate_left(idx);
        }
        idx
    }

    fn rotate_right(&mut self, z: NodeIdx) -> NodeIdx {
        let Some(y) = self.node(z).left else { return z };
        let moved = self.node(y).right;
        self.node_mut(z).left = moved;
        self.node_mut(y).right = Some(z);
        self.update_height(z);
        self.update_height(y);
        y
    }

    fn rotate_left(&mut self, z: NodeIdx) -> NodeIdx {
        let Some(y) = self.node(z).right else { return z };
        let moved = self.node(y).left;
        self.node_mut(z).right = moved;
        self.node_mut(y).left = Some(z);
        self.update_height(z);
        self.update_height(y);
        y
    }
}

/// Lazy in-order walk over a key range. See [`AvlTree::range`].
pub struct Range<'a, K> {
    tree: &'a AvlTree<K>,
    stack: Vec<NodeIdx>,
    high: Bound<&'a K>,
}

impl<'a, K: Ord> Iterator for Range<'a, K> {
    type Item = (&'a K, &'a [UserId]);

    fn next(&mut self) -> Option<Self::Item> {
        let idx = self.stack.pop()?;
        let node = self.tree.node(idx);
        let within_high = match self.high {
            Bound::Unbounded => true,
            Bound::Included(h) => node.key <= *h,
            Bound::Excluded(h) => node.key < *h,
        };
        if !within_high {
            self.stack.clear();
            return None;
        }
        let mut cursor = node.right;
        while let Some(child) = cursor {
            self.stack.push(child);
            cursor = self.tree.node(child).left;
        }
        Some((&node.key, node.ids.as_slice()))
    }
}
