//! # bplus-set
//!
//! A set-like container backed by a B+ tree keyed on 64-bit value hashes.
//!
//! Values are opaque to the tree: the host supplies a stable signed 64-bit
//! hash and an equality predicate through [`Semantics`]. Values whose hashes
//! collide share one leaf entry (a bucket) and are told apart by equality.
//! Iteration is ascending by hash, and two trees compare equal when they hold
//! the same values, whatever their branching factor or shape.
//!
//! ## Example
//!
//! ```rust
//! use bplus_set::BPlusSet;
//!
//! let mut set: BPlusSet<&str> = BPlusSet::with_b(4)?;
//! assert!(set.add("hello")?);
//! assert!(set.add("world")?);
//! assert!(!set.add("hello")?);
//!
//! assert!(set.contains(&"hello"));
//! assert!(!set.contains(&"missing"));
//! assert_eq!(set.len(), 2);
//! # Ok::<(), bplus_set::Error>(())
//! ```
//!
//! The engine itself takes precomputed hashes:
//!
//! ```rust
//! use bplus_set::BPlusTree;
//!
//! let mut tree: BPlusTree<u64> = BPlusTree::new(3)?;
//! for v in 0..10u64 {
//!     tree.insert(v as i64, v)?;
//! }
//! assert!(tree.contains(4, &4));
//! assert_eq!(tree.iter().copied().collect::<Vec<_>>(), (0..10u64).collect::<Vec<_>>());
//! # Ok::<(), bplus_set::Error>(())
//! ```

#![forbid(unsafe_code)]

mod bucket;
mod bulk;
mod error;
mod node;
mod options;
mod semantics;
mod set;
mod stats;

pub use error::{Error, Result};
pub use options::{BPlusOptions, BulkLoad, DEFAULT_B, MAX_B, MIN_B};
pub use semantics::{FnSemantics, Semantics, StdSemantics};
pub use set::BPlusSet;
pub use stats::TreeStats;

use std::collections::VecDeque;
use std::hash::Hash;

use bucket::Bucket;
use node::{Arena, Internal, Leaf, Node, NodeId};

// =============================================================================
// BPlusTree
// =============================================================================

/// B+ tree of values keyed by their 64-bit hash.
///
/// The root is always an internal node. A fresh tree is a root with a single
/// empty leaf; the tree grows only through splits and never shrinks.
#[derive(Clone)]
pub struct BPlusTree<T, S = StdSemantics> {
    nodes: Arena<T>,
    root: NodeId,
    /// Distinct values stored.
    size: usize,
    b: usize,
    max_bucket_len: usize,
    semantics: S,
    stats: TreeStats,
}

impl<T: Hash + Eq> BPlusTree<T> {
    /// Empty tree with branching factor `b`, hashing with [`StdSemantics`].
    pub fn new(b: usize) -> Result<Self> {
        Self::with_semantics(b, StdSemantics::default())
    }
}

impl<T, S> BPlusTree<T, S> {
    pub fn with_semantics(b: usize, semantics: S) -> Result<Self> {
        Self::with_options(BPlusOptions::default().with_b(b), semantics)
    }

    pub fn with_options(options: BPlusOptions, semantics: S) -> Result<Self> {
        options.validate()?;
        Ok(Self::empty(&options, semantics))
    }

    /// Builds the root and its first leaf. `options` must be validated.
    pub(crate) fn empty(options: &BPlusOptions, semantics: S) -> Self {
        let mut nodes = Arena::new();
        let root = nodes.alloc(Node::Internal(Internal::new(options.b, NodeId::NULL)));
        let leaf = nodes.alloc(Node::Leaf(Leaf::new(options.b, root)));
        nodes.internal_mut(root).children.push(leaf);

        Self {
            nodes,
            root,
            size: 0,
            b: options.b,
            max_bucket_len: options.max_bucket_len,
            semantics,
            stats: TreeStats::default(),
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.size
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Branching factor fixed at construction.
    #[inline]
    pub fn b(&self) -> usize {
        self.b
    }

    #[inline]
    pub fn semantics(&self) -> &S {
        &self.semantics
    }

    pub fn stats(&self) -> TreeStats {
        self.stats
    }

    /// Number of levels, root included. Every leaf sits at this depth.
    pub fn height(&self) -> usize {
        let mut height = 1;
        let mut current = self.root;
        while let Node::Internal(node) = self.nodes.get(current) {
            current = node.children.as_slice()[0];
            height += 1;
        }
        height
    }

    /// Values ascending by hash; values sharing a hash come in insertion order.
    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            entries: self.entries(),
            current: <&[T]>::default().iter(),
            remaining: self.size,
        }
    }

    /// Leaf entries ascending by hash, as `(hash, bucket)` pairs.
    pub fn entries(&self) -> Entries<'_, T> {
        Entries {
            nodes: &self.nodes,
            leaf: self.first_leaf(),
            idx: 0,
        }
    }

    /// Breadth-first dump of every node's keys: the root first, then each
    /// level left to right. Meant for debugging only.
    pub fn level_indices(&self) -> Vec<Vec<i64>> {
        let mut out = Vec::with_capacity(self.nodes.len());
        let mut queue = VecDeque::from([self.root]);
        while let Some(id) = queue.pop_front() {
            let node = self.nodes.get(id);
            out.push(node.keys().to_vec());
            if let Node::Internal(internal) = node {
                queue.extend(internal.children.iter().copied());
            }
        }
        out
    }

    fn find_leaf(&self, hash: i64) -> NodeId {
        let mut current = self.root;
        while let Node::Internal(node) = self.nodes.get(current) {
            current = node.children.as_slice()[node.route(hash)];
        }
        current
    }

    fn first_leaf(&self) -> NodeId {
        let mut current = self.root;
        while let Node::Internal(node) = self.nodes.get(current) {
            current = node.children.as_slice()[0];
        }
        current
    }
}

impl<T, S: Semantics<T>> BPlusTree<T, S> {
    /// Inserts `value` under `hash`.
    ///
    /// Returns `Ok(false)` without touching the tree if an equal value is
    /// already stored. Fails only when `hash` already carries the configured
    /// maximum of distinct values; nothing is modified in that case.
    pub fn insert(&mut self, hash: i64, value: T) -> Result<bool> {
        let leaf_id = self.find_leaf(hash);
        let leaf = self.nodes.leaf_mut(leaf_id);

        match leaf.search(hash) {
            Ok(idx) => {
                let Some(bucket) = leaf.buckets.get_mut(idx) else {
                    unreachable!("leaf keys and buckets out of step");
                };
                if bucket.contains(&value, &self.semantics) {
                    return Ok(false);
                }
                if bucket.len() >= self.max_bucket_len {
                    return Err(Error::KeySpaceExhausted {
                        hash,
                        len: bucket.len(),
                    });
                }
                bucket.push(value);
                tracing::debug!(
                    target: "bplus_set::insert",
                    hash,
                    bucket_len = bucket.len(),
                    "hash collision resolved by equality"
                );
                self.size += 1;
                self.stats.collisions += 1;
                Ok(true)
            }
            Err(idx) => {
                leaf.insert_entry(idx, hash, value);
                let overflow = leaf.len() > self.b - 1;
                self.size += 1;
                if overflow {
                    self.split_leaf(leaf_id);
                }
                Ok(true)
            }
        }
    }

    /// True iff a value equal to `value` is stored under `hash`.
    pub fn contains(&self, hash: i64, value: &T) -> bool {
        let leaf = self.nodes.leaf(self.find_leaf(hash));
        match leaf.search(hash) {
            Ok(idx) => leaf.buckets.as_slice()[idx].contains(value, &self.semantics),
            Err(_) => false,
        }
    }

    /// Same set of values, regardless of branching factor or shape.
    ///
    /// Runs a single merge-walk over both leaf chains, comparing buckets with
    /// `self`'s equality predicate.
    pub fn equals<S2>(&self, other: &BPlusTree<T, S2>) -> bool {
        if self.size != other.size {
            return false;
        }

        let mut ours = self.entries();
        let mut theirs = other.entries();
        loop {
            match (ours.next(), theirs.next()) {
                (None, None) => return true,
                (Some((ka, a)), Some((kb, b))) => {
                    if ka != kb || !Bucket::same_members(a, b, &self.semantics) {
                        return false;
                    }
                }
                _ => return false,
            }
        }
    }
}

// =============================================================================
// Split cascade
// =============================================================================

impl<T, S> BPlusTree<T, S> {
    /// Moves the upper half of an overflowing leaf into a new sibling linked
    /// right after it, then promotes the sibling's first key.
    fn split_leaf(&mut self, leaf_id: NodeId) {
        let leaf = self.nodes.leaf_mut(leaf_id);
        let at = leaf.len().div_ceil(2);
        let keys = leaf.keys.split_off(at);
        let buckets = leaf.buckets.split_off(at);
        let separator = keys.as_slice()[0];
        let sibling = Leaf {
            keys,
            buckets,
            parent: leaf.parent,
            next: leaf.next,
        };

        let sibling_id = self.nodes.alloc(Node::Leaf(sibling));
        self.nodes.leaf_mut(leaf_id).next = sibling_id;

        self.stats.leaf_splits += 1;
        tracing::trace!(
            target: "bplus_set::split",
            left = leaf_id.index(),
            right = sibling_id.index(),
            separator,
            "split leaf"
        );

        self.promote(leaf_id, separator, sibling_id);
    }

    /// Inserts `separator` and `right` into the parent of `left`, splitting
    /// ancestors upward until one absorbs the key or a new root is made.
    fn promote(&mut self, mut left: NodeId, mut separator: i64, mut right: NodeId) {
        loop {
            let parent_id = self.nodes.get(left).parent();
            if parent_id.is_null() {
                self.grow_root(left, separator, right);
                return;
            }

            let parent = self.nodes.internal_mut(parent_id);
            let idx = parent.route(separator);
            debug_assert_eq!(parent.children.get(idx), Some(&left));
            parent.keys.insert(idx, separator);
            parent.children.insert(idx + 1, right);
            let overflow = parent.children.len() > self.b;
            self.nodes.get_mut(right).set_parent(parent_id);

            if !overflow {
                return;
            }

            let (promoted, sibling_id) = self.split_internal(parent_id);
            left = parent_id;
            separator = promoted;
            right = sibling_id;
        }
    }

    /// Splits an internal node holding `b + 1` children. The lower
    /// `ceil((b + 1) / 2)` children stay; the key between the halves is
    /// removed and returned for promotion.
    fn split_internal(&mut self, node_id: NodeId) -> (i64, NodeId) {
        let node = self.nodes.internal_mut(node_id);
        let lower = node.children.len().div_ceil(2);
        let promoted = node.keys.as_slice()[lower - 1];
        let children = node.children.split_off(lower);
        let keys = node.keys.split_off(lower);
        node.keys.pop();
        let parent = node.parent;

        let moved = children.as_slice().to_vec();
        let sibling_id = self.nodes.alloc(Node::Internal(Internal {
            keys,
            children,
            parent,
        }));
        for child in moved {
            self.nodes.get_mut(child).set_parent(sibling_id);
        }

        self.stats.internal_splits += 1;
        tracing::trace!(
            target: "bplus_set::split",
            left = node_id.index(),
            right = sibling_id.index(),
            promoted,
            "split internal node"
        );

        (promoted, sibling_id)
    }

    fn grow_root(&mut self, left: NodeId, separator: i64, right: NodeId) {
        let mut root = Internal::new(self.b, NodeId::NULL);
        root.keys.push(separator);
        root.children.push(left);
        root.children.push(right);

        let root_id = self.nodes.alloc(Node::Internal(root));
        self.nodes.get_mut(left).set_parent(root_id);
        self.nodes.get_mut(right).set_parent(root_id);
        self.root = root_id;

        self.stats.root_splits += 1;
        tracing::trace!(
            target: "bplus_set::split",
            root = root_id.index(),
            height = self.height(),
            "grew new root"
        );
    }
}

impl<T, S: Semantics<T>, S2> PartialEq<BPlusTree<T, S2>> for BPlusTree<T, S> {
    fn eq(&self, other: &BPlusTree<T, S2>) -> bool {
        self.equals(other)
    }
}

impl<T: std::fmt::Debug, S> std::fmt::Debug for BPlusTree<T, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl<'a, T, S> IntoIterator for &'a BPlusTree<T, S> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

// =============================================================================
// Iteration
// =============================================================================

/// Walks the leaf chain entry by entry.
pub struct Entries<'a, T> {
    nodes: &'a Arena<T>,
    leaf: NodeId,
    idx: usize,
}

impl<'a, T> Iterator for Entries<'a, T> {
    type Item = (i64, &'a [T]);

    fn next(&mut self) -> Option<Self::Item> {
        let nodes = self.nodes;
        while !self.leaf.is_null() {
            let leaf = nodes.leaf(self.leaf);
            if let (Some(&key), Some(bucket)) =
                (leaf.keys.get(self.idx), leaf.buckets.get(self.idx))
            {
                self.idx += 1;
                return Some((key, bucket.as_slice()));
            }
            self.leaf = leaf.next;
            self.idx = 0;
        }
        None
    }
}

pub struct Iter<'a, T> {
    entries: Entries<'a, T>,
    current: std::slice::Iter<'a, T>,
    remaining: usize,
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(value) = self.current.next() {
                self.remaining -= 1;
                return Some(value);
            }
            let (_, bucket) = self.entries.next()?;
            self.current = bucket.iter();
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<T> ExactSizeIterator for Iter<'_, T> {}


#[cfg(test)]
mod proptests;
