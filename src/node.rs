//! Node arena and per-node slot storage.
//!
//! Every node lives in one `Vec<Node<T>>` owned by the tree and is addressed
//! by a 32-bit [`NodeId`]. Parent and leaf-successor links are plain ids, so
//! they never own anything and the whole graph is dropped with the arena.

use crate::bucket::Bucket;

// =============================================================================
// Node ids
// =============================================================================

/// A 32-bit reference to a node in the arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(transparent)]
pub(crate) struct NodeId(u32);

impl NodeId {
    pub(crate) const NULL: NodeId = NodeId(u32::MAX);

    #[inline]
    pub(crate) fn is_null(self) -> bool {
        self.0 == u32::MAX
    }

    #[inline]
    pub(crate) fn new(idx: usize) -> Self {
        debug_assert!(idx < u32::MAX as usize);
        NodeId(idx as u32)
    }

    #[inline]
    pub(crate) fn index(self) -> usize {
        debug_assert!(!self.is_null());
        self.0 as usize
    }
}

// =============================================================================
// Slot storage
// =============================================================================

/// Ordered, bounded slot storage for one node.
///
/// The backing `Vec` is allocated once with room for `b + 1` items: a node may
/// overflow by exactly one slot before it is split, and never grows further.
#[derive(Clone, Debug)]
pub(crate) struct Slots<T> {
    items: Vec<T>,
}

impl<T> Slots<T> {
    pub(crate) fn with_capacity(cap: usize) -> Self {
        Self {
            items: Vec::with_capacity(cap),
        }
    }

    pub(crate) fn from_vec(items: Vec<T>, cap: usize) -> Self {
        let mut slots = Self::with_capacity(cap.max(items.len()));
        slots.items.extend(items);
        slots
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.items.len()
    }

    #[inline]
    pub(crate) fn as_slice(&self) -> &[T] {
        &self.items
    }

    #[inline]
    pub(crate) fn get(&self, idx: usize) -> Option<&T> {
        self.items.get(idx)
    }

    #[inline]
    pub(crate) fn get_mut(&mut self, idx: usize) -> Option<&mut T> {
        self.items.get_mut(idx)
    }

    #[inline]
    pub(crate) fn push(&mut self, item: T) {
        self.items.push(item);
    }

    /// Inserts at `idx`, shifting later slots right.
    #[inline]
    pub(crate) fn insert(&mut self, idx: usize, item: T) {
        self.items.insert(idx, item);
    }

    #[inline]
    pub(crate) fn pop(&mut self) -> Option<T> {
        self.items.pop()
    }

    /// Moves slots `at..` into a new `Slots` with the same capacity.
    pub(crate) fn split_off(&mut self, at: usize) -> Self {
        let cap = self.items.capacity();
        let tail = self.items.split_off(at);
        Self::from_vec(tail, cap)
    }

    #[inline]
    pub(crate) fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }
}

impl<T: Ord> Slots<T> {
    /// Leftmost index at which `x` can be inserted keeping the order.
    #[inline]
    pub(crate) fn bisect_left(&self, x: &T) -> usize {
        self.items.partition_point(|k| k < x)
    }

    /// Rightmost index at which `x` can be inserted keeping the order.
    #[inline]
    pub(crate) fn bisect_right(&self, x: &T) -> usize {
        self.items.partition_point(|k| k <= x)
    }
}

// =============================================================================
// Nodes
// =============================================================================

/// Routing node: `keys.len() == children.len() - 1`. Child `i` holds keys in
/// `[keys[i - 1], keys[i])`.
#[derive(Clone, Debug)]
pub(crate) struct Internal {
    pub(crate) keys: Slots<i64>,
    pub(crate) children: Slots<NodeId>,
    pub(crate) parent: NodeId,
}

/// Data node: `keys[i]` is the hash shared by every value in `buckets[i]`.
#[derive(Clone, Debug)]
pub(crate) struct Leaf<T> {
    pub(crate) keys: Slots<i64>,
    pub(crate) buckets: Slots<Bucket<T>>,
    pub(crate) parent: NodeId,
    pub(crate) next: NodeId,
}

#[derive(Clone, Debug)]
pub(crate) enum Node<T> {
    Internal(Internal),
    Leaf(Leaf<T>),
}

impl Internal {
    pub(crate) fn new(b: usize, parent: NodeId) -> Self {
        Self {
            keys: Slots::with_capacity(b),
            children: Slots::with_capacity(b + 1),
            parent,
        }
    }

    /// Index of the child whose range contains `hash`. Keys equal to a
    /// separator route right.
    #[inline]
    pub(crate) fn route(&self, hash: i64) -> usize {
        self.keys.bisect_right(&hash)
    }
}

impl<T> Leaf<T> {
    pub(crate) fn new(b: usize, parent: NodeId) -> Self {
        Self {
            keys: Slots::with_capacity(b),
            buckets: Slots::with_capacity(b),
            parent,
            next: NodeId::NULL,
        }
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.keys.len()
    }

    /// Position of the entry keyed by `hash`, or where it would be inserted.
    #[inline]
    pub(crate) fn search(&self, hash: i64) -> Result<usize, usize> {
        let idx = self.keys.bisect_left(&hash);
        match self.keys.get(idx) {
            Some(&k) if k == hash => Ok(idx),
            _ => Err(idx),
        }
    }

    /// Inserts a fresh single-value entry at `idx` (from [`Leaf::search`]).
    pub(crate) fn insert_entry(&mut self, idx: usize, hash: i64, value: T) {
        debug_assert!(idx == 0 || self.keys.as_slice()[idx - 1] < hash);
        debug_assert!(self.keys.get(idx).map_or(true, |&k| k > hash));
        self.keys.insert(idx, hash);
        self.buckets.insert(idx, Bucket::new(value));
    }
}

impl<T> Node<T> {
    #[inline]
    pub(crate) fn parent(&self) -> NodeId {
        match self {
            Node::Internal(node) => node.parent,
            Node::Leaf(leaf) => leaf.parent,
        }
    }

    #[inline]
    pub(crate) fn set_parent(&mut self, parent: NodeId) {
        match self {
            Node::Internal(node) => node.parent = parent,
            Node::Leaf(leaf) => leaf.parent = parent,
        }
    }

    /// Separator keys for internal nodes, entry keys for leaves.
    #[inline]
    pub(crate) fn keys(&self) -> &[i64] {
        match self {
            Node::Internal(node) => node.keys.as_slice(),
            Node::Leaf(leaf) => leaf.keys.as_slice(),
        }
    }
}

// =============================================================================
// Arena
// =============================================================================

/// Owner of every node of one tree. Nodes are never freed individually.
#[derive(Clone, Debug)]
pub(crate) struct Arena<T> {
    nodes: Vec<Node<T>>,
}

impl<T> Arena<T> {
    pub(crate) fn new() -> Self {
        Self { nodes: Vec::new() }
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.nodes.len()
    }

    pub(crate) fn clear(&mut self) {
        self.nodes.clear();
    }

    pub(crate) fn alloc(&mut self, node: Node<T>) -> NodeId {
        let id = NodeId::new(self.nodes.len());
        self.nodes.push(node);
        id
    }

    #[inline]
    pub(crate) fn get(&self, id: NodeId) -> &Node<T> {
        &self.nodes[id.index()]
    }

    #[inline]
    pub(crate) fn get_mut(&mut self, id: NodeId) -> &mut Node<T> {
        &mut self.nodes[id.index()]
    }

    #[inline]
    pub(crate) fn leaf(&self, id: NodeId) -> &Leaf<T> {
        match self.get(id) {
            Node::Leaf(leaf) => leaf,
            Node::Internal(_) => unreachable!("node {id:?} is not a leaf"),
        }
    }

    #[inline]
    pub(crate) fn leaf_mut(&mut self, id: NodeId) -> &mut Leaf<T> {
        match self.get_mut(id) {
            Node::Leaf(leaf) => leaf,
            Node::Internal(_) => unreachable!("node {id:?} is not a leaf"),
        }
    }

    #[inline]
    pub(crate) fn internal_mut(&mut self, id: NodeId) -> &mut Internal {
        match self.get_mut(id) {
            Node::Internal(node) => node,
            Node::Leaf(_) => unreachable!("node {id:?} is not an internal node"),
        }
    }
}
