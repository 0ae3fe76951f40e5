//! Building a tree from an initializer sequence.
//!
//! [`BulkLoad::Sequential`] replays `insert` for every value. [`BulkLoad::Sorted`]
//! sorts by hash, folds equal-hash values into buckets and packs the leaf
//! level and every internal level left to right. Both produce trees that are
//! indistinguishable through the public API.

use crate::bucket::Bucket;
use crate::error::{Error, Result};
use crate::node::{Internal, Leaf, Node, NodeId, Slots};
use crate::options::{BPlusOptions, BulkLoad};
use crate::semantics::Semantics;
use crate::BPlusTree;

impl<T, S: Semantics<T>> BPlusTree<T, S> {
    /// Builds a tree holding every distinct value of `values`.
    ///
    /// Duplicates are dropped; among values sharing a hash, the first
    /// occurrence of each distinct value is kept in first-seen order. Fails if
    /// `options` are invalid or a hash would exceed `max_bucket_len`.
    pub fn from_values<I>(options: BPlusOptions, semantics: S, values: I) -> Result<Self>
    where
        I: IntoIterator<Item = T>,
    {
        options.validate()?;
        let mut tree = Self::empty(&options, semantics);

        match options.bulk_load {
            BulkLoad::Sequential => {
                for value in values {
                    let hash = tree.semantics.hash(&value);
                    tree.insert(hash, value)?;
                }
            }
            BulkLoad::Sorted => {
                let entries = tree.group_by_hash(values)?;
                if !entries.is_empty() {
                    tree.build_sorted(entries);
                }
            }
        }

        tracing::debug!(
            target: "bplus_set::bulk",
            strategy = ?options.bulk_load,
            b = tree.b,
            len = tree.size,
            height = tree.height(),
            "bulk load complete"
        );
        Ok(tree)
    }

    /// Hashes, stable-sorts and deduplicates `values` into ascending entries.
    fn group_by_hash<I>(&mut self, values: I) -> Result<Vec<(i64, Bucket<T>)>>
    where
        I: IntoIterator<Item = T>,
    {
        let mut hashed: Vec<(i64, T)> = values
            .into_iter()
            .map(|v| (self.semantics.hash(&v), v))
            .collect();
        hashed.sort_by_key(|&(hash, _)| hash);

        let mut entries: Vec<(i64, Bucket<T>)> = Vec::new();
        for (hash, value) in hashed {
            if let Some((key, bucket)) = entries.last_mut() {
                if *key == hash {
                    if bucket.contains(&value, &self.semantics) {
                        continue;
                    }
                    if bucket.len() >= self.max_bucket_len {
                        return Err(Error::KeySpaceExhausted {
                            hash,
                            len: bucket.len(),
                        });
                    }
                    bucket.push(value);
                    self.size += 1;
                    self.stats.collisions += 1;
                    continue;
                }
            }
            entries.push((hash, Bucket::new(value)));
            self.size += 1;
        }
        Ok(entries)
    }
}

impl<T, S> BPlusTree<T, S> {
    /// Replaces the arena with a packed tree over `entries`, which must be
    /// non-empty, ascending and unique by hash.
    fn build_sorted(&mut self, entries: Vec<(i64, Bucket<T>)>) {
        let b = self.b;
        self.nodes.clear();

        // Each level is a list of (node, smallest hash below it).
        let mut level: Vec<(NodeId, i64)> = Vec::new();
        let mut entries = entries.into_iter();
        let mut prev = NodeId::NULL;
        for size in chunk_sizes(entries.len(), b - 1, (b / 2).max(1)) {
            let mut leaf = Leaf::new(b, NodeId::NULL);
            for (hash, bucket) in entries.by_ref().take(size) {
                leaf.keys.push(hash);
                leaf.buckets.push(bucket);
            }
            let min = leaf.keys.as_slice()[0];
            let id = self.nodes.alloc(Node::Leaf(leaf));
            if !prev.is_null() {
                self.nodes.leaf_mut(prev).next = id;
            }
            prev = id;
            level.push((id, min));
        }

        // The root is internal even when a single leaf holds everything.
        loop {
            level = self.build_level(&level);
            if level.len() == 1 {
                break;
            }
        }
        self.root = level[0].0;
    }

    fn build_level(&mut self, children: &[(NodeId, i64)]) -> Vec<(NodeId, i64)> {
        let b = self.b;
        let mut parents = Vec::new();
        let mut rest = children;
        for size in chunk_sizes(children.len(), b, b.div_ceil(2)) {
            let (group, tail) = rest.split_at(size);
            rest = tail;

            let keys = group[1..].iter().map(|&(_, min)| min).collect();
            let ids = group.iter().map(|&(id, _)| id).collect();
            let id = self.nodes.alloc(Node::Internal(Internal {
                keys: Slots::from_vec(keys, b),
                children: Slots::from_vec(ids, b + 1),
                parent: NodeId::NULL,
            }));
            for &(child, _) in group {
                self.nodes.get_mut(child).set_parent(id);
            }
            parents.push((id, group[0].1));
        }
        parents
    }
}

/// Splits `n` items into the fewest chunks of at most `max`, all full except
/// the last two, which are evened out when the last would hold fewer than
/// `min`. A lone chunk may hold fewer than `min`.
fn chunk_sizes(n: usize, max: usize, min: usize) -> Vec<usize> {
    if n == 0 {
        return Vec::new();
    }
    let count = n.div_ceil(max);
    let mut sizes = vec![max; count];
    sizes[count - 1] = n - max * (count - 1);
    if count > 1 && sizes[count - 1] < min {
        let total = max + sizes[count - 1];
        sizes[count - 2] = total.div_ceil(2);
        sizes[count - 1] = total / 2;
    }
    sizes
}
