use std::fmt;
use std::hash::Hash;

use crate::error::Result;
use crate::options::{BPlusOptions, BulkLoad};
use crate::semantics::{Semantics, StdSemantics};
use crate::{BPlusTree, Iter};

/// Set of values stored in a [`BPlusTree`], hashing each value itself.
///
/// This is the convenience surface over the engine: callers hand in values
/// and the set computes their hash through its [`Semantics`].
#[derive(Clone)]
pub struct BPlusSet<T, S = StdSemantics> {
    tree: BPlusTree<T, S>,
}

impl<T: Hash + Eq> BPlusSet<T> {
    /// Empty set with the default branching factor.
    pub fn new() -> Self {
        Self {
            tree: BPlusTree::empty(&BPlusOptions::default(), StdSemantics::default()),
        }
    }

    pub fn with_b(b: usize) -> Result<Self> {
        Self::with_semantics(b, StdSemantics::default())
    }

    /// Set holding every distinct value of `values`, built with the sorted
    /// bulk loader.
    pub fn from_values<I: IntoIterator<Item = T>>(values: I, b: usize) -> Result<Self> {
        let options = BPlusOptions::default()
            .with_b(b)
            .with_bulk_load(BulkLoad::Sorted);
        Self::from_values_with(options, StdSemantics::default(), values)
    }
}

impl<T: Hash + Eq> Default for BPlusSet<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, S: Semantics<T>> BPlusSet<T, S> {
    pub fn with_semantics(b: usize, semantics: S) -> Result<Self> {
        Ok(Self {
            tree: BPlusTree::with_semantics(b, semantics)?,
        })
    }

    pub fn with_options(options: BPlusOptions, semantics: S) -> Result<Self> {
        Ok(Self {
            tree: BPlusTree::with_options(options, semantics)?,
        })
    }

    pub fn from_values_with<I: IntoIterator<Item = T>>(
        options: BPlusOptions,
        semantics: S,
        values: I,
    ) -> Result<Self> {
        Ok(Self {
            tree: BPlusTree::from_values(options, semantics, values)?,
        })
    }

    /// Adds `value`, returning whether it was not already present.
    pub fn add(&mut self, value: T) -> Result<bool> {
        let hash = self.tree.semantics().hash(&value);
        self.tree.insert(hash, value)
    }

    pub fn contains(&self, value: &T) -> bool {
        let hash = self.tree.semantics().hash(value);
        self.tree.contains(hash, value)
    }
}

impl<T, S> BPlusSet<T, S> {
    #[inline]
    pub fn len(&self) -> usize {
        self.tree.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }

    #[inline]
    pub fn b(&self) -> usize {
        self.tree.b()
    }

    pub fn iter(&self) -> Iter<'_, T> {
        self.tree.iter()
    }

    pub fn level_indices(&self) -> Vec<Vec<i64>> {
        self.tree.level_indices()
    }

    /// The underlying tree.
    pub fn as_tree(&self) -> &BPlusTree<T, S> {
        &self.tree
    }

    pub fn into_tree(self) -> BPlusTree<T, S> {
        self.tree
    }
}

impl<T, S: Semantics<T>, S2> PartialEq<BPlusSet<T, S2>> for BPlusSet<T, S> {
    fn eq(&self, other: &BPlusSet<T, S2>) -> bool {
        self.tree.equals(&other.tree)
    }
}

impl<T: fmt::Debug, S> fmt::Debug for BPlusSet<T, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.tree, f)
    }
}

impl<'a, T, S> IntoIterator for &'a BPlusSet<T, S> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
