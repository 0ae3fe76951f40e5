//! Collision buckets: every distinct value sharing one hash, in insertion order.

use smallvec::SmallVec;

use crate::semantics::Semantics;

#[derive(Clone, Debug)]
pub(crate) struct Bucket<T> {
    values: SmallVec<[T; 1]>,
}

impl<T> Bucket<T> {
    #[inline]
    pub(crate) fn new(value: T) -> Self {
        let mut values = SmallVec::new();
        values.push(value);
        Self { values }
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.values.len()
    }

    #[inline]
    pub(crate) fn as_slice(&self) -> &[T] {
        &self.values
    }

    pub(crate) fn contains<S: Semantics<T>>(&self, value: &T, semantics: &S) -> bool {
        self.values.iter().any(|v| semantics.equals(value, v))
    }

    /// Appends `value`; the caller has already checked it is not present.
    #[inline]
    pub(crate) fn push(&mut self, value: T) {
        self.values.push(value);
    }

    /// Same members, ignoring order. Both sides hold distinct values, so equal
    /// length plus one-way inclusion is enough.
    pub(crate) fn same_members<S: Semantics<T>>(a: &[T], b: &[T], semantics: &S) -> bool {
        a.len() == b.len()
            && a
                .iter()
                .all(|x| b.iter().any(|y| semantics.equals(x, y)))
    }
}
