//! Host-supplied hashing and equality.
//!
//! The tree never looks inside a stored value. Everything it needs is a stable
//! signed 64-bit hash and a pairwise equality predicate, both provided through
//! [`Semantics`] when the tree is constructed.

use std::hash::{BuildHasher, BuildHasherDefault, Hash};
use std::marker::PhantomData;

use rustc_hash::FxHasher;

/// Hash and equality capabilities for values of type `T`.
///
/// `hash` must stay stable for as long as a value is stored, and values that
/// compare equal must hash identically.
pub trait Semantics<T: ?Sized> {
    fn hash(&self, value: &T) -> i64;
    fn equals(&self, a: &T, b: &T) -> bool;
}

/// [`Semantics`] derived from `Hash + Eq`.
///
/// The hasher builder must be deterministic: two trees are only comparable if
/// they hash the same value to the same key. The default builder
/// (`FxHasher` with a fixed zero seed) satisfies that; `RandomState` does not.
#[derive(Clone, Copy, Debug, Default)]
pub struct StdSemantics<S = BuildHasherDefault<FxHasher>> {
    build: S,
}

impl<S> StdSemantics<S> {
    pub fn with_hasher(build: S) -> Self {
        Self { build }
    }
}

impl<T, S> Semantics<T> for StdSemantics<S>
where
    T: Hash + Eq + ?Sized,
    S: BuildHasher,
{
    #[inline]
    fn hash(&self, value: &T) -> i64 {
        self.build.hash_one(value) as i64
    }

    #[inline]
    fn equals(&self, a: &T, b: &T) -> bool {
        a == b
    }
}

/// [`Semantics`] built from a hash closure and an equality closure.
pub struct FnSemantics<T: ?Sized, H, E> {
    hash: H,
    equals: E,
    _marker: PhantomData<fn(&T)>,
}

impl<T: ?Sized, H, E> FnSemantics<T, H, E>
where
    H: Fn(&T) -> i64,
    E: Fn(&T, &T) -> bool,
{
    pub fn new(hash: H, equals: E) -> Self {
        Self {
            hash,
            equals,
            _marker: PhantomData,
        }
    }
}

impl<T: ?Sized, H: Clone, E: Clone> Clone for FnSemantics<T, H, E> {
    fn clone(&self) -> Self {
        Self {
            hash: self.hash.clone(),
            equals: self.equals.clone(),
            _marker: PhantomData,
        }
    }
}

impl<T: ?Sized, H, E> Semantics<T> for FnSemantics<T, H, E>
where
    H: Fn(&T) -> i64,
    E: Fn(&T, &T) -> bool,
{
    #[inline]
    fn hash(&self, value: &T) -> i64 {
        (self.hash)(value)
    }

    #[inline]
    fn equals(&self, a: &T, b: &T) -> bool {
        (self.equals)(a, b)
    }
}
