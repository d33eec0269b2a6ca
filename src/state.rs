//! Traversal state threaded through one top-level comparison.
//!
//! A [`State`] bundles everything a comparator needs besides the two object
//! ids it was handed:
//! - the heap both values live in;
//! - the dispatch comparator, to re-enter the full pipeline for children;
//! - the internal comparator (`equals`), the hook through which every child
//!   pair is compared and which callers may replace;
//! - the cycle cache, present only for circular-safe engines;
//! - an opaque `meta` payload for custom comparators;
//! - the `strict` flag.

use crate::cycle::CycleCache;
use crate::engine::Dispatch;
use crate::heap::{Heap, ObjectId};
use crate::object::PropertyKey;
use crate::value::Value;
use std::any::Any;
use std::sync::Arc;

/// Opaque payload handed to custom comparators.
pub type Meta = Arc<dyn Any + Send + Sync>;

/// Comparator for one category: decides equality of two objects.
pub type Comparator = Arc<dyn Fn(ObjectId, ObjectId, &mut State<'_>) -> bool + Send + Sync>;

/// Compares one child pair reached through `edge`.
pub type InternalComparator =
    Arc<dyn Fn(&Value, &Value, &Edge<'_>, &mut State<'_>) -> bool + Send + Sync>;

/// Wraps a closure as a [`Comparator`].
///
/// Going through this function (rather than `Arc::new`) lets closures infer
/// the higher-ranked signature.
pub fn comparator<F>(f: F) -> Comparator
where
    F: Fn(ObjectId, ObjectId, &mut State<'_>) -> bool + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Wraps a closure as an [`InternalComparator`].
pub fn internal_comparator<F>(f: F) -> InternalComparator
where
    F: Fn(&Value, &Value, &Edge<'_>, &mut State<'_>) -> bool + Send + Sync + 'static,
{
    Arc::new(f)
}

/// The internal comparator every engine uses unless told otherwise: recurse
/// through dispatch, ignoring the edge.
pub fn deep_internal_comparator() -> InternalComparator {
    internal_comparator(|a, b, _edge, state| state.compare(a, b))
}

/// Where a child value sits inside its parent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EdgeKey<'v> {
    /// Array or typed-array index.
    Index(usize),
    /// Own property key.
    Property(&'v PropertyKey),
    /// Key of the map entry at this position.
    MapKey(usize),
    /// Value stored under this map key.
    MapValue(&'v Value),
    /// Set member at this position.
    SetMember(usize),
}

/// The edge from a parent pair to the child pair being compared.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Edge<'v> {
    pub key_a: EdgeKey<'v>,
    pub key_b: EdgeKey<'v>,
    pub parent_a: ObjectId,
    pub parent_b: ObjectId,
}

impl<'v> Edge<'v> {
    /// Same key on both sides.
    #[inline]
    pub fn aligned(key: EdgeKey<'v>, parent_a: ObjectId, parent_b: ObjectId) -> Self {
        Self {
            key_a: key,
            key_b: key,
            parent_a,
            parent_b,
        }
    }
}

/// Per-call traversal state.
pub struct State<'a> {
    heap: &'a Heap,
    dispatch: &'a dyn Dispatch,
    equals: &'a InternalComparator,
    cache: Option<&'a mut CycleCache>,
    meta: Option<Meta>,
    strict: bool,
}

impl<'a> State<'a> {
    /// Assembles a state. Engines do this once per top-level call.
    pub fn new(
        heap: &'a Heap,
        dispatch: &'a dyn Dispatch,
        equals: &'a InternalComparator,
        cache: Option<&'a mut CycleCache>,
        meta: Option<Meta>,
        strict: bool,
    ) -> Self {
        Self {
            heap,
            dispatch,
            equals,
            cache,
            meta,
            strict,
        }
    }

    /// Heap the compared values live in.
    #[inline]
    pub fn heap(&self) -> &'a Heap {
        self.heap
    }

    #[inline]
    pub fn strict(&self) -> bool {
        self.strict
    }

    /// The opaque payload, if any.
    #[inline]
    pub fn meta(&self) -> Option<&Meta> {
        self.meta.as_ref()
    }

    /// The payload downcast to `T`.
    pub fn meta_as<T: Any>(&self) -> Option<&T> {
        self.meta.as_deref().and_then(|m| m.downcast_ref::<T>())
    }

    /// Cycle cache, present for circular-safe engines.
    #[inline]
    pub fn cache_mut(&mut self) -> Option<&mut CycleCache> {
        self.cache.as_deref_mut()
    }

    /// Compares a child pair through the internal comparator.
    pub fn equals(&mut self, a: &Value, b: &Value, edge: &Edge<'_>) -> bool {
        let equals = self.equals;
        equals(a, b, edge, self)
    }

    /// Compares a pair through the full dispatch pipeline.
    pub fn compare(&mut self, a: &Value, b: &Value) -> bool {
        let dispatch = self.dispatch;
        dispatch.compare(a, b, self)
    }
}

impl std::fmt::Debug for State<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("State")
            .field("strict", &self.strict)
            .field("cache", &self.cache)
            .field("has_meta", &self.meta.is_some())
            .finish_non_exhaustive()
    }
}
