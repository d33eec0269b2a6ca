//! Cycle guard for recursive comparators.
//!
//! Comparing self-referential graphs naively never terminates. The guard keeps
//! the set of object pairs currently being compared on the call stack; when a
//! comparison re-enters a pair that is already in progress it answers `true`
//! for that sub-comparison. If the cycle is in fact inconsistent, some other
//! part of the enclosing comparison observes the mismatch and the overall
//! answer is still `false` (a greatest-fixed-point reading of equality).
//!
//! # Invariants
//! - Keys are object identities, never values; the cache holds no objects.
//! - A pair is present only while its comparison is on the stack, so the
//!   cache is empty whenever a top-level call returns normally.
//! - Every stack of nested guarded comparisons consists of distinct pairs,
//!   which bounds recursion by `|A| × |B|` for graphs `A` and `B`.
//!
//! # References
//! - Amadio & Cardelli, "Subtyping recursive types" (1993), coinductive equality
//! - Pierce, "Types and Programming Languages" (2002), §21 Metatheory of recursive types

use crate::heap::ObjectId;
use crate::state::{comparator, Comparator};
use std::collections::HashSet;
use tracing::trace;

/// Identity-keyed set of pairs currently under comparison.
#[derive(Debug, Clone, Default)]
pub struct CycleCache {
    in_progress: HashSet<(ObjectId, ObjectId)>,
}

impl CycleCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Normalized key: comparison is symmetric, so `(a, b)` and `(b, a)` are one pair.
    #[inline]
    fn key(a: ObjectId, b: ObjectId) -> (ObjectId, ObjectId) {
        if a <= b {
            (a, b)
        } else {
            (b, a)
        }
    }

    /// Marks `(a, b)` as in progress. Returns `false` if it already was.
    pub fn enter(&mut self, a: ObjectId, b: ObjectId) -> bool {
        self.in_progress.insert(Self::key(a, b))
    }

    /// Clears the in-progress marker of `(a, b)`.
    pub fn leave(&mut self, a: ObjectId, b: ObjectId) {
        self.in_progress.remove(&Self::key(a, b));
    }

    /// Returns `true` if `(a, b)` is in progress.
    pub fn contains(&self, a: ObjectId, b: ObjectId) -> bool {
        self.in_progress.contains(&Self::key(a, b))
    }

    /// Number of pairs in progress.
    pub fn len(&self) -> usize {
        self.in_progress.len()
    }

    pub fn is_empty(&self) -> bool {
        self.in_progress.is_empty()
    }

    /// Forgets every marker.
    pub fn clear(&mut self) {
        self.in_progress.clear();
    }
}

/// Wraps `inner` with the cycle guard.
///
/// Without a cache in the state (non-circular engines) the wrapper is a
/// pass-through.
pub fn guard(inner: Comparator) -> Comparator {
    comparator(move |a, b, state| {
        match state.cache_mut() {
            None => return inner(a, b, state),
            Some(cache) => {
                if !cache.enter(a, b) {
                    trace!(%a, %b, "pair already in progress, assuming equal");
                    return true;
                }
            }
        }
        let result = inner(a, b, state);
        if let Some(cache) = state.cache_mut() {
            cache.leave(a, b);
        }
        result
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pairs_are_symmetric_and_scoped() {
        let a = ObjectId::new(4);
        let b = ObjectId::new(9);
        let mut cache = CycleCache::new();
        assert!(cache.enter(a, b));
        assert!(cache.contains(b, a));
        assert!(!cache.enter(b, a));
        assert!(!cache.contains(a, a));
        cache.leave(a, b);
        assert!(cache.is_empty());
    }

    #[test]
    fn distinct_pairs_with_shared_member() {
        let (a, b, c) = (ObjectId::new(0), ObjectId::new(1), ObjectId::new(2));
        let mut cache = CycleCache::new();
        assert!(cache.enter(a, b));
        assert!(cache.enter(a, c));
        cache.leave(a, c);
        // The outer marker survives the inner one.
        assert!(cache.contains(a, b));
        assert_eq!(cache.len(), 1);
    }
}
