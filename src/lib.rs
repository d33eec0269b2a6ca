//! Congruence: structural equality for dynamic, possibly cyclic object graphs.
//!
//! This crate decides whether two values of a dynamic object model are deeply
//! equivalent, providing:
//! - a value model with an arena-backed heap, where object identity is the
//!   arena slot and cycles are ordinary references;
//! - an ordered type classifier that routes each pair of values to one of a
//!   closed set of comparison categories;
//! - per-category comparators for records, arrays, typed arrays, dates,
//!   regular expressions, maps, sets and boxed primitives;
//! - an identity-keyed cycle guard for self-referential graphs;
//! - a builder that assembles customized engines, plus ready-made presets.
//!
//! # Name Origin: "Congruence"
//!
//! Two terms are congruent when they agree structurally under a relation that
//! is preserved by every constructor. Equality here is exactly that: two
//! objects are equal when their constructors agree and their children are,
//! recursively, equal.
//!
//! # References
//!
//! - Amadio, Cardelli. "Subtyping recursive types" (1993) – coinductive equality
//! - Kuhn, H.W. "The Hungarian method for the assignment problem" (1955) – matching
//! - ECMA-262, §7.2.10 SameValueZero and §7.2.11 SameValue
//!
//! # Example
//!
//! ```
//! use congruence::prelude::*;
//!
//! let mut heap = Heap::new();
//! let list_a = heap.array([Value::from(1), Value::from(2), Value::from(3)]);
//! let a = heap.record([("a", Value::from(1)), ("b", list_a)]);
//! let list_b = heap.array([Value::from(1), Value::from(2), Value::from(3)]);
//! let b = heap.record([("a", Value::from(1)), ("b", list_b)]);
//!
//! assert!(deep_equal(&heap, &a, &b));
//! assert!(!shallow_equal(&heap, &a, &b));
//! ```

pub mod classify;
pub mod comparators;
pub mod config;
pub mod cycle;
pub mod engine;
pub mod error;
pub mod heap;
pub mod import;
pub mod object;
pub mod presets;
pub mod state;
pub mod value;

pub use classify::{classify, Classification, TypeTag};
pub use config::{build_comparator_set, ComparatorOverrides, ComparatorSet, EqualityOptions, StateMode};
pub use engine::{build_is_equal, Dispatch, Dispatcher, EqualityBuilder, IsEqual, IsEqualOptions, StateParts};
pub use error::CongruenceError;
pub use heap::{Heap, ObjectId};
pub use presets::{
    circular_deep_equal, circular_shallow_equal, deep_equal, shallow_equal,
    strict_circular_deep_equal, strict_circular_shallow_equal, strict_deep_equal,
    strict_shallow_equal,
};
pub use value::{same_value_equal, same_value_zero_equal, SymbolId, Value};

/// Prelude for convenient usage.
pub mod prelude {
    pub use crate::classify::{classify, Classification, TypeTag};
    pub use crate::comparators::combine_comparators;
    pub use crate::config::{
        build_comparator_set, ComparatorOverrides, ComparatorSet, EqualityOptions, StateMode,
    };
    pub use crate::cycle::CycleCache;
    pub use crate::engine::{
        build_is_equal, dispatch_fn, Dispatch, Dispatcher, EqualityBuilder, IsEqual,
        IsEqualOptions, StateFactory, StateParts,
    };
    pub use crate::error::CongruenceError;
    pub use crate::heap::{Heap, ObjectId};
    pub use crate::object::{
        Builtin, ClassId, Constructor, ElementType, Object, ObjectKind, OpaqueKind, Property,
        PropertyFlags, PropertyKey, RealmId, TypedArray,
    };
    pub use crate::presets::{
        circular_deep_equal, circular_shallow_equal, deep_equal, shallow_equal,
        strict_circular_deep_equal, strict_circular_shallow_equal, strict_deep_equal,
        strict_shallow_equal,
    };
    pub use crate::state::{
        comparator, internal_comparator, Comparator, Edge, EdgeKey, InternalComparator, Meta,
        State,
    };
    pub use crate::value::{same_value_equal, same_value_zero_equal, SymbolId, Value};
}

#[cfg(test)]
mod tests {
    use super::prelude::*;

    /// Every value is equal to itself, including NaN and cyclic graphs.
    #[test]
    fn reflexivity() {
        let mut heap = Heap::new();
        let nan = Value::from(f64::NAN);
        assert!(deep_equal(&heap, &nan, &nan));

        let cyclic = heap.record([("n", Value::from(1))]);
        heap.set_property(&cyclic, "me", cyclic.clone()).unwrap();
        assert!(deep_equal(&heap, &cyclic, &cyclic));
        assert!(circular_deep_equal(&heap, &cyclic, &cyclic));
    }

    /// Positive and negative zero are equal at every depth.
    #[test]
    fn signed_zero() {
        let mut heap = Heap::new();
        assert!(deep_equal(&heap, &Value::from(0.0), &Value::from(-0.0)));
        let a = heap.array([Value::from(0.0)]);
        let b = heap.array([Value::from(-0.0)]);
        assert!(deep_equal(&heap, &a, &b));
        assert!(!same_value_equal(&Value::from(0.0), &Value::from(-0.0)));
    }

    /// Records and class instances are never equal, whatever their fields.
    #[test]
    fn constructor_mismatch() {
        let mut heap = Heap::new();
        let class = heap.define_class("Point", ["norm"]);
        let record = heap.record([("x", Value::from(1))]);
        let instance = heap.instance(class, [("x", Value::from(1))]);
        assert!(!deep_equal(&heap, &record, &instance));
        assert!(!deep_equal(&heap, &instance, &record));
    }

    /// Values from another realm compare through their intrinsic tags.
    #[test]
    fn cross_realm_values() {
        let mut heap = Heap::new();
        let realm = heap.new_realm();
        let local = heap.map([(Value::from("k"), Value::from(1))]);
        let foreign = heap.map([(Value::from("k"), Value::from(1))]);
        heap.get_mut(foreign.as_object().unwrap()).unwrap().constructor =
            Constructor::builtin_in(realm, Builtin::Map);
        let foreign_twin = heap.map([(Value::from("k"), Value::from(1))]);
        heap.get_mut(foreign_twin.as_object().unwrap()).unwrap().constructor =
            Constructor::builtin_in(realm, Builtin::Map);

        assert!(deep_equal(&heap, &foreign, &foreign_twin));
        assert!(!deep_equal(&heap, &local, &foreign));
    }

    /// Opaque builtins and promises are equal only to themselves.
    #[test]
    fn opaque_values() {
        let mut heap = Heap::new();
        let a = heap.opaque(OpaqueKind::WeakMap);
        let b = heap.opaque(OpaqueKind::WeakMap);
        assert!(deep_equal(&heap, &a, &a));
        assert!(!deep_equal(&heap, &a, &b));
        let p = heap.promise();
        let q = heap.promise();
        assert!(!deep_equal(&heap, &p, &q));
    }
}
