//! Ready-made engines.
//!
//! Each preset is built on first use and shared for the rest of the process.
//! Deep presets recurse into children; shallow presets compare children with
//! SameValueZero. All presets use per-call state, so they are safe to call
//! from any thread and from inside custom comparators.

use crate::engine::{EqualityBuilder, IsEqual};
use crate::heap::Heap;
use crate::state::internal_comparator;
use crate::value::{same_value_zero_equal, Value};
use std::sync::OnceLock;

fn deep(circular: bool, strict: bool) -> IsEqual {
    EqualityBuilder::new().circular(circular).strict(strict).build()
}

fn shallow(circular: bool, strict: bool) -> IsEqual {
    EqualityBuilder::new()
        .circular(circular)
        .strict(strict)
        .internal_comparator(internal_comparator(|a, b, _, _| same_value_zero_equal(a, b)))
        .build()
}

macro_rules! preset {
    ($(#[$doc:meta])* $name:ident, $build:ident, circular = $circular:expr, strict = $strict:expr) => {
        $(#[$doc])*
        pub fn $name(heap: &Heap, a: &Value, b: &Value) -> bool {
            static ENGINE: OnceLock<IsEqual> = OnceLock::new();
            ENGINE
                .get_or_init(|| $build($circular, $strict))
                .is_equal(heap, a, b)
        }
    };
}

preset!(
    /// Deep structural equality.
    deep_equal, deep, circular = false, strict = false
);
preset!(
    /// Deep equality comparing all own properties and their attributes.
    strict_deep_equal, deep, circular = false, strict = true
);
preset!(
    /// Deep equality that terminates on cyclic graphs.
    circular_deep_equal, deep, circular = true, strict = false
);
preset!(
    strict_circular_deep_equal, deep, circular = true, strict = true
);
preset!(
    /// One level deep: children compare with SameValueZero.
    shallow_equal, shallow, circular = false, strict = false
);
preset!(
    strict_shallow_equal, shallow, circular = false, strict = true
);
preset!(
    circular_shallow_equal, shallow, circular = true, strict = false
);
preset!(
    strict_circular_shallow_equal, shallow, circular = true, strict = true
);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::{Property, PropertyFlags};

    #[test]
    fn deep_versus_shallow() {
        let mut heap = Heap::new();
        let inner_a = heap.array([Value::from(1)]);
        let inner_b = heap.array([Value::from(1)]);
        let a = heap.record([("list", inner_a.clone())]);
        let b = heap.record([("list", inner_b)]);
        let c = heap.record([("list", inner_a)]);

        assert!(deep_equal(&heap, &a, &b));
        assert!(!shallow_equal(&heap, &a, &b));
        assert!(shallow_equal(&heap, &a, &c));
        assert!(strict_shallow_equal(&heap, &a, &c));
    }

    #[test]
    fn circular_presets_terminate() {
        let mut heap = Heap::new();
        let a = heap.array([Value::from(1)]);
        heap.push(&a, a.clone()).unwrap();
        let b = heap.array([Value::from(1)]);
        heap.push(&b, b.clone()).unwrap();

        assert!(circular_deep_equal(&heap, &a, &b));
        assert!(strict_circular_deep_equal(&heap, &a, &b));
        // Shallow: the self references differ by identity.
        assert!(!circular_shallow_equal(&heap, &a, &b));
        assert!(strict_circular_shallow_equal(&heap, &a, &a));
    }

    #[test]
    fn strict_presets_see_hidden_properties() {
        let mut heap = Heap::new();
        let a = heap.record([("x", Value::from(1))]);
        let b = heap.record([("x", Value::from(1))]);
        heap.define_property(
            &b,
            "hidden",
            Property::with_flags(Value::Null, PropertyFlags::HIDDEN),
        )
        .unwrap();
        assert!(deep_equal(&heap, &a, &b));
        assert!(!strict_deep_equal(&heap, &a, &b));
    }
}
