//! Per-category comparators.
//!
//! Each comparator receives two object ids that the classifier has already
//! placed in its category, plus the traversal state. Children are always
//! compared through [`State::equals`], never directly, so custom internal
//! comparators and the cycle guard see every edge.
//!
//! Comparators are total: an id that does not resolve, or an object whose
//! slots do not match the category, compares unequal.
//!
//! # References
//! - Kuhn, "The Hungarian method for the assignment problem" (1955), augmenting
//!   paths for the unordered matching of set members and map entries

use crate::heap::ObjectId;
use crate::object::{Object, ObjectKind, TypedArray};
use crate::state::{comparator, Comparator, Edge, EdgeKey, State};
use crate::value::same_value_zero_equal;
use std::collections::HashMap;

fn resolve_pair<'h>(state: &State<'h>, a: ObjectId, b: ObjectId) -> Option<(&'h Object, &'h Object)> {
    let heap = state.heap();
    Some((heap.get(a)?, heap.get(b)?))
}

/// Records: same enumerable own string keys, equal values under each key.
pub fn are_records_equal(a: ObjectId, b: ObjectId, state: &mut State<'_>) -> bool {
    let Some((obj_a, obj_b)) = resolve_pair(state, a, b) else {
        return false;
    };
    if obj_a.enumerable_keys().count() != obj_b.enumerable_keys().count() {
        return false;
    }
    for key in obj_a.enumerable_keys() {
        let (Some(prop_a), Some(prop_b)) = (obj_a.own_property(key), obj_b.own_property(key)) else {
            return false;
        };
        if !prop_b.flags.enumerable {
            return false;
        }
        let edge = Edge::aligned(EdgeKey::Property(key), a, b);
        if !state.equals(&prop_a.value, &prop_b.value, &edge) {
            return false;
        }
    }
    true
}

/// Strict records: all own keys (string and symbol, enumerable or not), equal
/// values and identical property flags.
///
/// For collections this compares only the properties attached to the object,
/// not its entries; it is combined with the category comparator.
pub fn are_records_equal_strict(a: ObjectId, b: ObjectId, state: &mut State<'_>) -> bool {
    let Some((obj_a, obj_b)) = resolve_pair(state, a, b) else {
        return false;
    };
    if obj_a.properties.len() != obj_b.properties.len() {
        return false;
    }
    for (key, prop_a) in &obj_a.properties {
        let Some(prop_b) = obj_b.own_property(key) else {
            return false;
        };
        let edge = Edge::aligned(EdgeKey::Property(key), a, b);
        if !state.equals(&prop_a.value, &prop_b.value, &edge) {
            return false;
        }
        if prop_a.flags != prop_b.flags {
            return false;
        }
    }
    true
}

/// Sequences: same length, equal elements index by index.
pub fn are_sequences_equal(a: ObjectId, b: ObjectId, state: &mut State<'_>) -> bool {
    let Some((obj_a, obj_b)) = resolve_pair(state, a, b) else {
        return false;
    };
    let (ObjectKind::Array(items_a), ObjectKind::Array(items_b)) = (&obj_a.kind, &obj_b.kind) else {
        return false;
    };
    if items_a.len() != items_b.len() {
        return false;
    }
    items_a
        .iter()
        .zip(items_b)
        .enumerate()
        .all(|(idx, (item_a, item_b))| {
            state.equals(item_a, item_b, &Edge::aligned(EdgeKey::Index(idx), a, b))
        })
}

/// Typed buffers: same element type, same length, `===` elements.
pub fn are_typed_arrays_equal(a: ObjectId, b: ObjectId, state: &mut State<'_>) -> bool {
    let Some((obj_a, obj_b)) = resolve_pair(state, a, b) else {
        return false;
    };
    match (&obj_a.kind, &obj_b.kind) {
        (ObjectKind::TypedArray(data_a), ObjectKind::TypedArray(data_b)) => {
            // Variant equality covers the element type.
            data_a == data_b
        }
        _ => false,
    }
}

/// Strict typed buffers: same element type, same length, SameValueZero
/// elements (float NaN equals NaN), plus the strict record check on the
/// buffer's own properties.
pub fn are_typed_arrays_equal_strict(a: ObjectId, b: ObjectId, state: &mut State<'_>) -> bool {
    let Some((obj_a, obj_b)) = resolve_pair(state, a, b) else {
        return false;
    };
    let elements_equal = match (&obj_a.kind, &obj_b.kind) {
        (ObjectKind::TypedArray(data_a), ObjectKind::TypedArray(data_b)) => {
            typed_same_value_zero(data_a, data_b)
        }
        _ => false,
    };
    elements_equal && are_records_equal_strict(a, b, state)
}

fn typed_same_value_zero(a: &TypedArray, b: &TypedArray) -> bool {
    fn floats<T: PartialEq>(xs: &[T], ys: &[T], is_nan: fn(&T) -> bool) -> bool {
        xs.len() == ys.len()
            && xs
                .iter()
                .zip(ys)
                .all(|(x, y)| x == y || (is_nan(x) && is_nan(y)))
    }
    match (a, b) {
        (TypedArray::Float32(xs), TypedArray::Float32(ys)) => floats(xs, ys, |x: &f32| x.is_nan()),
        (TypedArray::Float64(xs), TypedArray::Float64(ys)) => floats(xs, ys, |x: &f64| x.is_nan()),
        // Integer elements have no NaN; `===` is SameValueZero.
        _ => a == b,
    }
}

/// Dates: same instant. Two invalid dates are equal (SameValueZero on NaN).
pub fn are_dates_equal(a: ObjectId, b: ObjectId, state: &mut State<'_>) -> bool {
    let Some((obj_a, obj_b)) = resolve_pair(state, a, b) else {
        return false;
    };
    match (&obj_a.kind, &obj_b.kind) {
        (ObjectKind::Date(time_a), ObjectKind::Date(time_b)) => time_a == time_b,
        _ => false,
    }
}

/// Patterns: same source text and same flag set.
pub fn are_regexps_equal(a: ObjectId, b: ObjectId, state: &mut State<'_>) -> bool {
    let Some((obj_a, obj_b)) = resolve_pair(state, a, b) else {
        return false;
    };
    match (&obj_a.kind, &obj_b.kind) {
        (ObjectKind::RegExp(re_a), ObjectKind::RegExp(re_b)) => {
            re_a.source == re_b.source && re_a.flags == re_b.flags
        }
        _ => false,
    }
}

/// Boxed primitives: SameValueZero on the wrapped value.
pub fn are_primitive_wrappers_equal(a: ObjectId, b: ObjectId, state: &mut State<'_>) -> bool {
    let Some((obj_a, obj_b)) = resolve_pair(state, a, b) else {
        return false;
    };
    match (&obj_a.kind, &obj_b.kind) {
        (ObjectKind::Boxed(inner_a), ObjectKind::Boxed(inner_b)) => {
            same_value_zero_equal(inner_a, inner_b)
        }
        _ => false,
    }
}

/// Maps: same size, and a one-to-one pairing of entries with equal keys and
/// equal values. Insertion order is irrelevant.
pub fn are_maps_equal(a: ObjectId, b: ObjectId, state: &mut State<'_>) -> bool {
    let Some((obj_a, obj_b)) = resolve_pair(state, a, b) else {
        return false;
    };
    let (ObjectKind::Map(entries_a), ObjectKind::Map(entries_b)) = (&obj_a.kind, &obj_b.kind) else {
        return false;
    };
    if entries_a.len() != entries_b.len() {
        return false;
    }
    match_unordered(entries_a.len(), |i, j| {
        let (key_a, value_a) = &entries_a[i];
        let (key_b, value_b) = &entries_b[j];
        let key_edge = Edge {
            key_a: EdgeKey::MapKey(i),
            key_b: EdgeKey::MapKey(j),
            parent_a: a,
            parent_b: b,
        };
        if !state.equals(key_a, key_b, &key_edge) {
            return false;
        }
        let value_edge = Edge {
            key_a: EdgeKey::MapValue(key_a),
            key_b: EdgeKey::MapValue(key_b),
            parent_a: a,
            parent_b: b,
        };
        state.equals(value_a, value_b, &value_edge)
    })
}

/// Sets: same size, and a one-to-one pairing of equal members.
pub fn are_sets_equal(a: ObjectId, b: ObjectId, state: &mut State<'_>) -> bool {
    let Some((obj_a, obj_b)) = resolve_pair(state, a, b) else {
        return false;
    };
    let (ObjectKind::Set(members_a), ObjectKind::Set(members_b)) = (&obj_a.kind, &obj_b.kind) else {
        return false;
    };
    if members_a.len() != members_b.len() {
        return false;
    }
    match_unordered(members_a.len(), |i, j| {
        let edge = Edge {
            key_a: EdgeKey::SetMember(i),
            key_b: EdgeKey::SetMember(j),
            parent_a: a,
            parent_b: b,
        };
        state.equals(&members_a[i], &members_b[j], &edge)
    })
}

/// Logical AND of two comparators; `second` runs only if `first` holds.
pub fn combine_comparators(first: Comparator, second: Comparator) -> Comparator {
    comparator(move |a, b, state| first(a, b, state) && second(a, b, state))
}

/// Decides whether a perfect matching exists between `0..len` on the left and
/// `0..len` on the right, where `matches(i, j)` says whether left `i` may pair
/// with right `j`.
///
/// Each left item first takes the first free right item it matches, which is
/// all an equivalence relation ever needs. Only when no free partner exists
/// does it search for an augmenting path, so custom comparators that are not
/// transitive still get a correct answer. `matches` is evaluated at most once
/// per pair.
pub(crate) fn match_unordered<F>(len: usize, mut matches: F) -> bool
where
    F: FnMut(usize, usize) -> bool,
{
    if len == 0 {
        return true;
    }
    let mut matcher = Matcher {
        len,
        memo: HashMap::new(),
        owner: vec![None; len],
    };
    for left in 0..len {
        if !matcher.assign_free(left, &mut matches) {
            let mut visited = vec![false; len];
            if !matcher.augment(left, &mut visited, &mut matches) {
                return false;
            }
        }
    }
    true
}

struct Matcher {
    len: usize,
    memo: HashMap<(usize, usize), bool>,
    /// Left item currently paired with each right item.
    owner: Vec<Option<usize>>,
}

impl Matcher {
    fn edge<F: FnMut(usize, usize) -> bool>(&mut self, left: usize, right: usize, matches: &mut F) -> bool {
        *self
            .memo
            .entry((left, right))
            .or_insert_with(|| matches(left, right))
    }

    fn assign_free<F: FnMut(usize, usize) -> bool>(&mut self, left: usize, matches: &mut F) -> bool {
        for right in 0..self.len {
            if self.owner[right].is_none() && self.edge(left, right, matches) {
                self.owner[right] = Some(left);
                return true;
            }
        }
        false
    }

    fn augment<F: FnMut(usize, usize) -> bool>(
        &mut self,
        left: usize,
        visited: &mut [bool],
        matches: &mut F,
    ) -> bool {
        for right in 0..self.len {
            if visited[right] || !self.edge(left, right, matches) {
                continue;
            }
            visited[right] = true;
            let free = match self.owner[right] {
                None => true,
                Some(current) => self.augment(current, visited, matches),
            };
            if free {
                self.owner[right] = Some(left);
                return true;
            }
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ComparatorSet;
    use crate::engine::Dispatcher;
    use crate::heap::Heap;
    use crate::object::{Property, PropertyFlags};
    use crate::state::deep_internal_comparator;
    use crate::value::Value;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn with_state<R>(heap: &Heap, f: impl FnOnce(&mut State<'_>) -> R) -> R {
        let dispatch = Dispatcher::new(ComparatorSet::loose());
        let equals = deep_internal_comparator();
        let mut state = State::new(heap, &dispatch, &equals, None, None, false);
        f(&mut state)
    }

    fn id(value: &Value) -> ObjectId {
        value.as_object().unwrap()
    }

    #[test]
    fn kind_mismatch_is_unequal() {
        let mut heap = Heap::new();
        let list = heap.array([Value::from(1)]);
        let set = heap.set([Value::from(1)]);
        let date = heap.date_millis(0);
        with_state(&heap, |state| {
            assert!(!are_sequences_equal(id(&list), id(&set), state));
            assert!(!are_sets_equal(id(&set), id(&list), state));
            assert!(!are_dates_equal(id(&date), id(&list), state));
            assert!(!are_records_equal(id(&list), ObjectId::new(99), state));
        });
    }

    #[test]
    fn strict_records_check_symbols() {
        let mut heap = Heap::new();
        let sym = heap.symbol(Some("meta"));
        let a = heap.record([("x", Value::from(1))]);
        let b = heap.record([("x", Value::from(1))]);
        heap.set_property(&b, sym, Value::Null).unwrap();
        with_state(&heap, |state| {
            assert!(are_records_equal(id(&a), id(&b), state));
            assert!(!are_records_equal_strict(id(&a), id(&b), state));
        });
    }

    #[test]
    fn records_ignore_hidden_keys_in_both_orders() {
        let mut heap = Heap::new();
        let a = heap.record([("x", Value::from(1)), ("y", Value::from(2))]);
        let b = heap.record([("x", Value::from(1)), ("z", Value::from(3))]);
        let hidden = Property::with_flags(Value::from(2), PropertyFlags::HIDDEN);
        heap.define_property(&b, "y", hidden).unwrap();
        with_state(&heap, |state| {
            assert!(!are_records_equal(id(&a), id(&b), state));
            assert!(!are_records_equal(id(&b), id(&a), state));
        });
    }

    #[test]
    fn strict_typed_arrays_treat_nan_as_equal() {
        let mut heap = Heap::new();
        let a = heap.typed_array(TypedArray::Float64(vec![1.0, f64::NAN]));
        let b = heap.typed_array(TypedArray::Float64(vec![1.0, f64::NAN]));
        let c = heap.typed_array(TypedArray::Float32(vec![1.0, f32::NAN]));
        let d = heap.typed_array(TypedArray::Int8(vec![1, 2]));
        let e = heap.typed_array(TypedArray::Int8(vec![1, 2]));
        heap.set_property(&e, "tag", Value::from("extra")).unwrap();
        with_state(&heap, |state| {
            assert!(!are_typed_arrays_equal(id(&a), id(&b), state));
            assert!(are_typed_arrays_equal_strict(id(&a), id(&b), state));
            assert!(!are_typed_arrays_equal_strict(id(&a), id(&c), state));
            assert!(are_typed_arrays_equal(id(&d), id(&e), state));
            assert!(!are_typed_arrays_equal_strict(id(&d), id(&e), state));
        });
    }

    #[test]
    fn combined_comparators_short_circuit() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let second = comparator(move |_, _, _| {
            counter.fetch_add(1, Ordering::SeqCst);
            true
        });
        let both = combine_comparators(comparator(|_, _, _| false), second.clone());
        let heap = Heap::new();
        let (a, b) = (ObjectId::new(0), ObjectId::new(1));
        with_state(&heap, |state| {
            assert!(!both(a, b, state));
            assert!(combine_comparators(comparator(|_, _, _| true), second)(a, b, state));
        });
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn matching_trivial_cases() {
        assert!(match_unordered(0, |_, _| false));
        assert!(match_unordered(3, |i, j| i == j));
        assert!(match_unordered(3, |i, j| i + j == 2));
        assert!(!match_unordered(2, |_, j| j == 0));
    }

    #[test]
    fn matching_needs_augmenting_path() {
        // Left 0 matches right 0 and 1; left 1 only matches right 0.
        // Greedy pairs (0, 0) and strands left 1; the augmenting path fixes it.
        let edges = [(0, 0), (0, 1), (1, 0)];
        assert!(match_unordered(2, |i, j| edges.contains(&(i, j))));
    }

    #[test]
    fn matching_evaluates_each_pair_once() {
        let mut calls = HashMap::new();
        let edges = [(0, 0), (0, 1), (1, 0), (2, 2)];
        assert!(match_unordered(3, |i, j| {
            *calls.entry((i, j)).or_insert(0) += 1;
            edges.contains(&(i, j))
        }));
        assert!(calls.values().all(|&n| n == 1));
    }
}
