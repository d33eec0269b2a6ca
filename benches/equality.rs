//! Benchmarks for the equality engine.
//!
//! These benchmarks measure the cost of the three traversal shapes that
//! dominate in practice: deep acyclic records, graphs with back edges, and
//! large unordered collections.

use congruence::prelude::*;
use criterion::{black_box, criterion_group, criterion_main, Criterion};

/// A binary tree of records, `depth` levels deep.
fn record_tree(heap: &mut Heap, depth: u32) -> Value {
    if depth == 0 {
        return heap.array([Value::from(1), Value::from("leaf"), Value::Null]);
    }
    let left = record_tree(heap, depth - 1);
    let right = record_tree(heap, depth - 1);
    heap.record([
        ("depth", Value::from(depth)),
        ("left", left),
        ("right", right),
    ])
}

/// A ring of `len` records, each pointing at the next and back at the head.
fn ring(heap: &mut Heap, len: usize) -> Value {
    let head = heap.record([("idx", Value::from(0))]);
    let mut prev = head.clone();
    for idx in 1..len {
        let node = heap.record([("idx", Value::from(idx as u32)), ("head", head.clone())]);
        heap.set_property(&prev, "next", node.clone()).unwrap();
        prev = node;
    }
    heap.set_property(&prev, "next", head.clone()).unwrap();
    head
}

/// Benchmarks deep equality on two 2^12-leaf record trees.
fn bench_deep_records(c: &mut Criterion) {
    let mut heap = Heap::new();
    let a = record_tree(&mut heap, 12);
    let b = record_tree(&mut heap, 12);

    c.bench_function("deep_records_depth_12", |ben| {
        ben.iter(|| assert!(deep_equal(black_box(&heap), black_box(&a), black_box(&b))));
    });
}

/// Benchmarks the cycle guard on two 1k-node rings.
fn bench_cyclic_ring(c: &mut Criterion) {
    let mut heap = Heap::new();
    let a = ring(&mut heap, 1_000);
    let b = ring(&mut heap, 1_000);
    let persistent = EqualityBuilder::new()
        .circular(true)
        .state_mode(StateMode::Persistent)
        .build();

    c.bench_function("cyclic_ring_1k_per_call", |ben| {
        ben.iter(|| assert!(circular_deep_equal(black_box(&heap), black_box(&a), black_box(&b))));
    });
    c.bench_function("cyclic_ring_1k_persistent", |ben| {
        ben.iter(|| assert!(persistent.is_equal(black_box(&heap), black_box(&a), black_box(&b))));
    });
}

/// Benchmarks unordered matching on sets of 500 structurally equal records
/// inserted in opposite orders.
fn bench_large_sets(c: &mut Criterion) {
    let mut heap = Heap::new();
    let members = |heap: &mut Heap, reversed: bool| {
        let mut ids: Vec<u32> = (0..500).collect();
        if reversed {
            ids.reverse();
        }
        let items: Vec<Value> = ids
            .into_iter()
            .map(|i| heap.record([("id", Value::from(i))]))
            .collect();
        heap.set(items)
    };
    let a = members(&mut heap, false);
    let b = members(&mut heap, true);

    c.bench_function("set_of_records_500_reversed", |ben| {
        ben.iter(|| assert!(deep_equal(black_box(&heap), black_box(&a), black_box(&b))));
    });
}

criterion_group!(benches, bench_deep_records, bench_cyclic_ring, bench_large_sets);
criterion_main!(benches);
