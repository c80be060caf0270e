//! Growable-sequence contract conformance

use refmodel::{grow, Error, Heap};

#[test]
fn append_increments_by_exactly_one() {
    let mut heap = Heap::new();
    let seq = heap.new_grow(0);
    let value = heap.alloc_str("value");
    let before = heap.refcount(value).unwrap();

    grow::append(&mut heap, seq, Some(value)).unwrap();

    assert_eq!(heap.refcount(value).unwrap(), before + 1);
    // The caller's own reference is still valid and separately releasable.
    heap.release(value).unwrap();
    assert_eq!(heap.refcount(value).unwrap(), before);
}

#[test]
fn insert_increments_by_exactly_one() {
    let mut heap = Heap::new();
    let seq = heap.new_grow(0);
    let value = heap.alloc_str("value");
    let before = heap.refcount(value).unwrap();

    grow::insert(&mut heap, seq, 0, Some(value)).unwrap();

    assert_eq!(heap.refcount(value).unwrap(), before + 1);
}

#[test]
fn insert_clamps_rather_than_erroring() {
    let mut heap = Heap::new();
    let seq = heap.new_grow(0);
    let high = heap.alloc_str("high");
    let negative = heap.alloc_str("negative");

    grow::insert(&mut heap, seq, 100, Some(high)).unwrap();
    grow::insert(&mut heap, seq, -100, Some(negative)).unwrap();

    assert_eq!(grow::len(&heap, seq).unwrap(), 2);
    assert_eq!(grow::get(&heap, seq, 0).unwrap(), Some(negative));
    assert_eq!(grow::get(&heap, seq, 1).unwrap(), Some(high));
}

#[test]
fn checked_replace_errors_out_of_range_where_insert_clamps() {
    let mut heap = Heap::new();
    let seq = heap.new_grow(0);
    let value = heap.alloc_str("value");
    heap.acquire(value).unwrap();

    let err = grow::replace(&mut heap, seq, 0, Some(value)).unwrap_err();

    assert_eq!(err, Error::IndexOutOfRange { index: 0, len: 0 });
    // Consumed even on failure; the stealing family's policy.
    assert_eq!(heap.refcount(value).unwrap(), 1);
}

#[test]
fn failed_append_against_wrong_kind_changes_nothing() {
    let mut heap = Heap::new();
    let target = heap.new_fixed(2);
    let value = heap.alloc_str("value");

    let err = grow::append(&mut heap, target, Some(value)).unwrap_err();

    assert!(matches!(err, Error::TypeMismatch { .. }));
    assert_eq!(heap.refcount(value).unwrap(), 1);
    assert_eq!(refmodel::fixed::len(&heap, target).unwrap(), 2);
    assert_eq!(refmodel::fixed::get(&heap, target, 0).unwrap(), None);
}

#[test]
fn unchecked_replace_leaks_instead_of_releasing() {
    let mut heap = Heap::new();
    let seq = heap.new_grow(1);
    let first = heap.alloc_str("first");
    grow::replace(&mut heap, seq, 0, Some(first)).unwrap();
    let second = heap.alloc_str("second");

    grow::replace_unchecked(&mut heap, seq, 0, Some(second));

    // The displaced occupant keeps the count the container never gave back.
    assert_eq!(heap.refcount(first).unwrap(), 1);
    heap.release(seq).unwrap();
    // `second` died with the container; `first` is the documented leak.
    assert!(!heap.is_live(second));
    assert!(heap.is_live(first));
    assert_eq!(heap.live_count(), 1);
}

#[test]
fn repeating_a_failing_call_reproduces_the_same_outcome() {
    let mut heap = Heap::new();
    let target = heap.new_fixed(1);

    let first = grow::append(&mut heap, target, None).unwrap_err();
    let second = grow::append(&mut heap, target, None).unwrap_err();

    // Deterministic and idempotent-to-inspect.
    assert_eq!(first, second);
    assert_eq!(refmodel::fixed::len(&heap, target).unwrap(), 1);
}
