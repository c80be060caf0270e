//! Associative-map contract conformance

use refmodel::{map, Error, Heap, SetDefaultOutcome};

#[test]
fn set_is_idempotent_for_identical_key_and_value() {
    let mut heap = Heap::new();
    let m = heap.new_map();
    let key = heap.alloc_str("key");
    let value = heap.alloc_str("value");

    map::set(&mut heap, m, Some(key), Some(value)).unwrap();
    let key_count = heap.refcount(key).unwrap();
    let value_count = heap.refcount(value).unwrap();

    map::set(&mut heap, m, Some(key), Some(value)).unwrap();

    assert_eq!(heap.refcount(key).unwrap(), key_count);
    assert_eq!(heap.refcount(value).unwrap(), value_count);
    assert_eq!(map::len(&heap, m).unwrap(), 1);
}

#[test]
fn set_default_absent_stores_exactly_once() {
    let mut heap = Heap::new();
    let m = heap.new_map();
    let key = heap.alloc_str("key");
    let default = heap.alloc_str("default");
    let before = heap.refcount(default).unwrap();

    let result = map::set_default(&mut heap, m, Some(key), Some(default)).unwrap();

    assert_eq!(map::len(&heap, m).unwrap(), 1);
    assert!(result.same(&default));
    // +1 (stored), not +2.
    assert_eq!(heap.refcount(default).unwrap(), before + 1);
}

#[test]
fn set_default_present_never_stores_the_default() {
    let mut heap = Heap::new();
    let m = heap.new_map();
    let key = heap.alloc_str("key");
    let value = heap.alloc_str("value");
    let default = heap.alloc_str("default");
    map::set(&mut heap, m, Some(key), Some(value)).unwrap();

    let result = map::set_default(&mut heap, m, Some(key), Some(default)).unwrap();

    assert_eq!(map::len(&heap, m).unwrap(), 1);
    assert!(result.same(&value));
    assert_eq!(heap.refcount(default).unwrap(), 1);
}

#[test]
fn set_default_ref_hands_out_a_distinct_strong_reference() {
    let mut heap = Heap::new();
    let m = heap.new_map();
    let key = heap.alloc_str("key");
    let default = heap.alloc_str("default");

    let mut out = None;
    let outcome = map::set_default_ref(&mut heap, m, Some(key), Some(default), &mut out).unwrap();

    assert_eq!(outcome, SetDefaultOutcome::Inserted);
    let result = out.unwrap();
    assert!(result.same(&default));
    // caller + stored + out-reference: releasing the out-reference leaves
    // the map's ownership intact.
    assert_eq!(heap.refcount(default).unwrap(), 3);
    heap.release(result).unwrap();
    assert_eq!(map::get(&heap, m, key).unwrap(), Some(default));
}

#[test]
fn unhashable_key_is_rejected_before_any_ownership_effect() {
    let mut heap = Heap::new();
    let m = heap.new_map();
    let bad_key = heap.new_map(); // maps cannot key maps
    let value = heap.alloc_str("value");

    let err = map::set(&mut heap, m, Some(bad_key), Some(value)).unwrap_err();

    assert_eq!(err, Error::Unhashable("Map"));
    assert_eq!(heap.refcount(bad_key).unwrap(), 1);
    assert_eq!(heap.refcount(value).unwrap(), 1);
    assert_eq!(map::len(&heap, m).unwrap(), 0);
}

#[test]
fn pop_moves_the_stored_reference_to_the_caller() {
    let mut heap = Heap::new();
    let m = heap.new_map();
    let key = heap.alloc_str("key");
    let value = heap.alloc_str("value");
    map::set(&mut heap, m, Some(key), Some(value)).unwrap();
    let before = heap.refcount(value).unwrap();

    let popped = map::pop(&mut heap, m, key).unwrap().unwrap();

    assert!(popped.same(&value));
    assert_eq!(map::len(&heap, m).unwrap(), 0);
    // Count unchanged: the map's reference became the caller's.
    assert_eq!(heap.refcount(value).unwrap(), before);
    assert_eq!(heap.refcount(key).unwrap(), 1);
    // Destroying the map now must not touch the popped value.
    heap.release(m).unwrap();
    assert_eq!(heap.refcount(value).unwrap(), before);
}

#[test]
fn keys_match_by_value_not_identity() {
    let mut heap = Heap::new();
    let m = heap.new_map();
    let stored = heap.alloc_str_exact("k");
    let probe = heap.alloc_str_exact("k");
    let value = heap.alloc_str("value");
    map::set(&mut heap, m, Some(stored), Some(value)).unwrap();

    // Structurally equal, distinct identity: still the same logical key.
    assert!(!stored.same(&probe));
    assert_eq!(map::get(&heap, m, probe).unwrap(), Some(value));
}
