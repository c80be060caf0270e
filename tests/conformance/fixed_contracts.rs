//! Fixed-sequence contract conformance

use refmodel::{fixed, Error, Heap};

#[test]
fn successful_replace_keeps_the_count_flat() {
    let mut heap = Heap::new();
    let seq = heap.new_fixed(1);
    let value = heap.alloc_str("flat");
    let before = heap.refcount(value).unwrap();

    fixed::replace(&mut heap, seq, 0, Some(value)).unwrap();

    // Steal: no net change; the container's ownership is the caller's old
    // reference.
    assert_eq!(heap.refcount(value).unwrap(), before);
}

#[test]
fn displaced_occupant_loses_exactly_one_reference() {
    let mut heap = Heap::new();
    let seq = heap.new_fixed(1);
    let displaced = heap.alloc_str("displaced");
    heap.acquire(displaced).unwrap(); // caller keeps one alongside the slot
    fixed::replace(&mut heap, seq, 0, Some(displaced)).unwrap();
    let before = heap.refcount(displaced).unwrap();

    let incoming = heap.alloc_str("incoming");
    fixed::replace(&mut heap, seq, 0, Some(incoming)).unwrap();

    assert_eq!(heap.refcount(displaced).unwrap(), before - 1);
    heap.release(displaced).unwrap();
}

#[test]
fn failed_replace_against_wrong_kind_leaves_target_untouched() {
    let mut heap = Heap::new();
    let target = heap.new_grow(0);
    let resident = heap.alloc_str("resident");
    refmodel::grow::append(&mut heap, target, Some(resident)).unwrap();
    let value = heap.alloc_str("value");

    let err = fixed::replace(&mut heap, target, 0, Some(value)).unwrap_err();

    assert!(matches!(err, Error::TypeMismatch { .. }));
    assert_eq!(refmodel::grow::len(&heap, target).unwrap(), 1);
    assert_eq!(
        refmodel::grow::get(&heap, target, 0).unwrap(),
        Some(resident)
    );
    // The incoming value was consumed regardless of the target surviving.
    assert!(!heap.is_live(value));
}

#[test]
fn self_replacement_delta_without_special_case() {
    let mut heap = Heap::new();
    let seq = heap.new_fixed(1);
    let value = heap.alloc_str("same");
    fixed::replace(&mut heap, seq, 0, Some(value)).unwrap();
    heap.acquire(value).unwrap();
    let before = heap.refcount(value).unwrap();

    fixed::replace(&mut heap, seq, 0, Some(value)).unwrap();

    // No identity special-case: the displaced-value release fired on the
    // value itself, one extra decrement.
    assert_eq!(heap.refcount(value).unwrap(), before - 1);
}

#[test]
fn pack_then_destroy_returns_arguments_to_their_prior_counts() {
    let mut heap = Heap::new();
    let a = heap.alloc_str("a");
    let b = heap.alloc_str("b");

    let seq = fixed::pack(&mut heap, &[a, b]).unwrap();
    assert_eq!(heap.refcount(a).unwrap(), 2);
    assert_eq!(heap.refcount(b).unwrap(), 2);

    heap.release(seq).unwrap();
    assert_eq!(heap.refcount(a).unwrap(), 1);
    assert_eq!(heap.refcount(b).unwrap(), 1);
}

#[test]
fn finalized_sequence_rejects_mutation() {
    let mut heap = Heap::new();
    let seq = heap.new_fixed(1);
    heap.acquire(seq).unwrap(); // shared
    let value = heap.alloc_str("value");

    let err = fixed::replace(&mut heap, seq, 0, Some(value)).unwrap_err();

    assert!(matches!(err, Error::TypeMismatch { .. }));
    assert!(!heap.is_live(value)); // consumed
    assert_eq!(fixed::get(&heap, seq, 0).unwrap(), None); // unchanged
}
