//! End-to-end ownership sequences
//!
//! The multi-step flows that exercise acquire/release pairing across a whole
//! container lifetime, finishing with a zero census.

use refmodel::{fixed, grow, map, record, Heap};

#[test]
fn fixed_steal_displace_destroy() {
    let mut heap = Heap::new();
    let seq = heap.new_fixed(1);
    let a = heap.alloc_str("a");
    let b = heap.alloc_str("b");
    assert_eq!(heap.refcount(a).unwrap(), 1);
    assert_eq!(heap.refcount(b).unwrap(), 1);

    fixed::replace(&mut heap, seq, 0, Some(a)).unwrap();
    assert_eq!(heap.refcount(a).unwrap(), 1);
    assert_eq!(fixed::get(&heap, seq, 0).unwrap(), Some(a));

    fixed::replace(&mut heap, seq, 0, Some(b)).unwrap();
    assert_eq!(heap.refcount(b).unwrap(), 1);
    assert!(!heap.is_live(a)); // displaced and destroyed

    heap.release(seq).unwrap();
    assert!(!heap.is_live(b));
    assert_eq!(heap.live_count(), 0);
}

#[test]
fn map_replace_under_existing_key() {
    let mut heap = Heap::new();
    let m = heap.new_map();
    let k = heap.alloc_str("k");
    let v1 = heap.alloc_str("v1");
    let v2 = heap.alloc_str("v2");

    map::set(&mut heap, m, Some(k), Some(v1)).unwrap();
    assert_eq!(heap.refcount(k).unwrap(), 2); // caller + map
    assert_eq!(heap.refcount(v1).unwrap(), 2);

    map::set(&mut heap, m, Some(k), Some(v2)).unwrap();
    assert_eq!(heap.refcount(k).unwrap(), 2); // key retained
    assert_eq!(heap.refcount(v1).unwrap(), 1); // released
    assert_eq!(heap.refcount(v2).unwrap(), 2); // acquired

    heap.release(m).unwrap();
    heap.release(k).unwrap();
    heap.release(v1).unwrap();
    heap.release(v2).unwrap();
    assert_eq!(heap.live_count(), 0);
}

#[test]
fn append_then_release_caller_reference() {
    let mut heap = Heap::new();
    let list = heap.new_grow(0);
    let x = heap.alloc_str("x");
    assert_eq!(heap.refcount(x).unwrap(), 1);

    grow::append(&mut heap, list, Some(x)).unwrap();
    assert_eq!(heap.refcount(x).unwrap(), 2);

    heap.release(x).unwrap();
    assert_eq!(heap.refcount(x).unwrap(), 1); // the list still owns it

    heap.release(list).unwrap();
    assert_eq!(heap.live_count(), 0);
}

#[test]
fn nested_containers_cascade_on_destroy() {
    let mut heap = Heap::new();
    let outer = heap.new_grow(0);
    let inner = heap.new_grow(0);
    let m = heap.new_map();
    let key = heap.alloc_str("key");
    let leaf = heap.alloc_str("leaf");

    map::set(&mut heap, m, Some(key), Some(leaf)).unwrap();
    grow::append(&mut heap, inner, Some(m)).unwrap();
    grow::append(&mut heap, outer, Some(inner)).unwrap();

    // Hand everything to the outer container.
    heap.release(inner).unwrap();
    heap.release(m).unwrap();
    heap.release(key).unwrap();
    heap.release(leaf).unwrap();
    assert_eq!(heap.live_count(), 5);

    heap.release(outer).unwrap();
    assert_eq!(heap.live_count(), 0);
}

#[test]
fn record_lifecycle_with_field_swaps() {
    let mut heap = Heap::new();
    let rec = heap.new_record();
    let first = heap.alloc_str_exact("Grace");
    let last = heap.alloc_str_exact("Hopper");

    record::set_first(&mut heap, rec, Some(first)).unwrap();
    record::set_last(&mut heap, rec, Some(last)).unwrap();
    // The freshly constructed empty fields were displaced and destroyed.
    assert_eq!(heap.live_count(), 3); // rec + first + last, nothing else

    heap.release(first).unwrap();
    heap.release(last).unwrap();
    heap.release(rec).unwrap();
    assert_eq!(heap.live_count(), 0);
}

#[test]
fn harness_suite_is_green() {
    // The scenario suite is the executable specification; a workspace build
    // must keep it green.
    let reports = refmodel::run_all();
    let failures: Vec<String> = reports
        .iter()
        .filter(|report| !report.passed)
        .map(|report| report.to_string())
        .collect();
    assert!(failures.is_empty(), "failing scenarios:\n{}", failures.join("\n"));
}

#[test]
fn reports_serialize_for_machine_consumption() {
    let reports = refmodel::run_matching("map_pop");
    assert!(!reports.is_empty());
    for report in &reports {
        let line = serde_json::to_string(report).unwrap();
        let back: refmodel::Report = serde_json::from_str(&line).unwrap();
        assert_eq!(&back, report);
    }
}
