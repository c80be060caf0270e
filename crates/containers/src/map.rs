//! Associative map operations
//!
//! ## Ownership contract
//!
//! `set` **acquires** both the key and the value on a fresh insert; the
//! caller keeps its own references. Replacing the value under an existing
//! key releases the displaced value once and retains the *stored* key
//! object: the incoming (value-equal) key is neither stored nor acquired.
//! Re-setting a key to the identity-equal stored value is net-zero, and the
//! acquire is ordered before the release so the count never dips through
//! zero in between.
//!
//! Failures (wrong container kind, unhashable key, absent argument) never
//! consume the caller's references. This is the opposite policy from the
//! stealing sequence `replace`, and exactly why the two families are so easy
//! to misuse when switching between them.
//!
//! ## Lookup
//!
//! Keys must be hashable (scalar kind). Lookup hashes the probe key's
//! payload and compares candidates by *value* equality; identity only
//! matters for the refcount bookkeeping, never for matching.

use refmodel_core::{Error, Kind, ObjId, Result, SetDefaultOutcome};
use refmodel_heap::{Heap, MapEntry, Payload};
use tracing::trace;

fn entries<'h>(heap: &'h Heap, map: ObjId, op: &'static str) -> Result<&'h Vec<MapEntry>> {
    match heap.payload(map)? {
        Payload::Map(entries) => Ok(entries),
        other => Err(Error::type_mismatch(op, Kind::Map.name(), other.kind().name())),
    }
}

fn entries_mut<'h>(heap: &'h mut Heap, map: ObjId, op: &'static str) -> Result<&'h mut Vec<MapEntry>> {
    match heap.payload_mut(map)? {
        Payload::Map(entries) => Ok(entries),
        other => Err(Error::type_mismatch(op, Kind::Map.name(), other.kind().name())),
    }
}

/// Find the entry index for `key`: hash precheck, then value equality.
fn lookup(heap: &Heap, map: ObjId, key: ObjId, op: &'static str) -> Result<Option<usize>> {
    let hash = heap.key_hash(key)?;
    // Entries are copied out so the probe can borrow the heap for payload
    // comparisons; MapEntry is plain data.
    let candidates: Vec<MapEntry> = entries(heap, map, op)?.clone();
    for (index, entry) in candidates.iter().enumerate() {
        if entry.hash == hash && heap.value_eq(entry.key, key)? {
            return Ok(Some(index));
        }
    }
    Ok(None)
}

/// Associate `value` with `key`, acquiring both on a fresh insert.
///
/// Existing key: the stored key object is retained (no acquire on the
/// incoming key), the new value is acquired, and the displaced value is
/// released once. Failures consume nothing.
pub fn set(heap: &mut Heap, map: ObjId, key: Option<ObjId>, value: Option<ObjId>) -> Result<()> {
    let key = key.ok_or(Error::NullArgument { op: "map::set" })?;
    let value = value.ok_or(Error::NullArgument { op: "map::set" })?;
    entries(heap, map, "map::set")?;
    match lookup(heap, map, key, "map::set")? {
        Some(index) => {
            // Acquire before release: an identity-equal re-set must stay
            // net-zero without the count touching zero in between.
            heap.acquire(value)?;
            let previous = {
                let entries = entries_mut(heap, map, "map::set")?;
                std::mem::replace(&mut entries[index].value, value)
            };
            heap.release(previous)?;
            trace!(target: "refmodel::containers", map = %map, "map set (replace)");
        }
        None => {
            let hash = heap.key_hash(key)?;
            heap.acquire(key)?;
            heap.acquire(value)?;
            entries_mut(heap, map, "map::set")?.push(MapEntry { hash, key, value });
            trace!(target: "refmodel::containers", map = %map, "map set (insert)");
        }
    }
    Ok(())
}

/// Borrow the value stored under `key` (no acquire). `Ok(None)` if absent.
pub fn get(heap: &Heap, map: ObjId, key: ObjId) -> Result<Option<ObjId>> {
    match lookup(heap, map, key, "map::get")? {
        Some(index) => Ok(Some(entries(heap, map, "map::get")?[index].value)),
        None => Ok(None),
    }
}

/// Return the value under `key`, inserting `default` if the key is absent.
///
/// Present: the stored value is returned borrowed; `default` is neither
/// stored nor acquired. Absent: `key` and `default` are acquired and stored,
/// and `default` is returned borrowed.
pub fn set_default(heap: &mut Heap, map: ObjId, key: Option<ObjId>, default: Option<ObjId>) -> Result<ObjId> {
    let key = key.ok_or(Error::NullArgument { op: "map::set_default" })?;
    let default = default.ok_or(Error::NullArgument { op: "map::set_default" })?;
    entries(heap, map, "map::set_default")?;
    match lookup(heap, map, key, "map::set_default")? {
        Some(index) => {
            let value = entries(heap, map, "map::set_default")?[index].value;
            trace!(target: "refmodel::containers", map = %map, "map set_default (existing)");
            Ok(value)
        }
        None => {
            let hash = heap.key_hash(key)?;
            heap.acquire(key)?;
            heap.acquire(default)?;
            entries_mut(heap, map, "map::set_default")?.push(MapEntry {
                hash,
                key,
                value: default,
            });
            trace!(target: "refmodel::containers", map = %map, "map set_default (inserted)");
            Ok(default)
        }
    }
}

/// `set_default` with a strong out-reference.
///
/// Writes into `out` a **newly acquired** reference to whichever value ends
/// up associated with `key`, on top of the map's own stored ownership, so
/// the caller holds a reference distinct from the map's. Whatever `out` held
/// before is overwritten without release; managing it is the caller's
/// responsibility. On failure `out` is set to `None` and nothing is
/// consumed.
pub fn set_default_ref(
    heap: &mut Heap,
    map: ObjId,
    key: Option<ObjId>,
    default: Option<ObjId>,
    out: &mut Option<ObjId>,
) -> Result<SetDefaultOutcome> {
    let key = match key {
        Some(key) => key,
        None => {
            *out = None;
            return Err(Error::NullArgument { op: "map::set_default_ref" });
        }
    };
    let default = match default {
        Some(default) => default,
        None => {
            *out = None;
            return Err(Error::NullArgument { op: "map::set_default_ref" });
        }
    };
    let checked = entries(heap, map, "map::set_default_ref")
        .map(|_| ())
        .and_then(|()| lookup(heap, map, key, "map::set_default_ref"));
    let found = match checked {
        Ok(found) => found,
        Err(err) => {
            *out = None;
            return Err(err);
        }
    };
    match found {
        Some(index) => {
            let value = entries(heap, map, "map::set_default_ref")?[index].value;
            heap.acquire(value)?;
            *out = Some(value);
            Ok(SetDefaultOutcome::Existing)
        }
        None => {
            let hash = heap.key_hash(key)?;
            heap.acquire(key)?;
            heap.acquire(default)?;
            entries_mut(heap, map, "map::set_default_ref")?.push(MapEntry {
                hash,
                key,
                value: default,
            });
            // The out-reference is an additional acquire on top of the
            // stored one.
            heap.acquire(default)?;
            *out = Some(default);
            Ok(SetDefaultOutcome::Inserted)
        }
    }
}

/// Remove `key`, transferring ownership of the stored value to the caller.
///
/// Present: the entry is removed, the stored key is released once, and the
/// value's stored reference moves to the caller unchanged in count; the
/// caller must release it when done. Absent: `Ok(None)`.
pub fn pop(heap: &mut Heap, map: ObjId, key: ObjId) -> Result<Option<ObjId>> {
    match lookup(heap, map, key, "map::pop")? {
        Some(index) => {
            let entry = entries_mut(heap, map, "map::pop")?.remove(index);
            heap.release(entry.key)?;
            trace!(target: "refmodel::containers", map = %map, "map pop (removed)");
            Ok(Some(entry.value))
        }
        None => Ok(None),
    }
}

/// Number of entries.
pub fn len(heap: &Heap, map: ObjId) -> Result<usize> {
    Ok(entries(heap, map, "map::len")?.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_acquires_key_and_value() {
        let mut heap = Heap::new();
        let map = heap.new_map();
        let key = heap.alloc_str("key");
        let value = heap.alloc_str("value");
        set(&mut heap, map, Some(key), Some(value)).unwrap();
        assert_eq!(heap.refcount(key).unwrap(), 2);
        assert_eq!(heap.refcount(value).unwrap(), 2);
        assert_eq!(get(&heap, map, key).unwrap(), Some(value));
    }

    #[test]
    fn set_on_existing_key_retains_stored_key() {
        let mut heap = Heap::new();
        let map = heap.new_map();
        let key = heap.alloc_str("key");
        let v1 = heap.alloc_str("v1");
        let v2 = heap.alloc_str("v2");
        set(&mut heap, map, Some(key), Some(v1)).unwrap();
        set(&mut heap, map, Some(key), Some(v2)).unwrap();
        // Key count unchanged: the stored key was retained, not re-acquired.
        assert_eq!(heap.refcount(key).unwrap(), 2);
        assert_eq!(heap.refcount(v1).unwrap(), 1);
        assert_eq!(heap.refcount(v2).unwrap(), 2);
        assert_eq!(get(&heap, map, key).unwrap(), Some(v2));
    }

    #[test]
    fn set_with_value_equal_key_keeps_stored_key_object() {
        let mut heap = Heap::new();
        let map = heap.new_map();
        let stored_key = heap.alloc_str_exact("k");
        let probe_key = heap.alloc_str_exact("k");
        let v1 = heap.alloc_str("v1");
        let v2 = heap.alloc_str("v2");
        set(&mut heap, map, Some(stored_key), Some(v1)).unwrap();
        set(&mut heap, map, Some(probe_key), Some(v2)).unwrap();
        // Same logical key: stored identity kept, probe untouched.
        assert_eq!(len(&heap, map).unwrap(), 1);
        assert_eq!(heap.refcount(stored_key).unwrap(), 2);
        assert_eq!(heap.refcount(probe_key).unwrap(), 1);
    }

    #[test]
    fn identity_equal_reset_is_net_zero() {
        let mut heap = Heap::new();
        let map = heap.new_map();
        let key = heap.alloc_str("key");
        let value = heap.alloc_str("value");
        set(&mut heap, map, Some(key), Some(value)).unwrap();
        set(&mut heap, map, Some(key), Some(value)).unwrap();
        assert_eq!(heap.refcount(key).unwrap(), 2);
        assert_eq!(heap.refcount(value).unwrap(), 2);
    }

    #[test]
    fn set_rejects_unhashable_key_without_consuming() {
        let mut heap = Heap::new();
        let map = heap.new_map();
        let bad_key = heap.new_grow(0);
        let value = heap.alloc_str("kept");
        let err = set(&mut heap, map, Some(bad_key), Some(value)).unwrap_err();
        assert_eq!(err, Error::Unhashable("GrowSeq"));
        assert_eq!(heap.refcount(bad_key).unwrap(), 1);
        assert_eq!(heap.refcount(value).unwrap(), 1);
        assert_eq!(len(&heap, map).unwrap(), 0);
    }

    #[test]
    fn set_rejects_wrong_container_without_consuming() {
        let mut heap = Heap::new();
        let not_a_map = heap.new_grow(0);
        let key = heap.alloc_str("key");
        let value = heap.alloc_str("value");
        let err = set(&mut heap, not_a_map, Some(key), Some(value)).unwrap_err();
        assert!(matches!(err, Error::TypeMismatch { .. }));
        assert_eq!(heap.refcount(key).unwrap(), 1);
        assert_eq!(heap.refcount(value).unwrap(), 1);
    }

    #[test]
    fn set_requires_both_arguments() {
        let mut heap = Heap::new();
        let map = heap.new_map();
        let key = heap.alloc_str("key");
        assert_eq!(
            set(&mut heap, map, Some(key), None),
            Err(Error::NullArgument { op: "map::set" })
        );
        assert_eq!(
            set(&mut heap, map, None, None),
            Err(Error::NullArgument { op: "map::set" })
        );
        assert_eq!(heap.refcount(key).unwrap(), 1);
    }

    #[test]
    fn set_default_on_present_key_ignores_default() {
        let mut heap = Heap::new();
        let map = heap.new_map();
        let key = heap.alloc_str("key");
        let value = heap.alloc_str("value");
        let default = heap.alloc_str("default");
        set(&mut heap, map, Some(key), Some(value)).unwrap();
        let result = set_default(&mut heap, map, Some(key), Some(default)).unwrap();
        assert!(result.same(&value));
        assert_eq!(heap.refcount(default).unwrap(), 1);
        assert_eq!(heap.refcount(value).unwrap(), 2);
        assert_eq!(len(&heap, map).unwrap(), 1);
    }

    #[test]
    fn set_default_on_absent_key_stores_default_once() {
        let mut heap = Heap::new();
        let map = heap.new_map();
        let key = heap.alloc_str("key");
        let default = heap.alloc_str("default");
        let result = set_default(&mut heap, map, Some(key), Some(default)).unwrap();
        assert!(result.same(&default));
        assert_eq!(len(&heap, map).unwrap(), 1);
        // Stored exactly once: +1, not +2.
        assert_eq!(heap.refcount(default).unwrap(), 2);
        assert_eq!(heap.refcount(key).unwrap(), 2);
    }

    #[test]
    fn set_default_ref_returns_an_extra_strong_reference() {
        let mut heap = Heap::new();
        let map = heap.new_map();
        let key = heap.alloc_str("key");
        let value = heap.alloc_str("value");
        let default = heap.alloc_str("default");
        set(&mut heap, map, Some(key), Some(value)).unwrap();

        let mut out = None;
        let outcome = set_default_ref(&mut heap, map, Some(key), Some(default), &mut out).unwrap();
        assert_eq!(outcome, SetDefaultOutcome::Existing);
        assert_eq!(out, Some(value));
        // Caller's out-reference on top of caller + map.
        assert_eq!(heap.refcount(value).unwrap(), 3);
        assert_eq!(heap.refcount(default).unwrap(), 1);
    }

    #[test]
    fn set_default_ref_insert_acquires_stored_plus_result() {
        let mut heap = Heap::new();
        let map = heap.new_map();
        let key = heap.alloc_str("key");
        let default = heap.alloc_str("default");
        let mut out = None;
        let outcome = set_default_ref(&mut heap, map, Some(key), Some(default), &mut out).unwrap();
        assert_eq!(outcome, SetDefaultOutcome::Inserted);
        assert_eq!(out, Some(default));
        // caller + stored + out-reference
        assert_eq!(heap.refcount(default).unwrap(), 3);
        assert_eq!(heap.refcount(key).unwrap(), 2);
    }

    #[test]
    fn set_default_ref_abandons_previous_out_content() {
        let mut heap = Heap::new();
        let map = heap.new_map();
        let key = heap.alloc_str("key");
        let value = heap.alloc_str("value");
        let default = heap.alloc_str("default");
        let bystander = heap.alloc_str("bystander");
        set(&mut heap, map, Some(key), Some(value)).unwrap();

        let mut out = Some(bystander);
        set_default_ref(&mut heap, map, Some(key), Some(default), &mut out).unwrap();
        assert_eq!(out, Some(value));
        // The bystander was overwritten, not released.
        assert_eq!(heap.refcount(bystander).unwrap(), 1);
    }

    #[test]
    fn set_default_ref_failure_clears_out() {
        let mut heap = Heap::new();
        let not_a_map = heap.new_grow(0);
        let key = heap.alloc_str("key");
        let default = heap.alloc_str("default");
        let stale_content = heap.alloc_str("stale");
        let mut out = Some(stale_content);
        let err =
            set_default_ref(&mut heap, not_a_map, Some(key), Some(default), &mut out).unwrap_err();
        assert!(matches!(err, Error::TypeMismatch { .. }));
        assert_eq!(out, None);
        assert_eq!(heap.refcount(key).unwrap(), 1);
        assert_eq!(heap.refcount(default).unwrap(), 1);
    }

    #[test]
    fn pop_transfers_value_ownership_and_releases_key() {
        let mut heap = Heap::new();
        let map = heap.new_map();
        let key = heap.alloc_str("key");
        let value = heap.alloc_str("value");
        set(&mut heap, map, Some(key), Some(value)).unwrap();

        let popped = pop(&mut heap, map, key).unwrap();
        assert_eq!(popped, Some(value));
        assert_eq!(len(&heap, map).unwrap(), 0);
        // Key: caller-only again. Value: count unchanged, but the second
        // reference now belongs to the caller, not the map.
        assert_eq!(heap.refcount(key).unwrap(), 1);
        assert_eq!(heap.refcount(value).unwrap(), 2);
        heap.release(value).unwrap();
        assert_eq!(heap.refcount(value).unwrap(), 1);
    }

    #[test]
    fn pop_on_absent_key_is_none() {
        let mut heap = Heap::new();
        let map = heap.new_map();
        let key = heap.alloc_str("missing");
        assert_eq!(pop(&mut heap, map, key).unwrap(), None);
        assert_eq!(heap.refcount(key).unwrap(), 1);
    }

    #[test]
    fn get_borrows_without_acquiring() {
        let mut heap = Heap::new();
        let map = heap.new_map();
        let key = heap.alloc_str("key");
        let value = heap.alloc_str("value");
        set(&mut heap, map, Some(key), Some(value)).unwrap();
        let got = get(&heap, map, key).unwrap();
        assert_eq!(got, Some(value));
        assert_eq!(heap.refcount(value).unwrap(), 2);
    }

    #[test]
    fn destroying_the_map_releases_keys_and_values() {
        let mut heap = Heap::new();
        let map = heap.new_map();
        let key = heap.alloc_str("key");
        let value = heap.alloc_str("value");
        set(&mut heap, map, Some(key), Some(value)).unwrap();
        heap.release(map).unwrap();
        assert_eq!(heap.refcount(key).unwrap(), 1);
        assert_eq!(heap.refcount(value).unwrap(), 1);
    }
}
