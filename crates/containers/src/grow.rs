//! Growable sequence operations
//!
//! ## Ownership contract
//!
//! Two families with opposite rules live on this container:
//!
//! - `replace` **steals**, exactly like the fixed-sequence variant (including
//!   consumption-on-failure and the self-replacement hazard), minus the
//!   exclusivity rule; growable sequences stay mutable while shared.
//! - `append` and `insert` **acquire**: the container takes its own
//!   reference and the caller keeps theirs. A caller that no longer needs
//!   the value must release its own reference separately. Failures consume
//!   nothing.
//!
//! ## Index policy
//!
//! `replace` addresses existing slots and reports `IndexOutOfRange` past the
//! end. `insert` accepts any signed index and clamps it to `[0, len]`:
//! a negative index inserts at the front, an index past the end appends.
//! Callers must not assume raw indices are preserved.

use refmodel_core::{Error, Kind, ObjId, Result};
use refmodel_heap::{Heap, Payload};
use tracing::trace;

fn slots_mut<'h>(heap: &'h mut Heap, seq: ObjId, op: &'static str) -> Result<&'h mut Vec<Option<ObjId>>> {
    match heap.payload_mut(seq)? {
        Payload::GrowSeq(slots) => Ok(slots),
        other => Err(Error::type_mismatch(op, Kind::GrowSeq.name(), other.kind().name())),
    }
}

fn slots<'h>(heap: &'h Heap, seq: ObjId, op: &'static str) -> Result<&'h Vec<Option<ObjId>>> {
    match heap.payload(seq)? {
        Payload::GrowSeq(slots) => Ok(slots),
        other => Err(Error::type_mismatch(op, Kind::GrowSeq.name(), other.kind().name())),
    }
}

/// Replace the slot at `index` with `value`, stealing the caller's reference.
///
/// `None` clears the slot. The displaced occupant is released once, with no
/// identity special-case. On failure the incoming value is released anyway.
pub fn replace(heap: &mut Heap, seq: ObjId, index: usize, value: Option<ObjId>) -> Result<()> {
    let checked = slots(heap, seq, "grow::replace").map(Vec::len).and_then(|len| {
        if index >= len {
            Err(Error::IndexOutOfRange { index, len })
        } else {
            Ok(())
        }
    });
    if let Err(err) = checked {
        if let Some(v) = value {
            heap.release(v)?;
        }
        return Err(err);
    }
    let previous = {
        let slots = slots_mut(heap, seq, "grow::replace")?;
        std::mem::replace(&mut slots[index], value)
    };
    trace!(target: "refmodel::containers", seq = %seq, index, "grow replace");
    if let Some(prev) = previous {
        heap.release(prev)?;
    }
    Ok(())
}

/// Replace the slot at `index` without validation and without releasing the
/// displaced occupant.
///
/// Caller guarantees a live growable sequence and an in-range index;
/// violations panic. The displaced occupant's reference is abandoned in
/// place (the documented leak).
pub fn replace_unchecked(heap: &mut Heap, seq: ObjId, index: usize, value: Option<ObjId>) {
    let payload = heap
        .payload_mut(seq)
        .expect("grow::replace_unchecked: caller guarantees a live target");
    match payload {
        Payload::GrowSeq(slots) => slots[index] = value,
        other => panic!(
            "grow::replace_unchecked: caller guarantees a GrowSeq, found {}",
            other.kind().name()
        ),
    }
    trace!(target: "refmodel::containers", seq = %seq, index, "grow replace (unchecked)");
}

/// Append `value`, acquiring it. The caller's reference is untouched.
///
/// An absent value is `NullArgument`; failures consume nothing.
pub fn append(heap: &mut Heap, seq: ObjId, value: Option<ObjId>) -> Result<()> {
    let value = value.ok_or(Error::NullArgument { op: "grow::append" })?;
    // Validate the target before acquiring so a failed call leaves the
    // caller's reference untouched.
    slots(heap, seq, "grow::append")?;
    heap.acquire(value)?;
    match heap.payload_mut(seq)? {
        Payload::GrowSeq(slots) => slots.push(Some(value)),
        _ => unreachable!("kind checked above"),
    }
    trace!(target: "refmodel::containers", seq = %seq, "grow append");
    Ok(())
}

/// Insert `value` at a clamped position, acquiring it.
///
/// `index` clamps to `[0, len]`: negative inserts at the front, past-the-end
/// appends. Subsequent occupants shift; nothing is released. An absent value
/// is `NullArgument`; failures consume nothing.
pub fn insert(heap: &mut Heap, seq: ObjId, index: isize, value: Option<ObjId>) -> Result<()> {
    let value = value.ok_or(Error::NullArgument { op: "grow::insert" })?;
    let len = slots(heap, seq, "grow::insert")?.len();
    let position = index.clamp(0, len as isize) as usize;
    heap.acquire(value)?;
    match heap.payload_mut(seq)? {
        Payload::GrowSeq(slots) => slots.insert(position, Some(value)),
        _ => unreachable!("kind checked above"),
    }
    trace!(target: "refmodel::containers", seq = %seq, index, position, "grow insert");
    Ok(())
}

/// Borrow the occupant of the slot at `index` (no acquire).
pub fn get(heap: &Heap, seq: ObjId, index: usize) -> Result<Option<ObjId>> {
    let slots = slots(heap, seq, "grow::get")?;
    match slots.get(index) {
        Some(slot) => Ok(*slot),
        None => Err(Error::IndexOutOfRange { index, len: slots.len() }),
    }
}

/// Current length of the sequence.
pub fn len(heap: &Heap, seq: ObjId) -> Result<usize> {
    Ok(slots(heap, seq, "grow::len")?.len())
}
