//! Fixed-length sequence operations
//!
//! ## Ownership contract
//!
//! `replace` **steals**: on success the sequence becomes the sole owner of
//! the incoming value without acquiring it; ownership transfers from the
//! caller. The flip side is the failure policy: when the checked variant
//! rejects the call (wrong kind, finalized target, out-of-range slot), the
//! caller's reference is **released anyway**. Error reporting and reference
//! consumption are decoupled on purpose; callers that retry after a failure
//! without re-acquiring have already lost their reference.
//!
//! ## Exclusivity (finalization)
//!
//! The checked `replace` additionally requires the sequence itself to be
//! exclusively owned (refcount 1). A sequence that has been shared is
//! finalized; mutating it fails through the same channel as a kind mismatch,
//! consuming the value.
//!
//! ## Hazards, preserved
//!
//! - *Self-replacement*: `replace` releases the displaced occupant without
//!   comparing identities. Replacing a slot with the object already stored
//!   there therefore drops that object's count by one; if the slot held the
//!   only reference, the object dies and the slot is left holding a dangling
//!   identity.
//! - *Unchecked write*: `replace_unchecked` skips validation **and** skips
//!   the displaced-occupant release; the previous occupant's reference is
//!   abandoned in place (a leak, observable in the heap census). Violating
//!   the caller-guaranteed preconditions panics.

use refmodel_core::{Error, Kind, ObjId, Result};
use refmodel_heap::{Heap, Payload};
use tracing::trace;

fn check_target(heap: &Heap, seq: ObjId, index: usize) -> Result<()> {
    let kind = heap.kind(seq)?;
    if kind != Kind::FixedSeq {
        return Err(Error::type_mismatch("fixed::replace", Kind::FixedSeq.name(), kind.name()));
    }
    if heap.refcount(seq)? != 1 {
        return Err(Error::type_mismatch(
            "fixed::replace",
            Kind::FixedSeq.name(),
            "shared FixedSeq (finalized)",
        ));
    }
    let len = len(heap, seq)?;
    if index >= len {
        return Err(Error::IndexOutOfRange { index, len });
    }
    Ok(())
}

/// Replace the slot at `index` with `value`, stealing the caller's reference.
///
/// `None` clears the slot. The displaced occupant, if any, is released once,
/// with no identity special-case (see module docs for the self-replacement
/// hazard). On failure the incoming value is released anyway and the error is
/// returned.
pub fn replace(heap: &mut Heap, seq: ObjId, index: usize, value: Option<ObjId>) -> Result<()> {
    if let Err(err) = check_target(heap, seq, index) {
        // Consumption-on-failure: the steal happens even though the store
        // does not.
        if let Some(v) = value {
            heap.release(v)?;
        }
        return Err(err);
    }
    let previous = match heap.payload_mut(seq)? {
        Payload::FixedSeq(slots) => std::mem::replace(&mut slots[index], value),
        _ => unreachable!("kind checked above"),
    };
    trace!(target: "refmodel::containers", seq = %seq, index, "fixed replace");
    if let Some(prev) = previous {
        heap.release(prev)?;
    }
    Ok(())
}

/// Replace the slot at `index` without validation and without releasing the
/// displaced occupant.
///
/// The caller guarantees that `seq` is a live fixed sequence and `index` is
/// in range; a violated guarantee panics. The previous occupant's reference
/// is abandoned in place, which the heap census reports as a leak. This is
/// the documented behavior of the raw slot write, not an oversight. Because
/// nothing is released, writing a slot's current occupant back into it is
/// harmless here.
pub fn replace_unchecked(heap: &mut Heap, seq: ObjId, index: usize, value: Option<ObjId>) {
    let payload = heap
        .payload_mut(seq)
        .expect("fixed::replace_unchecked: caller guarantees a live target");
    match payload {
        Payload::FixedSeq(slots) => slots[index] = value,
        other => panic!(
            "fixed::replace_unchecked: caller guarantees a FixedSeq, found {}",
            other.kind().name()
        ),
    }
    trace!(target: "refmodel::containers", seq = %seq, index, "fixed replace (unchecked)");
}

/// Build a fixed sequence holding exactly `values`, acquiring each one.
///
/// The borrowed dual of `replace`: callers keep their own references and
/// release them separately.
pub fn pack(heap: &mut Heap, values: &[ObjId]) -> Result<ObjId> {
    // Validate liveness up front so a stale argument fails before anything
    // is acquired.
    for &v in values {
        heap.refcount(v)?;
    }
    let seq = heap.new_fixed(values.len());
    for (index, &v) in values.iter().enumerate() {
        heap.acquire(v)?;
        match heap.payload_mut(seq)? {
            Payload::FixedSeq(slots) => slots[index] = Some(v),
            _ => unreachable!("freshly allocated FixedSeq"),
        }
    }
    trace!(target: "refmodel::containers", seq = %seq, len = values.len(), "fixed pack");
    Ok(seq)
}

/// Borrow the occupant of the slot at `index` (no acquire).
///
/// `Ok(None)` for an empty slot. The returned handle is plain data; whether
/// it is still live is the caller's problem, exactly as in the modeled API.
pub fn get(heap: &Heap, seq: ObjId, index: usize) -> Result<Option<ObjId>> {
    match heap.payload(seq)? {
        Payload::FixedSeq(slots) => match slots.get(index) {
            Some(slot) => Ok(*slot),
            None => Err(Error::IndexOutOfRange { index, len: slots.len() }),
        },
        other => Err(Error::type_mismatch("fixed::get", Kind::FixedSeq.name(), other.kind().name())),
    }
}

/// Length of the sequence (slot count, occupied or not).
pub fn len(heap: &Heap, seq: ObjId) -> Result<usize> {
    match heap.payload(seq)? {
        Payload::FixedSeq(slots) => Ok(slots.len()),
        other => Err(Error::type_mismatch("fixed::len", Kind::FixedSeq.name(), other.kind().name())),
    }
}
