//! Record operations
//!
//! Records are the composite-object collaborator at the model's boundary:
//! two string fields that are themselves reference-counted handles, plus a
//! plain integer. Their whole contract surface is construct/destroy (the
//! heap releases both fields exactly once when the record dies) and the
//! field accessors here.
//!
//! ## Ownership contract
//!
//! - Setters acquire the incoming string *first*, then release the displaced
//!   field; the ordering makes self-assignment safe.
//! - Getters hand out a **newly acquired** strong reference; the caller owns
//!   it and must release it.
//! - `full_name` allocates a fresh string object (refcount 1, caller-owned)
//!   combining both fields.

use refmodel_core::{Error, Kind, ObjId, Result};
use refmodel_heap::{Heap, Payload};
use tracing::trace;

fn fields(heap: &Heap, rec: ObjId, op: &'static str) -> Result<(ObjId, ObjId, i64)> {
    match heap.payload(rec)? {
        Payload::Record { first, last, number } => Ok((*first, *last, *number)),
        other => Err(Error::type_mismatch(op, Kind::Record.name(), other.kind().name())),
    }
}

/// Strong reference to the first field; the caller must release it.
pub fn first(heap: &mut Heap, rec: ObjId) -> Result<ObjId> {
    let (first, _, _) = fields(heap, rec, "record::first")?;
    heap.acquire(first)?;
    Ok(first)
}

/// Strong reference to the second field; the caller must release it.
pub fn last(heap: &mut Heap, rec: ObjId) -> Result<ObjId> {
    let (_, last, _) = fields(heap, rec, "record::last")?;
    heap.acquire(last)?;
    Ok(last)
}

fn set_field(
    heap: &mut Heap,
    rec: ObjId,
    value: Option<ObjId>,
    op: &'static str,
    pick_first: bool,
) -> Result<()> {
    let value = value.ok_or(Error::NullArgument { op })?;
    // Field type check before any ownership effect.
    let value_kind = heap.kind(value)?;
    if value_kind != Kind::Str {
        return Err(Error::type_mismatch(op, Kind::Str.name(), value_kind.name()));
    }
    fields(heap, rec, op)?;
    // Acquire the replacement, then release the displaced field; the order
    // keeps self-assignment from dropping the count through zero.
    heap.acquire(value)?;
    let previous = match heap.payload_mut(rec)? {
        Payload::Record { first, last, .. } => {
            let field = if pick_first { first } else { last };
            std::mem::replace(field, value)
        }
        _ => unreachable!("kind checked above"),
    };
    heap.release(previous)?;
    trace!(target: "refmodel::containers", rec = %rec, op, "record field set");
    Ok(())
}

/// Replace the first field, acquiring the new string and releasing the old.
pub fn set_first(heap: &mut Heap, rec: ObjId, value: Option<ObjId>) -> Result<()> {
    set_field(heap, rec, value, "record::set_first", true)
}

/// Replace the second field, acquiring the new string and releasing the old.
pub fn set_last(heap: &mut Heap, rec: ObjId, value: Option<ObjId>) -> Result<()> {
    set_field(heap, rec, value, "record::set_last", false)
}

/// The integer field. Plain data, no ownership effect.
pub fn number(heap: &Heap, rec: ObjId) -> Result<i64> {
    let (_, _, number) = fields(heap, rec, "record::number")?;
    Ok(number)
}

/// Set the integer field. Plain data, no ownership effect.
pub fn set_number(heap: &mut Heap, rec: ObjId, value: i64) -> Result<()> {
    match heap.payload_mut(rec)? {
        Payload::Record { number, .. } => {
            *number = value;
            Ok(())
        }
        other => Err(Error::type_mismatch(
            "record::set_number",
            Kind::Record.name(),
            other.kind().name(),
        )),
    }
}

/// Allocate a fresh string combining both fields ("first last").
///
/// The result is a new object with refcount 1, owned by the caller.
pub fn full_name(heap: &mut Heap, rec: ObjId) -> Result<ObjId> {
    let (first, last, _) = fields(heap, rec, "record::full_name")?;
    let combined = format!("{} {}", heap.str_value(first)?, heap.str_value(last)?);
    Ok(heap.alloc_str_exact(&combined))
}
