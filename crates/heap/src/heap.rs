//! The object heap
//!
//! ## Design
//!
//! - Slots are generation-tagged: destroying an object bumps its slot's
//!   generation, so outstanding handles become detectably stale instead of
//!   silently aliasing a recycled slot.
//! - Destruction cascades through an explicit worklist: when a container
//!   dies, each occupant is released exactly once; occupants that reach zero
//!   join the worklist. No recursion, no double release.
//! - A dangling occupant discovered mid-cascade aborts the cascade with
//!   `UseAfterFree`, the safe stand-in for crashing while tearing down a
//!   container that holds a dangling reference; the remaining worklist
//!   entries keep their counts, which the census then exposes.
//!
//! ## What the heap does not do
//!
//! It never acquires or releases on the caller's behalf. Which operations
//! consume, borrow, or steal references is entirely the contract layer's
//! business (`refmodel-containers`).

use crate::payload::Payload;
use refmodel_core::{Error, Kind, ObjId, ReleaseOutcome, Result};
use rustc_hash::FxHasher;
use smallvec::SmallVec;
use std::hash::{Hash, Hasher};
use tracing::{debug, trace};

/// Running counters for a heap
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HeapStats {
    /// Objects currently live
    pub live: usize,
    /// Objects allocated over the heap's lifetime
    pub total_allocated: usize,
    /// Objects destroyed over the heap's lifetime
    pub total_destroyed: usize,
}

struct ObjCell {
    refcount: usize,
    payload: Payload,
}

struct Slot {
    generation: u32,
    cell: Option<ObjCell>,
}

/// Single-threaded reference-counted object heap
///
/// All mutation goes through `&mut self`, which makes the single-writer
/// discipline structural: two operations cannot overlap.
pub struct Heap {
    slots: Vec<Slot>,
    free: Vec<u32>,
    stats: HeapStats,
    serial: u64,
}

impl Heap {
    /// Create an empty heap.
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            stats: HeapStats::default(),
            serial: 0,
        }
    }

    // ========== Allocation ==========

    fn alloc(&mut self, payload: Payload) -> ObjId {
        let kind = payload.kind();
        let cell = ObjCell {
            refcount: 1,
            payload,
        };
        let id = match self.free.pop() {
            Some(index) => {
                let slot = &mut self.slots[index as usize];
                slot.cell = Some(cell);
                ObjId::from_raw(index, slot.generation)
            }
            None => {
                let index = self.slots.len() as u32;
                self.slots.push(Slot {
                    generation: 0,
                    cell: Some(cell),
                });
                ObjId::from_raw(index, 0)
            }
        };
        self.stats.live += 1;
        self.stats.total_allocated += 1;
        debug!(target: "refmodel::heap", id = %id, kind = %kind, "object allocated");
        id
    }

    /// Allocate a uniquely tagged string (refcount 1).
    ///
    /// The serial suffix guarantees structurally distinct payloads per call,
    /// so scenarios can tell apart which of two objects survived.
    pub fn alloc_str(&mut self, label: &str) -> ObjId {
        let text = format!("{label}-{}", self.serial);
        self.serial += 1;
        self.alloc(Payload::Str(text))
    }

    /// Allocate a string with exactly the given text (refcount 1).
    ///
    /// Needed when a scenario wants two *structurally equal* objects with
    /// distinct identities, e.g. to probe map-key retention.
    pub fn alloc_str_exact(&mut self, text: &str) -> ObjId {
        self.alloc(Payload::Str(text.to_string()))
    }

    /// Allocate a fixed-length sequence, every slot empty (refcount 1).
    pub fn new_fixed(&mut self, len: usize) -> ObjId {
        self.alloc(Payload::FixedSeq(vec![None; len].into_boxed_slice()))
    }

    /// Allocate a growable sequence with `len` empty slots (refcount 1).
    pub fn new_grow(&mut self, len: usize) -> ObjId {
        self.alloc(Payload::GrowSeq(vec![None; len]))
    }

    /// Allocate an empty map (refcount 1).
    pub fn new_map(&mut self) -> ObjId {
        self.alloc(Payload::Map(Vec::new()))
    }

    /// Allocate a record with two fresh empty-string fields (refcount 1).
    ///
    /// The field objects are owned by the record (refcount 1 each) and are
    /// released when the record is destroyed.
    pub fn new_record(&mut self) -> ObjId {
        let first = self.alloc_str_exact("");
        let last = self.alloc_str_exact("");
        self.alloc(Payload::Record {
            first,
            last,
            number: 0,
        })
    }

    // ========== Ownership primitives ==========

    /// Take one additional strong reference (+1). Never fails on a live
    /// object; a stale handle is `UseAfterFree`.
    pub fn acquire(&mut self, id: ObjId) -> Result<()> {
        let cell = self.cell_mut(id)?;
        cell.refcount += 1;
        trace!(target: "refmodel::heap", id = %id, refcount = cell.refcount, "acquire");
        Ok(())
    }

    /// Give up one strong reference (−1); destroys the object at zero.
    ///
    /// Destroying a container releases every occupant exactly once, which
    /// may cascade. A stale occupant aborts the cascade with `UseAfterFree`.
    pub fn release(&mut self, id: ObjId) -> Result<ReleaseOutcome> {
        let cell = self.cell_mut(id)?;
        cell.refcount -= 1;
        if cell.refcount > 0 {
            let refcount = cell.refcount;
            trace!(target: "refmodel::heap", id = %id, refcount, "release");
            return Ok(ReleaseOutcome::Alive(refcount));
        }
        self.destroy(id)?;
        Ok(ReleaseOutcome::Destroyed)
    }

    fn destroy(&mut self, id: ObjId) -> Result<()> {
        let mut pending: SmallVec<[ObjId; 8]> = SmallVec::new();
        self.free_slot(id, &mut pending);
        while let Some(occupant) = pending.pop() {
            // A stale occupant here is the modeled API's crash point.
            let cell = self.cell_mut(occupant)?;
            cell.refcount -= 1;
            if cell.refcount == 0 {
                self.free_slot(occupant, &mut pending);
            } else {
                trace!(
                    target: "refmodel::heap",
                    id = %occupant,
                    "occupant released by cascade"
                );
            }
        }
        Ok(())
    }

    fn free_slot(&mut self, id: ObjId, pending: &mut SmallVec<[ObjId; 8]>) {
        let slot = &mut self.slots[id.index() as usize];
        let cell = slot
            .cell
            .take()
            .expect("free_slot called on an empty slot");
        pending.extend(cell.payload.owned_refs());
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(id.index());
        self.stats.live -= 1;
        self.stats.total_destroyed += 1;
        debug!(target: "refmodel::heap", id = %id, "object destroyed");
    }

    // ========== Inspection ==========

    /// Current refcount of a live object.
    pub fn refcount(&self, id: ObjId) -> Result<usize> {
        Ok(self.cell(id)?.refcount)
    }

    /// Whether the handle still addresses a live object.
    pub fn is_live(&self, id: ObjId) -> bool {
        self.cell(id).is_ok()
    }

    /// Payload kind of a live object.
    pub fn kind(&self, id: ObjId) -> Result<Kind> {
        Ok(self.cell(id)?.payload.kind())
    }

    /// Borrow the payload of a live object.
    pub fn payload(&self, id: ObjId) -> Result<&Payload> {
        Ok(&self.cell(id)?.payload)
    }

    /// Mutably borrow the payload of a live object.
    ///
    /// Contract layer only: every `ObjId` written into a container payload
    /// must correspond to exactly one strong reference the container owns.
    pub fn payload_mut(&mut self, id: ObjId) -> Result<&mut Payload> {
        Ok(&mut self.cell_mut(id)?.payload)
    }

    /// Text of a string object.
    pub fn str_value(&self, id: ObjId) -> Result<&str> {
        match &self.cell(id)?.payload {
            Payload::Str(text) => Ok(text),
            other => Err(Error::type_mismatch(
                "heap::str_value",
                Kind::Str.name(),
                other.kind().name(),
            )),
        }
    }

    /// Structural payload equality, distinct from identity.
    ///
    /// Scalars compare by text. Containers and records have no structural
    /// equality in this model; they compare equal only to themselves.
    pub fn value_eq(&self, a: ObjId, b: ObjId) -> Result<bool> {
        if a == b {
            // Still validate liveness: comparing a dangling identity is misuse.
            self.cell(a)?;
            return Ok(true);
        }
        match (&self.cell(a)?.payload, &self.cell(b)?.payload) {
            (Payload::Str(x), Payload::Str(y)) => Ok(x == y),
            _ => Ok(false),
        }
    }

    /// Hash of a hashable object's payload.
    ///
    /// Container-kind payloads are rejected with `Unhashable`: their identity
    /// is stable but their contents are not.
    pub fn key_hash(&self, id: ObjId) -> Result<u64> {
        let cell = self.cell(id)?;
        match &cell.payload {
            Payload::Str(text) => {
                let mut hasher = FxHasher::default();
                text.hash(&mut hasher);
                Ok(hasher.finish())
            }
            other => Err(Error::Unhashable(other.kind().name())),
        }
    }

    /// Number of live objects.
    pub fn live_count(&self) -> usize {
        self.stats.live
    }

    /// Handles of every live object, in slot order.
    ///
    /// The harness uses this to name leaked objects in failure details.
    pub fn live_ids(&self) -> Vec<ObjId> {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.cell.is_some())
            .map(|(index, slot)| ObjId::from_raw(index as u32, slot.generation))
            .collect()
    }

    /// Lifetime counters.
    pub fn stats(&self) -> HeapStats {
        self.stats
    }

    // ========== Internal ==========

    fn cell(&self, id: ObjId) -> Result<&ObjCell> {
        self.slots
            .get(id.index() as usize)
            .filter(|slot| slot.generation == id.generation())
            .and_then(|slot| slot.cell.as_ref())
            .ok_or(Error::UseAfterFree(id))
    }

    fn cell_mut(&mut self, id: ObjId) -> Result<&mut ObjCell> {
        self.slots
            .get_mut(id.index() as usize)
            .filter(|slot| slot.generation == id.generation())
            .and_then(|slot| slot.cell.as_mut())
            .ok_or(Error::UseAfterFree(id))
    }
}

impl Default for Heap {
    fn default() -> Self {
        Self::new()
    }
}
