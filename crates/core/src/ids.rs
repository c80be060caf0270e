//! Object identity
//!
//! This module defines `ObjId`, the handle through which every object in the
//! model is addressed.
//!
//! ## Identity vs. value
//!
//! `ObjId` equality is *reference* equality: two handles are equal exactly
//! when they address the same live allocation. Structural comparison of
//! payloads is a separate operation (`Heap::value_eq`); the two must never be
//! conflated, because several mutation contracts hinge on whether an incoming
//! value *is* the stored occupant, not whether it merely looks like it.
//!
//! ## Staleness
//!
//! An `ObjId` captures the generation of its slot at allocation time. When an
//! object is destroyed the slot's generation advances, so every outstanding
//! handle to the dead object becomes detectably stale. A stale handle is the
//! model's dangling pointer: the identity survives as a value, but every
//! primitive invoked on it reports `UseAfterFree`.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Generation-tagged handle to an object in a heap
///
/// Plain data: copying an `ObjId` never affects any refcount. Ownership is a
/// protocol between caller and runtime, not a property of the handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ObjId {
    index: u32,
    generation: u32,
}

impl ObjId {
    /// Create a handle from raw slot coordinates.
    ///
    /// Intended for the runtime only; a fabricated handle is simply stale.
    pub fn from_raw(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    /// Slot index within the heap.
    pub fn index(&self) -> u32 {
        self.index
    }

    /// Slot generation this handle was minted against.
    pub fn generation(&self) -> u32 {
        self.generation
    }

    /// Reference-equality check, spelled out for call sites where a bare
    /// `==` would read as structural comparison.
    pub fn same(&self, other: &ObjId) -> bool {
        self == other
    }
}

impl fmt::Display for ObjId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "obj:{}.{}", self.index, self.generation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_is_index_plus_generation() {
        let a = ObjId::from_raw(3, 1);
        let b = ObjId::from_raw(3, 1);
        let c = ObjId::from_raw(3, 2);
        assert!(a.same(&b));
        assert!(!a.same(&c));
        assert_ne!(a, c);
    }

    #[test]
    fn display_is_compact() {
        assert_eq!(ObjId::from_raw(7, 2).to_string(), "obj:7.2");
    }

    #[test]
    fn serde_round_trip() {
        let id = ObjId::from_raw(5, 9);
        let json = serde_json::to_string(&id).unwrap();
        let back: ObjId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, back);
    }
}
