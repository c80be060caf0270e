//! Contract outcome types
//!
//! Small enums that make the ownership contracts explicit in signatures
//! instead of encoding them in magic integers:
//! - [`Kind`]: payload kind discriminator; hashability is a property of the
//!   kind, not of individual objects.
//! - [`ReleaseOutcome`]: what a release did (count still positive vs. object
//!   destroyed).
//! - [`SetDefaultOutcome`]: whether a set-default found the key or inserted
//!   the default (the modeled API reports this as 1 / 0 around a failure
//!   sentinel; a sum type removes the sentinel).

use serde::{Deserialize, Serialize};
use std::fmt;

/// Payload kind of an object
///
/// The container operations validate their target against this discriminator
/// before touching anything, and map insertion validates the *key's* kind:
/// only scalar payloads hash.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Kind {
    /// Uniquely tagged string scalar
    Str,
    /// Fixed-length slot sequence (length set at allocation)
    FixedSeq,
    /// Growable slot sequence
    GrowSeq,
    /// Key-to-value associative map
    Map,
    /// Composite record: two string fields plus a plain integer
    Record,
}

impl Kind {
    /// Static name used in error messages.
    pub fn name(&self) -> &'static str {
        match self {
            Kind::Str => "Str",
            Kind::FixedSeq => "FixedSeq",
            Kind::GrowSeq => "GrowSeq",
            Kind::Map => "Map",
            Kind::Record => "Record",
        }
    }

    /// Whether objects of this kind may serve as map keys.
    ///
    /// Containers and records are unhashable: their identity is stable but
    /// their contents are not, so admitting them as keys would let a key's
    /// hash drift after insertion.
    pub fn is_hashable(&self) -> bool {
        matches!(self, Kind::Str)
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Result of a successful release
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReleaseOutcome {
    /// The object survives with the given refcount.
    Alive(usize),
    /// The count reached zero; the object (and, for containers, its
    /// occupants) was destroyed and the identity is now stale.
    Destroyed,
}

impl ReleaseOutcome {
    /// True when the release destroyed the object.
    pub fn destroyed(&self) -> bool {
        matches!(self, ReleaseOutcome::Destroyed)
    }
}

/// Result of a successful `map::set_default_ref`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetDefaultOutcome {
    /// The key was already present; the default was not stored or acquired.
    Existing,
    /// The key was absent; the default was stored (and acquired).
    Inserted,
}
