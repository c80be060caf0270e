//! Error types for RefModel
//!
//! Every fallible operation reports through this enum, scoped to the call;
//! there is no ambient "last error" state to clear between operations.
//!
//! Note that error *reporting* and reference *consumption* are decoupled:
//! whether a failing operation consumed the caller's reference is fixed per
//! operation (see `refmodel-containers`), not per error kind. An
//! `IndexOutOfRange` from a checked fixed-sequence replace has consumed the
//! incoming value; the same error never arises from insert, which clamps.

use crate::ids::ObjId;
use thiserror::Error;

/// Result type alias for RefModel operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for the RefModel runtime and container operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// Operation invoked on the wrong container variant, or on a fixed
    /// sequence that is no longer exclusively owned (finalized).
    #[error("type mismatch: {op} requires {expected}, found {found}")]
    TypeMismatch {
        /// Operation that rejected the container
        op: &'static str,
        /// Container kind the operation requires
        expected: &'static str,
        /// Kind actually found (or a finalization note)
        found: String,
    },

    /// Slot index outside the container bounds (fixed sequences always;
    /// growable sequences only for checked replace, since insert clamps).
    #[error("index {index} out of range for length {len}")]
    IndexOutOfRange {
        /// Requested slot index
        index: usize,
        /// Container length at the time of the call
        len: usize,
    },

    /// A container-kind object was used where a hashable key is required.
    #[error("unhashable key kind: {0}")]
    Unhashable(&'static str),

    /// A required value argument was absent.
    #[error("{op}: required value argument was absent")]
    NullArgument {
        /// Operation that required the value
        op: &'static str,
    },

    /// A primitive was invoked on a stale identity.
    ///
    /// Reaching this error means an ownership contract was already violated
    /// upstream; it exists so the harness can demonstrate misuse, not so
    /// callers can recover from it.
    #[error("use after free: {0} addresses a destroyed object")]
    UseAfterFree(ObjId),
}

impl Error {
    /// Shorthand used by container operations rejecting a wrong-kind target.
    pub fn type_mismatch(op: &'static str, expected: &'static str, found: impl Into<String>) -> Self {
        Error::TypeMismatch {
            op,
            expected,
            found: found.into(),
        }
    }
}
