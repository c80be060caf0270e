//! Reference-counted object runtime for RefModel
//!
//! This crate is the engine the container contracts are built on: a
//! single-threaded heap of generation-tagged slots, each holding a payload
//! and a live reference count.
//!
//! ## Ownership discipline
//!
//! Owning is explicit: `acquire` is +1, `release` is −1, and a count of zero
//! destroys the object on the spot; slots holding references into it become
//! dangling identities. The runtime never pairs acquires and releases on the
//! caller's behalf; that pairing *is* the contract surface the containers
//! specify and the harness verifies.
//!
//! ## Determinism
//!
//! Allocation order, destruction order (worklist, LIFO), and the serial tags
//! on string payloads are all deterministic, so scenario outcomes are exactly
//! reproducible across runs.

pub mod heap;
pub mod payload;

pub use heap::{Heap, HeapStats};
pub use payload::{MapEntry, Payload};
