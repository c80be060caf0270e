//! Core types and contracts for RefModel
//!
//! This crate defines the foundational types used throughout the system:
//! - ObjId: Generation-tagged object identity
//! - Kind: Payload kind discriminator (hashability lives here)
//! - Error: Error type hierarchy
//! - Report: Per-scenario pass/fail report
//! - Contract outcome types (ReleaseOutcome, SetDefaultOutcome)
//!
//! No behavior lives here: the runtime is in `refmodel-heap`, the mutation
//! contracts in `refmodel-containers`, the scenario machinery in
//! `refmodel-harness`.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod contract;
pub mod error;
pub mod ids;
pub mod report;

pub use contract::{Kind, ReleaseOutcome, SetDefaultOutcome};
pub use error::{Error, Result};
pub use ids::ObjId;
pub use report::Report;
