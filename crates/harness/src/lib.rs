//! Scenario verification harness for RefModel
//!
//! The harness is the executable specification of the mutation contracts:
//! each [`Scenario`] constructs objects and containers on a fresh heap,
//! performs one contract call (or the short sequence a multi-step hazard
//! needs), asserts the exact post-condition refcounts and error outcomes,
//! and tears down with a census that catches both accidental leaks and
//! missing documented ones.
//!
//! ## Running
//!
//! The `refmodel-harness` binary runs the whole suite and prints one report
//! line per scenario (`--json` for machine output, an argument substring to
//! filter). Library consumers use [`run_all`] / [`run_matching`] directly.
//!
//! ## Hazards
//!
//! Scenarios provoking the modeled use-after-free are compiled only with
//! the `hazard-scenarios` feature and are appended to the registry there.

pub mod runner;
pub mod scenario;
pub mod scenarios;

pub use runner::{render_table, run_all, run_matching, SUITE};
pub use scenario::{Phase, Scenario, ScenarioCtx};
