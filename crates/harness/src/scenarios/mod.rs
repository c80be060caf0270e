//! The scenario suites
//!
//! One module per container family plus the records, each scenario probing a
//! single contract row (or the short sequence a multi-step hazard needs).
//! Together the suites are the executable form of the contract tables in the
//! container modules' documentation.
//!
//! Scenarios that deliberately provoke the modeled use-after-free live in
//! [`hazards`] and are compiled only with the `hazard-scenarios` feature:
//! they demonstrate misuse whose real-world counterpart terminates the
//! process, so they stay out of default runs.

use crate::scenario::Scenario;

pub mod fixed;
pub mod grow;
#[cfg(feature = "hazard-scenarios")]
pub mod hazards;
pub mod map;
pub mod record;

/// Every scenario in registration order.
pub fn all() -> Vec<Scenario> {
    let mut suite = Vec::new();
    suite.extend(fixed::scenarios());
    suite.extend(grow::scenarios());
    suite.extend(map::scenarios());
    suite.extend(record::scenarios());
    #[cfg(feature = "hazard-scenarios")]
    suite.extend(hazards::scenarios());
    suite
}
