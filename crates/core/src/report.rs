//! Scenario reports
//!
//! The harness's only external interface besides the API surface itself:
//! one [`Report`] per scenario, serializable for machine consumption.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Pass/fail report for a single verification scenario
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
    /// Scenario name (unique within a suite)
    pub scenario: String,
    /// Whether every assertion and the teardown census held
    pub passed: bool,
    /// Failure detail: the first assertion that did not hold, with observed
    /// vs expected values. `None` on success.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl Report {
    /// Build a passing report.
    pub fn pass(scenario: impl Into<String>) -> Self {
        Self {
            scenario: scenario.into(),
            passed: true,
            detail: None,
        }
    }

    /// Build a failing report with detail.
    pub fn fail(scenario: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            scenario: scenario.into(),
            passed: false,
            detail: Some(detail.into()),
        }
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let status = if self.passed { "PASS" } else { "FAIL" };
        match &self.detail {
            Some(detail) => write!(f, "{status} {}: {detail}", self.scenario),
            None => write!(f, "{status} {}", self.scenario),
        }
    }
}
