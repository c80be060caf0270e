//! Suite runner and report rendering
//!
//! Scenarios run strictly one after another, each on its own fresh heap;
//! there is no shared state to clear between them, so a failing scenario
//! can never poison its successors.

use crate::scenario::Scenario;
use crate::scenarios;
use once_cell::sync::Lazy;
use refmodel_core::Report;

/// The registered suite, in registration order.
pub static SUITE: Lazy<Vec<Scenario>> = Lazy::new(scenarios::all);

/// Run every registered scenario and collect the reports.
pub fn run_all() -> Vec<Report> {
    SUITE.iter().map(Scenario::execute).collect()
}

/// Run the scenarios whose names contain `filter`.
pub fn run_matching(filter: &str) -> Vec<Report> {
    SUITE
        .iter()
        .filter(|scenario| scenario.name.contains(filter))
        .map(Scenario::execute)
        .collect()
}

/// Render reports as a plain text table, one line per scenario, with a
/// trailing summary line.
pub fn render_table(reports: &[Report]) -> String {
    let width = reports
        .iter()
        .map(|report| report.scenario.len())
        .max()
        .unwrap_or(0);
    let mut out = String::new();
    for report in reports {
        let status = if report.passed { "PASS" } else { "FAIL" };
        out.push_str(&format!("{status}  {:width$}", report.scenario));
        if let Some(detail) = &report.detail {
            out.push_str("  ");
            out.push_str(detail);
        }
        out.push('\n');
    }
    let failed = reports.iter().filter(|report| !report.passed).count();
    out.push_str(&format!(
        "{} scenario(s), {} passed, {} failed\n",
        reports.len(),
        reports.len() - failed,
        failed
    ));
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn the_whole_suite_passes() {
        // The suite is the executable specification; every registered
        // scenario must hold.
        let reports = run_all();
        assert!(!reports.is_empty());
        for report in &reports {
            assert!(report.passed, "{report}");
        }
    }

    #[test]
    fn scenario_names_are_unique() {
        let mut names: Vec<&str> = SUITE.iter().map(|scenario| scenario.name).collect();
        names.sort_unstable();
        let before = names.len();
        names.dedup();
        assert_eq!(before, names.len(), "duplicate scenario names");
    }

    #[test]
    fn filtering_selects_by_substring() {
        let reports = run_matching("map_");
        assert!(!reports.is_empty());
        assert!(reports.iter().all(|report| report.scenario.starts_with("map_")));
    }

    #[test]
    fn table_includes_summary_line() {
        let reports = run_matching("record_");
        let table = render_table(&reports);
        assert!(table.contains("passed"));
        assert!(table.lines().count() == reports.len() + 1);
    }
}
