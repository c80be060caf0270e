//! Suite runner binary
//!
//! Runs the registered scenarios and prints one report per line. Exits
//! nonzero when any scenario fails.
//!
//! Usage: `refmodel-harness [--json] [filter]`
//!
//! Logging goes to stderr and follows `RUST_LOG` (e.g.
//! `RUST_LOG=refmodel::heap=trace` to watch individual acquires and
//! releases while a scenario runs).

use refmodel_harness::{render_table, run_all, run_matching};
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let mut json = false;
    let mut filter: Option<String> = None;
    for arg in std::env::args().skip(1) {
        match arg.as_str() {
            "--json" => json = true,
            "--help" | "-h" => {
                eprintln!("usage: refmodel-harness [--json] [filter]");
                return;
            }
            other => filter = Some(other.to_string()),
        }
    }

    let reports = match &filter {
        Some(filter) => run_matching(filter),
        None => run_all(),
    };

    if json {
        for report in &reports {
            match serde_json::to_string(report) {
                Ok(line) => println!("{line}"),
                Err(err) => eprintln!("report serialization failed: {err}"),
            }
        }
    } else {
        print!("{}", render_table(&reports));
    }

    if reports.iter().any(|report| !report.passed) {
        std::process::exit(1);
    }
}
