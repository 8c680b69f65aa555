// src/ledger/report.rs

//! Human-readable view of a ledger, used by `--status` and the end-of-run
//! summary.

use std::fmt::Write;

use super::model::{Ledger, StepStatus};

/// Record counts per status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatusCounts {
    pub ok: usize,
    pub failed: usize,
    pub skipped: usize,
    pub running: usize,
}

impl StatusCounts {
    pub fn of(ledger: &Ledger) -> Self {
        let mut counts = Self::default();
        for record in ledger.steps.values() {
            match record.status {
                StepStatus::Ok => counts.ok += 1,
                StepStatus::Failed => counts.failed += 1,
                StepStatus::Skipped => counts.skipped += 1,
                StepStatus::Running => counts.running += 1,
            }
        }
        counts
    }

    pub fn total(&self) -> usize {
        self.ok + self.failed + self.skipped + self.running
    }
}

/// One-line summary such as `4 ok, 1 failed, 0 skipped, 0 running`.
pub fn summary_line(ledger: &Ledger) -> String {
    let c = StatusCounts::of(ledger);
    format!(
        "{} ok, {} failed, {} skipped, {} running",
        c.ok, c.failed, c.skipped, c.running
    )
}

/// Full status report: run metadata, one line per record, then the summary.
pub fn render_report(ledger: &Ledger) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "environment:     {}", or_dash(&ledger.env));
    let _ = writeln!(out, "deployment type: {}", or_dash(&ledger.deployment_type));
    let _ = writeln!(out, "deployment plan: {}", or_dash(&ledger.deployment_plan));
    let _ = writeln!(out);

    if ledger.steps.is_empty() {
        let _ = writeln!(out, "no steps recorded");
        return out;
    }

    let width = ledger.steps.keys().map(String::len).max().unwrap_or(0);
    for (key, record) in &ledger.steps {
        let _ = write!(
            out,
            "  {key:<width$}  {:<7}  {}",
            record.status.as_str(),
            record.description
        );
        if let Some(code) = record.exit_code {
            if record.status != StepStatus::Ok {
                let _ = write!(out, " (exit {code})");
            }
        }
        if let Some(reason) = &record.reason {
            let _ = write!(out, " [{reason}]");
        }
        let _ = writeln!(out);
    }

    let _ = writeln!(out);
    let _ = writeln!(out, "{}", summary_line(ledger));
    out
}

fn or_dash(s: &str) -> &str {
    if s.is_empty() { "-" } else { s }
}
