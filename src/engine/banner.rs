// src/engine/banner.rs

//! Operator-facing per-unit banners.
//!
//! The `*_lines` functions build the text; the others print it through
//! `tracing`.

use std::path::Path;
use std::time::Duration;

use tracing::{error, info, warn};

const RULE_WIDTH: usize = 70;

/// `STEP i/N` for a single unit, `STEP i/N.j/m` for the j-th of m hosts of
/// an iterated step.
pub fn step_label(index: usize, total: usize, position: Option<(usize, usize)>) -> String {
    match position {
        Some((host_idx, host_total)) => format!("STEP {index}/{total}.{host_idx}/{host_total}"),
        None => format!("STEP {index}/{total}"),
    }
}

pub fn header_lines(
    index: usize,
    total: usize,
    position: Option<(usize, usize)>,
    description: &str,
    target: &str,
    timeout: Option<Duration>,
) -> Vec<String> {
    let rule = "=".repeat(RULE_WIDTH);
    let mut lines = vec![
        String::new(),
        rule.clone(),
        format!("{}: {description}", step_label(index, total, position)),
        rule,
        format!("Target: {target}"),
    ];
    if let Some(timeout) = timeout {
        lines.push(format!("Timeout: {}s", timeout.as_secs()));
    }
    lines.push(String::new());
    lines
}

pub fn success_lines(log: &Path) -> Vec<String> {
    vec!["✅ SUCCESS".to_string(), format!("Log: {}", log.display())]
}

pub fn failure_lines(exit_code: Option<i32>, reason: Option<&str>, log: &Path) -> Vec<String> {
    let mut lines = vec!["❌ FAILED".to_string()];
    match exit_code {
        Some(code) => lines.push(format!("Exit code: {code}")),
        None => lines.push("Exit code: none".to_string()),
    }
    if let Some(reason) = reason {
        lines.push(format!("Reason: {reason}"));
    }
    lines.push(format!("Log: {}", log.display()));
    lines
}

/// Header printed before a unit starts.
pub fn unit_header(
    index: usize,
    total: usize,
    position: Option<(usize, usize)>,
    description: &str,
    target: &str,
    timeout: Option<Duration>,
) {
    for line in header_lines(index, total, position, description, target, timeout) {
        info!("{line}");
    }
}

pub fn unit_succeeded(log: &Path) {
    for line in success_lines(log) {
        info!("{line}");
    }
}

pub fn unit_failed(exit_code: Option<i32>, reason: Option<&str>, log: &Path) {
    for line in failure_lines(exit_code, reason, log) {
        error!("{line}");
    }
}

pub fn continuing_after_failure(key: &str) {
    warn!(key = %key, "⚠️  Continuing despite failure");
}
