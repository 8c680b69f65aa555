// src/config/preflight.rs

//! Pre-flight checks for `--validate-only`.
//!
//! Walks the whole plan without running anything and collects every problem
//! the executor would stop on, instead of stopping at the first one.

use std::path::{Path, PathBuf};

use tracing::{error, info, warn};

use crate::fs::FileSystem;
use crate::plan::{resolve_step_file, Plan, PlanEntry, StepAction, StepDefect};

/// Outcome of a pre-flight pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    pub errors: Vec<String>,
    /// Problems the executor tolerates (a step without `kind` is skipped).
    pub warnings: Vec<String>,
}

impl ValidationReport {
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Check every plan entry against the data root and the filesystem.
pub fn preflight(
    plan: &Plan,
    data_dir: &Path,
    allowed_prefixes: &[PathBuf],
    fs: &dyn FileSystem,
) -> ValidationReport {
    let mut report = ValidationReport::default();

    info!("plan has {} steps", plan.len());
    if let Some(meta) = &plan.metadata {
        info!(
            name = meta.name.as_deref().unwrap_or("Unknown"),
            version = meta.version.as_deref().unwrap_or("Unknown"),
            description = meta.description.as_deref().unwrap_or("N/A"),
            "plan metadata"
        );
    }

    for (idx, entry) in plan.entries.iter().enumerate() {
        let id = entry.id();
        info!(step = %id, position = idx + 1, description = %entry.description(), "checking step");

        match entry {
            PlanEntry::Defective(defective) => match &defective.defect {
                StepDefect::MissingKind => {
                    report
                        .warnings
                        .push(format!("step '{id}' has no 'kind' and will be skipped"));
                }
                StepDefect::Unbuildable(err) => {
                    report.errors.push(format!("step '{id}': {err}"));
                }
            },
            PlanEntry::Step(step) => {
                let file = match &step.action {
                    StepAction::Command { .. } => continue,
                    StepAction::Ansible { file, .. } | StepAction::Script { file, .. } => file,
                };

                match resolve_step_file(file, data_dir, allowed_prefixes) {
                    Ok(path) if fs.is_file(&path) => {
                        info!(step = %id, file = ?path, "step file exists");
                    }
                    Ok(path) => {
                        report
                            .errors
                            .push(format!("step '{id}' file not found: {}", path.display()));
                    }
                    Err(err) => report.errors.push(format!("step '{id}': {err}")),
                }
            }
        }
    }

    for warning in &report.warnings {
        warn!("{warning}");
    }
    if report.is_ok() {
        info!("plan validation passed");
    } else {
        error!(errors = report.errors.len(), "plan validation failed");
        for problem in &report.errors {
            error!("  - {problem}");
        }
    }

    report
}
