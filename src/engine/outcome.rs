// src/engine/outcome.rs

use std::fmt;
use std::path::PathBuf;

use crate::exec::BuildError;
use crate::inventory::InventoryError;
use crate::plan::StepPathError;
use crate::types::ExitCode;

/// Why a run stopped early.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HaltCause {
    /// The process failed (non-zero exit, timeout, spawn error) and the step's
    /// policy is `fail`.
    ExecutionFailed { exit_code: Option<i32> },
    /// Unknown kind or missing `command`/`file`.
    Unbuildable(BuildError),
    StepFileNotFound(PathBuf),
    StepFileRejected(StepPathError),
    HostUnresolved(InventoryError),
}

impl HaltCause {
    pub fn exit_code(&self) -> ExitCode {
        match self {
            HaltCause::ExecutionFailed { .. } => ExitCode::StepFailed,
            HaltCause::Unbuildable(BuildError::UnknownKind(_)) => ExitCode::UnsupportedKind,
            HaltCause::Unbuildable(BuildError::MissingField { .. }) => ExitCode::ConfigError,
            HaltCause::StepFileNotFound(_) | HaltCause::StepFileRejected(_) => {
                ExitCode::FileNotFound
            }
            HaltCause::HostUnresolved(_) => ExitCode::ConfigError,
        }
    }
}

impl fmt::Display for HaltCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HaltCause::ExecutionFailed {
                exit_code: Some(code),
            } => write!(f, "step failed with exit code {code}"),
            HaltCause::ExecutionFailed { exit_code: None } => f.write_str("step failed to run"),
            HaltCause::Unbuildable(BuildError::UnknownKind(kind)) => {
                write!(f, "unsupported kind '{kind}'")
            }
            HaltCause::Unbuildable(err) => write!(f, "{err}"),
            HaltCause::StepFileNotFound(path) => write!(f, "file not found: {}", path.display()),
            HaltCause::StepFileRejected(err) => write!(f, "{err}"),
            HaltCause::HostUnresolved(err) => write!(f, "{err}"),
        }
    }
}

/// Result of [`super::StepExecutor::run`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// Every step finished. `tolerated` lists the keys of units that failed
    /// under an `on_failure: continue` policy.
    Completed { tolerated: Vec<String> },
    /// Stopped at `key`.
    Halted { key: String, cause: HaltCause },
    /// The operator interrupted the run while `key` was next or in flight.
    Interrupted { key: String },
}

impl RunOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, RunOutcome::Completed { .. })
    }

    pub fn exit_code(&self) -> ExitCode {
        match self {
            RunOutcome::Completed { .. } => ExitCode::Success,
            RunOutcome::Halted { cause, .. } => cause.exit_code(),
            RunOutcome::Interrupted { .. } => ExitCode::Interrupted,
        }
    }
}
