// src/exec/backend.rs

//! Pluggable process backend abstraction.
//!
//! The step executor talks to a `ProcessBackend` instead of spawning
//! processes itself. Production code uses [`RealProcessBackend`], which runs
//! the argv through [`super::process::run_invocation`]; tests provide a fake
//! that records invocations and returns scripted outcomes.

use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;
use std::time::Duration;

use crate::errors::Result;

use super::interrupt::Interrupt;
use super::process::run_invocation;

/// Exit code recorded when a process is killed for exceeding its timeout.
pub const TIMEOUT_EXIT_CODE: i32 = 124;

/// Everything needed to run one execution unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    /// Ledger key of the unit, for logging.
    pub key: String,
    pub argv: Vec<String>,
    pub cwd: Option<PathBuf>,
    pub env: Vec<(String, String)>,
    /// Per-unit log file receiving the combined output.
    pub log_path: PathBuf,
    pub timeout: Option<Duration>,
}

/// How a process ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessOutcome {
    /// Exited on its own. Killed-by-signal processes report `-1`.
    Exited(i32),
    /// Killed after exceeding its timeout.
    TimedOut,
    /// Killed because the operator interrupted the run.
    Interrupted,
}

impl ProcessOutcome {
    pub fn success(self) -> bool {
        matches!(self, ProcessOutcome::Exited(0))
    }

    /// Exit code to record; `None` for interrupted processes.
    pub fn exit_code(self) -> Option<i32> {
        match self {
            ProcessOutcome::Exited(code) => Some(code),
            ProcessOutcome::TimedOut => Some(TIMEOUT_EXIT_CODE),
            ProcessOutcome::Interrupted => None,
        }
    }
}

/// Trait abstracting how an execution unit's process is run.
pub trait ProcessBackend: Send {
    /// Run `invocation` to completion, timeout or interrupt.
    ///
    /// An `Err` means the process could not be run at all (spawn failure,
    /// unwritable log file); the executor records that as a failed unit.
    fn execute(
        &mut self,
        invocation: Invocation,
        interrupt: Interrupt,
    ) -> Pin<Box<dyn Future<Output = Result<ProcessOutcome>> + Send + '_>>;
}

/// Real backend: spawns OS processes and streams their output.
#[derive(Debug, Clone)]
pub struct RealProcessBackend {
    echo_output: bool,
}

impl RealProcessBackend {
    /// `echo_output` mirrors process output to stdout as well as the log.
    pub fn new(echo_output: bool) -> Self {
        Self { echo_output }
    }
}

impl Default for RealProcessBackend {
    fn default() -> Self {
        Self::new(true)
    }
}

impl ProcessBackend for RealProcessBackend {
    fn execute(
        &mut self,
        invocation: Invocation,
        interrupt: Interrupt,
    ) -> Pin<Box<dyn Future<Output = Result<ProcessOutcome>> + Send + '_>> {
        let echo = self.echo_output;
        Box::pin(async move { run_invocation(invocation, interrupt, echo).await })
    }
}
