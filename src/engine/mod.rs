// src/engine/mod.rs

//! Orchestration engine.
//!
//! - [`context`] holds the immutable per-run context (paths, variables,
//!   inventory, command builder).
//! - [`executor`] is the step state machine that walks the plan and drives
//!   the process backend.
//! - [`outcome`] describes how a run ended and maps that to an exit code.
//! - [`banner`] prints the per-unit operator banners.

pub mod banner;
pub mod context;
pub mod executor;
pub mod outcome;

pub use context::{process_env, sanitize_description, ExecutionContext};
pub use executor::StepExecutor;
pub use outcome::{HaltCause, RunOutcome};
