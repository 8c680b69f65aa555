// src/exec/mod.rs

//! Process execution layer.
//!
//! - [`command`] turns a step into the argv of the process that runs it.
//! - [`backend`] provides the `ProcessBackend` trait and the concrete
//!   `RealProcessBackend` used in production, which tests replace with a fake.
//! - [`process`] spawns one invocation and streams its output to a log file.
//! - [`interrupt`] carries the operator's Ctrl-C / SIGTERM to running processes.

pub mod backend;
pub mod command;
pub mod interrupt;
pub mod process;

pub use backend::{Invocation, ProcessBackend, ProcessOutcome, RealProcessBackend, TIMEOUT_EXIT_CODE};
pub use command::{display_argv, BuildError, CommandBuilder};
pub use interrupt::{Interrupt, InterruptHandle};
