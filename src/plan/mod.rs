// src/plan/mod.rs

//! The deployment plan as the executor sees it.
//!
//! - [`step`] holds the typed step model (`Step`, `StepAction`, `Hosts`) and
//!   the defect entries produced when a raw step cannot be turned into one.
//! - [`render`] substitutes placeholders into commands and arguments.
//! - [`path`] resolves step files against the data root.
//!
//! Raw YAML parsing lives in `config`; this module only deals with validated
//! values.

pub mod path;
pub mod render;
pub mod step;

pub use path::{resolve_step_file, StepPathError};
pub use render::{render, render_all};
pub use step::{
    DefectiveStep, ExecutionUnit, Hosts, Interpreter, Plan, PlanEntry, PlanMetadata, Step,
    StepAction, StepDefect, StepKind, LOCALHOST,
};
