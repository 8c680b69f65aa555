// src/config/mod.rs

//! Settings, environment and plan loading.
//!
//! Responsibilities:
//! - Define the on-disk data model (`model.rs`): `deployrun.toml`, the raw
//!   plan and step documents, and the per-environment file layout.
//! - Load those files from disk (`loader.rs`).
//! - Turn raw documents into checked values (`validate.rs`).
//! - Run the `--validate-only` pre-flight pass (`preflight.rs`).

pub mod loader;
pub mod model;
pub mod preflight;
pub mod validate;

pub use loader::{load_environment, load_inventory, load_plan, load_settings};
pub use model::{EnvironmentLayout, EnvironmentVars, RawPlan, RawSettings, RawStep, Settings};
pub use preflight::{preflight, ValidationReport};
