// src/ledger/mod.rs

//! The execution ledger: a durable record of what each step did.
//!
//! - [`model`] defines the JSON document (`Ledger`, `ExecutionRecord`).
//! - [`store`] provides the `LedgerStore` trait with file and in-memory
//!   implementations.
//! - [`state_manager`] applies status transitions and persists each one.
//! - [`report`] renders the ledger for operators.

pub mod model;
pub mod report;
pub mod state_manager;
pub mod store;

pub use model::{ExecutionRecord, Ledger, RecordMeta, StepStatus};
pub use report::{render_report, summary_line, StatusCounts};
pub use state_manager::StateManager;
pub use store::{FileLedgerStore, LedgerStore, MemoryLedgerStore};
