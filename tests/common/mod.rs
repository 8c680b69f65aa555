#![allow(dead_code)]

use std::error::Error;

use deployrun::ledger::{Ledger, MemoryLedgerStore, StateManager};

pub use deployrun_test_utils::{init_tracing, with_timeout};

pub type TestResult = Result<(), Box<dyn Error>>;

/// A state manager over a fresh in-memory store, plus a handle on that store.
pub fn memory_state() -> (StateManager, MemoryLedgerStore) {
    let store = MemoryLedgerStore::new();
    (StateManager::load(Box::new(store.clone())), store)
}

/// A state manager over a store pre-seeded with `ledger`.
pub fn seeded_state(ledger: Ledger) -> (StateManager, MemoryLedgerStore) {
    let store = MemoryLedgerStore::with_ledger(ledger);
    (StateManager::load(Box::new(store.clone())), store)
}
