// src/ledger/store.rs

//! Ledger persistence backends.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Context, Result};
use tracing::debug;

use crate::fs::{FileSystem, RealFileSystem};

use super::model::Ledger;

/// Where the ledger document lives.
///
/// `load` returns `Ok(None)` when nothing has been stored yet and `Err` when
/// something is stored but unreadable; the state manager decides what to do
/// about the latter.
pub trait LedgerStore: Send + Sync {
    fn load(&self) -> Result<Option<Ledger>>;
    fn save(&mut self, ledger: &Ledger) -> Result<()>;
}

/// Stores the ledger as pretty-printed JSON at a fixed path.
#[derive(Debug, Clone)]
pub struct FileLedgerStore {
    path: PathBuf,
    fs: Arc<dyn FileSystem>,
}

impl FileLedgerStore {
    pub fn new(path: impl Into<PathBuf>, fs: Arc<dyn FileSystem>) -> Self {
        Self {
            path: path.into(),
            fs,
        }
    }

    /// File store on the real filesystem.
    pub fn on_disk(path: impl Into<PathBuf>) -> Self {
        Self::new(path, Arc::new(RealFileSystem))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl LedgerStore for FileLedgerStore {
    fn load(&self) -> Result<Option<Ledger>> {
        if !self.fs.exists(&self.path) {
            return Ok(None);
        }

        let text = self.fs.read_to_string(&self.path)?;
        let ledger = serde_json::from_str(&text)
            .with_context(|| format!("parsing ledger {:?}", self.path))?;
        Ok(Some(ledger))
    }

    fn save(&mut self, ledger: &Ledger) -> Result<()> {
        let mut json = serde_json::to_string_pretty(ledger).context("serializing ledger")?;
        json.push('\n');
        self.fs.replace(&self.path, json.as_bytes())?;
        debug!(path = ?self.path, records = ledger.steps.len(), "ledger saved");
        Ok(())
    }
}

/// Keeps the ledger in memory. Clones share state, so tests can hand one
/// clone to the executor and inspect the other.
#[derive(Debug, Clone, Default)]
pub struct MemoryLedgerStore {
    ledger: Arc<Mutex<Option<Ledger>>>,
    saves: Arc<Mutex<usize>>,
}

impl MemoryLedgerStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-seeded with `ledger`, as if left behind by an earlier run.
    pub fn with_ledger(ledger: Ledger) -> Self {
        Self {
            ledger: Arc::new(Mutex::new(Some(ledger))),
            saves: Arc::default(),
        }
    }

    /// Last saved ledger, if any.
    pub fn snapshot(&self) -> Option<Ledger> {
        self.ledger.lock().ok().and_then(|guard| guard.clone())
    }

    pub fn save_count(&self) -> usize {
        self.saves.lock().map(|n| *n).unwrap_or(0)
    }
}

impl LedgerStore for MemoryLedgerStore {
    fn load(&self) -> Result<Option<Ledger>> {
        let guard = self
            .ledger
            .lock()
            .map_err(|_| anyhow!("memory ledger lock poisoned"))?;
        Ok(guard.clone())
    }

    fn save(&mut self, ledger: &Ledger) -> Result<()> {
        *self
            .ledger
            .lock()
            .map_err(|_| anyhow!("memory ledger lock poisoned"))? = Some(ledger.clone());
        if let Ok(mut saves) = self.saves.lock() {
            *saves += 1;
        }
        Ok(())
    }
}
