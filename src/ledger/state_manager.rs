// src/ledger/state_manager.rs

//! Durable state transitions for execution records.

use chrono::Utc;
use tracing::{debug, warn};

use crate::errors::Result;

use super::model::{ExecutionRecord, Ledger, RecordMeta, StepStatus};
use super::store::LedgerStore;

/// Owns the ledger for one environment and persists every transition.
///
/// Each `mark_*` call updates the in-memory ledger and writes the whole
/// document through the store before returning, so a crash between two
/// calls never loses the first one.
pub struct StateManager {
    store: Box<dyn LedgerStore>,
    ledger: Ledger,
}

impl StateManager {
    /// Load the ledger from `store`.
    ///
    /// A missing document starts an empty ledger. An unreadable one is
    /// discarded with a warning; loading never fails.
    pub fn load(store: Box<dyn LedgerStore>) -> Self {
        let ledger = match store.load() {
            Ok(Some(ledger)) => {
                debug!(records = ledger.steps.len(), "loaded existing ledger");
                ledger
            }
            Ok(None) => Ledger::default(),
            Err(e) => {
                warn!(error = %format!("{e:#}"), "could not load ledger; starting fresh");
                Ledger::default()
            }
        };

        Self { store, ledger }
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn record(&self, key: &str) -> Option<&ExecutionRecord> {
        self.ledger.record(key)
    }

    /// Stamp the run metadata, keeping every existing record, and persist.
    pub fn initialize(
        &mut self,
        env: &str,
        deployment_type: &str,
        deployment_plan: &str,
    ) -> Result<()> {
        self.ledger.env = env.to_string();
        self.ledger.deployment_type = deployment_type.to_string();
        self.ledger.deployment_plan = deployment_plan.to_string();
        self.persist()
    }

    /// Start a fresh `running` record for `key`, replacing any earlier one.
    pub fn mark_running(&mut self, key: &str, meta: RecordMeta) -> Result<()> {
        let mut record = ExecutionRecord::new(StepStatus::Running, meta);
        record.started_at = Some(Utc::now());
        self.ledger.steps.insert(key.to_string(), record);
        debug!(key = %key, "record running");
        self.persist()
    }

    pub fn mark_success(&mut self, key: &str, exit_code: i32) -> Result<()> {
        let record = self.finish(key, StepStatus::Ok);
        record.exit_code = Some(exit_code);
        record.reason = None;
        debug!(key = %key, "record ok");
        self.persist()
    }

    pub fn mark_failed(
        &mut self,
        key: &str,
        exit_code: Option<i32>,
        reason: Option<String>,
    ) -> Result<()> {
        let record = self.finish(key, StepStatus::Failed);
        record.exit_code = exit_code;
        record.reason = reason;
        debug!(key = %key, ?exit_code, "record failed");
        self.persist()
    }

    /// Record a unit that was rejected before it could run.
    pub fn mark_defective(&mut self, key: &str, meta: RecordMeta, reason: &str) -> Result<()> {
        let mut record = ExecutionRecord::new(StepStatus::Failed, meta);
        record.reason = Some(reason.to_string());
        record.finished_at = Some(Utc::now());
        self.ledger.steps.insert(key.to_string(), record);
        debug!(key = %key, reason = %reason, "record failed before running");
        self.persist()
    }

    pub fn mark_skipped(&mut self, key: &str, meta: RecordMeta, reason: &str) -> Result<()> {
        let mut record = ExecutionRecord::new(StepStatus::Skipped, meta);
        record.reason = Some(reason.to_string());
        record.finished_at = Some(Utc::now());
        self.ledger.steps.insert(key.to_string(), record);
        debug!(key = %key, reason = %reason, "record skipped");
        self.persist()
    }

    /// Only `ok` counts; a `running` record left behind by a crash does not.
    pub fn is_completed(&self, key: &str) -> bool {
        self.ledger.status(key) == Some(StepStatus::Ok)
    }

    fn finish(&mut self, key: &str, status: StepStatus) -> &mut ExecutionRecord {
        let record = self
            .ledger
            .steps
            .entry(key.to_string())
            .or_insert_with(|| ExecutionRecord::new(status, RecordMeta::default()));
        record.status = status;
        record.finished_at = Some(Utc::now());
        record
    }

    fn persist(&mut self) -> Result<()> {
        self.store.save(&self.ledger)?;
        Ok(())
    }
}
