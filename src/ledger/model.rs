// src/ledger/model.rs

use std::fmt;

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Status of one execution record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepStatus {
    Running,
    Ok,
    Failed,
    Skipped,
}

impl StepStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            StepStatus::Running => "running",
            StepStatus::Ok => "ok",
            StepStatus::Failed => "failed",
            StepStatus::Skipped => "skipped",
        }
    }
}

impl fmt::Display for StepStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Descriptive fields attached to a record when it is created.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordMeta {
    pub log: Option<String>,
    pub kind: String,
    pub description: String,
}

/// Outcome of one execution unit as stored in the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionRecord {
    pub status: StepStatus,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log: Option<String>,

    #[serde(default)]
    pub kind: String,

    #[serde(default)]
    pub description: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exit_code: Option<i32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
}

impl ExecutionRecord {
    pub fn new(status: StepStatus, meta: RecordMeta) -> Self {
        Self {
            status,
            log: meta.log,
            kind: meta.kind,
            description: meta.description,
            reason: None,
            exit_code: None,
            started_at: None,
            finished_at: None,
        }
    }
}

/// The persisted ledger document for one environment.
///
/// `steps` keeps insertion order, so the JSON reads in execution order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ledger {
    #[serde(default)]
    pub env: String,

    #[serde(default, alias = "profile_kind")]
    pub deployment_type: String,

    #[serde(default, alias = "profile_name")]
    pub deployment_plan: String,

    #[serde(default)]
    pub steps: IndexMap<String, ExecutionRecord>,
}

impl Ledger {
    pub fn record(&self, key: &str) -> Option<&ExecutionRecord> {
        self.steps.get(key)
    }

    pub fn status(&self, key: &str) -> Option<StepStatus> {
        self.steps.get(key).map(|r| r.status)
    }
}
