// src/plan/step.rs

//! Typed step model produced from the raw plan document.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;

use crate::exec::command::BuildError;
use crate::types::{deserialize_opt_scalar, OnFailure};

/// Reserved host name that always means "run here, no SSH".
pub const LOCALHOST: &str = "localhost";

pub const NO_DESCRIPTION: &str = "No description";

/// Target hosts of a step, exactly as written in the plan.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum Hosts {
    One(String),
    Many(Vec<String>),
}

impl Default for Hosts {
    fn default() -> Self {
        Hosts::One(LOCALHOST.to_string())
    }
}

impl Hosts {
    pub fn is_localhost(&self) -> bool {
        matches!(self, Hosts::One(name) if name == LOCALHOST)
    }

    /// The host a non-iterated `command` step talks to: the single name, or
    /// the first entry of a list. An empty list means localhost.
    pub fn primary(&self) -> &str {
        match self {
            Hosts::One(name) => name,
            Hosts::Many(names) => names.first().map(String::as_str).unwrap_or(LOCALHOST),
        }
    }

    /// Comma-joined form used for Ansible's `target_hosts`.
    pub fn joined(&self) -> String {
        match self {
            Hosts::One(name) => name.clone(),
            Hosts::Many(names) => names.join(","),
        }
    }
}

impl fmt::Display for Hosts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Hosts::One(name) => write!(f, "{name}"),
            Hosts::Many(names) => write!(f, "[{}]", names.join(", ")),
        }
    }
}

/// Interpreter for file-based script steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interpreter {
    Python,
    Shell,
    Bash,
    Sh,
}

impl Interpreter {
    pub fn program(self) -> &'static str {
        match self {
            Interpreter::Python => "python3",
            Interpreter::Shell | Interpreter::Bash => "/bin/bash",
            Interpreter::Sh => "/bin/sh",
        }
    }
}

/// Declared kind of a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepKind {
    Command,
    Ansible,
    Script(Interpreter),
}

impl StepKind {
    pub fn as_str(self) -> &'static str {
        match self {
            StepKind::Command => "command",
            StepKind::Ansible => "ansible",
            StepKind::Script(Interpreter::Python) => "python",
            StepKind::Script(Interpreter::Shell) => "shell",
            StepKind::Script(Interpreter::Bash) => "bash",
            StepKind::Script(Interpreter::Sh) => "sh",
        }
    }
}

impl fmt::Display for StepKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StepKind {
    type Err = BuildError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "command" => Ok(StepKind::Command),
            "ansible" => Ok(StepKind::Ansible),
            "python" | "python3" => Ok(StepKind::Script(Interpreter::Python)),
            "shell" => Ok(StepKind::Script(Interpreter::Shell)),
            "bash" => Ok(StepKind::Script(Interpreter::Bash)),
            "sh" => Ok(StepKind::Script(Interpreter::Sh)),
            _ => Err(BuildError::UnknownKind(s.to_string())),
        }
    }
}

/// What a step does. Each variant carries only the fields its kind uses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepAction {
    Command {
        command: String,
    },
    Ansible {
        file: String,
        args: Vec<String>,
    },
    Script {
        interpreter: Interpreter,
        file: String,
        args: Vec<String>,
    },
}

/// A well-formed step ready for the executor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    pub id: String,
    pub description: Option<String>,
    pub hosts: Hosts,
    pub iterate: bool,
    pub timeout: Option<Duration>,
    pub on_failure: OnFailure,
    pub action: StepAction,
}

/// One concrete invocation of a step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionUnit {
    /// Ledger key: the step id, or `{id}_{host}` when iterated.
    pub key: String,
    /// Host this unit is pinned to (iterated steps only).
    pub host: Option<String>,
    /// 1-based position and total when iterated.
    pub position: Option<(usize, usize)>,
}

impl Step {
    pub fn kind(&self) -> StepKind {
        match &self.action {
            StepAction::Command { .. } => StepKind::Command,
            StepAction::Ansible { .. } => StepKind::Ansible,
            StepAction::Script { interpreter, .. } => StepKind::Script(*interpreter),
        }
    }

    pub fn description(&self) -> &str {
        self.description.as_deref().unwrap_or(NO_DESCRIPTION)
    }

    /// Fan out only for `command` steps with `iterate: true` and more than one
    /// host in a list.
    pub fn iterates(&self) -> bool {
        matches!(self.action, StepAction::Command { .. })
            && self.iterate
            && matches!(&self.hosts, Hosts::Many(names) if names.len() > 1)
    }

    pub fn execution_units(&self) -> Vec<ExecutionUnit> {
        match &self.hosts {
            Hosts::Many(names) if self.iterates() => {
                let total = names.len();
                names
                    .iter()
                    .enumerate()
                    .map(|(idx, host)| ExecutionUnit {
                        key: format!("{}_{}", self.id, host),
                        host: Some(host.clone()),
                        position: Some((idx + 1, total)),
                    })
                    .collect()
            }
            _ => vec![ExecutionUnit {
                key: self.id.clone(),
                host: None,
                position: None,
            }],
        }
    }
}

/// Why a plan entry could not become a [`Step`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepDefect {
    /// No `kind` at all; tolerated by the executor (recorded as skipped).
    MissingKind,
    /// Unknown kind or missing required field; always a hard stop.
    Unbuildable(BuildError),
}

impl fmt::Display for StepDefect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StepDefect::MissingKind => f.write_str("missing kind"),
            StepDefect::Unbuildable(err) => write!(f, "{err}"),
        }
    }
}

/// A plan entry that failed boundary validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefectiveStep {
    pub id: String,
    pub description: Option<String>,
    /// The `kind` string as written, if any.
    pub declared_kind: Option<String>,
    pub defect: StepDefect,
}

impl DefectiveStep {
    pub fn description(&self) -> &str {
        self.description.as_deref().unwrap_or(NO_DESCRIPTION)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlanEntry {
    Step(Step),
    Defective(DefectiveStep),
}

impl PlanEntry {
    pub fn id(&self) -> &str {
        match self {
            PlanEntry::Step(step) => &step.id,
            PlanEntry::Defective(defective) => &defective.id,
        }
    }

    pub fn description(&self) -> &str {
        match self {
            PlanEntry::Step(step) => step.description(),
            PlanEntry::Defective(defective) => defective.description(),
        }
    }
}

/// Informational `metadata` block of a plan.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct PlanMetadata {
    #[serde(default, deserialize_with = "deserialize_opt_scalar")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "deserialize_opt_scalar")]
    pub version: Option<String>,
    #[serde(default, deserialize_with = "deserialize_opt_scalar")]
    pub description: Option<String>,
}

/// A validated plan: entries in execution order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Plan {
    pub metadata: Option<PlanMetadata>,
    pub entries: Vec<PlanEntry>,
}

impl Plan {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
