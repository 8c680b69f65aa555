#![allow(dead_code)]

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use deployrun::config::{EnvironmentVars, Settings};
use deployrun::engine::ExecutionContext;
use deployrun::exec::BuildError;
use deployrun::fs::mock::MockFileSystem;
use deployrun::fs::FileSystem;
use deployrun::inventory::Inventory;
use deployrun::plan::{
    DefectiveStep, Hosts, Interpreter, Plan, PlanEntry, Step, StepAction, StepDefect, StepKind,
};
use deployrun::types::{OnFailure, VarMap};

/// Builder for `Step` to simplify test setup.
pub struct StepBuilder {
    step: Step,
}

impl StepBuilder {
    fn with_action(id: &str, action: StepAction) -> Self {
        Self {
            step: Step {
                id: id.to_string(),
                description: None,
                hosts: Hosts::default(),
                iterate: false,
                timeout: None,
                on_failure: OnFailure::Fail,
                action,
            },
        }
    }

    pub fn command(id: &str, command: &str) -> Self {
        Self::with_action(
            id,
            StepAction::Command {
                command: command.to_string(),
            },
        )
    }

    pub fn ansible(id: &str, file: &str) -> Self {
        Self::with_action(
            id,
            StepAction::Ansible {
                file: file.to_string(),
                args: vec![],
            },
        )
    }

    pub fn script(id: &str, interpreter: Interpreter, file: &str) -> Self {
        Self::with_action(
            id,
            StepAction::Script {
                interpreter,
                file: file.to_string(),
                args: vec![],
            },
        )
    }

    pub fn description(mut self, description: &str) -> Self {
        self.step.description = Some(description.to_string());
        self
    }

    pub fn host(mut self, name: &str) -> Self {
        self.step.hosts = Hosts::One(name.to_string());
        self
    }

    pub fn hosts(mut self, names: &[&str]) -> Self {
        self.step.hosts = Hosts::Many(names.iter().map(|n| n.to_string()).collect());
        self
    }

    pub fn iterate(mut self, val: bool) -> Self {
        self.step.iterate = val;
        self
    }

    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.step.timeout = Some(Duration::from_secs(secs));
        self
    }

    pub fn continue_on_failure(mut self) -> Self {
        self.step.on_failure = OnFailure::Continue;
        self
    }

    pub fn args(mut self, new_args: &[&str]) -> Self {
        match &mut self.step.action {
            StepAction::Ansible { args, .. } | StepAction::Script { args, .. } => {
                *args = new_args.iter().map(|a| a.to_string()).collect();
            }
            StepAction::Command { .. } => panic!("command steps take no args"),
        }
        self
    }

    pub fn build(self) -> Step {
        self.step
    }
}

/// Builder for `Plan`.
#[derive(Default)]
pub struct PlanBuilder {
    entries: Vec<PlanEntry>,
}

impl PlanBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn step(mut self, step: StepBuilder) -> Self {
        self.entries.push(PlanEntry::Step(step.build()));
        self
    }

    /// Shorthand for a local `command` step.
    pub fn command(self, id: &str, command: &str) -> Self {
        self.step(StepBuilder::command(id, command))
    }

    pub fn missing_kind(mut self, id: &str) -> Self {
        self.entries.push(PlanEntry::Defective(DefectiveStep {
            id: id.to_string(),
            description: None,
            declared_kind: None,
            defect: StepDefect::MissingKind,
        }));
        self
    }

    pub fn unknown_kind(mut self, id: &str, kind: &str) -> Self {
        self.entries.push(PlanEntry::Defective(DefectiveStep {
            id: id.to_string(),
            description: None,
            declared_kind: Some(kind.to_string()),
            defect: StepDefect::Unbuildable(BuildError::UnknownKind(kind.to_string())),
        }));
        self
    }

    pub fn missing_field(mut self, id: &str, kind: StepKind, field: &'static str) -> Self {
        self.entries.push(PlanEntry::Defective(DefectiveStep {
            id: id.to_string(),
            description: None,
            declared_kind: Some(kind.to_string()),
            defect: StepDefect::Unbuildable(BuildError::MissingField { kind, field }),
        }));
        self
    }

    pub fn build(self) -> Plan {
        Plan {
            metadata: None,
            entries: self.entries,
        }
    }
}

/// Builder for `ExecutionContext` rooted at a test workspace.
///
/// Defaults: env `test`, deployment type `basekit`, plan `default`, empty
/// inventory, and an empty `MockFileSystem`.
pub struct ContextBuilder {
    settings: Settings,
    env: String,
    deployment_type: String,
    deployment_plan: String,
    vars: VarMap,
    inventory: Inventory,
    fs: Arc<dyn FileSystem>,
}

impl ContextBuilder {
    pub fn new(workspace: &Path) -> Self {
        Self {
            settings: Settings::for_workspace(workspace),
            env: "test".to_string(),
            deployment_type: "basekit".to_string(),
            deployment_plan: "default".to_string(),
            vars: VarMap::new(),
            inventory: Inventory::default(),
            fs: Arc::new(MockFileSystem::new()),
        }
    }

    pub fn env(mut self, env: &str) -> Self {
        self.env = env.to_string();
        self
    }

    pub fn deployment(mut self, deployment_type: &str, deployment_plan: &str) -> Self {
        self.deployment_type = deployment_type.to_string();
        self.deployment_plan = deployment_plan.to_string();
        self
    }

    pub fn var(mut self, key: &str, value: impl Into<serde_yaml::Value>) -> Self {
        self.vars.insert(key.to_string(), value.into());
        self
    }

    pub fn inventory_yaml(mut self, yaml: &str) -> Self {
        self.inventory = serde_yaml::from_str(yaml).expect("test inventory must parse");
        self
    }

    pub fn fs(mut self, fs: Arc<dyn FileSystem>) -> Self {
        self.fs = fs;
        self
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn build(self) -> ExecutionContext {
        let env_vars = EnvironmentVars {
            deployment_type: self.deployment_type,
            deployment_plan: self.deployment_plan,
            vars: self.vars,
        };
        ExecutionContext::new(&self.settings, &self.env, env_vars, self.inventory, self.fs)
    }
}
