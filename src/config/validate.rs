// src/config/validate.rs

use std::collections::HashSet;
use std::path::PathBuf;
use std::time::Duration;

use crate::config::model::{
    EnvironmentVars, Paths, RawPlan, RawSettings, RawStep, RunnerSettings, Settings,
    DEFAULT_WORKSPACE,
};
use crate::errors::{DeployError, Result};
use crate::exec::command::{BuildError, DEFAULT_SSH_CONNECT_TIMEOUT};
use crate::plan::render::scalar_to_string;
use crate::plan::{
    DefectiveStep, Plan, PlanEntry, Step, StepAction, StepDefect, StepKind,
};
use crate::types::{Scalar, VarMap};

impl TryFrom<RawSettings> for Settings {
    type Error = DeployError;

    fn try_from(raw: RawSettings) -> std::result::Result<Self, Self::Error> {
        let paths = raw.paths;
        let runner = raw.runner;

        let workspace = paths
            .workspace
            .unwrap_or_else(|| PathBuf::from(DEFAULT_WORKSPACE));
        if !workspace.is_absolute() {
            return Err(DeployError::ConfigError(format!(
                "[paths].workspace must be an absolute path (got {:?})",
                workspace
            )));
        }

        // Relative directories hang off the workspace.
        let under_workspace = |dir: Option<PathBuf>, default: &str| match dir {
            Some(dir) if dir.is_absolute() => dir,
            Some(dir) => workspace.join(dir),
            None => workspace.join(default),
        };
        let data_dir = under_workspace(paths.data_dir, "data");
        let config_dir = under_workspace(paths.config_dir, "config");

        let allowed_prefixes = match paths.allowed_prefixes {
            Some(prefixes) => {
                if let Some(relative) = prefixes.iter().find(|p| !p.is_absolute()) {
                    return Err(DeployError::ConfigError(format!(
                        "[paths].allowed_prefixes entries must be absolute (got {:?})",
                        relative
                    )));
                }
                prefixes
            }
            None => vec![config_dir.clone()],
        };

        let ssh_connect_timeout = runner
            .ssh_connect_timeout
            .unwrap_or(DEFAULT_SSH_CONNECT_TIMEOUT);
        if ssh_connect_timeout == 0 {
            return Err(DeployError::ConfigError(
                "[runner].ssh_connect_timeout must be >= 1 (got 0)".to_string(),
            ));
        }

        let ansible_config = match runner.ansible_config {
            Some(path) if path.is_absolute() => path,
            Some(path) => workspace.join(path),
            None => data_dir.join("ansible.cfg"),
        };

        Ok(Settings {
            paths: Paths {
                workspace,
                data_dir,
                config_dir,
                allowed_prefixes,
            },
            runner: RunnerSettings {
                ssh_connect_timeout,
                echo_output: runner.echo_output.unwrap_or(true),
                ansible_config,
            },
        })
    }
}

impl TryFrom<VarMap> for EnvironmentVars {
    type Error = DeployError;

    fn try_from(vars: VarMap) -> std::result::Result<Self, Self::Error> {
        let deployment_type = required_var(&vars, "deployment_type", "profile_kind")?;
        let deployment_plan = required_var(&vars, "deployment_plan", "profile_name")?;
        Ok(EnvironmentVars {
            deployment_type,
            deployment_plan,
            vars,
        })
    }
}

fn required_var(vars: &VarMap, key: &str, alias: &str) -> Result<String> {
    vars.get(key)
        .or_else(|| vars.get(alias))
        .and_then(scalar_to_string)
        .filter(|value| !value.trim().is_empty())
        .ok_or_else(|| {
            DeployError::ConfigError(format!("missing '{key}' (or '{alias}') in group vars"))
        })
}

impl TryFrom<RawPlan> for Plan {
    type Error = DeployError;

    fn try_from(raw: RawPlan) -> std::result::Result<Self, Self::Error> {
        let steps = raw.steps.ok_or_else(|| {
            DeployError::ConfigError("plan must have a 'steps' list".to_string())
        })?;
        if steps.is_empty() {
            return Err(DeployError::ConfigError(
                "plan has no steps defined".to_string(),
            ));
        }

        let entries: Vec<PlanEntry> = steps
            .into_iter()
            .enumerate()
            .map(|(idx, step)| step_entry(step, idx + 1))
            .collect();

        ensure_unique_ids(&entries)?;

        Ok(Plan {
            metadata: raw.metadata,
            entries,
        })
    }
}

fn ensure_unique_ids(entries: &[PlanEntry]) -> Result<()> {
    let mut seen = HashSet::new();
    for entry in entries {
        if !seen.insert(entry.id()) {
            return Err(DeployError::ConfigError(format!(
                "duplicate step id '{}' in plan",
                entry.id()
            )));
        }
    }
    Ok(())
}

/// Turn one raw step into a typed entry. Never fails: anything that cannot be
/// run becomes a [`DefectiveStep`] for the executor to report in order.
fn step_entry(raw: RawStep, position: usize) -> PlanEntry {
    let id = raw
        .id
        .filter(|id| !id.trim().is_empty())
        .unwrap_or_else(|| position.to_string());
    let description = raw.description.filter(|d| !d.trim().is_empty());

    let declared_kind = raw.kind.filter(|k| !k.trim().is_empty());
    let defective = |declared_kind: Option<String>, defect: StepDefect| {
        PlanEntry::Defective(DefectiveStep {
            id: id.clone(),
            description: description.clone(),
            declared_kind,
            defect,
        })
    };

    let Some(kind_text) = declared_kind else {
        return defective(None, StepDefect::MissingKind);
    };

    let kind: StepKind = match kind_text.parse() {
        Ok(kind) => kind,
        Err(err) => return defective(Some(kind_text), StepDefect::Unbuildable(err)),
    };

    let non_empty = |value: Option<String>| value.filter(|v| !v.trim().is_empty());
    let args: Vec<String> = raw
        .args
        .unwrap_or_default()
        .into_iter()
        .map(Scalar::into_string)
        .collect();

    let action = match kind {
        StepKind::Command => non_empty(raw.command).map(|command| StepAction::Command { command }),
        StepKind::Ansible => non_empty(raw.file).map(|file| StepAction::Ansible { file, args }),
        StepKind::Script(interpreter) => non_empty(raw.file).map(|file| StepAction::Script {
            interpreter,
            file,
            args,
        }),
    };

    let Some(action) = action else {
        let field = if kind == StepKind::Command { "command" } else { "file" };
        return defective(
            Some(kind_text),
            StepDefect::Unbuildable(BuildError::MissingField { kind, field }),
        );
    };

    PlanEntry::Step(Step {
        id,
        description,
        hosts: raw.hosts.unwrap_or_default(),
        iterate: raw.iterate,
        timeout: raw.timeout.map(|secs| Duration::from_secs(secs.get())),
        on_failure: raw.on_failure,
        action,
    })
}
