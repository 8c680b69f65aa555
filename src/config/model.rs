// src/config/model.rs

use std::num::NonZeroU64;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::exec::command::DEFAULT_SSH_CONNECT_TIMEOUT;
use crate::plan::{Hosts, PlanMetadata};
use crate::types::{deserialize_opt_scalar, OnFailure, Scalar, VarMap};

pub const DEFAULT_WORKSPACE: &str = "/docker-workspace";
pub const DEFAULT_SETTINGS_FILE: &str = "deployrun.toml";

/// `deployrun.toml` as read from disk.
///
/// ```toml
/// [paths]
/// workspace = "/docker-workspace"
/// data_dir = "data"            # relative to workspace
/// config_dir = "config"        # relative to workspace
/// allowed_prefixes = ["/docker-workspace/config"]
///
/// [runner]
/// ssh_connect_timeout = 30
/// echo_output = true
/// ansible_config = "/docker-workspace/data/ansible.cfg"
/// ```
///
/// Every field is optional; see [`Settings`] for the defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawSettings {
    #[serde(default)]
    pub paths: RawPathsSection,

    #[serde(default)]
    pub runner: RawRunnerSection,
}

/// `[paths]` section.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawPathsSection {
    /// Working directory of every spawned process.
    #[serde(default)]
    pub workspace: Option<PathBuf>,

    /// Root for plans and step files (`deployments/`, playbooks, scripts).
    #[serde(default)]
    pub data_dir: Option<PathBuf>,

    /// Parent of the per-environment directories.
    #[serde(default)]
    pub config_dir: Option<PathBuf>,

    /// Absolute prefixes a step `file` may point into. Defaults to
    /// `config_dir`.
    #[serde(default)]
    pub allowed_prefixes: Option<Vec<PathBuf>>,
}

/// `[runner]` section.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawRunnerSection {
    #[serde(default)]
    pub ssh_connect_timeout: Option<u64>,

    /// Mirror process output to stdout as well as the step log.
    #[serde(default)]
    pub echo_output: Option<bool>,

    /// Exported as `ANSIBLE_CONFIG`. Defaults to `<data_dir>/ansible.cfg`.
    #[serde(default)]
    pub ansible_config: Option<PathBuf>,
}

/// Validated settings with every default applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub paths: Paths,
    pub runner: RunnerSettings,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paths {
    pub workspace: PathBuf,
    pub data_dir: PathBuf,
    pub config_dir: PathBuf,
    pub allowed_prefixes: Vec<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunnerSettings {
    pub ssh_connect_timeout: u64,
    pub echo_output: bool,
    pub ansible_config: PathBuf,
}

impl Settings {
    /// Settings rooted at `workspace` with every other field defaulted.
    pub fn for_workspace(workspace: impl Into<PathBuf>) -> Self {
        let workspace = workspace.into();
        let data_dir = workspace.join("data");
        let config_dir = workspace.join("config");
        Self {
            runner: RunnerSettings {
                ssh_connect_timeout: DEFAULT_SSH_CONNECT_TIMEOUT,
                echo_output: true,
                ansible_config: data_dir.join("ansible.cfg"),
            },
            paths: Paths {
                allowed_prefixes: vec![config_dir.clone()],
                workspace,
                data_dir,
                config_dir,
            },
        }
    }

    /// Where everything for environment `env` lives.
    pub fn layout(&self, env: &str) -> EnvironmentLayout {
        EnvironmentLayout::new(&self.paths.config_dir, env)
    }

    /// `<data_dir>/deployments/<type>/<plan>.yml`
    pub fn plan_file(&self, deployment_type: &str, deployment_plan: &str) -> PathBuf {
        self.paths
            .data_dir
            .join("deployments")
            .join(deployment_type)
            .join(format!("{deployment_plan}.yml"))
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self::for_workspace(DEFAULT_WORKSPACE)
    }
}

/// Files of one environment under `<config_dir>/<env>/`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvironmentLayout {
    pub env_dir: PathBuf,
    /// Ansible inventory, `config.yml`.
    pub inventory_file: PathBuf,
    /// `group_vars/deployment.yml`
    pub group_vars_file: PathBuf,
    /// `.cache/state.json`
    pub ledger_file: PathBuf,
    /// `.cache/logs/`
    pub log_dir: PathBuf,
}

impl EnvironmentLayout {
    pub fn new(config_dir: &Path, env: &str) -> Self {
        let env_dir = config_dir.join(env);
        let cache = env_dir.join(".cache");
        Self {
            inventory_file: env_dir.join("config.yml"),
            group_vars_file: env_dir.join("group_vars").join("deployment.yml"),
            ledger_file: cache.join("state.json"),
            log_dir: cache.join("logs"),
            env_dir,
        }
    }
}

/// `group_vars/deployment.yml` after the two required keys were pulled out.
#[derive(Debug, Clone, PartialEq)]
pub struct EnvironmentVars {
    pub deployment_type: String,
    pub deployment_plan: String,
    /// Every variable in the file, the two above included.
    pub vars: VarMap,
}

/// Plan document exactly as written in YAML.
#[derive(Debug, Clone, Deserialize)]
pub struct RawPlan {
    #[serde(default)]
    pub metadata: Option<PlanMetadata>,

    /// Opaque to the executor.
    #[serde(default)]
    pub requirements: Option<serde_yaml::Value>,

    #[serde(default)]
    pub steps: Option<Vec<RawStep>>,
}

/// One step exactly as written in YAML, before kind-specific checks.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawStep {
    /// String or integer. Defaults to the 1-based position.
    #[serde(default, deserialize_with = "deserialize_opt_scalar")]
    pub id: Option<String>,

    #[serde(default)]
    pub kind: Option<String>,

    #[serde(default, alias = "desc")]
    pub description: Option<String>,

    #[serde(default)]
    pub hosts: Option<Hosts>,

    #[serde(default)]
    pub iterate: bool,

    #[serde(default)]
    pub file: Option<String>,

    #[serde(default)]
    pub command: Option<String>,

    #[serde(default)]
    pub args: Option<Vec<Scalar>>,

    /// Seconds. Zero is rejected at parse time.
    #[serde(default)]
    pub timeout: Option<NonZeroU64>,

    #[serde(default)]
    pub on_failure: OnFailure,
}
