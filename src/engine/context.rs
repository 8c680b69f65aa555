// src/engine/context.rs

//! Everything a run needs to know, built once and passed by reference.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::{EnvironmentVars, Settings};
use crate::exec::CommandBuilder;
use crate::fs::FileSystem;
use crate::inventory::Inventory;
use crate::plan::render::{render, render_all};
use crate::types::VarMap;

/// Immutable context of one run against one environment.
#[derive(Debug, Clone)]
pub struct ExecutionContext {
    pub env: String,
    pub deployment_type: String,
    pub deployment_plan: String,
    /// Group vars, available as `{key}` placeholders.
    pub vars: VarMap,
    pub inventory: Inventory,
    pub inventory_file: PathBuf,
    /// Working directory of every spawned process.
    pub workspace: PathBuf,
    pub data_dir: PathBuf,
    pub allowed_prefixes: Vec<PathBuf>,
    pub log_dir: PathBuf,
    /// Extra environment variables for every spawned process.
    pub process_env: Vec<(String, String)>,
    pub builder: CommandBuilder,
    pub fs: Arc<dyn FileSystem>,
}

impl ExecutionContext {
    pub fn new(
        settings: &Settings,
        env: &str,
        env_vars: EnvironmentVars,
        inventory: Inventory,
        fs: Arc<dyn FileSystem>,
    ) -> Self {
        let layout = settings.layout(env);
        Self {
            env: env.to_string(),
            deployment_type: env_vars.deployment_type,
            deployment_plan: env_vars.deployment_plan,
            vars: env_vars.vars,
            inventory,
            builder: CommandBuilder::new(
                layout.inventory_file.clone(),
                settings.runner.ssh_connect_timeout,
            ),
            inventory_file: layout.inventory_file,
            workspace: settings.paths.workspace.clone(),
            data_dir: settings.paths.data_dir.clone(),
            allowed_prefixes: settings.paths.allowed_prefixes.clone(),
            log_dir: layout.log_dir,
            process_env: process_env(&settings.runner.ansible_config),
            fs,
        }
    }

    pub fn render(&self, text: &str) -> String {
        render(
            text,
            &self.env,
            &self.deployment_plan,
            &self.deployment_type,
            &self.vars,
        )
    }

    pub fn render_all(&self, args: &[String]) -> Vec<String> {
        render_all(
            args,
            &self.env,
            &self.deployment_plan,
            &self.deployment_type,
            &self.vars,
        )
    }

    /// `<log_dir>/<key>-<sanitized description>.log`
    pub fn log_path(&self, key: &str, description: &str) -> PathBuf {
        self.log_dir
            .join(format!("{key}-{}.log", sanitize_description(description)))
    }
}

/// Spaces become `_`, slashes become `-`, parentheses are dropped.
pub fn sanitize_description(description: &str) -> String {
    description
        .chars()
        .filter(|c| !matches!(c, '(' | ')'))
        .map(|c| match c {
            ' ' => '_',
            '/' => '-',
            other => other,
        })
        .collect()
}

/// Variables exported to every step process.
pub fn process_env(ansible_config: &Path) -> Vec<(String, String)> {
    vec![
        (
            "ANSIBLE_CONFIG".to_string(),
            ansible_config.display().to_string(),
        ),
        ("ANSIBLE_HOST_KEY_CHECKING".to_string(), "False".to_string()),
        ("ANSIBLE_SSH_RETRIES".to_string(), "3".to_string()),
        ("PYTHONUNBUFFERED".to_string(), "1".to_string()),
        ("ANSIBLE_FORCE_COLOR".to_string(), "true".to_string()),
    ]
}
