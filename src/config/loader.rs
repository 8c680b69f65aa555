// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use tracing::{debug, info};

use crate::config::model::{
    EnvironmentLayout, EnvironmentVars, RawPlan, RawSettings, Settings, DEFAULT_SETTINGS_FILE,
};
use crate::errors::{DeployError, Result};
use crate::inventory::Inventory;
use crate::plan::Plan;
use crate::types::VarMap;

/// Load settings from `path`, or from `deployrun.toml` in the working
/// directory when no path is given.
///
/// An explicit path must exist. Without one, a missing default file just
/// means "use the defaults".
pub fn load_settings(path: Option<&Path>) -> Result<Settings> {
    let path = match path {
        Some(path) => path.to_path_buf(),
        None => {
            let default = default_settings_path();
            if !default.exists() {
                debug!("no {DEFAULT_SETTINGS_FILE} found; using default settings");
                return Settings::try_from(RawSettings::default());
            }
            default
        }
    };

    let contents = read_required(&path, "settings file")?;
    let raw: RawSettings = toml::from_str(&contents)?;
    let settings = Settings::try_from(raw)?;
    debug!(path = ?path, "loaded settings");
    Ok(settings)
}

pub fn default_settings_path() -> PathBuf {
    PathBuf::from(DEFAULT_SETTINGS_FILE)
}

/// Load `group_vars/deployment.yml` for an environment.
pub fn load_environment(layout: &EnvironmentLayout) -> Result<EnvironmentVars> {
    let vars: VarMap = read_yaml(&layout.group_vars_file, "deployment configuration")?
        .unwrap_or_default();
    EnvironmentVars::try_from(vars).map_err(|e| match e {
        DeployError::ConfigError(msg) => {
            DeployError::ConfigError(format!("{msg} ({:?})", layout.group_vars_file))
        }
        other => other,
    })
}

/// Load the environment's inventory. An empty file is an empty inventory.
pub fn load_inventory(path: &Path) -> Result<Inventory> {
    Ok(read_yaml(path, "inventory file")?.unwrap_or_default())
}

/// Load and validate a plan document.
pub fn load_plan(path: &Path) -> Result<Plan> {
    let raw: RawPlan = read_yaml(path, "plan file")?.ok_or_else(|| {
        DeployError::ConfigError(format!("plan file {:?} is empty", path))
    })?;
    let plan = Plan::try_from(raw).map_err(|e| match e {
        DeployError::ConfigError(msg) => DeployError::ConfigError(format!("{msg} ({:?})", path)),
        other => other,
    })?;
    info!(path = ?path, steps = plan.len(), "loaded plan");
    Ok(plan)
}

fn read_required(path: &Path, what: &str) -> Result<String> {
    if !path.exists() {
        return Err(DeployError::ConfigError(format!(
            "{what} not found: {:?}",
            path
        )));
    }
    Ok(fs::read_to_string(path)?)
}

/// Parse a YAML file; `None` when the document is empty or `null`.
fn read_yaml<T: DeserializeOwned>(path: &Path, what: &str) -> Result<Option<T>> {
    let contents = read_required(path, what)?;
    if contents.trim().is_empty() {
        return Ok(None);
    }
    let value: Option<T> = serde_yaml::from_str(&contents)
        .map_err(|e| DeployError::ConfigError(format!("parsing {what} {:?}: {e}", path)))?;
    Ok(value)
}
