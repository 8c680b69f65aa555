// src/errors.rs

//! Crate-wide error aliases and helpers.

use thiserror::Error;

use crate::types::ExitCode;

#[derive(Error, Debug)]
pub enum DeployError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("YAML parsing error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl DeployError {
    /// Exit code reported when this error aborts the whole invocation.
    ///
    /// Anything raised while loading settings, the environment or the plan is
    /// a configuration problem; the rest are treated as step failures.
    pub fn exit_code(&self) -> ExitCode {
        match self {
            DeployError::ConfigError(_)
            | DeployError::IoError(_)
            | DeployError::TomlError(_)
            | DeployError::YamlError(_) => ExitCode::ConfigError,
            DeployError::JsonError(_) | DeployError::Other(_) => ExitCode::StepFailed,
        }
    }
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, DeployError>;
