use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

/// What a failed execution unit means for the rest of the run.
///
/// - `Fail`: halt the whole run after recording the failure (default).
/// - `Continue`: record the failure, log a warning and move on.
///
/// Configuration defects (missing `command`/`file`, unknown kind, unknown
/// host) ignore this policy and always halt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OnFailure {
    Fail,
    Continue,
}

impl Default for OnFailure {
    fn default() -> Self {
        OnFailure::Fail
    }
}

impl FromStr for OnFailure {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "fail" => Ok(OnFailure::Fail),
            "continue" => Ok(OnFailure::Continue),
            other => Err(format!(
                "invalid on_failure: {other} (expected \"fail\" or \"continue\")"
            )),
        }
    }
}

/// Process exit codes surfaced by the `deployrun` binary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    Success,
    /// Settings, environment or plan could not be loaded.
    ConfigError,
    /// A step references a file that does not exist.
    FileNotFound,
    /// A step declares a kind nobody knows how to run.
    UnsupportedKind,
    /// A step failed and its policy did not tolerate it.
    StepFailed,
    /// `--validate-only` found problems.
    ValidationFailed,
    /// The operator interrupted the run.
    Interrupted,
}

impl ExitCode {
    pub fn as_i32(self) -> i32 {
        match self {
            ExitCode::Success => 0,
            ExitCode::ConfigError => 2,
            ExitCode::FileNotFound => 3,
            ExitCode::UnsupportedKind => 4,
            ExitCode::StepFailed => 5,
            ExitCode::ValidationFailed => 6,
            ExitCode::Interrupted => 130,
        }
    }
}

impl fmt::Display for ExitCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_i32())
    }
}

/// Free-form variables: group vars, inventory vars.
pub type VarMap = std::collections::BTreeMap<String, serde_yaml::Value>;

/// A YAML scalar read as text: plan ids, step args and metadata accept
/// strings, numbers and booleans alike.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Text(String),
    Int(i64),
    Float(f64),
    Bool(bool),
}

impl Scalar {
    pub fn into_string(self) -> String {
        match self {
            Scalar::Text(s) => s,
            Scalar::Int(n) => n.to_string(),
            Scalar::Float(n) => n.to_string(),
            Scalar::Bool(b) => b.to_string(),
        }
    }
}

/// `deserialize_with` helper for optional scalar fields kept as text.
pub fn deserialize_opt_scalar<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value: Option<Scalar> = Option::deserialize(deserializer)?;
    Ok(value.map(Scalar::into_string))
}
