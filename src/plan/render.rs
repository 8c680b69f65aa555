// src/plan/render.rs

//! Placeholder substitution for step commands and arguments.

use serde_yaml::Value;

use crate::types::VarMap;

/// Substitute run placeholders into `text`.
///
/// Fixed tokens come first: `{env}`, `{deployment}` / `{profile}` (the plan
/// name) and `{deployment_type}` / `{profile_kind}`. Then every scalar entry
/// of `vars` replaces its own `{key}` token. Each key is replaced in a single
/// pass; substituted values are not scanned again for that key.
pub fn render(
    text: &str,
    env: &str,
    plan: &str,
    deployment_type: &str,
    vars: &VarMap,
) -> String {
    let mut result = text
        .replace("{env}", env)
        .replace("{deployment}", plan)
        .replace("{profile}", plan)
        .replace("{deployment_type}", deployment_type)
        .replace("{profile_kind}", deployment_type);

    for (key, value) in vars {
        if let Some(value) = scalar_to_string(value) {
            result = result.replace(&format!("{{{key}}}"), &value);
        }
    }

    result
}

/// Render every element of `args` in order.
pub fn render_all(
    args: &[String],
    env: &str,
    plan: &str,
    deployment_type: &str,
    vars: &VarMap,
) -> Vec<String> {
    args.iter()
        .map(|arg| render(arg, env, plan, deployment_type, vars))
        .collect()
}

/// String form of a YAML scalar; `None` for null, sequences and mappings.
pub fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Tagged(tagged) => scalar_to_string(&tagged.value),
        Value::Null | Value::Sequence(_) | Value::Mapping(_) => None,
    }
}
