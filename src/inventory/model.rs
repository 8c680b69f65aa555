// src/inventory/model.rs

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Deserializer};
use serde_yaml::Value;

use crate::plan::render::scalar_to_string;
use crate::types::VarMap;

use super::InventoryError;

pub const DEFAULT_SSH_PORT: u16 = 22;
pub const DEFAULT_SSH_USER: &str = "root";

/// Ansible-style YAML inventory rooted at `all`.
///
/// ```yaml
/// all:
///   vars:
///     ansible_user: deploy
///   children:
///     web:
///       hosts:
///         node1:
///           ansible_host: 10.0.0.5
/// ```
///
/// Host and group maps are ordered by name, which is what makes "first host
/// of a group" deterministic.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Inventory {
    #[serde(default, deserialize_with = "null_as_default")]
    pub all: Group,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Group {
    /// Hosts declared directly at this level. A host with no variables is
    /// written as `node1:` and comes through as `None`.
    #[serde(default, deserialize_with = "null_as_default")]
    pub hosts: BTreeMap<String, Option<VarMap>>,

    #[serde(default, deserialize_with = "null_as_default")]
    pub vars: VarMap,

    #[serde(default, deserialize_with = "null_as_default")]
    pub children: BTreeMap<String, Option<Group>>,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// How to reach one host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostConnection {
    /// Inventory name the connection was resolved for.
    pub name: String,
    pub address: String,
    pub user: String,
    pub password: Option<String>,
    pub private_key: Option<PathBuf>,
    pub port: u16,
    /// Local execution, no SSH.
    pub local: bool,
}

impl HostConnection {
    /// The fixed descriptor for `localhost`.
    pub fn local() -> Self {
        let user = std::env::var("USER").unwrap_or_else(|_| DEFAULT_SSH_USER.to_string());
        Self {
            name: "localhost".to_string(),
            address: "localhost".to_string(),
            user,
            password: None,
            private_key: None,
            port: DEFAULT_SSH_PORT,
            local: true,
        }
    }

    /// Build a remote connection from merged Ansible variables.
    pub fn from_vars(name: &str, vars: &VarMap) -> Result<Self, InventoryError> {
        let text = |key: &str| vars.get(key).and_then(scalar_to_string);

        let port = match vars.get("ansible_port") {
            None | Some(Value::Null) => DEFAULT_SSH_PORT,
            Some(value) => parse_port(value).ok_or_else(|| InventoryError::InvalidPort {
                host: name.to_string(),
                value: scalar_to_string(value).unwrap_or_else(|| format!("{value:?}")),
            })?,
        };

        Ok(Self {
            name: name.to_string(),
            address: text("ansible_host").unwrap_or_else(|| name.to_string()),
            user: text("ansible_user").unwrap_or_else(|| DEFAULT_SSH_USER.to_string()),
            password: text("ansible_ssh_pass").or_else(|| text("ansible_password")),
            private_key: text("ansible_ssh_private_key_file").map(PathBuf::from),
            port,
            local: false,
        })
    }

    pub fn destination(&self) -> String {
        format!("{}@{}", self.user, self.address)
    }
}

fn parse_port(value: &Value) -> Option<u16> {
    match value {
        Value::Number(n) => n.as_u64().and_then(|p| u16::try_from(p).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
