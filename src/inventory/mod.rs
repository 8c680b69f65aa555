// src/inventory/mod.rs

//! Host resolution against a nested YAML inventory.
//!
//! Only `command` steps aimed at a remote host need this; Ansible steps hand
//! the inventory file straight to `ansible-playbook`.

pub mod model;

pub use model::{Group, HostConnection, Inventory, DEFAULT_SSH_PORT};

use thiserror::Error;
use tracing::debug;

use crate::plan::LOCALHOST;
use crate::types::VarMap;

/// Deepest group nesting the resolver will walk.
pub const MAX_GROUP_DEPTH: usize = 64;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InventoryError {
    #[error("host or group '{0}' not found in inventory")]
    HostNotFound(String),

    #[error("inventory groups nested deeper than {limit} levels")]
    TooDeep { limit: usize },

    #[error("host '{host}' has invalid ansible_port '{value}'")]
    InvalidPort { host: String, value: String },
}

impl Inventory {
    /// Resolve a host or group name to connection details.
    ///
    /// `localhost` never consults the inventory. Otherwise groups are walked
    /// depth-first from `all`, children in name order. At each level the
    /// group's `vars` are layered over the inherited ones, and host vars over
    /// those. A host entry named `name` wins; a child group named `name`
    /// resolves to its first host (see [`Inventory::first_host`]).
    pub fn resolve(&self, name: &str) -> Result<HostConnection, InventoryError> {
        if name == LOCALHOST {
            return Ok(HostConnection::local());
        }

        let mut stack: Vec<(&Group, VarMap, usize)> = vec![(&self.all, VarMap::new(), 0)];

        while let Some((group, inherited, depth)) = stack.pop() {
            if depth > MAX_GROUP_DEPTH {
                return Err(InventoryError::TooDeep {
                    limit: MAX_GROUP_DEPTH,
                });
            }

            let vars = layered(&inherited, &group.vars);

            if let Some(host_vars) = group.hosts.get(name) {
                debug!(host = %name, "resolved host entry");
                let merged = match host_vars {
                    Some(own) => layered(&vars, own),
                    None => vars,
                };
                return HostConnection::from_vars(name, &merged);
            }

            if let Some(Some(child)) = group.children.get(name) {
                let child_vars = layered(&vars, &child.vars);
                if let Some((host, merged)) = Self::first_host(child, child_vars, depth + 1)? {
                    debug!(group = %name, host = %host, "resolved group to its first host");
                    return HostConnection::from_vars(host, &merged);
                }
            }

            // Reverse so the smallest name is popped first.
            for child in group.children.values().rev().flatten() {
                stack.push((child, vars.clone(), depth + 1));
            }
        }

        Err(InventoryError::HostNotFound(name.to_string()))
    }

    /// First host of a group: the smallest direct host name, or failing that
    /// the first host found in its children, searched in name order.
    ///
    /// `vars` must already include `group`'s own vars.
    fn first_host(
        group: &Group,
        vars: VarMap,
        depth: usize,
    ) -> Result<Option<(&str, VarMap)>, InventoryError> {
        let mut stack: Vec<(&Group, VarMap, usize)> = vec![(group, vars, depth)];

        while let Some((group, vars, depth)) = stack.pop() {
            if depth > MAX_GROUP_DEPTH {
                return Err(InventoryError::TooDeep {
                    limit: MAX_GROUP_DEPTH,
                });
            }

            if let Some((host, host_vars)) = group.hosts.iter().next() {
                let merged = match host_vars {
                    Some(own) => layered(&vars, own),
                    None => vars,
                };
                return Ok(Some((host.as_str(), merged)));
            }

            for child in group.children.values().rev().flatten() {
                let child_vars = layered(&vars, &child.vars);
                stack.push((child, child_vars, depth + 1));
            }
        }

        Ok(None)
    }
}

/// `over` layered on top of `base`; keys in `over` win.
fn layered(base: &VarMap, over: &VarMap) -> VarMap {
    let mut merged = base.clone();
    merged.extend(over.iter().map(|(k, v)| (k.clone(), v.clone())));
    merged
}
