// src/exec/command.rs

//! Maps a step to the argument vector of the process that runs it.
//!
//! Everything here is pure: no filesystem access, no inventory lookups. The
//! executor resolves the step file and target host first and passes them in.

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::inventory::{HostConnection, DEFAULT_SSH_PORT};
use crate::plan::{Step, StepAction, StepKind};

pub const LOCAL_SHELL: &str = "/bin/bash";
pub const DEFAULT_SSH_CONNECT_TIMEOUT: u64 = 30;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BuildError {
    #[error("unknown step kind: '{0}'")]
    UnknownKind(String),

    #[error("'{kind}' kind requires '{field}' field")]
    MissingField { kind: StepKind, field: &'static str },
}

/// Builds process argument vectors for steps.
#[derive(Debug, Clone)]
pub struct CommandBuilder {
    inventory_file: PathBuf,
    ssh_connect_timeout: u64,
}

impl CommandBuilder {
    pub fn new(inventory_file: impl Into<PathBuf>, ssh_connect_timeout: u64) -> Self {
        Self {
            inventory_file: inventory_file.into(),
            ssh_connect_timeout,
        }
    }

    /// Produce the argv for one execution unit.
    ///
    /// - `step_file`: resolved path for file-based kinds.
    /// - `args`: rendered `args` of file-based kinds.
    /// - `command`: rendered command text of `command` steps.
    /// - `host`: resolved target of a `command` step; `None` or a local
    ///   descriptor runs through the local shell.
    pub fn build(
        &self,
        step: &Step,
        step_file: Option<&Path>,
        args: &[String],
        command: Option<&str>,
        host: Option<&HostConnection>,
    ) -> Result<Vec<String>, BuildError> {
        let kind = step.kind();

        match &step.action {
            StepAction::Command { .. } => {
                let command = command.ok_or(BuildError::MissingField {
                    kind,
                    field: "command",
                })?;

                match host {
                    Some(conn) if !conn.local => Ok(self.ssh_argv(conn, command)),
                    _ => Ok(vec![
                        LOCAL_SHELL.to_string(),
                        "-c".to_string(),
                        command.to_string(),
                    ]),
                }
            }
            StepAction::Ansible { .. } => {
                let file = step_file.ok_or(BuildError::MissingField {
                    kind,
                    field: "file",
                })?;

                let mut argv = vec![
                    "ansible-playbook".to_string(),
                    "-i".to_string(),
                    self.inventory_file.display().to_string(),
                    file.display().to_string(),
                ];
                let targets = step.hosts.joined();
                if !step.hosts.is_localhost() && !targets.is_empty() {
                    argv.push("-e".to_string());
                    argv.push(format!("target_hosts={targets}"));
                }
                argv.extend(args.iter().cloned());
                Ok(argv)
            }
            StepAction::Script { interpreter, .. } => {
                let file = step_file.ok_or(BuildError::MissingField {
                    kind,
                    field: "file",
                })?;

                let mut argv = vec![
                    interpreter.program().to_string(),
                    file.display().to_string(),
                ];
                argv.extend(args.iter().cloned());
                Ok(argv)
            }
        }
    }

    fn ssh_argv(&self, conn: &HostConnection, remote_command: &str) -> Vec<String> {
        let mut argv = Vec::new();

        if let Some(password) = &conn.password {
            argv.extend(["sshpass".to_string(), "-p".to_string(), password.clone()]);
        }

        argv.push("ssh".to_string());
        argv.extend([
            "-o".to_string(),
            "StrictHostKeyChecking=no".to_string(),
            "-o".to_string(),
            "UserKnownHostsFile=/dev/null".to_string(),
            "-o".to_string(),
            format!("ConnectTimeout={}", self.ssh_connect_timeout),
            // Forced TTY keeps remote output line-buffered.
            "-tt".to_string(),
        ]);

        if let Some(key) = &conn.private_key {
            argv.push("-i".to_string());
            argv.push(key.display().to_string());
        }

        if conn.port != DEFAULT_SSH_PORT {
            argv.push("-p".to_string());
            argv.push(conn.port.to_string());
        }

        argv.push(conn.destination());
        argv.push(remote_command.to_string());
        argv
    }
}

/// Printable form of an argv with any `sshpass -p` secret masked.
pub fn display_argv(argv: &[String]) -> String {
    let mut shown = Vec::with_capacity(argv.len());
    let mut mask_next = false;

    for (idx, arg) in argv.iter().enumerate() {
        if mask_next {
            shown.push("****");
            mask_next = false;
            continue;
        }
        if idx == 1 && arg == "-p" && argv.first().map(String::as_str) == Some("sshpass") {
            mask_next = true;
        }
        shown.push(arg.as_str());
    }

    shown.join(" ")
}
