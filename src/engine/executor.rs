// src/engine/executor.rs

//! The step execution state machine.
//!
//! Walks the plan strictly in order, one execution unit at a time:
//!
//! ```text
//! pending -> running -> { ok | failed }
//!         \-> skipped (no kind) / failed (configuration defect)
//! ```
//!
//! Every transition goes through the [`StateManager`], which persists it
//! before the executor moves on.

use std::path::PathBuf;

use tracing::{error, info, warn};

use crate::errors::Result;
use crate::exec::{Interrupt, Invocation, ProcessBackend, ProcessOutcome};
use crate::inventory::HostConnection;
use crate::ledger::{RecordMeta, StateManager};
use crate::plan::{
    resolve_step_file, DefectiveStep, ExecutionUnit, Plan, PlanEntry, Step, StepAction,
    StepDefect, LOCALHOST,
};
use crate::types::OnFailure;

use super::banner;
use super::context::ExecutionContext;
use super::outcome::{HaltCause, RunOutcome};

/// What happened to one unit.
enum UnitResult {
    Succeeded,
    /// Failed under an `on_failure: continue` policy.
    Tolerated,
    Halt(HaltCause),
    Interrupted,
}

/// Drives a plan through a process backend, recording every outcome.
pub struct StepExecutor<'a, B: ProcessBackend> {
    ctx: &'a ExecutionContext,
    state: StateManager,
    backend: B,
    interrupt: Interrupt,
}

impl<'a, B: ProcessBackend> StepExecutor<'a, B> {
    pub fn new(
        ctx: &'a ExecutionContext,
        state: StateManager,
        backend: B,
        interrupt: Interrupt,
    ) -> Self {
        Self {
            ctx,
            state,
            backend,
            interrupt,
        }
    }

    pub fn state(&self) -> &StateManager {
        &self.state
    }

    /// Run every entry of `plan` in order.
    ///
    /// With `resume`, entries (and, for iterated steps, individual hosts)
    /// whose ledger record is `ok` are skipped. An `Err` means the ledger
    /// could not be written; the run stops immediately in that case.
    pub async fn run(&mut self, plan: &Plan, resume: bool) -> Result<RunOutcome> {
        self.state.initialize(
            &self.ctx.env,
            &self.ctx.deployment_type,
            &self.ctx.deployment_plan,
        )?;

        let total = plan.len();
        let mut tolerated = Vec::new();

        info!(
            env = %self.ctx.env,
            deployment_type = %self.ctx.deployment_type,
            deployment_plan = %self.ctx.deployment_plan,
            steps = total,
            resume,
            "starting execution"
        );

        for (idx, entry) in plan.entries.iter().enumerate() {
            let index = idx + 1;

            if self.interrupt.is_triggered() {
                return Ok(RunOutcome::Interrupted {
                    key: entry.id().to_string(),
                });
            }

            if let PlanEntry::Defective(DefectiveStep {
                defect: StepDefect::MissingKind,
                id,
                ..
            }) = entry
            {
                warn!(step = %id, "[{id}] SKIPPING: missing kind");
                self.state
                    .mark_skipped(id, defect_meta(entry), "missing kind")?;
                continue;
            }

            if resume && self.state.is_completed(entry.id()) {
                info!(
                    step = %entry.id(),
                    "[{}] SKIPPING: already completed - {}",
                    entry.id(),
                    entry.description()
                );
                continue;
            }

            let step = match entry {
                PlanEntry::Step(step) => step,
                PlanEntry::Defective(defective) => {
                    let cause = match &defective.defect {
                        StepDefect::Unbuildable(err) => HaltCause::Unbuildable(err.clone()),
                        StepDefect::MissingKind => continue,
                    };
                    return self.halt_on_defect(&defective.id, defect_meta(entry), cause);
                }
            };

            for unit in step.execution_units() {
                if resume && unit.host.is_some() && self.state.is_completed(&unit.key) {
                    info!(key = %unit.key, "[{}] SKIPPING: already completed", unit.key);
                    continue;
                }

                match self.run_unit(step, &unit, index, total).await? {
                    UnitResult::Succeeded => {}
                    UnitResult::Tolerated => tolerated.push(unit.key),
                    UnitResult::Halt(cause) => {
                        error!(key = %unit.key, cause = %cause, "halting run");
                        return Ok(RunOutcome::Halted {
                            key: unit.key,
                            cause,
                        });
                    }
                    UnitResult::Interrupted => {
                        return Ok(RunOutcome::Interrupted { key: unit.key });
                    }
                }
            }
        }

        info!(tolerated = tolerated.len(), "all steps completed");
        Ok(RunOutcome::Completed { tolerated })
    }

    async fn run_unit(
        &mut self,
        step: &Step,
        unit: &ExecutionUnit,
        index: usize,
        total: usize,
    ) -> Result<UnitResult> {
        if self.interrupt.is_triggered() {
            return Ok(UnitResult::Interrupted);
        }

        let description = match &unit.host {
            Some(host) => format!("{} (on {host})", step.description()),
            None => step.description().to_string(),
        };
        let log_path = self.ctx.log_path(&unit.key, &description);
        let meta = RecordMeta {
            log: Some(log_path.display().to_string()),
            kind: step.kind().to_string(),
            description: description.clone(),
        };

        let prepared = match self.prepare(step, unit) {
            Ok(prepared) => prepared,
            Err(cause) => {
                error!(key = %unit.key, "[{}] ERROR: {cause}", step.id);
                self.state
                    .mark_defective(&unit.key, meta, &cause.to_string())?;
                return Ok(UnitResult::Halt(cause));
            }
        };

        let argv = match self.ctx.builder.build(
            step,
            prepared.file.as_deref(),
            &prepared.args,
            prepared.command.as_deref(),
            prepared.host.as_ref(),
        ) {
            Ok(argv) => argv,
            Err(err) => {
                let cause = HaltCause::Unbuildable(err);
                error!(key = %unit.key, "[{}] ERROR: {cause}", step.id);
                self.state
                    .mark_defective(&unit.key, meta, &cause.to_string())?;
                return Ok(UnitResult::Halt(cause));
            }
        };

        let target = match &unit.host {
            Some(host) => host.clone(),
            None => step.hosts.to_string(),
        };
        banner::unit_header(index, total, unit.position, &description, &target, step.timeout);

        self.state.mark_running(&unit.key, meta)?;

        let invocation = Invocation {
            key: unit.key.clone(),
            argv,
            cwd: Some(self.ctx.workspace.clone()),
            env: self.ctx.process_env.clone(),
            log_path: log_path.clone(),
            timeout: step.timeout,
        };

        let (exit_code, reason) = match self
            .backend
            .execute(invocation, self.interrupt.clone())
            .await
        {
            Ok(ProcessOutcome::Exited(0)) => {
                banner::unit_succeeded(&log_path);
                self.state.mark_success(&unit.key, 0)?;
                return Ok(UnitResult::Succeeded);
            }
            Ok(ProcessOutcome::Interrupted) => {
                warn!(key = %unit.key, "interrupted; record left running");
                return Ok(UnitResult::Interrupted);
            }
            Ok(ProcessOutcome::Exited(code)) => (Some(code), None),
            Ok(outcome @ ProcessOutcome::TimedOut) => {
                let secs = step.timeout.map(|t| t.as_secs()).unwrap_or_default();
                (outcome.exit_code(), Some(format!("timed out after {secs}s")))
            }
            Err(err) => (None, Some(format!("failed to run: {err}"))),
        };

        banner::unit_failed(exit_code, reason.as_deref(), &log_path);
        self.state.mark_failed(&unit.key, exit_code, reason)?;

        match step.on_failure {
            OnFailure::Continue => {
                banner::continuing_after_failure(&unit.key);
                Ok(UnitResult::Tolerated)
            }
            OnFailure::Fail => Ok(UnitResult::Halt(HaltCause::ExecutionFailed { exit_code })),
        }
    }

    /// Render templates and resolve the step file or target host.
    fn prepare(
        &self,
        step: &Step,
        unit: &ExecutionUnit,
    ) -> std::result::Result<Prepared, HaltCause> {
        match &step.action {
            StepAction::Command { command } => {
                let target = unit.host.as_deref().unwrap_or_else(|| step.hosts.primary());
                let host = if target == LOCALHOST {
                    None
                } else {
                    Some(
                        self.ctx
                            .inventory
                            .resolve(target)
                            .map_err(HaltCause::HostUnresolved)?,
                    )
                };
                Ok(Prepared {
                    file: None,
                    args: Vec::new(),
                    command: Some(self.ctx.render(command)),
                    host,
                })
            }
            StepAction::Ansible { file, args } | StepAction::Script { file, args, .. } => {
                let path = resolve_step_file(file, &self.ctx.data_dir, &self.ctx.allowed_prefixes)
                    .map_err(HaltCause::StepFileRejected)?;
                if !self.ctx.fs.is_file(&path) {
                    return Err(HaltCause::StepFileNotFound(path));
                }
                Ok(Prepared {
                    file: Some(path),
                    args: self.ctx.render_all(args),
                    command: None,
                    host: None,
                })
            }
        }
    }

    fn halt_on_defect(
        &mut self,
        key: &str,
        meta: RecordMeta,
        cause: HaltCause,
    ) -> Result<RunOutcome> {
        error!(step = %key, "[{key}] ERROR: {cause}");
        self.state.mark_defective(key, meta, &cause.to_string())?;
        Ok(RunOutcome::Halted {
            key: key.to_string(),
            cause,
        })
    }
}

/// Rendered inputs of one unit, ready for the command builder.
struct Prepared {
    file: Option<PathBuf>,
    args: Vec<String>,
    command: Option<String>,
    host: Option<HostConnection>,
}

fn defect_meta(entry: &PlanEntry) -> RecordMeta {
    let kind = match entry {
        PlanEntry::Step(step) => step.kind().to_string(),
        PlanEntry::Defective(defective) => defective.declared_kind.clone().unwrap_or_default(),
    };
    RecordMeta {
        log: None,
        kind,
        description: entry.description().to_string(),
    }
}
