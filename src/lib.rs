// src/lib.rs

pub mod cli;
pub mod config;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod fs;
pub mod inventory;
pub mod ledger;
pub mod logging;
pub mod plan;
pub mod types;

use std::sync::Arc;

use tracing::{error, info, warn};

use crate::cli::CliArgs;
use crate::config::{load_environment, load_inventory, load_plan, load_settings, preflight};
use crate::engine::{ExecutionContext, RunOutcome, StepExecutor};
use crate::errors::Result;
use crate::exec::{Interrupt, InterruptHandle, RealProcessBackend};
use crate::fs::{FileSystem, RealFileSystem};
use crate::ledger::{render_report, summary_line, FileLedgerStore, StateManager};
use crate::types::ExitCode;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - settings, environment, inventory and plan loading
/// - `--status` and `--validate-only`
/// - the ledger and the step executor
/// - Ctrl-C / SIGTERM handling
pub async fn run(args: CliArgs) -> Result<ExitCode> {
    let settings = load_settings(args.config.as_deref())?;
    let layout = settings.layout(&args.env);

    logging::init_logging(
        args.log_level,
        Some(&layout.log_dir.join(logging::RUN_LOG_FILE)),
    )?;

    let fs: Arc<dyn FileSystem> = Arc::new(RealFileSystem);
    let store = FileLedgerStore::new(&layout.ledger_file, fs.clone());

    if args.status {
        let state = StateManager::load(Box::new(store));
        print!("{}", render_report(state.ledger()));
        return Ok(ExitCode::Success);
    }

    info!(env = %args.env, resume = args.resume, "deployrun starting");

    let env_vars = load_environment(&layout)?;
    let inventory = load_inventory(&layout.inventory_file)?;
    let plan_file = settings.plan_file(&env_vars.deployment_type, &env_vars.deployment_plan);
    info!(path = ?plan_file, "using deployment plan");
    let plan = load_plan(&plan_file)?;

    if args.validate_only {
        let report = preflight(
            &plan,
            &settings.paths.data_dir,
            &settings.paths.allowed_prefixes,
            fs.as_ref(),
        );
        return Ok(if report.is_ok() {
            info!("validation complete (--validate-only)");
            ExitCode::Success
        } else {
            ExitCode::ValidationFailed
        });
    }

    let ctx = ExecutionContext::new(&settings, &args.env, env_vars, inventory, fs);
    let state = StateManager::load(Box::new(store));

    let (handle, interrupt) = Interrupt::channel();
    spawn_signal_listeners(handle);

    let backend = RealProcessBackend::new(settings.runner.echo_output);
    let mut executor = StepExecutor::new(&ctx, state, backend, interrupt);
    let outcome = executor.run(&plan, args.resume).await?;

    info!("ledger: {}", summary_line(executor.state().ledger()));
    report_outcome(&outcome);

    Ok(outcome.exit_code())
}

fn report_outcome(outcome: &RunOutcome) {
    let rule = "=".repeat(70);
    match outcome {
        RunOutcome::Completed { tolerated } if tolerated.is_empty() => {
            info!("{rule}");
            info!("✅ ALL STEPS COMPLETED SUCCESSFULLY!");
            info!("{rule}");
        }
        RunOutcome::Completed { tolerated } => {
            info!("{rule}");
            warn!(failed = ?tolerated, "completed; some failures were tolerated");
            info!("{rule}");
        }
        RunOutcome::Halted { key, cause } => {
            error!(key = %key, exit_code = cause.exit_code().as_i32(), "❌ run halted: {cause}");
        }
        RunOutcome::Interrupted { key } => {
            warn!(key = %key, "⚠️  interrupted by user; resume with --resume");
        }
    }
}

/// Ctrl-C (and SIGTERM on unix) kill the running step and stop the run.
fn spawn_signal_listeners(handle: InterruptHandle) {
    {
        let handle = handle.clone();
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!(error = %e, "failed to listen for Ctrl+C");
                return;
            }
            warn!("Ctrl+C received");
            handle.trigger();
        });
    }

    #[cfg(unix)]
    tokio::spawn(async move {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                if term.recv().await.is_some() {
                    warn!("SIGTERM received");
                    handle.trigger();
                }
            }
            Err(e) => warn!(error = %e, "failed to listen for SIGTERM"),
        }
    });

    #[cfg(not(unix))]
    drop(handle);
}
