// src/exec/process.rs

//! Individual process runner.
//!
//! Spawns one invocation, streams stdout and stderr line by line into the
//! unit's log file (and optionally the console), and waits for it to exit,
//! time out, or be interrupted.

use std::process::Stdio;

use anyhow::Context;
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::errors::Result;

use super::backend::{Invocation, ProcessOutcome};
use super::command::display_argv;
use super::interrupt::Interrupt;

/// Run a single invocation to completion.
///
/// Output is written as it arrives, each line flushed straight away, so a
/// crashed run still leaves a usable log behind. A timeout or interrupt kills
/// the child; whatever it printed until then stays in the log.
pub async fn run_invocation(
    invocation: Invocation,
    mut interrupt: Interrupt,
    echo: bool,
) -> Result<ProcessOutcome> {
    let Invocation {
        key,
        argv,
        cwd,
        env,
        log_path,
        timeout,
    } = invocation;

    let (program, args) = argv
        .split_first()
        .context("cannot run an empty argument vector")?;

    if let Some(parent) = log_path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("creating log dir {:?}", parent))?;
    }
    let mut log = File::create(&log_path)
        .await
        .with_context(|| format!("creating log file {:?}", log_path))?;

    info!(unit = %key, cmd = %display_argv(&argv), "starting process");

    let mut cmd = Command::new(program);
    cmd.args(args)
        .envs(env)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    if let Some(dir) = &cwd {
        cmd.current_dir(dir);
    }

    let mut child = cmd
        .spawn()
        .with_context(|| format!("spawning process for '{key}' ({program})"))?;

    let stdout = child.stdout.take().context("child stdout was not piped")?;
    let stderr = child.stderr.take().context("child stderr was not piped")?;
    let mut out_reader = BufReader::new(stdout);
    let mut err_reader = BufReader::new(stderr);
    // Partial lines survive a cancelled read_until in these buffers.
    let mut out_buf = Vec::new();
    let mut err_buf = Vec::new();
    let mut out_open = true;
    let mut err_open = true;

    let deadline = async {
        match timeout {
            Some(limit) => tokio::time::sleep(limit).await,
            None => std::future::pending().await,
        }
    };
    tokio::pin!(deadline);

    let mut console = tokio::io::stdout();

    let outcome = loop {
        tokio::select! {
            read = out_reader.read_until(b'\n', &mut out_buf), if out_open => {
                out_open = forward(read, &mut out_buf, &mut log, &mut console, echo, &key, "stdout").await?;
            }

            read = err_reader.read_until(b'\n', &mut err_buf), if err_open => {
                err_open = forward(read, &mut err_buf, &mut log, &mut console, echo, &key, "stderr").await?;
            }

            status = child.wait(), if !out_open && !err_open => {
                let status = status
                    .with_context(|| format!("waiting for process of '{key}'"))?;
                let code = status.code().unwrap_or(-1);
                info!(unit = %key, exit_code = code, success = status.success(), "process exited");
                break ProcessOutcome::Exited(code);
            }

            _ = &mut deadline => {
                warn!(unit = %key, timeout_secs = timeout.map(|t| t.as_secs()), "process timed out; killing");
                kill(&mut child, &key).await;
                break ProcessOutcome::TimedOut;
            }

            _ = interrupt.triggered() => {
                warn!(unit = %key, "interrupt received; killing process");
                kill(&mut child, &key).await;
                break ProcessOutcome::Interrupted;
            }
        }
    };

    log.flush()
        .await
        .with_context(|| format!("flushing log file {:?}", log_path))?;

    Ok(outcome)
}

/// Handle one `read_until` result. Returns whether the stream is still open.
///
/// Bytes are passed through as-is, so output that is not valid UTF-8 is kept
/// and the pipe keeps draining.
async fn forward(
    read: std::io::Result<usize>,
    buf: &mut Vec<u8>,
    log: &mut File,
    console: &mut tokio::io::Stdout,
    echo: bool,
    key: &str,
    stream: &str,
) -> Result<bool> {
    let open = match read {
        Ok(0) => false,
        Ok(_) => true,
        Err(e) => {
            debug!(unit = %key, error = %e, "{stream} read failed; closing stream");
            false
        }
    };

    // On close, whatever is left is an unterminated final line.
    if !buf.is_empty() {
        emit(log, console, echo, buf).await?;
        buf.clear();
    }
    Ok(open)
}

async fn emit(
    log: &mut File,
    console: &mut tokio::io::Stdout,
    echo: bool,
    line: &[u8],
) -> Result<()> {
    let line = line.strip_suffix(b"\n").unwrap_or(line);

    log.write_all(line).await.context("writing to log file")?;
    log.write_all(b"\n").await.context("writing to log file")?;
    log.flush().await.context("flushing log file")?;

    if echo {
        // Console output is best effort; a closed stdout must not fail the step.
        let text = String::from_utf8_lossy(line);
        let _ = console.write_all(text.as_bytes()).await;
        let _ = console.write_all(b"\n").await;
        let _ = console.flush().await;
    }
    Ok(())
}

async fn kill(child: &mut tokio::process::Child, key: &str) {
    if let Err(e) = child.kill().await {
        warn!(unit = %key, error = %e, "failed to kill child process");
    }
}
