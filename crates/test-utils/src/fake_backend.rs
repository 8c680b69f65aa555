use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use anyhow::anyhow;

use deployrun::errors::Result;
use deployrun::exec::{Interrupt, Invocation, ProcessBackend, ProcessOutcome};

/// What the fake does for a matching invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scripted {
    Exit(i32),
    TimedOut,
    Interrupted,
    /// Behave like a process that could not be spawned.
    SpawnError(String),
    /// Block until the run's interrupt fires, then report `Interrupted`.
    WaitForInterrupt,
}

/// A fake process backend that:
/// - records every invocation it receives
/// - answers with the first scripted rule whose needle occurs in any argv
///   element, or `Exit(0)` when none matches.
///
/// Clones share state, so a test can keep one and hand the other to the
/// executor.
#[derive(Debug, Clone, Default)]
pub struct FakeBackend {
    invocations: Arc<Mutex<Vec<Invocation>>>,
    rules: Arc<Mutex<Vec<(String, Scripted)>>>,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond_when_contains(self, needle: &str, response: Scripted) -> Self {
        self.rules
            .lock()
            .unwrap()
            .push((needle.to_string(), response));
        self
    }

    pub fn fail_when_contains(self, needle: &str, exit_code: i32) -> Self {
        self.respond_when_contains(needle, Scripted::Exit(exit_code))
    }

    /// Drop every scripted rule, so later invocations succeed.
    pub fn clear_rules(&self) {
        self.rules.lock().unwrap().clear();
    }

    pub fn invocations(&self) -> Vec<Invocation> {
        self.invocations.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.invocations.lock().unwrap().len()
    }

    /// Ledger keys of the invocations, in call order.
    pub fn keys(&self) -> Vec<String> {
        self.invocations().into_iter().map(|i| i.key).collect()
    }

    /// How many invocations mentioned `needle` in their argv.
    pub fn count_containing(&self, needle: &str) -> usize {
        self.invocations()
            .iter()
            .filter(|inv| inv.argv.iter().any(|arg| arg.contains(needle)))
            .count()
    }

    fn response_for(&self, invocation: &Invocation) -> Scripted {
        let rules = self.rules.lock().unwrap();
        rules
            .iter()
            .find(|(needle, _)| invocation.argv.iter().any(|arg| arg.contains(needle.as_str())))
            .map(|(_, response)| response.clone())
            .unwrap_or(Scripted::Exit(0))
    }
}

impl ProcessBackend for FakeBackend {
    fn execute(
        &mut self,
        invocation: Invocation,
        mut interrupt: Interrupt,
    ) -> Pin<Box<dyn Future<Output = Result<ProcessOutcome>> + Send + '_>> {
        let response = self.response_for(&invocation);
        self.invocations.lock().unwrap().push(invocation);

        Box::pin(async move {
            match response {
                Scripted::Exit(code) => Ok(ProcessOutcome::Exited(code)),
                Scripted::TimedOut => Ok(ProcessOutcome::TimedOut),
                Scripted::Interrupted => Ok(ProcessOutcome::Interrupted),
                Scripted::SpawnError(msg) => Err(anyhow!(msg).into()),
                Scripted::WaitForInterrupt => {
                    interrupt.triggered().await;
                    Ok(ProcessOutcome::Interrupted)
                }
            }
        })
    }
}
