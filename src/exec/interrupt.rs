// src/exec/interrupt.rs

//! Operator interrupt signal shared by the executor and the process runner.

use tokio::sync::watch;

/// Sending half, held by whoever listens for Ctrl-C / SIGTERM.
#[derive(Debug, Clone)]
pub struct InterruptHandle {
    tx: watch::Sender<bool>,
}

impl InterruptHandle {
    pub fn trigger(&self) {
        // send_replace never fails, even with no receivers left.
        self.tx.send_replace(true);
    }
}

/// Receiving half, cloned into every running process.
#[derive(Debug, Clone)]
pub struct Interrupt {
    rx: Option<watch::Receiver<bool>>,
}

impl Interrupt {
    pub fn channel() -> (InterruptHandle, Interrupt) {
        let (tx, rx) = watch::channel(false);
        (InterruptHandle { tx }, Interrupt { rx: Some(rx) })
    }

    /// An interrupt that can never fire.
    pub fn never() -> Interrupt {
        Interrupt { rx: None }
    }

    pub fn is_triggered(&self) -> bool {
        self.rx.as_ref().is_some_and(|rx| *rx.borrow())
    }

    /// Resolves once the interrupt fires. Pends forever if it cannot fire
    /// any more (handle dropped, or built with [`Interrupt::never`]).
    pub async fn triggered(&mut self) {
        let Some(rx) = self.rx.as_mut() else {
            return std::future::pending().await;
        };

        loop {
            if *rx.borrow_and_update() {
                return;
            }
            if rx.changed().await.is_err() {
                return std::future::pending().await;
            }
        }
    }
}
