// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Supervised background task with cooperative shutdown

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;
use tokio::task::JoinHandle;

#[derive(Debug, Default)]
struct ShutdownInner {
    requested: AtomicBool,
    notify: Notify,
}

/// Cooperative shutdown flag.
///
/// Workers check it between units of work; sleepers can await it.
#[derive(Debug, Clone, Default)]
pub struct Shutdown {
    inner: Arc<ShutdownInner>,
}

impl Shutdown {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request(&self) {
        self.inner.requested.store(true, Ordering::SeqCst);
        self.inner.notify.notify_waiters();
    }

    pub fn is_requested(&self) -> bool {
        self.inner.requested.load(Ordering::SeqCst)
    }

    /// Resolves once shutdown has been requested.
    pub async fn requested(&self) {
        let notified = self.inner.notify.notified();
        tokio::pin!(notified);
        notified.as_mut().enable();
        if self.is_requested() {
            return;
        }
        notified.await;
    }
}

/// A unit of recurring background work.
#[async_trait]
pub trait Worker: Send + Sync + 'static {
    /// Name used in log fields.
    fn name(&self) -> &'static str;

    /// Run one iteration. Called in a loop until shutdown is requested;
    /// long iterations should check `shutdown` at their own boundaries.
    async fn tick(&self, shutdown: &Shutdown);
}

/// Pause before running the next tick after one panicked.
const PANIC_BACKOFF: Duration = Duration::from_secs(1);

struct Running {
    shutdown: Shutdown,
    handle: JoinHandle<()>,
}

/// Runs a [`Worker`] on a spawned tokio task.
pub struct BackgroundTask<W> {
    worker: Arc<W>,
    running: Mutex<Option<Running>>,
}

impl<W: Worker> BackgroundTask<W> {
    pub fn new(worker: Arc<W>) -> Self {
        Self {
            worker,
            running: Mutex::new(None),
        }
    }

    pub fn worker(&self) -> &Arc<W> {
        &self.worker
    }

    /// Spawn the worker loop. Must be called within a tokio runtime.
    ///
    /// Each tick runs on its own task. A tick that panics is logged and the
    /// loop carries on after [`PANIC_BACKOFF`].
    ///
    /// Returns `false` if the task was already running.
    pub fn start(&self) -> bool {
        let mut running = self.running.lock();
        if running.as_ref().is_some_and(|r| !r.handle.is_finished()) {
            tracing::warn!(task = self.worker.name(), "background task already running");
            return false;
        }

        let shutdown = Shutdown::new();
        let worker = Arc::clone(&self.worker);
        let loop_shutdown = shutdown.clone();
        let handle = tokio::spawn(async move {
            tracing::info!(task = worker.name(), "background task started");
            while !loop_shutdown.is_requested() {
                let tick_worker = Arc::clone(&worker);
                let tick_shutdown = loop_shutdown.clone();
                let tick = tokio::spawn(async move { tick_worker.tick(&tick_shutdown).await });
                if let Err(e) = tick.await {
                    tracing::error!(
                        task = worker.name(),
                        error = %e,
                        "background task tick panicked"
                    );
                    tokio::select! {
                        _ = tokio::time::sleep(PANIC_BACKOFF) => {}
                        _ = loop_shutdown.requested() => {}
                    }
                }
            }
            tracing::info!(task = worker.name(), "background task stopped");
        });
        *running = Some(Running { shutdown, handle });
        true
    }

    /// Request shutdown and wait for the loop to exit.
    pub async fn stop(&self) {
        let Some(Running { shutdown, handle }) = self.running.lock().take() else {
            return;
        };
        shutdown.request();
        if let Err(e) = handle.await {
            tracing::error!(task = self.worker.name(), error = %e, "background task panicked");
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
            .lock()
            .as_ref()
            .is_some_and(|r| !r.handle.is_finished())
    }
}

#[cfg(test)]
#[path = "task_tests.rs"]
mod tests;
