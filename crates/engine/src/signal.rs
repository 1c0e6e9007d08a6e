// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! One-shot wake signal a waiting bot session blocks on.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;

#[derive(Debug, Default)]
struct SignalInner {
    set: AtomicBool,
    notify: Notify,
}

/// Binary signal: starts unset, can be set once, never resets.
///
/// Clones share state. Setting and observing do not touch the registry lock.
#[derive(Debug, Clone, Default)]
pub struct WakeSignal {
    inner: Arc<SignalInner>,
}

impl WakeSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the signal, waking every waiter.
    ///
    /// Returns `false` if it was already set.
    pub fn set(&self) -> bool {
        let first = !self.inner.set.swap(true, Ordering::SeqCst);
        if first {
            self.inner.notify.notify_waiters();
        }
        first
    }

    pub fn is_set(&self) -> bool {
        self.inner.set.load(Ordering::SeqCst)
    }

    /// Wait until the signal is set.
    pub async fn wait(&self) {
        let notified = self.inner.notify.notified();
        tokio::pin!(notified);
        // Register interest before checking the flag so a concurrent set()
        // cannot slip between the check and the await.
        notified.as_mut().enable();
        if self.is_set() {
            return;
        }
        notified.await;
    }

    /// Wait at most `timeout`. Returns whether the signal was set.
    pub async fn wait_timeout(&self, timeout: Duration) -> bool {
        tokio::time::timeout(timeout, self.wait()).await.is_ok() || self.is_set()
    }
}

#[cfg(test)]
#[path = "signal_tests.rs"]
mod tests;
