// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job assigner: the surface bot session handlers talk to.
//!
//! A handler long-polling for work calls [`JobAssigner::scoped_wait`], waits
//! on the returned guard, and on wake asks the store for the lease it was
//! given. The guard unregisters itself on drop, so a timed-out, failed, or
//! cancelled poll never leaves a stale waiter behind.

use crate::assignment::{AssignmentLoop, LoopStats, PolicyPicker, RandomPolicyPicker};
use crate::config::AssignerConfig;
use crate::error::AssignerError;
use crate::registry::{WaitHandle, WaiterRegistry};
use crate::signal::WakeSignal;
use crate::task::BackgroundTask;
use bf_adapters::LeaseStore;
use bf_core::{BotSession, CapabilityIndexer, IdGen, Lease, UuidIdGen};
use std::sync::Arc;
use std::time::Duration;

/// Matches waiting bots to queued leases through a [`LeaseStore`]
pub struct JobAssigner<S: LeaseStore> {
    registry: Arc<WaiterRegistry>,
    indexer: CapabilityIndexer,
    store: S,
    task: BackgroundTask<AssignmentLoop<S>>,
}

impl<S: LeaseStore> JobAssigner<S> {
    pub fn new(store: S, config: AssignerConfig) -> Result<Self, AssignerError> {
        Self::with_parts(store, config, Arc::new(UuidIdGen), Arc::new(RandomPolicyPicker))
    }

    /// Build with explicit wait-key generation and policy selection.
    pub fn with_parts(
        store: S,
        config: AssignerConfig,
        id_gen: Arc<dyn IdGen>,
        picker: Arc<dyn PolicyPicker>,
    ) -> Result<Self, AssignerError> {
        config.validate()?;
        let registry = Arc::new(WaiterRegistry::with_id_gen(id_gen));
        let assignment = AssignmentLoop::new(
            Arc::clone(&registry),
            store.clone(),
            config.poll_interval,
            config.priority_percentage,
        )
        .with_picker(picker);

        Ok(Self {
            registry,
            indexer: CapabilityIndexer::new(config.enumeration_warn_threshold),
            store,
            task: BackgroundTask::new(Arc::new(assignment)),
        })
    }

    /// Start the assignment loop. Must be called within a tokio runtime.
    pub fn start(&self) -> bool {
        self.task.start()
    }

    /// Stop the assignment loop, aborting any pass at its next bucket.
    pub async fn stop(&self) {
        self.task.stop().await;
    }

    pub fn is_running(&self) -> bool {
        self.task.is_running()
    }

    /// Distinct bots currently waiting, however many buckets each sits in.
    ///
    /// [`WaiterRegistry::listener_count`] gives the per-bucket figure.
    pub fn listener_count(&self) -> usize {
        self.registry.bot_count()
    }

    pub fn stats(&self) -> LoopStats {
        self.task.worker().stats()
    }

    pub fn registry(&self) -> &Arc<WaiterRegistry> {
        &self.registry
    }

    /// Register `session` as waiting for work until the guard is dropped.
    pub fn scoped_wait(&self, session: &BotSession) -> Result<WaitGuard, AssignerError> {
        let capabilities = session
            .capabilities()
            .ok_or_else(|| AssignerError::NoPrimaryDevice(session.name.clone()))?;
        let hashes = self.indexer.hashes_for(&capabilities)?;
        let (handle, signal) = self.registry.register(&session.name, hashes);
        Ok(WaitGuard {
            registry: Arc::clone(&self.registry),
            handle,
            signal,
            released: false,
        })
    }

    /// One long-poll cycle for `session`.
    ///
    /// Returns a lease already assigned to the bot if there is one, otherwise
    /// waits up to `timeout` for the loop to assign one. `None` means the
    /// poll timed out empty.
    pub async fn wait_for_lease(
        &self,
        session: &BotSession,
        timeout: Duration,
    ) -> Result<Option<Lease>, AssignerError> {
        if let Some(lease) = self.store.take_assigned_lease(&session.name).await? {
            return Ok(Some(lease));
        }

        let guard = self.scoped_wait(session)?;
        let woken = guard.wait(timeout).await;
        guard.release();
        if !woken {
            tracing::trace!(bot = %session.name, "long poll timed out");
        }
        // A lease may land between the timeout and unregistering.
        Ok(self.store.take_assigned_lease(&session.name).await?)
    }
}

/// Live registration of one waiting bot session.
///
/// Dropping the guard unregisters it.
pub struct WaitGuard {
    registry: Arc<WaiterRegistry>,
    handle: WaitHandle,
    signal: WakeSignal,
    released: bool,
}

impl WaitGuard {
    pub fn signal(&self) -> &WakeSignal {
        &self.signal
    }

    pub fn handle(&self) -> &WaitHandle {
        &self.handle
    }

    pub fn is_woken(&self) -> bool {
        self.signal.is_set()
    }

    /// Wait at most `timeout` for work to be assigned.
    pub async fn wait(&self, timeout: Duration) -> bool {
        self.signal.wait_timeout(timeout).await
    }

    /// Unregister now instead of at drop.
    pub fn release(mut self) {
        self.unregister();
    }

    fn unregister(&mut self) {
        if !self.released {
            self.registry.unregister(&self.handle);
            self.released = true;
        }
    }
}

impl Drop for WaitGuard {
    fn drop(&mut self) {
        self.unregister();
    }
}

#[cfg(test)]
#[path = "assigner_tests.rs"]
mod tests;
