// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Background assignment loop.
//!
//! Idle: wait for a new registration or the poll interval, whichever comes
//! first. Assigning: one pass over every active bucket, asking the store to
//! hand leases to the bots waiting there and firing the winners' signals.

use crate::registry::WaiterRegistry;
use crate::task::{Shutdown, Worker};
use async_trait::async_trait;
use bf_adapters::{LeaseStore, StoreError};
use rand::Rng;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Which leases a pass hands out first
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionPolicy {
    /// Most important lease first
    Priority,
    /// Oldest lease first
    Age,
}

/// Chooses the selection policy for one pass.
pub trait PolicyPicker: Send + Sync + 'static {
    fn pick(&self, priority_percentage: u8) -> SelectionPolicy;
}

/// Picks [`SelectionPolicy::Priority`] with probability `priority_percentage / 100`.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomPolicyPicker;

impl PolicyPicker for RandomPolicyPicker {
    fn pick(&self, priority_percentage: u8) -> SelectionPolicy {
        if rand::rng().random_range(0..100u8) < priority_percentage {
            SelectionPolicy::Priority
        } else {
            SelectionPolicy::Age
        }
    }
}

/// What one pass did
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PassReport {
    pub policy: SelectionPolicy,
    /// Buckets offered to the store.
    pub buckets: usize,
    /// Signals that went from unset to set.
    pub fired: usize,
    /// Shutdown interrupted the pass before every bucket was visited.
    pub aborted: bool,
}

/// Counters for observability
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoopStats {
    pub passes: u64,
    pub failed_passes: u64,
    pub signals_fired: u64,
}

#[derive(Default)]
struct Counters {
    passes: AtomicU64,
    failed_passes: AtomicU64,
    signals_fired: AtomicU64,
}

/// Assigns leases to waiting bots
pub struct AssignmentLoop<S> {
    registry: Arc<WaiterRegistry>,
    store: S,
    poll_interval: Duration,
    priority_percentage: u8,
    picker: Arc<dyn PolicyPicker>,
    counters: Counters,
}

impl<S: LeaseStore> AssignmentLoop<S> {
    pub fn new(
        registry: Arc<WaiterRegistry>,
        store: S,
        poll_interval: Duration,
        priority_percentage: u8,
    ) -> Self {
        Self {
            registry,
            store,
            poll_interval,
            priority_percentage: priority_percentage.min(100),
            picker: Arc::new(RandomPolicyPicker),
            counters: Counters::default(),
        }
    }

    pub fn with_picker(mut self, picker: Arc<dyn PolicyPicker>) -> Self {
        self.picker = picker;
        self
    }

    pub fn stats(&self) -> LoopStats {
        LoopStats {
            passes: self.counters.passes.load(Ordering::Relaxed),
            failed_passes: self.counters.failed_passes.load(Ordering::Relaxed),
            signals_fired: self.counters.signals_fired.load(Ordering::Relaxed),
        }
    }

    /// Run one pass over every active bucket.
    ///
    /// The policy is chosen once for the whole pass. The registry lock is
    /// only held while taking snapshots and firing, never across a store
    /// call. A store error ends the pass early.
    pub async fn run_pass(&self, shutdown: &Shutdown) -> Result<PassReport, StoreError> {
        let policy = self.picker.pick(self.priority_percentage);
        let mut report = PassReport {
            policy,
            buckets: 0,
            fired: 0,
            aborted: false,
        };

        for hash in self.registry.active_capability_hashes() {
            if shutdown.is_requested() {
                report.aborted = true;
                break;
            }
            let bot_names = self.registry.bot_names_for(&hash);
            if bot_names.is_empty() {
                continue;
            }
            report.buckets += 1;

            let winners = match policy {
                SelectionPolicy::Priority => {
                    self.store
                        .assign_n_leases_by_priority(&hash, &bot_names)
                        .await?
                }
                SelectionPolicy::Age => {
                    self.store
                        .assign_n_leases_by_age(&hash, &bot_names)
                        .await?
                }
            };
            for bot in &winners {
                report.fired += self.registry.fire(&hash, bot);
            }
        }

        self.counters.passes.fetch_add(1, Ordering::Relaxed);
        self.counters
            .signals_fired
            .fetch_add(report.fired as u64, Ordering::Relaxed);
        Ok(report)
    }
}

#[async_trait]
impl<S: LeaseStore> Worker for AssignmentLoop<S> {
    fn name(&self) -> &'static str {
        "assignment-loop"
    }

    async fn tick(&self, shutdown: &Shutdown) {
        tokio::select! {
            _ = self.registry.new_registration().notified() => {}
            _ = tokio::time::sleep(self.poll_interval) => {}
            _ = shutdown.requested() => return,
        }

        match self.run_pass(shutdown).await {
            Ok(report) if report.buckets > 0 => tracing::debug!(
                policy = ?report.policy,
                buckets = report.buckets,
                fired = report.fired,
                aborted = report.aborted,
                "assignment pass complete"
            ),
            Ok(_) => {}
            Err(e) => {
                self.counters.failed_passes.fetch_add(1, Ordering::Relaxed);
                tracing::error!(error = %e, "assignment pass failed");
            }
        }
    }
}

#[cfg(test)]
#[path = "assignment_tests.rs"]
mod tests;
