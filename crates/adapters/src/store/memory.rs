// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-process lease store.
//!
//! Keeps queued leases in memory and assigns them atomically under one lock.
//! Useful for embedding the assigner without a database and as the reference
//! behaviour the assigner's integration tests run against.

use super::{LeaseStore, StoreError};
use async_trait::async_trait;
use bf_core::{BotName, CapabilityHash, Lease, LeaseId};
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::Arc;

#[derive(Debug, Clone, Copy)]
enum Order {
    Age,
    Priority,
}

#[derive(Debug)]
struct QueuedLease {
    hash: CapabilityHash,
    lease: Lease,
}

#[derive(Debug, Default)]
struct MemoryState {
    next_seq: u64,
    /// Keyed by enqueue sequence, so iteration order is age order.
    queued: BTreeMap<u64, QueuedLease>,
    assigned: HashMap<BotName, VecDeque<Lease>>,
}

/// Lease store backed by process memory
#[derive(Clone, Default)]
pub struct MemoryLeaseStore {
    inner: Arc<Mutex<MemoryState>>,
}

impl MemoryLeaseStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a lease. Leases enqueued earlier are older.
    pub fn enqueue(&self, lease: Lease) {
        let hash = lease.capability_hash();
        let mut state = self.inner.lock();
        let seq = state.next_seq;
        state.next_seq += 1;
        tracing::trace!(lease = %lease.id, seq, "lease queued");
        state.queued.insert(seq, QueuedLease { hash, lease });
    }

    /// Remove a queued lease that has not been assigned yet.
    pub fn cancel(&self, id: &LeaseId) -> bool {
        let mut state = self.inner.lock();
        let seq = state
            .queued
            .iter()
            .find(|(_, q)| q.lease.id == *id)
            .map(|(seq, _)| *seq);
        seq.and_then(|seq| state.queued.remove(&seq)).is_some()
    }

    pub fn queued_count(&self) -> usize {
        self.inner.lock().queued.len()
    }

    /// Leases assigned but not yet taken by their bot.
    pub fn assigned_count(&self) -> usize {
        self.inner.lock().assigned.values().map(VecDeque::len).sum()
    }

    fn assign(&self, hash: &CapabilityHash, bot_names: &[BotName], order: Order) -> Vec<BotName> {
        let mut state = self.inner.lock();

        let mut candidates: Vec<(u64, i32)> = state
            .queued
            .iter()
            .filter(|(_, q)| q.hash == *hash)
            .map(|(seq, q)| (*seq, q.lease.priority))
            .collect();
        if let Order::Priority = order {
            // Stable sort keeps age order among equal priorities.
            candidates.sort_by_key(|(_, priority)| *priority);
        }

        let mut winners = Vec::new();
        for ((seq, _), bot) in candidates.into_iter().zip(bot_names) {
            let Some(queued) = state.queued.remove(&seq) else {
                continue;
            };
            tracing::debug!(lease = %queued.lease.id, bot = %bot, ?order, "lease assigned");
            state
                .assigned
                .entry(bot.clone())
                .or_default()
                .push_back(queued.lease);
            winners.push(bot.clone());
        }
        winners
    }
}

#[async_trait]
impl LeaseStore for MemoryLeaseStore {
    async fn assign_n_leases_by_priority(
        &self,
        capability_hash: &CapabilityHash,
        bot_names: &[BotName],
    ) -> Result<Vec<BotName>, StoreError> {
        Ok(self.assign(capability_hash, bot_names, Order::Priority))
    }

    async fn assign_n_leases_by_age(
        &self,
        capability_hash: &CapabilityHash,
        bot_names: &[BotName],
    ) -> Result<Vec<BotName>, StoreError> {
        Ok(self.assign(capability_hash, bot_names, Order::Age))
    }

    async fn take_assigned_lease(&self, bot_name: &BotName) -> Result<Option<Lease>, StoreError> {
        let mut state = self.inner.lock();
        let Some(queue) = state.assigned.get_mut(bot_name) else {
            return Ok(None);
        };
        let lease = queue.pop_front();
        if queue.is_empty() {
            state.assigned.remove(bot_name);
        }
        Ok(lease)
    }
}

#[cfg(test)]
#[path = "memory_tests.rs"]
mod tests;
