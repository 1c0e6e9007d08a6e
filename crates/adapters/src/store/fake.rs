// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake lease store for testing
#![cfg_attr(coverage_nightly, coverage(off))]

use super::{LeaseStore, StoreError};
use async_trait::async_trait;
use bf_core::{BotName, CapabilityHash, Lease};
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;

/// Which assignment entry point was called
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignMethod {
    Priority,
    Age,
}

/// Recorded assignment call
#[derive(Debug, Clone)]
pub struct StoreCall {
    pub method: AssignMethod,
    pub capability_hash: CapabilityHash,
    pub bot_names: Vec<BotName>,
}

#[derive(Debug, Clone)]
enum Response {
    /// Every offered name wins.
    All,
    /// The first `n` offered names win.
    First(usize),
    Fail(StoreError),
}

struct FakeStoreState {
    calls: Vec<StoreCall>,
    response: Response,
    delay: Option<Duration>,
    leases: HashMap<BotName, VecDeque<Lease>>,
}

/// Fake lease store with scripted assignment results
#[derive(Clone)]
pub struct FakeLeaseStore {
    inner: Arc<Mutex<FakeStoreState>>,
}

impl Default for FakeLeaseStore {
    fn default() -> Self {
        Self {
            inner: Arc::new(Mutex::new(FakeStoreState {
                calls: Vec::new(),
                response: Response::All,
                delay: None,
                leases: HashMap::new(),
            })),
        }
    }
}

impl FakeLeaseStore {
    /// Store where every offered bot receives a lease.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store that awards only the first `n` offered bots.
    pub fn first(n: usize) -> Self {
        let store = Self::default();
        store.inner.lock().response = Response::First(n);
        store
    }

    /// Store whose assignment calls all fail with `error`.
    pub fn failing(error: StoreError) -> Self {
        let store = Self::default();
        store.inner.lock().response = Response::Fail(error);
        store
    }

    /// Sleep this long inside every assignment call.
    pub fn with_delay(self, delay: Duration) -> Self {
        self.inner.lock().delay = Some(delay);
        self
    }

    /// Lease returned by the next `take_assigned_lease` for `bot`.
    pub fn push_lease(&self, bot: impl Into<BotName>, lease: Lease) {
        self.inner
            .lock()
            .leases
            .entry(bot.into())
            .or_default()
            .push_back(lease);
    }

    /// Get all recorded assignment calls
    pub fn calls(&self) -> Vec<StoreCall> {
        self.inner.lock().calls.clone()
    }

    pub fn call_count(&self, method: AssignMethod) -> usize {
        self.inner
            .lock()
            .calls
            .iter()
            .filter(|c| c.method == method)
            .count()
    }

    async fn record(
        &self,
        method: AssignMethod,
        capability_hash: &CapabilityHash,
        bot_names: &[BotName],
    ) -> Result<Vec<BotName>, StoreError> {
        let (response, delay) = {
            let mut state = self.inner.lock();
            state.calls.push(StoreCall {
                method,
                capability_hash: capability_hash.clone(),
                bot_names: bot_names.to_vec(),
            });
            (state.response.clone(), state.delay)
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        match response {
            Response::All => Ok(bot_names.to_vec()),
            Response::First(n) => Ok(bot_names.iter().take(n).cloned().collect()),
            Response::Fail(e) => Err(e),
        }
    }
}

#[async_trait]
impl LeaseStore for FakeLeaseStore {
    async fn assign_n_leases_by_priority(
        &self,
        capability_hash: &CapabilityHash,
        bot_names: &[BotName],
    ) -> Result<Vec<BotName>, StoreError> {
        self.record(AssignMethod::Priority, capability_hash, bot_names)
            .await
    }

    async fn assign_n_leases_by_age(
        &self,
        capability_hash: &CapabilityHash,
        bot_names: &[BotName],
    ) -> Result<Vec<BotName>, StoreError> {
        self.record(AssignMethod::Age, capability_hash, bot_names)
            .await
    }

    async fn take_assigned_lease(&self, bot_name: &BotName) -> Result<Option<Lease>, StoreError> {
        Ok(self
            .inner
            .lock()
            .leases
            .get_mut(bot_name)
            .and_then(VecDeque::pop_front))
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
