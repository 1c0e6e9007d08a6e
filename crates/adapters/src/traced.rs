// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Traced store wrapper for consistent observability

use crate::store::{LeaseStore, StoreError};
use async_trait::async_trait;
use bf_core::{BotName, CapabilityHash, Lease};
use tracing::Instrument;

/// Wrapper that adds tracing to any LeaseStore
#[derive(Clone)]
pub struct TracedStore<S> {
    inner: S,
}

impl<S> TracedStore<S> {
    pub fn new(inner: S) -> Self {
        Self { inner }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }
}

/// Time an assignment call and log its outcome.
///
/// Failures are logged at `warn`; the caller decides whether they are errors.
async fn traced_assign<F>(offered: usize, call: F) -> Result<Vec<BotName>, StoreError>
where
    F: std::future::Future<Output = Result<Vec<BotName>, StoreError>>,
{
    let start = std::time::Instant::now();
    let result = call.await;
    let elapsed_ms = start.elapsed().as_millis() as u64;
    match &result {
        Ok(winners) => tracing::debug!(offered, assigned = winners.len(), elapsed_ms, "assigned"),
        Err(e) => tracing::warn!(offered, elapsed_ms, error = %e, "assign failed"),
    }
    result
}

#[async_trait]
impl<S: LeaseStore> LeaseStore for TracedStore<S> {
    async fn assign_n_leases_by_priority(
        &self,
        capability_hash: &CapabilityHash,
        bot_names: &[BotName],
    ) -> Result<Vec<BotName>, StoreError> {
        traced_assign(
            bot_names.len(),
            self.inner
                .assign_n_leases_by_priority(capability_hash, bot_names),
        )
        .instrument(tracing::debug_span!(
            "store.assign",
            policy = "priority",
            hash = capability_hash.short(12)
        ))
        .await
    }

    async fn assign_n_leases_by_age(
        &self,
        capability_hash: &CapabilityHash,
        bot_names: &[BotName],
    ) -> Result<Vec<BotName>, StoreError> {
        traced_assign(
            bot_names.len(),
            self.inner.assign_n_leases_by_age(capability_hash, bot_names),
        )
        .instrument(tracing::debug_span!(
            "store.assign",
            policy = "age",
            hash = capability_hash.short(12)
        ))
        .await
    }

    async fn take_assigned_lease(&self, bot_name: &BotName) -> Result<Option<Lease>, StoreError> {
        let result = self.inner.take_assigned_lease(bot_name).await;
        match &result {
            Ok(lease) => tracing::trace!(
                bot = %bot_name,
                lease = ?lease.as_ref().map(|l| l.id.as_str()),
                "took assigned lease"
            ),
            Err(e) => tracing::warn!(bot = %bot_name, error = %e, "take_assigned_lease failed"),
        }
        result
    }
}

#[cfg(test)]
#[path = "traced_tests.rs"]
mod tests;
