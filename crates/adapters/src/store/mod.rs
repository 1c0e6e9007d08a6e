// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Lease store adapters

mod memory;

pub use memory::MemoryLeaseStore;

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{AssignMethod, FakeLeaseStore, StoreCall};

use async_trait::async_trait;
use bf_core::{BotName, CapabilityHash, Lease};
use std::time::Duration;
use thiserror::Error;

/// Errors from lease store operations
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("store call timed out after {0:?}")]
    Timeout(Duration),
    #[error("store error: {0}")]
    Internal(String),
}

/// Durable store that owns queued leases and performs the actual assignment.
///
/// Both `assign_*` calls try to claim up to `bot_names.len()` leases whose
/// requirements hash to `capability_hash`, handing each to a name drawn from
/// `bot_names`. They return the names that received a lease; a name appears
/// once per lease it received. Calls for different hashes may run
/// concurrently.
#[async_trait]
pub trait LeaseStore: Clone + Send + Sync + 'static {
    /// Claim leases most-important first: lowest `priority` value, then oldest.
    async fn assign_n_leases_by_priority(
        &self,
        capability_hash: &CapabilityHash,
        bot_names: &[BotName],
    ) -> Result<Vec<BotName>, StoreError>;

    /// Claim leases oldest first.
    async fn assign_n_leases_by_age(
        &self,
        capability_hash: &CapabilityHash,
        bot_names: &[BotName],
    ) -> Result<Vec<BotName>, StoreError>;

    /// Hand over the next lease assigned to `bot_name`, if any.
    ///
    /// Called by a session handler after its wake signal fires.
    async fn take_assigned_lease(&self, bot_name: &BotName) -> Result<Option<Lease>, StoreError>;
}
