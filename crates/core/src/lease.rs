// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Lease: one assignable unit of queued work.

use crate::capability::{hash_partial, normalize, Capabilities, CapabilityHash};
use serde::{Deserialize, Serialize};

crate::define_id! {
    /// Unique identifier for a lease.
    pub struct LeaseId;
}

/// A queued unit of work and the capabilities it requires.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lease {
    pub id: LeaseId,
    #[serde(default)]
    pub requirements: Capabilities,
    /// Lower values run sooner.
    #[serde(default)]
    pub priority: i32,
}

impl Lease {
    pub fn new(id: impl Into<LeaseId>, requirements: Capabilities) -> Self {
        Self {
            id: id.into(),
            requirements,
            priority: 0,
        }
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// The bucket this lease is assignable from.
    pub fn capability_hash(&self) -> CapabilityHash {
        hash_partial(&normalize(&self.requirements))
    }
}

#[cfg(test)]
#[path = "lease_tests.rs"]
mod tests;
