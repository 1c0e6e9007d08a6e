// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! bf-core: data model for the botfarm lease assigner

pub mod capability;
pub mod id;
pub mod lease;
pub mod session;

pub use capability::{
    capability_hashes_for, enumerate_partial_capabilities, hash_partial, normalize, Capabilities,
    CapabilityError, CapabilityHash, CapabilityIndexer, NormalizedCapabilities,
    PartialCapabilities, DEFAULT_ENUMERATION_WARN_THRESHOLD,
};
pub use id::{IdGen, UuidIdGen};
pub use lease::{Lease, LeaseId};
pub use session::{BotName, BotSession, Device};

#[cfg(any(test, feature = "test-support"))]
pub use id::SequentialIdGen;
