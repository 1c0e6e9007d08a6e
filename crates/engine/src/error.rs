// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for the assigner

use crate::config::ConfigError;
use bf_adapters::StoreError;
use bf_core::{BotName, CapabilityError};
use thiserror::Error;

/// Errors surfaced to bot session handlers
#[derive(Debug, Error)]
pub enum AssignerError {
    #[error("bot {0} has no primary device")]
    NoPrimaryDevice(BotName),
    #[error("capability error: {0}")]
    Capability(#[from] CapabilityError),
    #[error("store error: {0}")]
    Store(#[from] StoreError),
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
}
