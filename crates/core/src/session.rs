// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Bot session descriptor.
//!
//! Sessions arrive over the bot protocol (handled elsewhere); the assigner
//! only reads the bot name and the primary device's properties.

use crate::capability::Capabilities;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

crate::define_id! {
    /// Name a bot registers under.
    pub struct BotName;
}

/// A device attached to a bot, with its declared properties.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Device {
    pub handle: String,
    #[serde(default)]
    pub properties: BTreeMap<String, Vec<String>>,
}

impl Device {
    pub fn new(handle: impl Into<String>) -> Self {
        Self {
            handle: handle.into(),
            properties: BTreeMap::new(),
        }
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties
            .entry(key.into())
            .or_default()
            .push(value.into());
        self
    }
}

/// One bot's session as reported in its latest heartbeat.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BotSession {
    pub name: BotName,
    /// The first device is the primary device.
    #[serde(default)]
    pub devices: Vec<Device>,
}

impl BotSession {
    pub fn new(name: impl Into<BotName>, devices: Vec<Device>) -> Self {
        Self {
            name: name.into(),
            devices,
        }
    }

    pub fn primary_device(&self) -> Option<&Device> {
        self.devices.first()
    }

    /// Capabilities declared by the primary device, if the bot has one.
    pub fn capabilities(&self) -> Option<Capabilities> {
        self.primary_device()
            .map(|device| Capabilities::from_properties(&device.properties))
    }
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
