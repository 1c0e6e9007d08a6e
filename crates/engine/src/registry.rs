// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Registry of bot sessions waiting for work.
//!
//! Layout: `capability hash -> bot name -> wait key -> wake signal`, behind a
//! single mutex. Empty bot maps and hash buckets are pruned on removal, so
//! the active hashes are exactly those with at least one waiting bot.

use crate::signal::WakeSignal;
use bf_core::{BotName, CapabilityHash, IdGen, UuidIdGen};
use parking_lot::Mutex;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::Notify;

bf_core::define_id! {
    /// Key of one registration; unique per `register` call.
    pub struct WaitKey;
}

type Waiters = HashMap<WaitKey, WakeSignal>;
type Bucket = HashMap<BotName, Waiters>;

/// Identifies one registration for cleanup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WaitHandle {
    bot_name: BotName,
    wait_key: WaitKey,
    hashes: Vec<CapabilityHash>,
}

impl WaitHandle {
    pub fn bot_name(&self) -> &BotName {
        &self.bot_name
    }

    pub fn wait_key(&self) -> &WaitKey {
        &self.wait_key
    }

    /// Buckets this registration was inserted into.
    pub fn capability_hashes(&self) -> &[CapabilityHash] {
        &self.hashes
    }
}

/// Waiting bot sessions indexed by capability hash
pub struct WaiterRegistry {
    events: Mutex<HashMap<CapabilityHash, Bucket>>,
    new_registration: Notify,
    id_gen: Arc<dyn IdGen>,
}

impl Default for WaiterRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl WaiterRegistry {
    pub fn new() -> Self {
        Self::with_id_gen(Arc::new(UuidIdGen))
    }

    pub fn with_id_gen(id_gen: Arc<dyn IdGen>) -> Self {
        Self {
            events: Mutex::new(HashMap::new()),
            new_registration: Notify::new(),
            id_gen,
        }
    }

    /// Register `bot_name` as waiting under every hash in `capability_hashes`.
    ///
    /// The same signal is stored in every bucket; it is returned for the
    /// caller to wait on outside the lock. Nudges the assignment loop so the
    /// new waiter is considered without waiting a full poll interval.
    pub fn register<I>(&self, bot_name: &BotName, capability_hashes: I) -> (WaitHandle, WakeSignal)
    where
        I: IntoIterator<Item = CapabilityHash>,
    {
        let wait_key = WaitKey::new(self.id_gen.next());
        let signal = WakeSignal::new();
        let hashes: Vec<CapabilityHash> = capability_hashes.into_iter().collect();

        {
            let mut events = self.events.lock();
            for hash in &hashes {
                events
                    .entry(hash.clone())
                    .or_default()
                    .entry(bot_name.clone())
                    .or_default()
                    .insert(wait_key.clone(), signal.clone());
            }
        }
        tracing::trace!(
            bot = %bot_name,
            wait_key = %wait_key,
            buckets = hashes.len(),
            "registered waiter"
        );

        // Stores a permit if the loop is mid-pass, so the nudge is not lost.
        self.new_registration.notify_one();

        (
            WaitHandle {
                bot_name: bot_name.clone(),
                wait_key,
                hashes,
            },
            signal,
        )
    }

    /// Remove a registration from every bucket it was inserted into.
    ///
    /// Safe to call more than once for the same handle.
    pub fn unregister(&self, handle: &WaitHandle) {
        let mut events = self.events.lock();
        for hash in &handle.hashes {
            let Some(bucket) = events.get_mut(hash) else {
                continue;
            };
            if let Some(waiters) = bucket.get_mut(&handle.bot_name) {
                waiters.remove(&handle.wait_key);
                if waiters.is_empty() {
                    bucket.remove(&handle.bot_name);
                }
            }
            if bucket.is_empty() {
                events.remove(hash);
            }
        }
        drop(events);
        tracing::trace!(
            bot = %handle.bot_name,
            wait_key = %handle.wait_key,
            "unregistered waiter"
        );
    }

    /// Number of distinct `(capability hash, bot name)` pairs.
    pub fn listener_count(&self) -> usize {
        self.events.lock().values().map(HashMap::len).sum()
    }

    /// Number of distinct bots with at least one live registration.
    pub fn bot_count(&self) -> usize {
        let events = self.events.lock();
        let bots: HashSet<&BotName> = events.values().flat_map(HashMap::keys).collect();
        bots.len()
    }

    /// Number of registrations across all buckets and bots.
    pub fn waiter_count(&self) -> usize {
        self.events
            .lock()
            .values()
            .flat_map(HashMap::values)
            .map(HashMap::len)
            .sum()
    }

    /// Snapshot of hashes with at least one waiting bot.
    pub fn active_capability_hashes(&self) -> BTreeSet<CapabilityHash> {
        self.events.lock().keys().cloned().collect()
    }

    /// Snapshot of the bots waiting under `capability_hash`, sorted by name.
    pub fn bot_names_for(&self, capability_hash: &CapabilityHash) -> Vec<BotName> {
        let mut names: Vec<BotName> = self
            .events
            .lock()
            .get(capability_hash)
            .map(|bucket| bucket.keys().cloned().collect())
            .unwrap_or_default();
        names.sort();
        names
    }

    /// Set every signal registered for `(capability_hash, bot_name)`.
    ///
    /// Returns how many signals went from unset to set.
    pub fn fire(&self, capability_hash: &CapabilityHash, bot_name: &BotName) -> usize {
        let events = self.events.lock();
        events
            .get(capability_hash)
            .and_then(|bucket| bucket.get(bot_name))
            .map(|waiters| waiters.values().filter(|signal| signal.set()).count())
            .unwrap_or(0)
    }

    /// Trigger the assignment loop waits on between passes.
    pub fn new_registration(&self) -> &Notify {
        &self.new_registration
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
