// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Capability sets and the partial-capability index.
//!
//! A bot declares a set of values per capability key. A lease matches a bot
//! when its requirements are a *partial capability* of the bot: a sub-map
//! keeping, for each retained key, a non-empty subset of that key's values.
//! Every partial capability is hashed into a [`CapabilityHash`], and bots are
//! indexed under the hashes of all their partial capabilities, so a lease
//! only has to look up the single bucket for its own requirements.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use thiserror::Error;

crate::define_id! {
    /// Hex SHA-256 digest of a normalized partial capability.
    ///
    /// This is the bucket key joining waiting bots to queued leases.
    pub struct CapabilityHash;
}

/// Warn when a capability set flattens to more pairs than this.
pub const DEFAULT_ENUMERATION_WARN_THRESHOLD: usize = 10;

/// The powerset is indexed by a `u64` bitmask.
const MAX_ENUMERABLE_PAIRS: usize = 63;

/// Capability map with each key's values sorted and de-duplicated.
pub type NormalizedCapabilities = BTreeMap<String, Vec<String>>;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CapabilityError {
    #[error("capability set has {pairs} key/value pairs, at most {max} can be enumerated")]
    TooManyPairs { pairs: usize, max: usize },
}

/// Capabilities declared by a bot: key -> set of values.
///
/// Keys never map to an empty set, however the value was built.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "HashMap<String, HashSet<String>>")]
pub struct Capabilities(HashMap<String, HashSet<String>>);

impl From<HashMap<String, HashSet<String>>> for Capabilities {
    fn from(map: HashMap<String, HashSet<String>>) -> Self {
        map.into_iter().collect()
    }
}

impl Capabilities {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`Capabilities::insert`].
    pub fn with<I>(mut self, key: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        self.insert(key, values);
        self
    }

    /// Add values under `key`, merging with any already present.
    ///
    /// A key with no values is not recorded.
    pub fn insert<I>(&mut self, key: impl Into<String>, values: I)
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        let values: HashSet<String> = values.into_iter().map(Into::into).collect();
        if values.is_empty() {
            return;
        }
        self.0.entry(key.into()).or_default().extend(values);
    }

    /// Build from device properties (`key -> list of values`).
    pub fn from_properties<'a, I>(properties: I) -> Self
    where
        I: IntoIterator<Item = (&'a String, &'a Vec<String>)>,
    {
        let mut caps = Self::new();
        for (key, values) in properties {
            caps.insert(key.as_str(), values.iter().map(String::as_str));
        }
        caps
    }

    pub fn get(&self, key: &str) -> Option<&HashSet<String>> {
        self.0.get(key)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of flattened `(key, value)` pairs.
    pub fn pair_count(&self) -> usize {
        self.0.values().map(HashSet::len).sum()
    }
}

impl<K, I> FromIterator<(K, I)> for Capabilities
where
    K: Into<String>,
    I: IntoIterator,
    I::Item: Into<String>,
{
    fn from_iter<T: IntoIterator<Item = (K, I)>>(iter: T) -> Self {
        let mut caps = Self::new();
        for (key, values) in iter {
            caps.insert(key, values);
        }
        caps
    }
}

/// Replace each key's value set with a sorted list, dropping empty sets.
pub fn normalize(capabilities: &Capabilities) -> NormalizedCapabilities {
    capabilities
        .0
        .iter()
        .filter(|(_, values)| !values.is_empty())
        .map(|(key, values)| {
            let mut values: Vec<String> = values.iter().cloned().collect();
            values.sort();
            (key.clone(), values)
        })
        .collect()
}

/// Hash a partial capability.
///
/// Values are re-sorted and de-duplicated before hashing, so any two maps
/// with the same keys mapped to the same value sets hash identically. Keys
/// with no values are skipped, so `{os: []}` hashes like `{}`.
pub fn hash_partial(partial: &NormalizedCapabilities) -> CapabilityHash {
    let canonical: BTreeMap<&str, Vec<&str>> = partial
        .iter()
        .filter(|(_, values)| !values.is_empty())
        .map(|(key, values)| {
            let mut values: Vec<&str> = values.iter().map(String::as_str).collect();
            values.sort_unstable();
            values.dedup();
            (key.as_str(), values)
        })
        .collect();
    // A map of strings to string lists always serializes.
    let json = serde_json::to_string(&canonical).unwrap_or_default();
    let digest = Sha256::digest(json.as_bytes());
    CapabilityHash::new(format!("{:x}", digest))
}

/// Enumerate every partial capability of `capabilities`.
///
/// Uses [`DEFAULT_ENUMERATION_WARN_THRESHOLD`]; see
/// [`CapabilityIndexer::enumerate`].
pub fn enumerate_partial_capabilities(
    capabilities: &Capabilities,
) -> Result<PartialCapabilities, CapabilityError> {
    CapabilityIndexer::default().enumerate(capabilities)
}

/// Every bucket a bot with `capabilities` is registered under.
pub fn capability_hashes_for(
    capabilities: &Capabilities,
) -> Result<BTreeSet<CapabilityHash>, CapabilityError> {
    CapabilityIndexer::default().hashes_for(capabilities)
}

/// Expands capability sets into bucket hashes.
#[derive(Debug, Clone, Copy)]
pub struct CapabilityIndexer {
    warn_threshold: usize,
}

impl Default for CapabilityIndexer {
    fn default() -> Self {
        Self::new(DEFAULT_ENUMERATION_WARN_THRESHOLD)
    }
}

impl CapabilityIndexer {
    pub fn new(warn_threshold: usize) -> Self {
        Self { warn_threshold }
    }

    pub fn warn_threshold(&self) -> usize {
        self.warn_threshold
    }

    /// Lazily enumerate the powerset of flattened `(key, value)` pairs,
    /// regrouped by key.
    ///
    /// Yields `2^N` maps for `N` pairs, starting with the empty map. Above the
    /// warn threshold a warning is logged first; enumeration still runs in
    /// full since matching needs every subset.
    pub fn enumerate(
        &self,
        capabilities: &Capabilities,
    ) -> Result<PartialCapabilities, CapabilityError> {
        let pairs: Vec<(String, String)> = normalize(capabilities)
            .into_iter()
            .flat_map(|(key, values)| values.into_iter().map(move |v| (key.clone(), v)))
            .collect();

        if pairs.len() > MAX_ENUMERABLE_PAIRS {
            return Err(CapabilityError::TooManyPairs {
                pairs: pairs.len(),
                max: MAX_ENUMERABLE_PAIRS,
            });
        }
        if pairs.len() > self.warn_threshold {
            tracing::warn!(
                pairs = pairs.len(),
                threshold = self.warn_threshold,
                partials = 1u64 << pairs.len(),
                "large capability set, registration will enumerate every partial capability"
            );
        }

        Ok(PartialCapabilities {
            end: 1u64 << pairs.len(),
            next: 0,
            pairs,
        })
    }

    /// `normalize` -> `enumerate` -> `hash_partial`, de-duplicated.
    pub fn hashes_for(
        &self,
        capabilities: &Capabilities,
    ) -> Result<BTreeSet<CapabilityHash>, CapabilityError> {
        Ok(self
            .enumerate(capabilities)?
            .map(|partial| hash_partial(&partial))
            .collect())
    }
}

/// Iterator over the partial capabilities of one capability set.
///
/// Each bit of the counter selects one flattened pair.
#[derive(Debug, Clone)]
pub struct PartialCapabilities {
    pairs: Vec<(String, String)>,
    next: u64,
    end: u64,
}

impl Iterator for PartialCapabilities {
    type Item = NormalizedCapabilities;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.end {
            return None;
        }
        let mask = self.next;
        self.next += 1;

        let mut partial = NormalizedCapabilities::new();
        for (bit, (key, value)) in self.pairs.iter().enumerate() {
            if mask & (1u64 << bit) != 0 {
                partial.entry(key.clone()).or_default().push(value.clone());
            }
        }
        Some(partial)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = usize::try_from(self.end - self.next).ok();
        (remaining.unwrap_or(usize::MAX), remaining)
    }
}

#[cfg(test)]
#[path = "capability_tests.rs"]
mod tests;
