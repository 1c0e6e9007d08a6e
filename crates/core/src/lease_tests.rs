// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::capability::capability_hashes_for;

#[test]
fn lease_hash_is_a_bucket_of_matching_bots() {
    let lease = Lease::new("l1", Capabilities::new().with("gpu", ["a100"]));
    let bot = Capabilities::new()
        .with("os", ["linux"])
        .with("gpu", ["a100", "v100"]);

    assert!(capability_hashes_for(&bot)
        .unwrap()
        .contains(&lease.capability_hash()));
}

#[test]
fn lease_without_requirements_matches_any_bot() {
    let lease = Lease::new("any", Capabilities::new());
    let bot = Capabilities::new().with("os", ["windows"]);

    assert!(capability_hashes_for(&bot)
        .unwrap()
        .contains(&lease.capability_hash()));
}

#[test]
fn lease_defaults_to_priority_zero() {
    let lease: Lease = serde_json::from_str(r#"{"id":"l9"}"#).unwrap();
    assert_eq!(lease.priority, 0);
    assert_eq!(lease.with_priority(-3).priority, -3);
}

#[test]
fn lease_with_empty_requirement_lands_in_the_catch_all_bucket() {
    let lease: Lease = serde_json::from_str(r#"{"id":"x","requirements":{"os":[]}}"#).unwrap();

    assert!(lease.requirements.is_empty());
    assert_eq!(
        lease.capability_hash(),
        Lease::new("any", Capabilities::new()).capability_hash()
    );
}
