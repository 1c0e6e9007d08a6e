// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::borrow::Borrow;
use std::collections::{BTreeSet, HashMap};

crate::define_id! {
    /// Test ID type for macro verification.
    pub struct TestId;
}

#[test]
fn define_id_display_and_as_str() {
    let id = TestId::new("bot-7");
    assert_eq!(id.as_str(), "bot-7");
    assert_eq!(id.to_string(), "bot-7");
}

#[test]
fn define_id_compares_with_str() {
    let id: TestId = "linux".into();
    assert_eq!(id, "linux");
    assert_eq!(id, *"linux");
}

#[test]
fn define_id_looks_up_by_str() {
    let mut map = HashMap::new();
    map.insert(TestId::new("k"), 42);
    assert_eq!(map.get("k"), Some(&42));

    let key = TestId::new("key");
    let borrowed: &str = key.borrow();
    assert_eq!(borrowed, "key");
}

#[test]
fn define_id_orders_lexically() {
    let set: BTreeSet<TestId> = ["b", "c", "a"].into_iter().map(TestId::from).collect();
    let ordered: Vec<&str> = set.iter().map(TestId::as_str).collect();
    assert_eq!(ordered, vec!["a", "b", "c"]);
}

#[test]
fn define_id_serializes_as_plain_string() {
    let id = TestId::new("w1");
    let json = serde_json::to_string(&id).unwrap();
    assert_eq!(json, "\"w1\"");
    let back: TestId = serde_json::from_str(&json).unwrap();
    assert_eq!(back, id);
}

#[yare::parameterized(
    truncates     = { "abcdefghijklmnop", 8, "abcdefgh" },
    shorter       = { "abc",              8, "abc" },
    exact         = { "abcdefgh",         8, "abcdefgh" },
    multibyte_cut = { "é",                1, "é" },
)]
fn define_id_short(input: &str, n: usize, expected: &str) {
    assert_eq!(TestId::new(input).short(n), expected);
}

#[test]
fn uuid_gen_creates_unique_keys() {
    let id_gen = UuidIdGen;
    let a = id_gen.next();
    let b = id_gen.next();
    assert_ne!(a, b);
    assert_eq!(a.len(), 36);
}

#[test]
fn sequential_gen_is_shared_between_clones() {
    let first = SequentialIdGen::new("wait");
    let second = first.clone();
    assert_eq!(first.next(), "wait-1");
    assert_eq!(second.next(), "wait-2");
    assert_eq!(first.next(), "wait-3");
}
