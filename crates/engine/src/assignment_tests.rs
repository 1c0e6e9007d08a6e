// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::signal::WakeSignal;
use crate::task::BackgroundTask;
use bf_adapters::{AssignMethod, FakeLeaseStore};
use bf_core::{capability_hashes_for, BotName, Capabilities, CapabilityHash};
use std::sync::atomic::AtomicUsize;
use tracing_subscriber::layer::{Context, SubscriberExt};
use tracing_subscriber::Layer;

/// Counts ERROR events emitted from this crate.
struct ErrorCounter(Arc<AtomicUsize>);

impl<S: tracing::Subscriber> Layer<S> for ErrorCounter {
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
        let meta = event.metadata();
        if *meta.level() == tracing::Level::ERROR && meta.target().starts_with("bf_engine") {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }
}

fn bucket() -> CapabilityHash {
    CapabilityHash::new("bucket")
}

fn register_bots(registry: &WaiterRegistry, names: &[&str]) -> Vec<WakeSignal> {
    names
        .iter()
        .map(|n| registry.register(&BotName::new(*n), [bucket()]).1)
        .collect()
}

fn assignment_loop<S: LeaseStore>(registry: &Arc<WaiterRegistry>, store: S, pct: u8) -> AssignmentLoop<S> {
    AssignmentLoop::new(Arc::clone(registry), store, Duration::from_millis(5), pct)
}

#[tokio::test]
async fn pass_fires_only_the_bots_the_store_picked() {
    let registry = Arc::new(WaiterRegistry::new());
    let signals = register_bots(&registry, &["a", "b", "c"]);
    let assigner = assignment_loop(&registry, FakeLeaseStore::first(1), 100);

    let report = assigner.run_pass(&Shutdown::new()).await.unwrap();

    assert_eq!(report.buckets, 1);
    assert_eq!(report.fired, 1);
    let set: Vec<bool> = signals.iter().map(WakeSignal::is_set).collect();
    assert_eq!(set, vec![true, false, false]);
}

#[tokio::test]
async fn pass_offers_every_waiting_bot_in_the_bucket() {
    let registry = Arc::new(WaiterRegistry::new());
    register_bots(&registry, &["w2", "w1"]);
    let store = FakeLeaseStore::first(0);
    let assigner = assignment_loop(&registry, store.clone(), 0);

    assigner.run_pass(&Shutdown::new()).await.unwrap();

    let calls = store.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].capability_hash, bucket());
    assert_eq!(calls[0].bot_names, vec![BotName::new("w1"), BotName::new("w2")]);
}

#[tokio::test]
async fn pass_over_empty_registry_calls_nothing() {
    let registry = Arc::new(WaiterRegistry::new());
    let store = FakeLeaseStore::new();
    let assigner = assignment_loop(&registry, store.clone(), 50);

    let report = assigner.run_pass(&Shutdown::new()).await.unwrap();

    assert_eq!(report.buckets, 0);
    assert!(store.calls().is_empty());
    assert_eq!(assigner.stats().passes, 1);
}

#[yare::parameterized(
    always_age      = { 0,   AssignMethod::Age },
    always_priority = { 100, AssignMethod::Priority },
)]
#[test_macro(tokio::test)]
async fn priority_percentage_extremes_are_deterministic(pct: u8, expected: AssignMethod) {
    let registry = Arc::new(WaiterRegistry::new());
    register_bots(&registry, &["w1"]);
    let store = FakeLeaseStore::first(0);
    let assigner = assignment_loop(&registry, store.clone(), pct);

    for _ in 0..100 {
        assigner.run_pass(&Shutdown::new()).await.unwrap();
    }

    assert_eq!(store.call_count(expected), 100);
    assert_eq!(store.calls().len(), 100);
}

#[tokio::test]
async fn policy_is_chosen_once_per_pass() {
    let registry = Arc::new(WaiterRegistry::new());
    let caps = Capabilities::new()
        .with("os", ["linux"])
        .with("gpu", ["a100"]);
    registry.register(&BotName::new("w1"), capability_hashes_for(&caps).unwrap());
    let store = FakeLeaseStore::first(0);
    let assigner = assignment_loop(&registry, store.clone(), 50);

    for _ in 0..20 {
        assigner.run_pass(&Shutdown::new()).await.unwrap();
    }

    let calls = store.calls();
    assert_eq!(calls.len(), 80);
    for pass in calls.chunks(4) {
        assert!(pass.iter().all(|c| c.method == pass[0].method));
    }
}

#[tokio::test]
async fn store_error_ends_the_pass() {
    let registry = Arc::new(WaiterRegistry::new());
    let signals = register_bots(&registry, &["w1"]);
    let assigner = assignment_loop(
        &registry,
        FakeLeaseStore::failing(StoreError::Unavailable("db down".into())),
        50,
    );

    let err = assigner.run_pass(&Shutdown::new()).await.unwrap_err();

    assert_eq!(err, StoreError::Unavailable("db down".into()));
    assert!(!signals[0].is_set());
    assert_eq!(registry.listener_count(), 1, "registry untouched by the failure");
}

#[tokio::test]
async fn shutdown_aborts_pass_at_bucket_boundary() {
    let registry = Arc::new(WaiterRegistry::new());
    let caps = Capabilities::new()
        .with("os", ["linux"])
        .with("gpu", ["a100"]);
    registry.register(&BotName::new("w1"), capability_hashes_for(&caps).unwrap());
    let store = FakeLeaseStore::first(0).with_delay(Duration::from_millis(200));
    let assigner = Arc::new(assignment_loop(&registry, store.clone(), 50));
    let shutdown = Shutdown::new();

    let pass = {
        let assigner = Arc::clone(&assigner);
        let shutdown = shutdown.clone();
        tokio::spawn(async move { assigner.run_pass(&shutdown).await })
    };
    tokio::time::sleep(Duration::from_millis(20)).await;
    shutdown.request();

    let report = pass.await.unwrap().unwrap();
    assert!(report.aborted);
    assert_eq!(report.buckets, 1);
    assert_eq!(store.calls().len(), 1);
}

#[tokio::test]
async fn loop_survives_failing_store_and_logs_each_failure() {
    let errors = Arc::new(AtomicUsize::new(0));
    let subscriber = tracing_subscriber::registry().with(ErrorCounter(Arc::clone(&errors)));
    let _guard = tracing::subscriber::set_default(subscriber);

    let registry = Arc::new(WaiterRegistry::new());
    register_bots(&registry, &["w1"]);
    let assigner = Arc::new(assignment_loop(
        &registry,
        FakeLeaseStore::failing(StoreError::Timeout(Duration::from_secs(1))),
        50,
    ));
    let task = BackgroundTask::new(Arc::clone(&assigner));
    assert!(task.start());

    tokio::time::timeout(Duration::from_secs(5), async {
        while assigner.stats().failed_passes < 3 {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .unwrap();

    assert!(task.is_running(), "loop kept running after failures");
    task.stop().await;

    let failed = assigner.stats().failed_passes;
    assert!(failed >= 3);
    assert_eq!(errors.load(Ordering::SeqCst) as u64, failed);
}

#[tokio::test]
async fn new_registration_wakes_loop_before_poll_interval() {
    let registry = Arc::new(WaiterRegistry::new());
    let store = FakeLeaseStore::new();
    let assigner = Arc::new(AssignmentLoop::new(
        Arc::clone(&registry),
        store,
        Duration::from_secs(3600),
        50,
    ));
    let task = BackgroundTask::new(Arc::clone(&assigner));
    task.start();

    let signals = register_bots(&registry, &["w1"]);

    assert!(signals[0].wait_timeout(Duration::from_secs(5)).await);
    task.stop().await;
}

#[test]
fn random_picker_respects_bounds() {
    let picker = RandomPolicyPicker;
    for _ in 0..100 {
        assert_eq!(picker.pick(0), SelectionPolicy::Age);
        assert_eq!(picker.pick(100), SelectionPolicy::Priority);
    }
}
