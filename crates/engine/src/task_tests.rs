// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::sync::atomic::AtomicUsize;
use std::time::Duration;
use tracing_subscriber::layer::{Context, SubscriberExt};
use tracing_subscriber::Layer;

struct ErrorCounter(Arc<AtomicUsize>);

impl<S: tracing::Subscriber> Layer<S> for ErrorCounter {
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
        if *event.metadata().level() == tracing::Level::ERROR {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }
}

#[derive(Default)]
struct CountingWorker {
    ticks: AtomicUsize,
}

#[async_trait]
impl Worker for CountingWorker {
    fn name(&self) -> &'static str {
        "counting"
    }

    async fn tick(&self, shutdown: &Shutdown) {
        self.ticks.fetch_add(1, Ordering::SeqCst);
        tokio::select! {
            _ = tokio::time::sleep(Duration::from_millis(5)) => {}
            _ = shutdown.requested() => {}
        }
    }
}

/// Panics on its first tick, then counts.
#[derive(Default)]
struct FlakyWorker {
    ticks: AtomicUsize,
}

#[async_trait]
impl Worker for FlakyWorker {
    fn name(&self) -> &'static str {
        "flaky"
    }

    async fn tick(&self, shutdown: &Shutdown) {
        if self.ticks.fetch_add(1, Ordering::SeqCst) == 0 {
            panic!("store exploded");
        }
        tokio::select! {
            _ = tokio::time::sleep(Duration::from_millis(5)) => {}
            _ = shutdown.requested() => {}
        }
    }
}

#[tokio::test]
async fn shutdown_requested_resolves_after_request() {
    let shutdown = Shutdown::new();
    let waiter = shutdown.clone();
    let handle = tokio::spawn(async move { waiter.requested().await });

    shutdown.request();
    tokio::time::timeout(Duration::from_secs(1), handle)
        .await
        .unwrap()
        .unwrap();
    assert!(shutdown.is_requested());
}

#[tokio::test]
async fn task_ticks_until_stopped() {
    let worker = Arc::new(CountingWorker::default());
    let task = BackgroundTask::new(Arc::clone(&worker));

    assert!(task.start());
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(task.is_running());

    task.stop().await;
    assert!(!task.is_running());
    let ticks = worker.ticks.load(Ordering::SeqCst);
    assert!(ticks > 0);

    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(worker.ticks.load(Ordering::SeqCst), ticks, "no ticks after stop");
}

#[tokio::test]
async fn start_twice_is_rejected() {
    let task = BackgroundTask::new(Arc::new(CountingWorker::default()));
    assert!(task.start());
    assert!(!task.start());
    task.stop().await;
}

#[tokio::test]
async fn stop_without_start_is_noop() {
    let task = BackgroundTask::new(Arc::new(CountingWorker::default()));
    task.stop().await;
    assert!(!task.is_running());
}

#[tokio::test]
async fn task_can_restart_after_stop() {
    let task = BackgroundTask::new(Arc::new(CountingWorker::default()));
    assert!(task.start());
    task.stop().await;
    assert!(task.start());
    assert!(task.is_running());
    task.stop().await;
}

#[tokio::test(start_paused = true)]
async fn panicking_tick_is_logged_and_the_loop_continues() {
    let errors = Arc::new(AtomicUsize::new(0));
    let subscriber = tracing_subscriber::registry().with(ErrorCounter(Arc::clone(&errors)));
    let _guard = tracing::subscriber::set_default(subscriber);

    let worker = Arc::new(FlakyWorker::default());
    let task = BackgroundTask::new(Arc::clone(&worker));
    assert!(task.start());

    tokio::time::sleep(PANIC_BACKOFF * 2).await;
    assert!(task.is_running());
    assert!(worker.ticks.load(Ordering::SeqCst) > 1);
    assert_eq!(errors.load(Ordering::SeqCst), 1);

    task.stop().await;
    assert!(!task.is_running());
}
