//! Shared helpers for the integration tests.

#![allow(dead_code)]

use std::time::Duration;

use tracing_subscriber::EnvFilter;
use typebus::Emitter;

/// Test event carrying a string.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Foo {
    pub x: String,
}

impl Foo {
    pub fn new(x: &str) -> Self {
        Self { x: x.to_string() }
    }
}

/// Test event of an unrelated type.
#[derive(Debug, Clone, PartialEq)]
pub struct Bar {
    pub b: String,
}

/// Set up test logging with the given filter.
pub fn setup_test_logging(filter: &str) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_test_writer()
        .try_init();
}

/// Wait until the emitter's registry holds exactly `expected` subscriptions.
///
/// Removal runs on watcher tasks, so it is observed eventually rather than
/// immediately after a lifetime is cancelled.
pub async fn wait_for_count(emitter: &Emitter, expected: usize) {
    tokio::time::timeout(Duration::from_secs(2), async {
        while emitter.subscriber_count().await != expected {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .unwrap_or_else(|_| panic!("registry never reached {expected} subscriptions"));
}
