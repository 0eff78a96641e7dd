//! In-flight call deduplication
//!
//! The first caller spawns the real work; everyone arriving with the
//! same key awaits the same shared future. The entry is removed when
//! the work settles, success or failure, so the next identical call
//! starts fresh.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};

use futures::future::{BoxFuture, FutureExt, Shared};
use mirador_domain::{MiradorError, Result};
use serde_json::Value;

type SharedCall = Shared<BoxFuture<'static, Result<Value>>>;

/// Registry of identical calls currently on the wire.
#[derive(Clone, Default)]
pub struct InflightRegistry {
    calls: Arc<Mutex<HashMap<String, SharedCall>>>,
}

impl InflightRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `make_call` under `key`, or join a call already in flight.
    ///
    /// Check-and-register happens under a single lock acquisition with no
    /// await inside, so two racing callers produce exactly one call. The
    /// work itself is spawned: a caller going away cannot cancel a call
    /// other waiters share.
    ///
    /// # Errors
    /// Propagates the call's error to every waiter.
    pub async fn run<F, Fut>(&self, key: String, make_call: F) -> Result<Value>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Value>> + Send + 'static,
    {
        let shared = {
            let mut calls = self.calls.lock().expect("inflight lock poisoned");
            if let Some(existing) = calls.get(&key) {
                existing.clone()
            } else {
                let registry = Arc::clone(&self.calls);
                let cleanup_key = key.clone();
                let future = make_call();
                let handle = tokio::spawn(async move {
                    let result = future.await;
                    registry.lock().expect("inflight lock poisoned").remove(&cleanup_key);
                    result
                });

                let shared: SharedCall = async move {
                    handle.await.unwrap_or_else(|err| {
                        Err(MiradorError::Internal(format!("odoo call task failed: {err}")))
                    })
                }
                .boxed()
                .shared();

                calls.insert(key, shared.clone());
                shared
            }
        };

        shared.await
    }
}
