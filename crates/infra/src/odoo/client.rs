//! `ErpClient` implementation over the JSON-RPC session
//!
//! Layers, outermost first: result cache, in-flight deduplication,
//! session manager, transport. The cache is only populated on success;
//! errors reach every deduplicated waiter but are never stored.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use mirador_core::ErpClient;
use mirador_domain::{MiradorError, OdooConfig, Result};
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use super::cache::ResultCache;
use super::dedup::InflightRegistry;
use super::session::SessionManager;
use super::transport::JsonRpcTransport;
use crate::time::{Clock, SystemClock};

/// Cache key: the full call signature in one canonical JSON string.
///
/// Struct fields serialize in declaration order and `serde_json` keeps
/// object keys sorted, so equal calls always produce equal keys.
#[derive(Serialize)]
struct CallKey<'a> {
    model: &'a str,
    method: &'a str,
    args: &'a Value,
    kwargs: &'a Value,
}

/// Cached, deduplicating Odoo client.
pub struct OdooClient<C: Clock = SystemClock> {
    session: Arc<SessionManager>,
    cache: ResultCache<C>,
    inflight: InflightRegistry,
}

impl OdooClient<SystemClock> {
    /// Build a client from the Odoo connection settings.
    ///
    /// # Errors
    /// Returns `MiradorError::Config` if the transport cannot be built.
    pub fn new(config: &OdooConfig) -> Result<Self> {
        Self::with_clock(config, SystemClock)
    }
}

impl<C: Clock + Clone> OdooClient<C> {
    /// Client with an injected clock, for deterministic TTL tests.
    ///
    /// # Errors
    /// Returns `MiradorError::Config` if the transport cannot be built.
    pub fn with_clock(config: &OdooConfig, clock: C) -> Result<Self> {
        let transport = JsonRpcTransport::new(&config.url)?;
        let session = Arc::new(SessionManager::new(transport, config));
        let cache = ResultCache::with_clock(Duration::from_secs(config.cache_ttl_secs), clock);

        Ok(Self { session, cache, inflight: InflightRegistry::new() })
    }
}

#[async_trait]
impl<C: Clock + Clone> ErpClient for OdooClient<C> {
    async fn execute(
        &self,
        model: &str,
        method: &str,
        args: Value,
        kwargs: Value,
    ) -> Result<Value> {
        let key = serde_json::to_string(&CallKey { model, method, args: &args, kwargs: &kwargs })
            .map_err(|e| MiradorError::Internal(format!("cache key serialization: {}", e)))?;

        if let Some(value) = self.cache.get(&key) {
            debug!(model, method, "cache hit");
            return Ok(value);
        }

        let session = Arc::clone(&self.session);
        let cache = self.cache.clone();
        let model = model.to_string();
        let method = method.to_string();
        let store_key = key.clone();

        self.inflight
            .run(key, move || async move {
                let value = session.execute(&model, &method, &args, &kwargs).await?;
                cache.insert(store_key, value.clone());
                Ok(value)
            })
            .await
    }

    async fn version(&self) -> Result<Value> {
        self.session.version().await
    }
}
