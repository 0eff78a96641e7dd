//! Session manager: lazy authentication and poisoned-session replay
//!
//! Odoo occasionally kills the worker a session lives on and starts
//! answering RPC calls with an HTML error page. When that happens the
//! stored uid is dropped, the manager waits a randomized beat so a burst
//! of failing calls does not stampede the auth endpoint, re-authenticates
//! and replays the call exactly once.

use std::time::Duration;

use mirador_domain::{MiradorError, OdooConfig, Result};
use rand::Rng;
use serde_json::{json, Value};
use tokio::sync::{Mutex, RwLock};
use tracing::{info, warn};

use super::transport::{JsonRpcTransport, RpcError};

/// Fixed part of the replay delay.
const RETRY_BASE_MS: u64 = 200;

/// Random part of the replay delay, on top of the base.
const RETRY_JITTER_MS: u64 = 800;

/// Owns the authenticated uid and the credentials that produce it.
pub struct SessionManager {
    transport: JsonRpcTransport,
    db: String,
    login: String,
    api_key: String,
    uid: RwLock<Option<i64>>,
    auth_lock: Mutex<()>,
}

impl SessionManager {
    /// Build a session manager over an already-configured transport.
    pub fn new(transport: JsonRpcTransport, config: &OdooConfig) -> Self {
        Self {
            transport,
            db: config.db.clone(),
            login: config.username.clone(),
            api_key: config.api_key.clone(),
            uid: RwLock::new(None),
            auth_lock: Mutex::new(()),
        }
    }

    /// Execute `method` on `model`, authenticating first when needed.
    ///
    /// A poisoned session is replayed once after re-authentication; any
    /// further failure propagates as a domain error.
    ///
    /// # Errors
    /// `MiradorError::Auth` when Odoo rejects the credentials, otherwise
    /// the classification of the underlying RPC failure.
    pub async fn execute(
        &self,
        model: &str,
        method: &str,
        args: &Value,
        kwargs: &Value,
    ) -> Result<Value> {
        let uid = self.uid().await?;

        match self.execute_kw(uid, model, method, args, kwargs).await {
            Ok(value) => Ok(value),
            Err(RpcError::PoisonedSession { snippet }) => {
                warn!(model, method, snippet, "session poisoned, replaying once");
                self.invalidate_if(uid).await;

                let jitter = RETRY_BASE_MS + rand::thread_rng().gen_range(0..=RETRY_JITTER_MS);
                tokio::time::sleep(Duration::from_millis(jitter)).await;

                let uid = self.uid().await?;
                self.execute_kw(uid, model, method, args, kwargs)
                    .await
                    .map_err(MiradorError::from)
            }
            Err(other) => Err(other.into()),
        }
    }

    /// Session-free server probe backing the health endpoint.
    ///
    /// # Errors
    /// Returns the transport failure classification.
    pub async fn version(&self) -> Result<Value> {
        self.transport.call("common", "version", json!([])).await.map_err(MiradorError::from)
    }

    /// Current uid, authenticating on first use.
    async fn uid(&self) -> Result<i64> {
        if let Some(uid) = *self.uid.read().await {
            return Ok(uid);
        }

        let _guard = self.auth_lock.lock().await;

        // Lost the race: someone else authenticated while we waited.
        if let Some(uid) = *self.uid.read().await {
            return Ok(uid);
        }

        let uid = self.authenticate().await?;
        *self.uid.write().await = Some(uid);
        Ok(uid)
    }

    async fn authenticate(&self) -> Result<i64> {
        let result = self
            .transport
            .call("common", "authenticate", json!([&self.db, &self.login, &self.api_key, {}]))
            .await
            .map_err(MiradorError::from)?;

        // Odoo answers `false` instead of a uid when the credentials are bad.
        match result.as_i64() {
            Some(uid) => {
                info!(uid, "authenticated against Odoo");
                Ok(uid)
            }
            None => Err(MiradorError::Auth("Autenticación con Odoo fallida.".to_string())),
        }
    }

    async fn execute_kw(
        &self,
        uid: i64,
        model: &str,
        method: &str,
        args: &Value,
        kwargs: &Value,
    ) -> std::result::Result<Value, RpcError> {
        self.transport
            .call(
                "object",
                "execute_kw",
                json!([&self.db, uid, &self.api_key, model, method, args, kwargs]),
            )
            .await
    }

    /// Clears the stored uid only when it still is the one the failed call
    /// used. A concurrent re-authentication is left alone.
    async fn invalidate_if(&self, stale_uid: i64) {
        let mut guard = self.uid.write().await;
        if *guard == Some(stale_uid) {
            *guard = None;
        }
    }
}
