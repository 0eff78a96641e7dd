//! Port for executing calls against the ERP's model layer

use async_trait::async_trait;
use mirador_domain::Result;
use serde_json::Value;

/// Generic gateway to the ERP.
///
/// `execute` is the classic `execute_kw` surface: a model, a method,
/// positional args and keyword args. Implementations own sessions,
/// caching and replay policy; callers see a single async call.
#[async_trait]
pub trait ErpClient: Send + Sync {
    /// Executes `method` on `model` with positional and keyword arguments.
    async fn execute(&self, model: &str, method: &str, args: Value, kwargs: Value)
        -> Result<Value>;

    /// Session-free server probe used by health checks.
    async fn version(&self) -> Result<Value>;
}
