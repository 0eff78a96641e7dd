use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use mirador_api::AppContext;
use mirador_core::ErpClient;
use mirador_domain::{Config, MiradorError, OdooConfig, Result, ServerConfig};
use serde_json::{json, Value};
use tower::ServiceExt;

/// One recorded ERP call.
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub model: String,
    pub method: String,
    pub args: Value,
    pub kwargs: Value,
}

/// Canned ERP responses keyed by `model.method`.
///
/// Router tests care about payload shaping and error mapping, not call
/// order, so responses replay on every lookup. A call with no canned
/// response panics, naming the call, so an unexpected query fails the
/// test loudly instead of shaping an empty payload.
pub struct StubErp {
    responses: HashMap<String, Result<Value>>,
    version: Result<Value>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl StubErp {
    pub fn new() -> Self {
        Self {
            responses: HashMap::new(),
            version: Ok(json!({"server_version": "17.0"})),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn on(mut self, model: &str, method: &str, response: Value) -> Self {
        self.responses.insert(format!("{model}.{method}"), Ok(response));
        self
    }

    pub fn on_error(mut self, model: &str, method: &str, error: MiradorError) -> Self {
        self.responses.insert(format!("{model}.{method}"), Err(error));
        self
    }

    pub fn with_version_error(mut self, error: MiradorError) -> Self {
        self.version = Err(error);
        self
    }

    pub fn recorded_calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ErpClient for StubErp {
    async fn execute(
        &self,
        model: &str,
        method: &str,
        args: Value,
        kwargs: Value,
    ) -> Result<Value> {
        self.calls.lock().unwrap().push(RecordedCall {
            model: model.to_string(),
            method: method.to_string(),
            args,
            kwargs,
        });
        self.responses
            .get(&format!("{model}.{method}"))
            .cloned()
            .unwrap_or_else(|| panic!("no canned response for {model}.{method}"))
    }

    async fn version(&self) -> Result<Value> {
        self.version.clone()
    }
}

/// Configuration that points nowhere; the stub never dials out.
pub fn test_config() -> Config {
    Config {
        odoo: OdooConfig {
            url: "http://odoo.test".to_string(),
            db: "mirador".to_string(),
            username: "svc-dashboard".to_string(),
            api_key: "secret".to_string(),
            cache_ttl_secs: 30,
        },
        server: ServerConfig::default(),
    }
}

/// Router over a stubbed ERP, plus the stub for call assertions.
pub fn router_over(stub: StubErp) -> (Router, Arc<StubErp>) {
    let stub = Arc::new(stub);
    let erp: Arc<dyn ErpClient> = stub.clone();
    let ctx = AppContext::with_erp(test_config(), erp);
    (mirador_api::router(ctx), stub)
}

/// Issues a GET and returns status plus decoded JSON body.
pub async fn get_json(app: Router, uri: &str) -> (StatusCode, Value) {
    let request = Request::builder().uri(uri).body(Body::empty()).expect("request builds");
    let response = app.oneshot(request).await.expect("router never fails");
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("body reads");
    let body = serde_json::from_slice(&bytes).expect("body is JSON");
    (status, body)
}

/// Directory rows backing `/api/companies` and the company filter.
pub fn directory_fixture() -> Value {
    json!([
        {"id": 1, "name": "SMD Consultores, S.L."},
        {"id": 2, "name": "Viper Web Tech, S.L."},
        {"id": 3, "name": "Samarluan S.L."},
    ])
}
