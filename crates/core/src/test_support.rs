//! Test doubles shared by the core unit tests.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use mirador_domain::{MiradorError, Result};
use serde_json::{json, Value};

use crate::erp::ErpClient;

/// One recorded `execute` invocation.
#[derive(Debug, Clone)]
pub(crate) struct RecordedCall {
    pub model: String,
    pub method: String,
    pub args: Value,
    pub kwargs: Value,
}

struct ScriptedCall {
    model: &'static str,
    method: &'static str,
    response: Result<Value>,
}

/// Scripted ERP double.
///
/// Responses are consumed in registration order and each call is
/// checked against the expected model and method, so tests also pin
/// the exact call sequence a routine issues.
pub(crate) struct ScriptedErp {
    script: Mutex<VecDeque<ScriptedCall>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl ScriptedErp {
    pub fn new() -> Self {
        Self { script: Mutex::new(VecDeque::new()), calls: Mutex::new(Vec::new()) }
    }

    pub fn expect(self, model: &'static str, method: &'static str, response: Value) -> Self {
        self.script
            .lock()
            .unwrap()
            .push_back(ScriptedCall { model, method, response: Ok(response) });
        self
    }

    pub fn expect_err(self, model: &'static str, method: &'static str, error: MiradorError) -> Self {
        self.script
            .lock()
            .unwrap()
            .push_back(ScriptedCall { model, method, response: Err(error) });
        self
    }

    pub fn recorded_calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Panics if a scripted response was never consumed.
    pub fn assert_exhausted(&self) {
        let script = self.script.lock().unwrap();
        assert!(script.is_empty(), "{} scripted ERP responses left unconsumed", script.len());
    }
}

#[async_trait]
impl ErpClient for ScriptedErp {
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
        let next = self
            .script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| panic!("unexpected ERP call: {model}.{method}"));
        assert_eq!(
            (next.model, next.method),
            (model, method),
            "ERP call out of order: expected {}.{}, got {model}.{method}",
            next.model,
            next.method
        );
        next.response
    }

    async fn version(&self) -> Result<Value> {
        Ok(json!({"server_version": "17.0"}))
    }
}

/// Directory fixture used by resolver and report tests, ordered by id.
pub(crate) fn directory_fixture() -> Value {
    json!([
        {"id": 1, "name": "SMD Consultores, S.L."},
        {"id": 2, "name": "Viper Web Tech, S.L."},
        {"id": 3, "name": "Samarluan S.L."},
        {"id": 4, "name": "Matches Padel Solutions S.L."},
        {"id": 5, "name": "365 Receptión, S.L."},
        {"id": 6, "name": "Grupo PDL Holding S.L."},
    ])
}
