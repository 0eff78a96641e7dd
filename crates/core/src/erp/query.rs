//! Typed queries over the raw ERP port.
//!
//! The wire format has two quirks this layer absorbs: nullable fields
//! come back as `false`, and many2one references come back as
//! `[id, display_name]` pairs. Decode failures surface as
//! `MiradorError::Decode` naming the model and method.

use mirador_domain::{MiradorError, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::{json, Map, Value};

use super::ports::ErpClient;

/// Keyword options for `search_read`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SearchReadOptions<'a> {
    pub fields: &'a [&'a str],
    pub order: Option<&'a str>,
    pub limit: Option<u32>,
}

/// Runs `search_read` on `model` and decodes each row into `T`.
pub async fn search_read<T: DeserializeOwned>(
    erp: &dyn ErpClient,
    model: &str,
    domain: Value,
    options: SearchReadOptions<'_>,
) -> Result<Vec<T>> {
    let mut kwargs = Map::new();
    kwargs.insert("fields".to_string(), json!(options.fields));
    if let Some(order) = options.order {
        kwargs.insert("order".to_string(), json!(order));
    }
    if let Some(limit) = options.limit {
        kwargs.insert("limit".to_string(), json!(limit));
    }
    let raw = erp.execute(model, "search_read", json!([domain]), Value::Object(kwargs)).await?;
    decode(model, "search_read", raw)
}

/// Runs a non-lazy `read_group` on `model`.
pub async fn read_group(
    erp: &dyn ErpClient,
    model: &str,
    domain: Value,
    fields: &[&str],
    groupby: &[&str],
) -> Result<Vec<ReadGroupRow>> {
    let raw = erp
        .execute(model, "read_group", json!([domain, fields, groupby]), json!({"lazy": false}))
        .await?;
    let rows: Vec<Map<String, Value>> = decode(model, "read_group", raw)?;
    Ok(rows.into_iter().map(ReadGroupRow).collect())
}

/// Runs `search_count` on `model`.
pub async fn search_count(erp: &dyn ErpClient, model: &str, domain: Value) -> Result<u64> {
    let raw = erp.execute(model, "search_count", json!([domain]), json!({})).await?;
    raw.as_u64().ok_or_else(|| {
        MiradorError::Decode(format!("{model}.search_count: expected a count, got {raw}"))
    })
}

fn decode<T: DeserializeOwned>(model: &str, method: &str, raw: Value) -> Result<T> {
    serde_json::from_value(raw).map_err(|err| MiradorError::Decode(format!("{model}.{method}: {err}")))
}

/// One `read_group` row.
///
/// Group rows are shaped at runtime by the grouping and aggregation
/// arguments, so access is by field name rather than a fixed struct.
#[derive(Debug, Clone)]
pub struct ReadGroupRow(pub(crate) Map<String, Value>);

impl ReadGroupRow {
    /// Aggregated sum for `field`; missing, `null` and `false` read as zero.
    pub fn sum(&self, field: &str) -> f64 {
        self.0.get(field).and_then(Value::as_f64).unwrap_or(0.0)
    }

    /// The `field` group key as a many2one reference, if grouped that way.
    pub fn many2one(&self, field: &str) -> Option<(i64, String)> {
        let pair = self.0.get(field)?.as_array()?;
        let id = pair.first()?.as_i64()?;
        let name = pair.get(1)?.as_str()?.to_string();
        Some((id, name))
    }

    /// Records in the group: `__count`, with the server's older
    /// `{field}_count` spelling as fallback.
    pub fn count(&self, groupby_field: &str) -> u64 {
        self.0
            .get("__count")
            .and_then(Value::as_u64)
            .or_else(|| self.0.get(&format!("{groupby_field}_count")).and_then(Value::as_u64))
            .unwrap_or(0)
    }
}

/// A many2one reference as returned by `search_read`: `[id, name]`, or
/// `false` when the field is empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Many2one(pub Option<(i64, String)>);

impl Many2one {
    pub fn id(&self) -> Option<i64> {
        self.0.as_ref().map(|(id, _)| *id)
    }

    pub fn name(&self) -> Option<&str> {
        self.0.as_ref().map(|(_, name)| name.as_str())
    }

    /// Display name, with the routine's fallback for empty references.
    pub fn name_or(&self, fallback: &str) -> String {
        self.name().unwrap_or(fallback).to_string()
    }
}

impl<'de> Deserialize<'de> for Many2one {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        match value {
            Value::Bool(false) | Value::Null => Ok(Self(None)),
            Value::Array(pair) => {
                let id = pair.first().and_then(Value::as_i64);
                let name = pair.get(1).and_then(Value::as_str);
                match (id, name) {
                    (Some(id), Some(name)) => Ok(Self(Some((id, name.to_string())))),
                    _ => Err(serde::de::Error::custom("expected an [id, display_name] pair")),
                }
            }
            other => Err(serde::de::Error::custom(format!(
                "expected false or [id, display_name], got {other}"
            ))),
        }
    }
}

/// Deserializes a nullable field, reading the `false` placeholder as `None`.
pub fn false_as_none<'de, D, T>(deserializer: D) -> std::result::Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    match value {
        Value::Bool(false) | Value::Null => Ok(None),
        other => serde_json::from_value(other).map(Some).map_err(serde::de::Error::custom),
    }
}

/// Deserializes a nullable numeric field, reading `false` and `null` as zero.
pub fn zero_when_false<'de, D>(deserializer: D) -> std::result::Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    match value {
        Value::Bool(false) | Value::Null => Ok(0.0),
        other => other
            .as_f64()
            .ok_or_else(|| serde::de::Error::custom(format!("expected a number, got {other}"))),
    }
}
