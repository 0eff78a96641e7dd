//! Tool catalog and dispatch for the conversational assistant.
//!
//! The assistant reaches the ERP exclusively through the tools declared
//! here. [`AssistantTools::dispatch`] always produces a JSON string;
//! failures travel in-band as `{"error": ...}` so the model can relay
//! them instead of breaking the conversation.

use std::sync::Arc;

use mirador_domain::{round2, DateRange, MiradorError, Result};
use serde::Serialize;
use serde_json::{json, Value};
use tracing::debug;

use crate::erp::{read_group, search_count, ErpClient};
use crate::reports::financial::{balance_sum, cash_account_ids, pnl_totals};
use crate::resolver::CompanyResolver;

mod allowlist;

use allowlist::{allowed_labels, is_company_allowed, label_for};

/// One callable tool, in the shape function-calling APIs expect.
#[derive(Debug, Clone, Serialize)]
pub struct ToolSpec {
    pub name: &'static str,
    pub description: &'static str,
    pub parameters: Value,
}

/// Catalog handed to the model on every assistant turn.
pub fn tool_catalog() -> Vec<ToolSpec> {
    vec![
        ToolSpec {
            name: "getFinancialSummary",
            description: "Obtiene P&L (ingresos, gastos, resultado) de una empresa para un período",
            parameters: json!({
                "type": "object",
                "properties": {
                    "company": {
                        "type": "string",
                        "description": "Nombre de la empresa (ej: \"SMD\", \"Samarluan\")",
                    },
                    "date_from": {"type": "string", "description": "Fecha inicio YYYY-MM-DD"},
                    "date_to": {"type": "string", "description": "Fecha fin YYYY-MM-DD"},
                },
                "required": ["date_from", "date_to"],
            }),
        },
        ToolSpec {
            name: "getCashflow",
            description: "Obtiene tesorería, cobros pendientes, pagos pendientes y posición neta",
            parameters: json!({
                "type": "object",
                "properties": {
                    "company": {"type": "string", "description": "Nombre de la empresa"},
                },
            }),
        },
        ToolSpec {
            name: "getEmployeeCount",
            description: "Cuenta empleados activos de una empresa",
            parameters: json!({
                "type": "object",
                "properties": {
                    "company": {"type": "string", "description": "Nombre de la empresa"},
                },
            }),
        },
        ToolSpec {
            name: "getCrmSummary",
            description: "Obtiene resumen CRM: oportunidades activas, valor pipeline, ganadas",
            parameters: json!({
                "type": "object",
                "properties": {
                    "company": {"type": "string", "description": "Nombre de la empresa"},
                    "date_from": {"type": "string", "description": "Fecha inicio"},
                    "date_to": {"type": "string", "description": "Fecha fin"},
                },
                "required": ["date_from", "date_to"],
            }),
        },
        ToolSpec {
            name: "listEmpresas",
            description: "Lista todas las empresas del grupo con sus IDs",
            parameters: json!({"type": "object", "properties": {}}),
        },
    ]
}

/// Executes assistant tool calls against the ERP.
///
/// A deployment may restrict the caller to a set of company aliases;
/// company-scoped tools then refuse requests outside the grant.
pub struct AssistantTools {
    erp: Arc<dyn ErpClient>,
    resolver: Arc<CompanyResolver>,
    allowed: Vec<String>,
}

impl AssistantTools {
    pub fn new(erp: Arc<dyn ErpClient>, resolver: Arc<CompanyResolver>) -> Self {
        Self { erp, resolver, allowed: Vec::new() }
    }

    /// Restricts company-scoped tools to the given aliases.
    pub fn with_allowed_companies(mut self, allowed: Vec<String>) -> Self {
        self.allowed = allowed;
        self
    }

    /// Runs one tool call and serializes its result.
    pub async fn dispatch(&self, name: &str, arguments: &Value) -> String {
        let scoped = matches!(
            name,
            "getFinancialSummary" | "getCashflow" | "getEmployeeCount" | "getCrmSummary"
        );
        if scoped {
            if let Some(denied) = self.denial(str_arg(arguments, "company")) {
                return denied.to_string();
            }
        }

        let result = match name {
            "getFinancialSummary" => self.financial_summary(arguments).await,
            "getCashflow" => self.cashflow(arguments).await,
            "getEmployeeCount" => self.employee_count(arguments).await,
            "getCrmSummary" => self.crm_summary(arguments).await,
            "listEmpresas" => self.list_companies().await,
            other => {
                debug!(tool = other, "unknown assistant tool");
                Ok(json!({"error": "Función no reconocida"}))
            }
        };
        result.unwrap_or_else(|err| error_payload(&err)).to_string()
    }

    /// P&L of the period in a flat shape, expenses negative.
    async fn financial_summary(&self, arguments: &Value) -> Result<Value> {
        let range = range_args(arguments)?;
        let target = self.resolver.resolve_one(str_arg(arguments, "company")).await?;
        let clause = target.clause();
        let totals = pnl_totals(self.erp.as_ref(), range, clause.as_ref()).await?;
        Ok(json!({
            "empresa": target.label,
            "ingresos_explotacion": round2(totals.operating_income),
            "gastos_explotacion": round2(-totals.operating_expense),
            "resultado_explotacion": round2(totals.operating_result()),
            "resultado_financiero": round2(totals.financial_result()),
            "resultado_antes_impuestos": round2(totals.pretax_result()),
        }))
    }

    /// Current balance of the liquidity accounts.
    async fn cashflow(&self, arguments: &Value) -> Result<Value> {
        let target = self.resolver.resolve_one(str_arg(arguments, "company")).await?;
        let cash_ids = cash_account_ids(self.erp.as_ref()).await?;

        let mut domain = vec![
            json!(["account_id", "in", cash_ids]),
            json!(["parent_state", "=", "posted"]),
        ];
        target.push_clause(&mut domain);
        let tesoreria = balance_sum(self.erp.as_ref(), domain).await?;

        Ok(json!({"empresa": target.label, "tesoreria": round2(tesoreria)}))
    }

    async fn employee_count(&self, arguments: &Value) -> Result<Value> {
        let target = self.resolver.resolve_one(str_arg(arguments, "company")).await?;
        let mut domain = vec![json!(["active", "=", true])];
        target.push_clause(&mut domain);
        let count = search_count(self.erp.as_ref(), "hr.employee", Value::Array(domain)).await?;
        Ok(json!({"empresa": target.label, "empleados_activos": count}))
    }

    /// Open opportunity count and pipeline value. The period is
    /// declared required for the model, the counters are point-in-time.
    async fn crm_summary(&self, arguments: &Value) -> Result<Value> {
        range_args(arguments)?;
        let target = self.resolver.resolve_one(str_arg(arguments, "company")).await?;

        let mut domain = vec![json!(["active", "=", true]), json!(["type", "=", "opportunity"])];
        target.push_clause(&mut domain);
        let oportunidades =
            search_count(self.erp.as_ref(), "crm.lead", Value::Array(domain.clone())).await?;
        let groups = read_group(
            self.erp.as_ref(),
            "crm.lead",
            Value::Array(domain),
            &["expected_revenue"],
            &[],
        )
        .await?;
        let pipeline_value = groups.first().map_or(0.0, |row| row.sum("expected_revenue"));

        Ok(json!({
            "empresa": target.label,
            "oportunidades": oportunidades,
            "pipeline_value": round2(pipeline_value),
        }))
    }

    /// Companies visible to the caller. Restricted callers get their
    /// grant back instead of the directory.
    async fn list_companies(&self) -> Result<Value> {
        if !self.allowed.is_empty() {
            let empresas: Vec<Value> = self
                .allowed
                .iter()
                .map(|alias| json!({"alias": alias, "nombre": label_for(alias)}))
                .collect();
            return Ok(json!({"empresas": empresas}));
        }
        let empresas = self.resolver.entries().await?;
        Ok(json!({"empresas": empresas}))
    }

    /// Denial payload for a company request outside the grant.
    fn denial(&self, company: Option<&str>) -> Option<Value> {
        if self.allowed.is_empty() {
            return None;
        }
        match company {
            None => Some(json!({
                "error": format!(
                    "Debes especificar una empresa. Solo tienes acceso a: {}.",
                    allowed_labels(&self.allowed)
                )
            })),
            Some(requested) if !is_company_allowed(requested, &self.allowed) => Some(json!({
                "error": format!(
                    "No tienes acceso a la empresa \"{requested}\". Solo puedes consultar: {}.",
                    allowed_labels(&self.allowed)
                )
            })),
            Some(_) => None,
        }
    }
}

fn str_arg<'a>(arguments: &'a Value, key: &str) -> Option<&'a str> {
    arguments.get(key).and_then(Value::as_str).map(str::trim).filter(|value| !value.is_empty())
}

fn range_args(arguments: &Value) -> Result<DateRange> {
    match (str_arg(arguments, "date_from"), str_arg(arguments, "date_to")) {
        (Some(from), Some(to)) => DateRange::parse(from, to),
        _ => Err(MiradorError::InvalidInput("date_from y date_to son obligatorios".to_string())),
    }
}

/// User-facing messages keep their text; everything else renders with
/// its error context.
fn error_payload(err: &MiradorError) -> Value {
    let message = match err {
        MiradorError::InvalidInput(msg) | MiradorError::NotFound(msg) => msg.clone(),
        other => other.to_string(),
    };
    json!({"error": message})
}
