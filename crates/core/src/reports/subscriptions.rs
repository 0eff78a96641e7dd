//! Subscription report routines over recurring sale orders.

use std::sync::Arc;

use mirador_domain::{
    round2, DateRange, MonthlySeries, Result, SeriesPoint, SubscriptionList, SubscriptionRow,
    SubscriptionSummary,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use crate::erp::{
    false_as_none, read_group, search_count, search_read, zero_when_false, ErpClient, Many2one,
    SearchReadOptions,
};
use crate::reports::months::month_points;
use crate::resolver::CompanyResolver;

/// `subscription_state` values that count as an active subscription.
const ACTIVE_STATES: [&str; 2] = ["3_progress", "4_paused"];
/// `subscription_state` values that count as churn.
const CHURN_STATES: [&str; 2] = ["5_close", "6_churn"];
/// Spanish labels for `subscription_state`.
const STATE_LABELS: [(&str, &str); 6] = [
    ("1_draft", "Borrador"),
    ("2_renewal", "Renovación"),
    ("3_progress", "Activa"),
    ("4_paused", "Pausada"),
    ("5_close", "Cerrada"),
    ("6_churn", "Baja"),
];

fn state_label(state: &str) -> &str {
    STATE_LABELS.iter().find(|(key, _)| *key == state).map_or(state, |(_, label)| *label)
}

/// Subscription reporting over recurring sale orders.
pub struct SubscriptionReports {
    erp: Arc<dyn ErpClient>,
    resolver: Arc<CompanyResolver>,
}

impl SubscriptionReports {
    pub fn new(erp: Arc<dyn ErpClient>, resolver: Arc<CompanyResolver>) -> Self {
        Self { erp, resolver }
    }

    /// Active base, MRR, movements in the period and churn rate.
    pub async fn summary(
        &self,
        range: DateRange,
        company: Option<&str>,
    ) -> Result<SubscriptionSummary> {
        let filter = self.resolver.resolve_many(company).await?;
        let from = range.from.to_string();
        let to = range.to.to_string();

        let mut active_domain = vec![
            json!(["is_subscription", "=", true]),
            json!(["subscription_state", "in", ACTIVE_STATES]),
        ];
        filter.push_clause(&mut active_domain);
        let activas =
            search_count(self.erp.as_ref(), "sale.order", Value::Array(active_domain)).await?;

        let mut mrr_domain = vec![
            json!(["is_subscription", "=", true]),
            json!(["subscription_state", "=", "3_progress"]),
        ];
        filter.push_clause(&mut mrr_domain);
        let mrr_groups = read_group(
            self.erp.as_ref(),
            "sale.order",
            Value::Array(mrr_domain),
            &["recurring_monthly"],
            &[],
        )
        .await?;
        let mrr = mrr_groups.first().map_or(0.0, |row| row.sum("recurring_monthly"));

        let mut nuevas_domain = vec![
            json!(["is_subscription", "=", true]),
            json!(["subscription_state", "in", ACTIVE_STATES]),
            json!(["date_order", ">=", from.as_str()]),
            json!(["date_order", "<=", to.as_str()]),
        ];
        filter.push_clause(&mut nuevas_domain);
        let nuevas =
            search_count(self.erp.as_ref(), "sale.order", Value::Array(nuevas_domain)).await?;

        // Not every deployment exposes end_date on the order. When the
        // filter is rejected, retry on write_date.
        let mut bajas_domain = vec![
            json!(["is_subscription", "=", true]),
            json!(["subscription_state", "in", CHURN_STATES]),
            json!(["end_date", ">=", from.as_str()]),
            json!(["end_date", "<=", to.as_str()]),
        ];
        filter.push_clause(&mut bajas_domain);
        let bajas =
            match search_count(self.erp.as_ref(), "sale.order", Value::Array(bajas_domain)).await {
                Ok(count) => count,
                Err(err) => {
                    debug!(error = %err, "end_date filter rejected, counting churn on write_date");
                    let mut fallback_domain = vec![
                        json!(["is_subscription", "=", true]),
                        json!(["subscription_state", "in", CHURN_STATES]),
                        json!(["write_date", ">=", from.as_str()]),
                        json!(["write_date", "<=", to.as_str()]),
                    ];
                    filter.push_clause(&mut fallback_domain);
                    search_count(self.erp.as_ref(), "sale.order", Value::Array(fallback_domain))
                        .await?
                }
            };

        let churn_rate = if activas > 0 {
            round2((bajas as f64 / (activas + bajas) as f64) * 100.0)
        } else {
            0.0
        };

        Ok(SubscriptionSummary {
            empresa: filter.label().to_string(),
            mrr: round2(mrr),
            activas,
            nuevas,
            bajas,
            churn_rate,
        })
    }

    /// MRR of running subscriptions at each month end of the period.
    pub async fn mrr_history(
        &self,
        range: DateRange,
        company: Option<&str>,
    ) -> Result<MonthlySeries> {
        let filter = self.resolver.resolve_many(company).await?;

        let mut data = Vec::new();
        for point in month_points(range.from, range.to) {
            let mut domain = vec![
                json!(["is_subscription", "=", true]),
                json!(["subscription_state", "=", "3_progress"]),
                json!(["date_order", "<=", point.month_end.to_string()]),
            ];
            filter.push_clause(&mut domain);
            let groups = read_group(
                self.erp.as_ref(),
                "sale.order",
                Value::Array(domain),
                &["recurring_monthly"],
                &[],
            )
            .await?;
            let mrr = groups.first().map_or(0.0, |row| row.sum("recurring_monthly"));
            data.push(SeriesPoint { fecha: point.label, valor: round2(mrr) });
        }
        Ok(MonthlySeries { data })
    }

    /// Subscriptions of the scope, highest MRR first.
    pub async fn list(&self, company: Option<&str>) -> Result<SubscriptionList> {
        let filter = self.resolver.resolve_many(company).await?;

        let mut domain = vec![json!(["is_subscription", "=", true])];
        filter.push_clause(&mut domain);
        let records: Vec<SubscriptionRecord> = search_read(
            self.erp.as_ref(),
            "sale.order",
            Value::Array(domain),
            SearchReadOptions {
                fields: &[
                    "name",
                    "partner_id",
                    "recurring_monthly",
                    "date_order",
                    "next_invoice_date",
                    "subscription_state",
                ],
                order: Some("recurring_monthly desc"),
                limit: Some(200),
            },
        )
        .await?;

        let subscriptions = records
            .into_iter()
            .map(|record| {
                let status = record
                    .subscription_state
                    .filter(|state| !state.is_empty())
                    .unwrap_or_else(|| "unknown".to_string());
                SubscriptionRow {
                    name: record
                        .name
                        .filter(|name| !name.is_empty())
                        .unwrap_or_else(|| "Sin nombre".to_string()),
                    partner: record.partner_id.name_or("Sin cliente"),
                    mrr: round2(record.recurring_monthly),
                    start_date: record.date_order.unwrap_or_default(),
                    next_invoice: record.next_invoice_date.unwrap_or_default(),
                    status_label: state_label(&status).to_string(),
                    status,
                }
            })
            .collect();
        Ok(SubscriptionList { subscriptions })
    }
}

#[derive(Debug, Deserialize)]
struct SubscriptionRecord {
    #[serde(default, deserialize_with = "false_as_none")]
    name: Option<String>,
    partner_id: Many2one,
    #[serde(deserialize_with = "zero_when_false")]
    recurring_monthly: f64,
    #[serde(default, deserialize_with = "false_as_none")]
    date_order: Option<String>,
    #[serde(default, deserialize_with = "false_as_none")]
    next_invoice_date: Option<String>,
    #[serde(default, deserialize_with = "false_as_none")]
    subscription_state: Option<String>,
}
