//! CRM report routines over the opportunity pipeline.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use mirador_domain::{
    round2, CrmPipeline, CrmSummary, DateRange, PipelineStage, Result, TopDeal, TopDealList,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use crate::erp::{
    false_as_none, read_group, search_count, search_read, ErpClient, Many2one, SearchReadOptions,
};
use crate::resolver::{CompanyFilter, CompanyResolver};

/// Pipeline stages as configured in the ERP, in funnel order.
const CRM_STAGES: [(i64, &str); 13] = [
    (15, "Forms"),
    (13, "BBDD / Potenciales clientes"),
    (12, "Negociando Oportunidad"),
    (14, "Contrato en preparación"),
    (6, "Contrato enviado"),
    (2, "Firmados + Proceso Onboarding + MKT"),
    (4, "Arrancado"),
    (19, "Impagos"),
    (11, "Posible baja"),
    (17, "Standby"),
    (5, "No interesados"),
    (18, "Perdidos"),
    (16, "Clubes sin respuesta"),
];

/// Stage of clubs with payment incidents.
const STAGE_IMPAGOS: i64 = 19;
/// Stage of clubs at risk of leaving.
const STAGE_POSIBLE_BAJA: i64 = 11;
/// Stages that count as an active club: signed, running, at risk, late.
const ACTIVE_CLUB_STAGES: [i64; 4] = [2, 4, 11, 19];

/// Chart palette for the pipeline funnel.
const STAGE_COLORS: [&str; 13] = [
    "#3b82f6", "#06b6d4", "#10b981", "#f59e0b", "#ef4444", "#8b5cf6", "#ec4899", "#14b8a6",
    "#f97316", "#6366f1", "#a855f7", "#e11d48", "#84cc16",
];

fn stage_name(stage_id: i64) -> Option<&'static str> {
    CRM_STAGES.iter().find(|(id, _)| *id == stage_id).map(|(_, name)| *name)
}

/// CRM reporting over opportunities.
pub struct CrmReports {
    erp: Arc<dyn ErpClient>,
    resolver: Arc<CompanyResolver>,
}

impl CrmReports {
    pub fn new(erp: Arc<dyn ErpClient>, resolver: Arc<CompanyResolver>) -> Self {
        Self { erp, resolver }
    }

    /// Open opportunities grouped by stage. Every configured stage is
    /// present in the payload, empty ones included, in funnel order.
    pub async fn pipeline(&self, company: Option<&str>) -> Result<CrmPipeline> {
        let filter = self.resolver.resolve_many(company).await?;
        let stage_ids: Vec<i64> = CRM_STAGES.iter().map(|(id, _)| *id).collect();

        let mut domain = vec![
            json!(["active", "=", true]),
            json!(["type", "=", "opportunity"]),
            json!(["stage_id", "in", stage_ids]),
        ];
        filter.push_clause(&mut domain);
        let groups = read_group(
            self.erp.as_ref(),
            "crm.lead",
            Value::Array(domain),
            &["expected_revenue"],
            &["stage_id"],
        )
        .await?;

        let mut by_stage: HashMap<i64, (u64, f64)> = HashMap::new();
        for row in &groups {
            let stage_id = row.many2one("stage_id").map_or(0, |(id, _)| id);
            by_stage.insert(stage_id, (row.count("stage_id"), row.sum("expected_revenue")));
        }

        let stages = CRM_STAGES
            .iter()
            .enumerate()
            .map(|(i, (id, name))| {
                let (count, revenue) = by_stage.get(id).copied().unwrap_or((0, 0.0));
                PipelineStage {
                    name: (*name).to_string(),
                    value: round2(revenue),
                    count,
                    color: STAGE_COLORS[i % STAGE_COLORS.len()].to_string(),
                }
            })
            .collect();
        Ok(CrmPipeline { stages })
    }

    /// CRM activity summary: open pipeline, closures in the period,
    /// sign-ups and leavers, and the club counters.
    pub async fn summary(&self, range: DateRange, company: Option<&str>) -> Result<CrmSummary> {
        let filter = self.resolver.resolve_many(company).await?;
        let from = range.from.to_string();
        let to = range.to.to_string();

        let mut active_domain =
            vec![json!(["active", "=", true]), json!(["type", "=", "opportunity"])];
        filter.push_clause(&mut active_domain);
        let oportunidades_activas =
            search_count(self.erp.as_ref(), "crm.lead", Value::Array(active_domain.clone()))
                .await?;

        let pipeline_groups = read_group(
            self.erp.as_ref(),
            "crm.lead",
            Value::Array(active_domain),
            &["expected_revenue"],
            &[],
        )
        .await?;
        let pipeline_value =
            pipeline_groups.first().map_or(0.0, |row| row.sum("expected_revenue"));

        let ganadas = self
            .count_leads(
                vec![
                    json!(["active", "=", true]),
                    json!(["type", "=", "opportunity"]),
                    json!(["stage_id.is_won", "=", true]),
                    json!(["date_closed", ">=", from.as_str()]),
                    json!(["date_closed", "<=", to.as_str()]),
                ],
                &filter,
            )
            .await?;
        let perdidas = self
            .count_leads(
                vec![
                    json!(["active", "=", false]),
                    json!(["type", "=", "opportunity"]),
                    json!(["date_closed", ">=", from.as_str()]),
                    json!(["date_closed", "<=", to.as_str()]),
                ],
                &filter,
            )
            .await?;
        let total_cerradas = ganadas + perdidas;
        let tasa_conversion = if total_cerradas > 0 {
            round2((ganadas as f64 / total_cerradas as f64) * 100.0)
        } else {
            0.0
        };

        // Sign-up and leave dates live in studio fields on the lead.
        let altas = self
            .count_leads(
                vec![
                    json!(["type", "=", "opportunity"]),
                    json!(["x_studio_fecha_firma_alta", ">=", from.as_str()]),
                    json!(["x_studio_fecha_firma_alta", "<=", to.as_str()]),
                ],
                &filter,
            )
            .await?;
        let bajas = self
            .count_leads(
                vec![
                    json!(["type", "=", "opportunity"]),
                    json!(["x_studio_fecha_baja", ">=", from.as_str()]),
                    json!(["x_studio_fecha_baja", "<=", to.as_str()]),
                ],
                &filter,
            )
            .await?;

        let impagos = self
            .count_leads(
                vec![
                    json!(["active", "=", true]),
                    json!(["type", "=", "opportunity"]),
                    json!(["stage_id", "=", STAGE_IMPAGOS]),
                ],
                &filter,
            )
            .await?;
        let posibles_bajas = self
            .count_leads(
                vec![
                    json!(["active", "=", true]),
                    json!(["type", "=", "opportunity"]),
                    json!(["stage_id", "=", STAGE_POSIBLE_BAJA]),
                ],
                &filter,
            )
            .await?;
        let clubs_activos = self
            .count_leads(
                vec![
                    json!(["active", "=", true]),
                    json!(["type", "=", "opportunity"]),
                    json!(["stage_id", "in", ACTIVE_CLUB_STAGES]),
                ],
                &filter,
            )
            .await?;

        debug!(empresa = filter.label(), oportunidades_activas, "computed crm summary");
        Ok(CrmSummary {
            empresa: filter.label().to_string(),
            oportunidades_activas,
            pipeline_value: round2(pipeline_value),
            ganadas,
            perdidas,
            tasa_conversion,
            altas,
            bajas,
            impagos,
            posibles_bajas,
            clubs_activos,
        })
    }

    /// Open opportunities ranked by revenue invoiced to their partner
    /// in the period. Without a period, revenue is reported as zero.
    pub async fn top_deals(
        &self,
        range: Option<DateRange>,
        company: Option<&str>,
    ) -> Result<TopDealList> {
        let filter = self.resolver.resolve_many(company).await?;

        let mut domain = vec![json!(["active", "=", true]), json!(["type", "=", "opportunity"])];
        filter.push_clause(&mut domain);
        let leads: Vec<LeadRow> = search_read(
            self.erp.as_ref(),
            "crm.lead",
            Value::Array(domain),
            SearchReadOptions {
                fields: &["name", "partner_id", "stage_id", "x_studio_fecha_firma_alta"],
                order: Some("stage_id asc"),
                limit: None,
            },
        )
        .await?;

        let mut revenue: HashMap<i64, f64> = HashMap::new();
        if let Some(range) = range {
            let partner_ids = unique_partner_ids(&leads);
            if !partner_ids.is_empty() {
                let mut invoice_domain = vec![
                    json!(["partner_id", "in", partner_ids]),
                    json!(["move_type", "=", "out_invoice"]),
                    json!(["state", "=", "posted"]),
                    json!(["invoice_date", ">=", range.from.to_string()]),
                    json!(["invoice_date", "<=", range.to.to_string()]),
                ];
                filter.push_clause(&mut invoice_domain);
                let groups = read_group(
                    self.erp.as_ref(),
                    "account.move",
                    Value::Array(invoice_domain),
                    &["amount_untaxed"],
                    &["partner_id"],
                )
                .await?;
                for row in &groups {
                    if let Some((partner_id, _)) = row.many2one("partner_id") {
                        revenue.insert(partner_id, row.sum("amount_untaxed"));
                    }
                }
            }
        }

        let mut clubs: Vec<TopDeal> = leads
            .into_iter()
            .map(|lead| {
                let stage_id = lead.stage_id.id().unwrap_or(0);
                let partner_id = lead.partner_id.id().unwrap_or(0);
                TopDeal {
                    name: lead
                        .name
                        .filter(|name| !name.is_empty())
                        .unwrap_or_else(|| "Sin nombre".to_string()),
                    partner: lead.partner_id.name_or("Sin cliente"),
                    stage: stage_name(stage_id).map_or_else(
                        || lead.stage_id.name_or("Sin etapa"),
                        ToString::to_string,
                    ),
                    stage_id,
                    fecha_alta: lead.x_studio_fecha_firma_alta.filter(|date| !date.is_empty()),
                    ingreso: round2(revenue.get(&partner_id).copied().unwrap_or(0.0)),
                }
            })
            .collect();
        clubs.sort_by(|a, b| b.ingreso.partial_cmp(&a.ingreso).unwrap_or(std::cmp::Ordering::Equal));
        Ok(TopDealList { clubs })
    }

    async fn count_leads(&self, mut domain: Vec<Value>, filter: &CompanyFilter) -> Result<u64> {
        filter.push_clause(&mut domain);
        search_count(self.erp.as_ref(), "crm.lead", Value::Array(domain)).await
    }
}

/// Partner ids of the leads, first occurrence order, no duplicates.
fn unique_partner_ids(leads: &[LeadRow]) -> Vec<i64> {
    let mut seen = HashSet::new();
    leads.iter().filter_map(|lead| lead.partner_id.id()).filter(|id| seen.insert(*id)).collect()
}

#[derive(Debug, Deserialize)]
struct LeadRow {
    #[serde(default, deserialize_with = "false_as_none")]
    name: Option<String>,
    partner_id: Many2one,
    stage_id: Many2one,
    #[serde(default, deserialize_with = "false_as_none")]
    x_studio_fecha_firma_alta: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::ScriptedErp;

    fn service(erp: Arc<ScriptedErp>) -> CrmReports {
        let resolver = Arc::new(CompanyResolver::new(erp.clone()));
        CrmReports::new(erp, resolver)
    }

    fn range(from: &str, to: &str) -> DateRange {
        DateRange::parse(from, to).unwrap()
    }

    #[tokio::test]
    async fn pipeline_reports_every_stage_in_funnel_order() {
        let erp = Arc::new(ScriptedErp::new().expect(
            "crm.lead",
            "read_group",
            json!([
                {"stage_id": [12, "Negociando Oportunidad"], "expected_revenue": 18000.567, "__count": 4},
                {"stage_id": [4, "Arrancado"], "expected_revenue": false, "stage_id_count": 9},
            ]),
        ));

        let pipeline = service(erp.clone()).pipeline(None).await.unwrap();

        assert_eq!(pipeline.stages.len(), 13);
        assert_eq!(pipeline.stages[0].name, "Forms");
        assert_eq!(pipeline.stages[0].count, 0);
        assert_eq!(pipeline.stages[0].value, 0.0);
        assert_eq!(pipeline.stages[0].color, "#3b82f6");

        let negotiating = &pipeline.stages[2];
        assert_eq!(negotiating.name, "Negociando Oportunidad");
        assert_eq!(negotiating.value, 18000.57);
        assert_eq!(negotiating.count, 4);
        assert_eq!(negotiating.color, "#10b981");

        let running = &pipeline.stages[6];
        assert_eq!(running.name, "Arrancado");
        assert_eq!(running.count, 9);
        assert_eq!(running.value, 0.0);

        // The query pins active opportunities to the configured stages.
        let calls = erp.recorded_calls();
        assert_eq!(
            calls[0].args[0][2],
            json!(["stage_id", "in", [15, 13, 12, 14, 6, 2, 4, 19, 11, 17, 5, 18, 16]])
        );
    }

    #[tokio::test]
    async fn summary_computes_conversion_rate_from_closures() {
        let erp = Arc::new(
            ScriptedErp::new()
                .expect("crm.lead", "search_count", json!(12))
                .expect("crm.lead", "read_group", json!([{"expected_revenue": 45000.0}]))
                .expect("crm.lead", "search_count", json!(3))
                .expect("crm.lead", "search_count", json!(1))
                .expect("crm.lead", "search_count", json!(2))
                .expect("crm.lead", "search_count", json!(1))
                .expect("crm.lead", "search_count", json!(4))
                .expect("crm.lead", "search_count", json!(2))
                .expect("crm.lead", "search_count", json!(9)),
        );

        let summary =
            service(erp.clone()).summary(range("2025-01-01", "2025-03-31"), None).await.unwrap();

        assert_eq!(summary.oportunidades_activas, 12);
        assert_eq!(summary.pipeline_value, 45000.0);
        assert_eq!(summary.ganadas, 3);
        assert_eq!(summary.perdidas, 1);
        assert_eq!(summary.tasa_conversion, 75.0);
        assert_eq!(summary.altas, 2);
        assert_eq!(summary.bajas, 1);
        assert_eq!(summary.impagos, 4);
        assert_eq!(summary.posibles_bajas, 2);
        assert_eq!(summary.clubs_activos, 9);

        let calls = erp.recorded_calls();
        // Won requires the is_won flag; lost counts archived leads.
        assert_eq!(calls[2].args[0][2], json!(["stage_id.is_won", "=", true]));
        assert_eq!(calls[3].args[0][0], json!(["active", "=", false]));
        assert_eq!(calls[8].args[0][2], json!(["stage_id", "in", [2, 4, 11, 19]]));
        erp.assert_exhausted();
    }

    #[tokio::test]
    async fn summary_conversion_rate_is_zero_without_closures() {
        let erp = Arc::new(
            ScriptedErp::new()
                .expect("crm.lead", "search_count", json!(5))
                .expect("crm.lead", "read_group", json!([]))
                .expect("crm.lead", "search_count", json!(0))
                .expect("crm.lead", "search_count", json!(0))
                .expect("crm.lead", "search_count", json!(0))
                .expect("crm.lead", "search_count", json!(0))
                .expect("crm.lead", "search_count", json!(0))
                .expect("crm.lead", "search_count", json!(0))
                .expect("crm.lead", "search_count", json!(5)),
        );

        let summary =
            service(erp).summary(range("2025-01-01", "2025-01-31"), None).await.unwrap();

        assert_eq!(summary.tasa_conversion, 0.0);
        assert_eq!(summary.pipeline_value, 0.0);
    }

    #[tokio::test]
    async fn top_deals_ranks_by_invoiced_revenue() {
        let erp = Arc::new(
            ScriptedErp::new()
                .expect(
                    "crm.lead",
                    "search_read",
                    json!([
                        {
                            "name": "Club Centro",
                            "partner_id": [31, "Padel Centro S.L."],
                            "stage_id": [4, "Arrancado"],
                            "x_studio_fecha_firma_alta": "2024-05-01",
                        },
                        {
                            "name": "Club Norte",
                            "partner_id": [32, "Padel Norte S.L."],
                            "stage_id": [99, "Etapa nueva"],
                            "x_studio_fecha_firma_alta": false,
                        },
                        {
                            "name": false,
                            "partner_id": false,
                            "stage_id": false,
                            "x_studio_fecha_firma_alta": false,
                        },
                        {
                            "name": "Club Centro Anexo",
                            "partner_id": [31, "Padel Centro S.L."],
                            "stage_id": [4, "Arrancado"],
                            "x_studio_fecha_firma_alta": false,
                        },
                    ]),
                )
                .expect(
                    "account.move",
                    "read_group",
                    json!([
                        {"partner_id": [31, "Padel Centro S.L."], "amount_untaxed": 900.0, "__count": 2},
                        {"partner_id": [32, "Padel Norte S.L."], "amount_untaxed": 2500.0, "__count": 1},
                    ]),
                ),
        );

        let deals = service(erp.clone())
            .top_deals(Some(range("2025-01-01", "2025-06-30")), None)
            .await
            .unwrap();

        assert_eq!(deals.clubs.len(), 4);
        assert_eq!(deals.clubs[0].name, "Club Norte");
        assert_eq!(deals.clubs[0].ingreso, 2500.0);
        // Unknown stage ids fall back to the ERP's display name.
        assert_eq!(deals.clubs[0].stage, "Etapa nueva");
        assert_eq!(deals.clubs[1].ingreso, 900.0);
        assert_eq!(deals.clubs[1].stage, "Arrancado");
        assert_eq!(deals.clubs[1].fecha_alta.as_deref(), Some("2024-05-01"));

        let empty = deals.clubs.iter().find(|club| club.name == "Sin nombre").unwrap();
        assert_eq!(empty.partner, "Sin cliente");
        assert_eq!(empty.stage, "Sin etapa");
        assert_eq!(empty.stage_id, 0);
        assert_eq!(empty.ingreso, 0.0);

        // Duplicate partners collapse to one id in the invoice query.
        let calls = erp.recorded_calls();
        assert_eq!(calls[1].args[0][0], json!(["partner_id", "in", [31, 32]]));
    }

    #[tokio::test]
    async fn top_deals_without_dates_skips_the_invoice_query() {
        let erp = Arc::new(ScriptedErp::new().expect(
            "crm.lead",
            "search_read",
            json!([{
                "name": "Club Sur",
                "partner_id": [40, "Padel Sur S.L."],
                "stage_id": [2, "Firmados + Proceso Onboarding + MKT"],
                "x_studio_fecha_firma_alta": false,
            }]),
        ));

        let deals = service(erp.clone()).top_deals(None, None).await.unwrap();

        assert_eq!(deals.clubs.len(), 1);
        assert_eq!(deals.clubs[0].ingreso, 0.0);
        assert_eq!(erp.recorded_calls().len(), 1);
        erp.assert_exhausted();
    }
}
