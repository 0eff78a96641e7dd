//! Financial report endpoints

use axum::extract::{Query, State};
use axum::Json;
use mirador_domain::{
    AlertCount, CashflowSummary, CompanyRevenueChart, DsoSummary, InvoiceList, MonthlySeries,
    OverdueSummary, PnlSummary,
};
use serde::Deserialize;

use super::{non_empty, required_range, PeriodParams};
use crate::context::AppContext;
use crate::error::ApiResult;

/// P&L summary over a mandatory period.
pub async fn summary(
    State(ctx): State<AppContext>,
    Query(params): Query<PeriodParams>,
) -> ApiResult<Json<PnlSummary>> {
    let range = required_range(params.date_from.as_deref(), params.date_to.as_deref())?;
    let payload = ctx.financial.pnl_summary(range, non_empty(params.company.as_deref())).await?;
    Ok(Json(payload))
}

/// Treasury, receivables and payables as of today.
pub async fn cashflow(
    State(ctx): State<AppContext>,
    Query(params): Query<PeriodParams>,
) -> ApiResult<Json<CashflowSummary>> {
    let payload = ctx.financial.cashflow(non_empty(params.company.as_deref())).await?;
    Ok(Json(payload))
}

/// Days sales outstanding over a mandatory period.
pub async fn dso(
    State(ctx): State<AppContext>,
    Query(params): Query<PeriodParams>,
) -> ApiResult<Json<DsoSummary>> {
    let range = required_range(params.date_from.as_deref(), params.date_to.as_deref())?;
    let payload = ctx.financial.dso(range, non_empty(params.company.as_deref())).await?;
    Ok(Json(payload))
}

/// Month-end treasury balance series.
pub async fn treasury(
    State(ctx): State<AppContext>,
    Query(params): Query<PeriodParams>,
) -> ApiResult<Json<MonthlySeries>> {
    let range = required_range(params.date_from.as_deref(), params.date_to.as_deref())?;
    let payload =
        ctx.financial.treasury_series(range, non_empty(params.company.as_deref())).await?;
    Ok(Json(payload))
}

/// Overdue customer invoices, oldest due date first.
pub async fn overdue(
    State(ctx): State<AppContext>,
    Query(params): Query<PeriodParams>,
) -> ApiResult<Json<OverdueSummary>> {
    let payload = ctx.financial.overdue(non_empty(params.company.as_deref())).await?;
    Ok(Json(payload))
}

/// Income ranking by company over a mandatory period.
pub async fn top_companies(
    State(ctx): State<AppContext>,
    Query(params): Query<PeriodParams>,
) -> ApiResult<Json<CompanyRevenueChart>> {
    let range = required_range(params.date_from.as_deref(), params.date_to.as_deref())?;
    let payload = ctx.financial.top_companies(range, non_empty(params.company.as_deref())).await?;
    Ok(Json(payload))
}

/// `/api/invoices` adds a move type and a row limit to the period params.
#[derive(Debug, Deserialize)]
pub(crate) struct InvoiceParams {
    date_from: Option<String>,
    date_to: Option<String>,
    company: Option<String>,
    #[serde(rename = "type", default = "default_invoice_kind")]
    kind: String,
    #[serde(default = "default_invoice_limit")]
    limit: u32,
}

fn default_invoice_kind() -> String {
    "out_invoice".to_string()
}

fn default_invoice_limit() -> u32 {
    50
}

/// Posted invoices in the period, newest first.
pub async fn invoices(
    State(ctx): State<AppContext>,
    Query(params): Query<InvoiceParams>,
) -> ApiResult<Json<InvoiceList>> {
    let range = required_range(params.date_from.as_deref(), params.date_to.as_deref())?;
    let payload = ctx
        .financial
        .invoices(range, non_empty(params.company.as_deref()), &params.kind, params.limit)
        .await?;
    Ok(Json(payload))
}

/// Overdue and critical alert counters for the dashboard header.
pub async fn alerts_count(
    State(ctx): State<AppContext>,
    Query(params): Query<PeriodParams>,
) -> ApiResult<Json<AlertCount>> {
    let payload = ctx.financial.alerts_count(non_empty(params.company.as_deref())).await?;
    Ok(Json(payload))
}
