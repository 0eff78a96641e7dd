//! CRM report endpoints

use axum::extract::{Query, State};
use axum::Json;
use mirador_domain::{CrmPipeline, CrmSummary, TopDealList};

use super::{non_empty, optional_range, required_range, PeriodParams};
use crate::context::AppContext;
use crate::error::ApiResult;

/// Open opportunities grouped by pipeline stage.
pub async fn pipeline(
    State(ctx): State<AppContext>,
    Query(params): Query<PeriodParams>,
) -> ApiResult<Json<CrmPipeline>> {
    let payload = ctx.crm.pipeline(non_empty(params.company.as_deref())).await?;
    Ok(Json(payload))
}

/// Pipeline value, conversion and portfolio movement over the period.
pub async fn summary(
    State(ctx): State<AppContext>,
    Query(params): Query<PeriodParams>,
) -> ApiResult<Json<CrmSummary>> {
    let range = required_range(params.date_from.as_deref(), params.date_to.as_deref())?;
    let payload = ctx.crm.summary(range, non_empty(params.company.as_deref())).await?;
    Ok(Json(payload))
}

/// Open opportunities ranked by invoiced revenue. The period is
/// optional here; without it revenue is reported as zero.
pub async fn top_deals(
    State(ctx): State<AppContext>,
    Query(params): Query<PeriodParams>,
) -> ApiResult<Json<TopDealList>> {
    let range = optional_range(params.date_from.as_deref(), params.date_to.as_deref())?;
    let payload = ctx.crm.top_deals(range, non_empty(params.company.as_deref())).await?;
    Ok(Json(payload))
}
