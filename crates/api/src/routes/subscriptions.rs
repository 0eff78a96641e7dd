//! Subscription report endpoints

use axum::extract::{Query, State};
use axum::Json;
use mirador_domain::{MonthlySeries, SubscriptionList, SubscriptionSummary};

use super::{non_empty, required_range, PeriodParams};
use crate::context::AppContext;
use crate::error::ApiResult;

/// Active base, MRR, movements and churn over the period.
pub async fn summary(
    State(ctx): State<AppContext>,
    Query(params): Query<PeriodParams>,
) -> ApiResult<Json<SubscriptionSummary>> {
    let range = required_range(params.date_from.as_deref(), params.date_to.as_deref())?;
    let payload = ctx.subscriptions.summary(range, non_empty(params.company.as_deref())).await?;
    Ok(Json(payload))
}

/// Month-end MRR series over the period.
pub async fn mrr_history(
    State(ctx): State<AppContext>,
    Query(params): Query<PeriodParams>,
) -> ApiResult<Json<MonthlySeries>> {
    let range = required_range(params.date_from.as_deref(), params.date_to.as_deref())?;
    let payload =
        ctx.subscriptions.mrr_history(range, non_empty(params.company.as_deref())).await?;
    Ok(Json(payload))
}

/// Subscriptions ordered by MRR descending.
pub async fn list(
    State(ctx): State<AppContext>,
    Query(params): Query<PeriodParams>,
) -> ApiResult<Json<SubscriptionList>> {
    let payload = ctx.subscriptions.list(non_empty(params.company.as_deref())).await?;
    Ok(Json(payload))
}
