//! HR report endpoints

use axum::extract::{Query, State};
use axum::Json;
use mirador_domain::{AttendanceReport, DepartmentChart, HrSummary};

use super::{non_empty, required_range, PeriodParams};
use crate::context::AppContext;
use crate::error::ApiResult;

/// Hours worked per employee over the period.
pub async fn attendance(
    State(ctx): State<AppContext>,
    Query(params): Query<PeriodParams>,
) -> ApiResult<Json<AttendanceReport>> {
    let range = required_range(params.date_from.as_deref(), params.date_to.as_deref())?;
    let payload = ctx.hr.attendance(range, non_empty(params.company.as_deref())).await?;
    Ok(Json(payload))
}

/// Headcount, hires, project hours and payroll cost over the period.
pub async fn summary(
    State(ctx): State<AppContext>,
    Query(params): Query<PeriodParams>,
) -> ApiResult<Json<HrSummary>> {
    let range = required_range(params.date_from.as_deref(), params.date_to.as_deref())?;
    let payload = ctx.hr.summary(range, non_empty(params.company.as_deref())).await?;
    Ok(Json(payload))
}

/// Active headcount grouped by department.
pub async fn departments(
    State(ctx): State<AppContext>,
    Query(params): Query<PeriodParams>,
) -> ApiResult<Json<DepartmentChart>> {
    let payload = ctx.hr.departments(non_empty(params.company.as_deref())).await?;
    Ok(Json(payload))
}
