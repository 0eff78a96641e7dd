//! Liveness and directory endpoints

use axum::extract::State;
use axum::Json;
use mirador_domain::{CompanyDirectory, HealthStatus};

use crate::context::AppContext;
use crate::error::ApiResult;

/// ERP reachability probe. Always answers 200; an unreachable ERP is
/// reported as degraded, not as a failure of this service.
pub async fn health(State(ctx): State<AppContext>) -> Json<HealthStatus> {
    let reachable = ctx.erp.version().await.is_ok();
    let status = if reachable { "ok" } else { "degraded" };
    Json(HealthStatus { status: status.to_string(), erp_reachable: reachable })
}

/// Company directory backing the dashboard's company filter.
pub async fn companies(State(ctx): State<AppContext>) -> ApiResult<Json<CompanyDirectory>> {
    let empresas = ctx.resolver.entries().await?;
    Ok(Json(CompanyDirectory { empresas }))
}
