//! HTTP surface of the dashboard API
//!
//! One module per dashboard area. Handlers are thin: parse the query
//! string, call one report routine, serialize its payload. All domain
//! errors surface through [`crate::error::ApiError`].

pub mod crm;
pub mod financial;
pub mod hr;
pub mod subscriptions;
pub mod system;

use axum::routing::get;
use axum::Router;
use mirador_domain::{DateRange, MiradorError, Result};
use serde::Deserialize;

use crate::context::AppContext;

/// Query parameters shared by the report endpoints.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct PeriodParams {
    pub date_from: Option<String>,
    pub date_to: Option<String>,
    pub company: Option<String>,
}

/// Full route table over the shared context.
pub fn router(ctx: AppContext) -> Router {
    Router::new()
        .route("/api/health", get(system::health))
        .route("/api/companies", get(system::companies))
        .route("/api/financial/summary", get(financial::summary))
        .route("/api/financial/cashflow", get(financial::cashflow))
        .route("/api/financial/dso", get(financial::dso))
        .route("/api/financial/treasury", get(financial::treasury))
        .route("/api/financial/overdue", get(financial::overdue))
        .route("/api/financial/top-companies", get(financial::top_companies))
        .route("/api/invoices", get(financial::invoices))
        .route("/api/alerts/count", get(financial::alerts_count))
        .route("/api/crm/pipeline", get(crm::pipeline))
        .route("/api/crm/summary", get(crm::summary))
        .route("/api/crm/top-deals", get(crm::top_deals))
        .route("/api/hr/attendance", get(hr::attendance))
        .route("/api/hr/summary", get(hr::summary))
        .route("/api/hr/departments", get(hr::departments))
        .route("/api/subscriptions/summary", get(subscriptions::summary))
        .route("/api/subscriptions/mrr-history", get(subscriptions::mrr_history))
        .route("/api/subscriptions/list", get(subscriptions::list))
        .with_state(ctx)
}

/// Mandatory period. Rejects before any remote call is made.
pub(crate) fn required_range(from: Option<&str>, to: Option<&str>) -> Result<DateRange> {
    match (non_empty(from), non_empty(to)) {
        (Some(from), Some(to)) => DateRange::parse(from, to),
        _ => Err(MiradorError::InvalidInput("date_from y date_to son obligatorios".to_string())),
    }
}

/// Optional period: `None` unless both dates are present.
pub(crate) fn optional_range(from: Option<&str>, to: Option<&str>) -> Result<Option<DateRange>> {
    match (non_empty(from), non_empty(to)) {
        (Some(from), Some(to)) => Ok(Some(DateRange::parse(from, to)?)),
        _ => Ok(None),
    }
}

/// Treats blank query values (`?company=`) as absent.
pub(crate) fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
