//! Domain error to HTTP status mapping

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use mirador_domain::MiradorError;
use serde_json::json;
use tracing::error;

/// Handler result; domain errors are translated at this boundary only.
pub type ApiResult<T> = Result<T, ApiError>;

/// HTTP shape of a `MiradorError`.
///
/// Validation problems and unresolved companies keep their message.
/// Everything else is logged and collapsed to a generic 500 body so
/// session, transport and decoding details never reach the client.
#[derive(Debug)]
pub struct ApiError(MiradorError);

impl From<MiradorError> for ApiError {
    fn from(err: MiradorError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self.0 {
            MiradorError::InvalidInput(msg) => (StatusCode::BAD_REQUEST, msg),
            MiradorError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            other => {
                error!(error = %other, "request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, "Error interno".to_string())
            }
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}
