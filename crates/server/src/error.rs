//! Maps [`ReservaError`] onto HTTP status codes for the JSON API.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use reserva_core::ReservaError;
use serde_json::json;

pub struct ApiError(pub ReservaError);

impl From<ReservaError> for ApiError {
    fn from(e: ReservaError) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            ReservaError::NotUnderstood => StatusCode::UNPROCESSABLE_ENTITY,
            ReservaError::Validation { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            ReservaError::StockConflict { .. } => StatusCode::CONFLICT,
            ReservaError::UpstreamUnavailable(_) => StatusCode::BAD_GATEWAY,
            ReservaError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            ReservaError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error = %self.0, "internal error serving request");
        }
        (status, Json(json!({ "error": self.0.to_string() }))).into_response()
    }
}
