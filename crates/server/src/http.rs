//! HTTP surface: the conversational endpoint, the payment webhook, and the
//! operational routes (`/health`, `/metrics`).

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json};
use axum::routing::{get, post};
use axum::Router;
use reserva_agent::{InboundMessage, OutboundMessage};
use reserva_core::domain::PaymentStatus;
use serde::Deserialize;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use crate::error::ApiError;
use crate::metrics::metrics_handler;
use crate::state::AppState;

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/v1/messages", post(handle_message))
        .route("/v1/payments/webhook", post(handle_payment_webhook))
        .route("/health", get(health))
        .route("/metrics", get(metrics_handler))
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Wire shape of the inbound message request (§6): exactly one of
/// `userId`/`phone` is expected, enforced by `BotEngine::resolve_user`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MessageRequest {
    company_id: Uuid,
    #[serde(default)]
    user_id: Option<Uuid>,
    #[serde(default)]
    phone: Option<String>,
    message: String,
}

async fn handle_message(
    State(state): State<AppState>,
    Json(request): Json<MessageRequest>,
) -> Result<Json<OutboundMessage>, ApiError> {
    let inbound = InboundMessage {
        company_id: request.company_id,
        user_id: request.user_id,
        phone: request.phone,
        message: request.message,
    };
    let outbound = state.engine.handle_message(inbound).await?;
    Ok(Json(outbound))
}

/// Wire shape of a payment provider webhook delivery (§6). `raw_event` is
/// accepted and logged for audit purposes but not otherwise interpreted;
/// providers disagree on its shape, so only `reference`/`status` are acted on.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WebhookRequest {
    reference: String,
    status: PaymentStatus,
    #[serde(default)]
    raw_event: serde_json::Value,
}

async fn handle_payment_webhook(
    State(state): State<AppState>,
    Json(request): Json<WebhookRequest>,
) -> Result<StatusCode, ApiError> {
    tracing::info!(
        reference = %request.reference,
        status = ?request.status,
        raw_event = %request.raw_event,
        "received payment webhook"
    );
    state
        .engine
        .handle_payment_webhook(&request.reference, request.status)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}
