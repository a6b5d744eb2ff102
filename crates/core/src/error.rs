//! Shared error type for the reservation engine.
//!
//! Every crate in the workspace converges on [`ReservaError`] at its public
//! boundary so the orchestrator can match on a single enum instead of
//! threading crate-specific error types through every call site.

use thiserror::Error;

/// The error kinds a conversation turn can surface.
#[derive(Debug, Error)]
pub enum ReservaError {
    /// All three intent tiers returned low confidence.
    #[error("could not understand the message")]
    NotUnderstood,

    /// A collected field failed validation (bad date, guests over capacity, ...).
    #[error("validation failed for field `{field}`: {message}")]
    Validation { field: String, message: String },

    /// A stock row could not be locked, or had insufficient quantity at lock time.
    #[error("stock conflict for product {product_id}: {message}")]
    StockConflict {
        product_id: uuid::Uuid,
        message: String,
    },

    /// The LLM or the payment provider failed or timed out.
    #[error("upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    /// The per-message deadline elapsed.
    #[error("operation timed out after {0:?}")]
    Timeout(std::time::Duration),

    /// Anything else: datastore unavailable, invariant violated, bug.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ReservaError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn stock_conflict(product_id: uuid::Uuid, message: impl Into<String>) -> Self {
        Self::StockConflict {
            product_id,
            message: message.into(),
        }
    }

    /// Whether this error should leave the conversation state unchanged.
    pub fn is_state_preserving(&self) -> bool {
        matches!(
            self,
            Self::NotUnderstood | Self::Validation { .. } | Self::Timeout(_)
        )
    }
}

impl From<sqlx::Error> for ReservaError {
    fn from(e: sqlx::Error) -> Self {
        Self::Internal(format!("datastore error: {e}"))
    }
}

impl From<reqwest::Error> for ReservaError {
    fn from(e: reqwest::Error) -> Self {
        Self::UpstreamUnavailable(e.to_string())
    }
}

impl From<serde_json::Error> for ReservaError {
    fn from(e: serde_json::Error) -> Self {
        Self::Internal(format!("malformed json: {e}"))
    }
}

pub type Result<T> = std::result::Result<T, ReservaError>;
