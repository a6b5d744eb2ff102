use thiserror::Error;

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("datastore error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("schema error: {0}")]
    Schema(String),

    #[error("row not found: {0}")]
    NotFound(String),

    #[error("stock conflict for product {product_id}: {message}")]
    StockConflict {
        product_id: uuid::Uuid,
        message: String,
    },

    #[error("malformed json: {0}")]
    Json(#[from] serde_json::Error),
}
