//! Stock movement audit trail.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StockMovementType {
    In,
    Out,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockMovement {
    pub id: Uuid,
    pub product_id: Uuid,
    pub previous_stock: i32,
    pub new_stock: i32,
    pub movement_type: StockMovementType,
    /// Signed quantity: positive for `in`, negative for `out`.
    pub quantity: i32,
    pub reason: String,
    pub correlation_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}
