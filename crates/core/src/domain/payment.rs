//! Payment correlation record.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    Pending,
    Approved,
    Declined,
    Voided,
    Expired,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payment {
    pub id: Uuid,
    pub conversation_id: Uuid,
    pub reservation_id: Option<Uuid>,
    /// Minor currency units.
    pub amount: i64,
    pub status: PaymentStatus,
    pub checkout_url: Option<String>,
    pub reference: String,
}
