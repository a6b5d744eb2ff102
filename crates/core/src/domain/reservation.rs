//! Reservation aggregate.

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReservationStatus {
    Pending,
    AwaitingPayment,
    Confirmed,
    Completed,
    Cancelled,
}

impl ReservationStatus {
    /// Cancellation is reachable from any non-terminal status; every other
    /// transition is monotonic in the order declared here.
    pub fn can_transition_to(self, next: Self) -> bool {
        use ReservationStatus::*;
        if next == Cancelled {
            return self != Completed && self != Cancelled;
        }
        matches!(
            (self, next),
            (Pending, AwaitingPayment)
                | (Pending, Confirmed)
                | (AwaitingPayment, Confirmed)
                | (Confirmed, Completed)
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReservationItem {
    pub product_id: Uuid,
    pub product_name: String,
    pub quantity: u32,
    pub unit_price: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reservation {
    pub id: Uuid,
    pub company_id: Uuid,
    pub user_id: Uuid,
    pub conversation_id: Uuid,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub guests: Option<u32>,
    pub phone: String,
    pub customer_name: Option<String>,
    pub service_key: String,
    pub items: Vec<ReservationItem>,
    pub resource_id: Option<Uuid>,
    pub status: ReservationStatus,
    /// Minor currency units: sum(item.qty * unit_price) + service_fee.
    pub total_price: i64,
}

impl Reservation {
    pub fn compute_total(items: &[ReservationItem], service_fee: i64) -> i64 {
        items
            .iter()
            .map(|i| i.unit_price * i.quantity as i64)
            .sum::<i64>()
            + service_fee
    }
}
