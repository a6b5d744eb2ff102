//! Payment correlation storage.

use crate::error::PersistenceError;
use reserva_core::domain::{Payment, PaymentStatus};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

#[derive(FromRow)]
struct PaymentRow {
    id: Uuid,
    conversation_id: Uuid,
    reservation_id: Option<Uuid>,
    amount: i64,
    status: String,
    checkout_url: Option<String>,
    reference: String,
}

impl PaymentRow {
    fn into_domain(self) -> Result<Payment, PersistenceError> {
        let status: PaymentStatus = serde_json::from_value(serde_json::Value::String(self.status))
            .map_err(|e| PersistenceError::Schema(format!("bad payment status: {e}")))?;
        Ok(Payment {
            id: self.id,
            conversation_id: self.conversation_id,
            reservation_id: self.reservation_id,
            amount: self.amount,
            status,
            checkout_url: self.checkout_url,
            reference: self.reference,
        })
    }
}

pub async fn find_by_reference(
    pool: &PgPool,
    reference: &str,
) -> Result<Option<Payment>, PersistenceError> {
    let row = sqlx::query_as::<_, PaymentRow>("SELECT * FROM payments WHERE reference = $1")
        .bind(reference)
        .fetch_optional(pool)
        .await?;
    row.map(PaymentRow::into_domain).transpose()
}

pub async fn insert(pool: &PgPool, payment: &Payment) -> Result<(), PersistenceError> {
    let status = serde_json::to_value(payment.status)?
        .as_str()
        .unwrap()
        .to_string();

    sqlx::query(
        r#"
        INSERT INTO payments (id, conversation_id, reservation_id, amount, status, checkout_url, reference)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        "#,
    )
    .bind(payment.id)
    .bind(payment.conversation_id)
    .bind(payment.reservation_id)
    .bind(payment.amount)
    .bind(status)
    .bind(&payment.checkout_url)
    .bind(&payment.reference)
    .execute(pool)
    .await?;
    Ok(())
}

/// Updates status by reference, idempotently. Returns `false` if the
/// reference is unknown or already in a terminal status matching `status`.
pub async fn update_status(
    pool: &PgPool,
    reference: &str,
    status: PaymentStatus,
) -> Result<bool, PersistenceError> {
    let status_s = serde_json::to_value(status)?.as_str().unwrap().to_string();
    let result = sqlx::query(
        "UPDATE payments SET status = $1 WHERE reference = $2 AND status <> $1",
    )
    .bind(status_s)
    .bind(reference)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() == 1)
}
