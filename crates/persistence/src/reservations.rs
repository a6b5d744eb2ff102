//! Reservation aggregate storage.

use crate::error::PersistenceError;
use chrono::{NaiveDate, NaiveTime};
use reserva_core::domain::{Reservation, ReservationStatus};
use sqlx::{Executor, FromRow, PgPool, Postgres};
use uuid::Uuid;

#[derive(FromRow)]
struct ReservationRow {
    id: Uuid,
    company_id: Uuid,
    user_id: Uuid,
    conversation_id: Uuid,
    date: NaiveDate,
    time: NaiveTime,
    guests: Option<i32>,
    phone: String,
    customer_name: Option<String>,
    service_key: String,
    items: serde_json::Value,
    resource_id: Option<Uuid>,
    status: String,
    total_price: i64,
}

impl ReservationRow {
    fn into_domain(self) -> Result<Reservation, PersistenceError> {
        let status: ReservationStatus =
            serde_json::from_value(serde_json::Value::String(self.status))
                .map_err(|e| PersistenceError::Schema(format!("bad reservation status: {e}")))?;
        Ok(Reservation {
            id: self.id,
            company_id: self.company_id,
            user_id: self.user_id,
            conversation_id: self.conversation_id,
            date: self.date,
            time: self.time,
            guests: self.guests.map(|g| g as u32),
            phone: self.phone,
            customer_name: self.customer_name,
            service_key: self.service_key,
            items: serde_json::from_value(self.items)?,
            resource_id: self.resource_id,
            status,
            total_price: self.total_price,
        })
    }
}

pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Reservation>, PersistenceError> {
    let row = sqlx::query_as::<_, ReservationRow>("SELECT * FROM reservations WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?;
    row.map(ReservationRow::into_domain).transpose()
}

pub async fn insert(pool: &PgPool, reservation: &Reservation) -> Result<(), PersistenceError> {
    insert_with(pool, reservation).await
}

/// A user's cancellable reservations (not yet completed or cancelled),
/// ordered by date/time so "1" in a numbered cancel prompt always means
/// the soonest one. Backs the cancel flow's list/select step (§4.M).
pub async fn list_active_by_user(
    pool: &PgPool,
    company_id: Uuid,
    user_id: Uuid,
) -> Result<Vec<Reservation>, PersistenceError> {
    let rows = sqlx::query_as::<_, ReservationRow>(
        "SELECT * FROM reservations WHERE company_id = $1 AND user_id = $2 \
         AND status IN ('pending', 'awaiting_payment', 'confirmed') \
         ORDER BY date, time",
    )
    .bind(company_id)
    .bind(user_id)
    .fetch_all(pool)
    .await?;
    rows.into_iter().map(ReservationRow::into_domain).collect()
}

/// Generic over `Executor` so callers can run this inside an existing
/// transaction (e.g. alongside the stock-reservation commit).
pub async fn insert_with<'e, E>(executor: E, reservation: &Reservation) -> Result<(), PersistenceError>
where
    E: Executor<'e, Database = Postgres>,
{
    let status = serde_json::to_value(reservation.status)?
        .as_str()
        .unwrap()
        .to_string();

    sqlx::query(
        r#"
        INSERT INTO reservations (id, company_id, user_id, conversation_id, date, time, guests,
                                   phone, customer_name, service_key, items, resource_id, status,
                                   total_price)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
        "#,
    )
    .bind(reservation.id)
    .bind(reservation.company_id)
    .bind(reservation.user_id)
    .bind(reservation.conversation_id)
    .bind(reservation.date)
    .bind(reservation.time)
    .bind(reservation.guests.map(|g| g as i32))
    .bind(&reservation.phone)
    .bind(&reservation.customer_name)
    .bind(&reservation.service_key)
    .bind(serde_json::to_value(&reservation.items)?)
    .bind(reservation.resource_id)
    .bind(status)
    .bind(reservation.total_price)
    .execute(executor)
    .await?;
    Ok(())
}

/// Updates status, enforcing the monotonic transition rule at the row
/// level via the `WHERE` clause rather than trusting the caller.
pub async fn transition_status(
    pool: &PgPool,
    id: Uuid,
    from: ReservationStatus,
    to: ReservationStatus,
) -> Result<bool, PersistenceError> {
    let from_s = serde_json::to_value(from)?.as_str().unwrap().to_string();
    let to_s = serde_json::to_value(to)?.as_str().unwrap().to_string();

    let result = sqlx::query(
        "UPDATE reservations SET status = $1 WHERE id = $2 AND status = $3",
    )
    .bind(to_s)
    .bind(id)
    .bind(from_s)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() == 1)
}
