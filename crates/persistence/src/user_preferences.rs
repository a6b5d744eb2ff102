//! Per (user, company) learned preferences.

use crate::error::PersistenceError;
use chrono::{NaiveTime, Weekday};
use reserva_core::domain::UserPreference;
use sqlx::{FromRow, PgPool};
use std::str::FromStr;
use uuid::Uuid;

#[derive(FromRow)]
struct PreferenceRow {
    user_id: Uuid,
    company_id: Uuid,
    preferred_time: Option<NaiveTime>,
    preferred_day: Option<String>,
    preferred_service_key: Option<String>,
    default_guests: Option<i32>,
    confirmed_contacts: serde_json::Value,
    favorite_product_ids: serde_json::Value,
    completed_reservations: i32,
}

impl PreferenceRow {
    fn into_domain(self) -> UserPreference {
        UserPreference {
            user_id: self.user_id,
            company_id: self.company_id,
            preferred_time: self.preferred_time,
            preferred_day: self
                .preferred_day
                .and_then(|d| Weekday::from_str(&d).ok()),
            preferred_service_key: self.preferred_service_key,
            default_guests: self.default_guests.map(|g| g as u32),
            confirmed_contacts: serde_json::from_value(self.confirmed_contacts).unwrap_or_default(),
            favorite_product_ids: serde_json::from_value(self.favorite_product_ids)
                .unwrap_or_default(),
            completed_reservations: self.completed_reservations as u32,
        }
    }
}

pub async fn find(
    pool: &PgPool,
    user_id: Uuid,
    company_id: Uuid,
) -> Result<Option<UserPreference>, PersistenceError> {
    let row = sqlx::query_as::<_, PreferenceRow>(
        "SELECT * FROM user_preferences WHERE user_id = $1 AND company_id = $2",
    )
    .bind(user_id)
    .bind(company_id)
    .fetch_optional(pool)
    .await?;
    Ok(row.map(PreferenceRow::into_domain))
}

/// Increments the completed-reservation counter, called only when a
/// reservation transitions into `confirmed`, inside that same transaction.
pub async fn record_completed_reservation_in_tx(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    user_id: Uuid,
    company_id: Uuid,
) -> Result<(), PersistenceError> {
    sqlx::query(
        r#"
        INSERT INTO user_preferences (user_id, company_id, completed_reservations)
        VALUES ($1, $2, 1)
        ON CONFLICT (user_id, company_id) DO UPDATE SET
            completed_reservations = user_preferences.completed_reservations + 1
        "#,
    )
    .bind(user_id)
    .bind(company_id)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

pub async fn record_completed_reservation(
    pool: &PgPool,
    user_id: Uuid,
    company_id: Uuid,
) -> Result<(), PersistenceError> {
    let mut tx = pool.begin().await?;
    record_completed_reservation_in_tx(&mut tx, user_id, company_id).await?;
    tx.commit().await?;
    Ok(())
}
