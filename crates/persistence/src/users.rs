//! User identity storage, keyed on phone number.

use crate::error::PersistenceError;
use reserva_core::domain::User;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

#[derive(FromRow)]
struct UserRow {
    id: Uuid,
    phone: String,
    name: Option<String>,
    email: Option<String>,
}

impl From<UserRow> for User {
    fn from(r: UserRow) -> Self {
        User {
            id: r.id,
            phone: r.phone,
            name: r.name,
            email: r.email,
        }
    }
}

pub async fn find_by_phone(pool: &PgPool, phone: &str) -> Result<Option<User>, PersistenceError> {
    let row = sqlx::query_as::<_, UserRow>("SELECT * FROM users WHERE phone = $1")
        .bind(phone)
        .fetch_optional(pool)
        .await?;
    Ok(row.map(User::from))
}

pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<User>, PersistenceError> {
    let row = sqlx::query_as::<_, UserRow>("SELECT * FROM users WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row.map(User::from))
}

/// Finds the user with this phone, creating a new one if none exists.
/// Relies on the `phone` unique constraint plus `ON CONFLICT DO NOTHING`
/// to stay race-safe under concurrent first-contact messages.
pub async fn find_or_create_by_phone(pool: &PgPool, phone: &str) -> Result<User, PersistenceError> {
    let id = Uuid::new_v4();
    sqlx::query(
        "INSERT INTO users (id, phone) VALUES ($1, $2) ON CONFLICT (phone) DO NOTHING",
    )
    .bind(id)
    .bind(phone)
    .execute(pool)
    .await?;

    find_by_phone(pool, phone)
        .await?
        .ok_or_else(|| PersistenceError::NotFound(format!("user with phone {phone}")))
}
