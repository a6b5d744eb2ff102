//! Conversation state storage.

use crate::error::PersistenceError;
use chrono::{DateTime, Utc};
use reserva_core::domain::{Conversation, ConversationState};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

#[derive(FromRow)]
struct ConversationRow {
    id: Uuid,
    company_id: Uuid,
    user_id: Uuid,
    state: String,
    active_intent: Option<String>,
    service_key: Option<String>,
    collected: serde_json::Value,
    draft_items: serde_json::Value,
    draft_reservation_id: Option<Uuid>,
    payment_reference: Option<String>,
    turn_count: i32,
    retries_remaining: i16,
    last_turn_at: DateTime<Utc>,
}

impl ConversationRow {
    fn into_domain(self) -> Result<Conversation, PersistenceError> {
        let state: ConversationState = serde_json::from_value(serde_json::Value::String(self.state))
            .map_err(|e| PersistenceError::Schema(format!("bad conversation state: {e}")))?;
        let active_intent = self
            .active_intent
            .map(|s| serde_json::from_value(serde_json::Value::String(s)))
            .transpose()
            .map_err(|e| PersistenceError::Schema(format!("bad intent label: {e}")))?;
        Ok(Conversation {
            id: self.id,
            company_id: self.company_id,
            user_id: self.user_id,
            state,
            active_intent,
            service_key: self.service_key,
            collected: serde_json::from_value(self.collected)?,
            draft_items: serde_json::from_value(self.draft_items)?,
            draft_reservation_id: self.draft_reservation_id,
            payment_reference: self.payment_reference,
            turn_count: self.turn_count as u32,
            retries_remaining: self.retries_remaining as u8,
            last_turn_at: self.last_turn_at,
        })
    }
}

pub async fn find_by_id(
    pool: &PgPool,
    id: Uuid,
) -> Result<Option<Conversation>, PersistenceError> {
    let row = sqlx::query_as::<_, ConversationRow>("SELECT * FROM conversations WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?;
    row.map(ConversationRow::into_domain).transpose()
}

/// Most recent non-terminal conversation for this (company, user) pair, if any.
pub async fn find_active(
    pool: &PgPool,
    company_id: Uuid,
    user_id: Uuid,
) -> Result<Option<Conversation>, PersistenceError> {
    let row = sqlx::query_as::<_, ConversationRow>(
        "SELECT * FROM conversations WHERE company_id = $1 AND user_id = $2 \
         AND state NOT IN ('cancelled', 'abandoned') \
         ORDER BY last_turn_at DESC LIMIT 1",
    )
    .bind(company_id)
    .bind(user_id)
    .fetch_optional(pool)
    .await?;
    row.map(ConversationRow::into_domain).transpose()
}

pub async fn upsert(pool: &PgPool, conv: &Conversation) -> Result<(), PersistenceError> {
    let state = serde_json::to_value(conv.state)?
        .as_str()
        .unwrap()
        .to_string();
    let active_intent = conv
        .active_intent
        .map(|i| serde_json::to_value(i).map(|v| v.as_str().unwrap().to_string()))
        .transpose()?;

    sqlx::query(
        r#"
        INSERT INTO conversations (id, company_id, user_id, state, active_intent, service_key,
                                    collected, draft_items, draft_reservation_id,
                                    payment_reference, turn_count, retries_remaining, last_turn_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
        ON CONFLICT (id) DO UPDATE SET
            state = EXCLUDED.state, active_intent = EXCLUDED.active_intent,
            service_key = EXCLUDED.service_key, collected = EXCLUDED.collected,
            draft_items = EXCLUDED.draft_items, draft_reservation_id = EXCLUDED.draft_reservation_id,
            payment_reference = EXCLUDED.payment_reference, turn_count = EXCLUDED.turn_count,
            retries_remaining = EXCLUDED.retries_remaining, last_turn_at = EXCLUDED.last_turn_at
        "#,
    )
    .bind(conv.id)
    .bind(conv.company_id)
    .bind(conv.user_id)
    .bind(state)
    .bind(active_intent)
    .bind(&conv.service_key)
    .bind(serde_json::to_value(&conv.collected)?)
    .bind(serde_json::to_value(&conv.draft_items)?)
    .bind(conv.draft_reservation_id)
    .bind(&conv.payment_reference)
    .bind(conv.turn_count as i32)
    .bind(conv.retries_remaining as i16)
    .bind(conv.last_turn_at)
    .execute(pool)
    .await?;
    Ok(())
}
