//! Conversation state machine and the collected-fields draft it carries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Wire-stable conversation states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversationState {
    Initial,
    Collecting,
    AwaitingPayment,
    Confirmed,
    Cancelled,
    Abandoned,
}

impl ConversationState {
    /// `true` once a conversation can no longer transition.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Cancelled | Self::Abandoned)
    }
}

/// A single collected field value, as extracted by the normalizer/extractor
/// or supplied by the LLM tier. Values are stored as strings; typed access
/// is the caller's responsibility (see `reserva-agent::field_validator`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectedField {
    pub value: String,
    pub confidence: f32,
    pub set_at_turn: u32,
}

/// An item selected as part of a reservation draft (product id + quantity).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DraftItem {
    pub product_id: Uuid,
    pub quantity: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    pub id: Uuid,
    pub company_id: Uuid,
    pub user_id: Uuid,
    pub state: ConversationState,
    pub active_intent: Option<super::intent::IntentLabel>,
    pub service_key: Option<String>,
    pub collected: BTreeMap<String, CollectedField>,
    pub draft_items: Vec<DraftItem>,
    pub draft_reservation_id: Option<Uuid>,
    pub payment_reference: Option<String>,
    pub turn_count: u32,
    pub retries_remaining: u8,
    pub last_turn_at: DateTime<Utc>,
}

pub const DEFAULT_RETRY_BUDGET: u8 = 3;

impl Conversation {
    pub fn new(company_id: Uuid, user_id: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            company_id,
            user_id,
            state: ConversationState::Initial,
            active_intent: None,
            service_key: None,
            collected: BTreeMap::new(),
            draft_items: Vec::new(),
            draft_reservation_id: None,
            payment_reference: None,
            turn_count: 0,
            retries_remaining: DEFAULT_RETRY_BUDGET,
            last_turn_at: Utc::now(),
        }
    }

    pub fn set_field(&mut self, field: &str, value: impl Into<String>, confidence: f32) {
        self.collected.insert(
            field.to_string(),
            CollectedField {
                value: value.into(),
                confidence,
                set_at_turn: self.turn_count,
            },
        );
    }

    pub fn field(&self, field: &str) -> Option<&str> {
        self.collected.get(field).map(|f| f.value.as_str())
    }
}
