//! Users and their per-tenant learned preferences.

use chrono::{NaiveTime, Weekday};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub phone: String,
    pub name: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserPreference {
    pub user_id: Uuid,
    pub company_id: Uuid,
    pub preferred_time: Option<NaiveTime>,
    pub preferred_day: Option<Weekday>,
    pub preferred_service_key: Option<String>,
    pub default_guests: Option<u32>,
    pub confirmed_contacts: Vec<String>,
    pub favorite_product_ids: Vec<Uuid>,
    pub completed_reservations: u32,
}

impl UserPreference {
    pub fn is_returning_customer(&self) -> bool {
        self.completed_reservations > 0
    }
}
