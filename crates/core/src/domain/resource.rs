//! Physical resources a reservation can be bound to (a table, a room, a chair).

use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Resource {
    pub id: Uuid,
    pub company_id: Uuid,
    pub resource_type: String,
    pub capacity: u32,
    pub available: bool,
    pub active: bool,
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

impl Resource {
    pub fn can_seat(&self, guests: u32) -> bool {
        self.active && self.available && self.capacity >= guests
    }
}
