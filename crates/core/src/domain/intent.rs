//! Intentions and the keyword tables consulted by the keyword tier.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The wire-stable intent taxonomy (see EXTERNAL INTERFACES).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntentLabel {
    Saludar,
    Reservar,
    Cancelar,
    Consultar,
    Despedida,
    Otro,
}

impl IntentLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Saludar => "saludar",
            Self::Reservar => "reservar",
            Self::Cancelar => "cancelar",
            Self::Consultar => "consultar",
            Self::Despedida => "despedida",
            Self::Otro => "otro",
        }
    }
}

/// A weighted keyword pattern attached to a tenant intention.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeywordPattern {
    pub word: String,
    pub weight: f32,
}

/// Tenant-scoped intention definition: priority breaks ties between
/// candidates of equal score, patterns feed Tier 1, examples feed Tier 2.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Intention {
    pub id: Uuid,
    pub company_id: Uuid,
    pub label: IntentLabel,
    pub priority: i32,
    pub patterns: Vec<KeywordPattern>,
    pub examples: Vec<String>,
}

/// Match mode for a system/service keyword entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchMode {
    Contains,
    Exact,
}

/// Global (tenant-independent) keyword consulted by Tier 1 regardless of
/// which tenant is asking.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemKeyword {
    pub word: String,
    pub category: IntentLabel,
    pub weight: f32,
    pub match_mode: MatchMode,
    pub language: String,
}

/// Maps a word/phrase to a service key, optionally scoped to a tenant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceKeyword {
    pub word: String,
    pub service_key: String,
    pub company_id: Option<Uuid>,
    pub weight: f32,
    pub match_mode: MatchMode,
}
