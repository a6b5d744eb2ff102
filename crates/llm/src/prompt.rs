//! Prompt construction and the strict response schema for Tier 3.

use reserva_core::domain::{Company, Conversation, Product};
use serde::{Deserialize, Serialize};

/// A recent conversation turn, included verbatim in the prompt.
#[derive(Debug, Clone)]
pub struct RecentTurn {
    pub speaker: &'static str,
    pub text: String,
}

const MAX_RECENT_TURNS: usize = 5;

pub struct PromptBuilder;

impl PromptBuilder {
    /// Builds the full prompt text: system identity, recent turns,
    /// collected-fields snapshot, a catalog slice, and the strict schema
    /// the model must answer in.
    pub fn build(
        company: &Company,
        conversation: &Conversation,
        recent_turns: &[RecentTurn],
        catalog_slice: &[Product],
        message: &str,
    ) -> String {
        let mut prompt = String::new();

        prompt.push_str(&format!(
            "Eres el asistente de reservas de {} ({:?}). Hoy es {}.\n",
            company.name,
            company.company_type,
            chrono::Utc::now().format("%Y-%m-%d"),
        ));

        if !catalog_slice.is_empty() {
            prompt.push_str("Servicios/productos disponibles:\n");
            for p in catalog_slice {
                prompt.push_str(&format!("- {} ({})\n", p.name, p.category));
            }
        }

        if !conversation.collected.is_empty() {
            prompt.push_str("Datos ya recolectados en esta conversación:\n");
            for (field, value) in &conversation.collected {
                prompt.push_str(&format!("- {}: {}\n", field, value.value));
            }
        }

        if !recent_turns.is_empty() {
            prompt.push_str("Turnos recientes:\n");
            for turn in recent_turns.iter().rev().take(MAX_RECENT_TURNS).rev() {
                prompt.push_str(&format!("{}: {}\n", turn.speaker, turn.text));
            }
        }

        prompt.push_str(&format!("Mensaje actual del usuario: {message}\n"));
        prompt.push_str(RESPONSE_SCHEMA_INSTRUCTIONS);
        prompt
    }
}

const RESPONSE_SCHEMA_INSTRUCTIONS: &str = r#"
Responde ÚNICAMENTE con un objeto JSON válido con esta forma exacta:
{
  "intention": "saludar|reservar|cancelar|consultar|despedida|otro",
  "confidence": 0.0,
  "extracted_data": {
    "date": null, "time": null, "guests": null, "phone": null,
    "service": null, "products": []
  },
  "missing_fields": [],
  "suggested_reply": "",
  "thinking": {}
}
"#;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExtractedData {
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub time: Option<String>,
    #[serde(default)]
    pub guests: Option<u32>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub service: Option<String>,
    #[serde(default)]
    pub products: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ClassifierResponse {
    pub intention: String,
    pub confidence: f32,
    #[serde(default)]
    pub extracted_data: ExtractedData,
    #[serde(default)]
    pub missing_fields: Vec<String>,
    #[serde(default)]
    pub suggested_reply: String,
    #[serde(default)]
    pub thinking: serde_json::Value,
}
