//! LLM backend configuration, mirroring `reserva_config::settings::LlmSettings`
//! but scoped to what this crate's HTTP client needs.

use std::time::Duration;

#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub endpoint: String,
    pub model: String,
    pub api_key: Option<String>,
    pub timeout: Duration,
    pub max_retries: u32,
    pub max_tokens: u32,
    pub temperature: f32,
}

impl From<&reserva_config::Settings> for LlmConfig {
    fn from(settings: &reserva_config::Settings) -> Self {
        Self {
            endpoint: settings.llm.endpoint.clone(),
            model: settings.llm.model.clone(),
            api_key: settings.llm.api_key.clone(),
            timeout: Duration::from_millis(settings.llm.timeout_ms),
            max_retries: settings.llm.max_retries,
            max_tokens: 512,
            temperature: 0.2,
        }
    }
}
