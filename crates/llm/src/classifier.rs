//! LLM Classifier (component E): the Tier 3 intent classifier, guarded by
//! the circuit breaker and called only when Tiers 1 and 2 are undecided.

use std::sync::Arc;
use std::time::Instant;

use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::circuit_breaker::{Admission, CircuitBreaker};
use crate::config::LlmConfig;
use crate::error::LlmError;
use crate::prompt::ClassifierResponse;

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    text: String,
}

/// Result of a Tier 3 call: either the model answered, or the breaker
/// rejected the call and the caller must fall back to the best tier-1/2
/// candidate on its own.
pub enum Tier3Outcome {
    Decided(ClassifierResponse),
    BreakerOpen,
}

pub struct LlmClassifier {
    client: Client,
    config: LlmConfig,
    breaker: Arc<CircuitBreaker>,
}

impl LlmClassifier {
    pub fn new(config: LlmConfig, breaker: Arc<CircuitBreaker>) -> Self {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .unwrap_or_else(|_| Client::new());
        Self {
            client,
            config,
            breaker,
        }
    }

    pub fn breaker(&self) -> &Arc<CircuitBreaker> {
        &self.breaker
    }

    /// Calls the LLM, parsing and validating its response against the
    /// strict output schema. On schema failure, retries once with a
    /// corrective follow-up; a second failure is treated as upstream
    /// unavailable rather than retried indefinitely.
    pub async fn classify(&self, prompt: &str) -> Result<Tier3Outcome, LlmError> {
        let Admission::Go = self.breaker.admit() else {
            return Ok(Tier3Outcome::BreakerOpen);
        };

        let started = Instant::now();
        let result = self.call_and_parse(prompt).await;

        match &result {
            Ok(_) => {
                self.breaker.on_success();
                metrics::histogram!("reserva_llm_tier3_latency_seconds")
                    .record(started.elapsed().as_secs_f64());
                metrics::counter!("reserva_llm_tier3_calls_total", "outcome" => "success")
                    .increment(1);
            }
            Err(_) => {
                self.breaker.on_failure();
                metrics::counter!("reserva_llm_tier3_calls_total", "outcome" => "failure")
                    .increment(1);
            }
        }

        result.map(Tier3Outcome::Decided)
    }

    async fn call_and_parse(&self, prompt: &str) -> Result<ClassifierResponse, LlmError> {
        let raw = self.request(prompt).await?;
        match serde_json::from_str::<ClassifierResponse>(&raw) {
            Ok(parsed) => Ok(parsed),
            Err(first_err) => {
                tracing::warn!(error = %first_err, "tier3 response failed schema validation, retrying once");
                let corrective = format!(
                    "{prompt}\n\nTu respuesta anterior no fue JSON válido según el esquema. Responde solo con el JSON exacto."
                );
                let raw_retry = self.request(&corrective).await?;
                serde_json::from_str::<ClassifierResponse>(&raw_retry)
                    .map_err(|e| LlmError::Schema(e.to_string()))
            }
        }
    }

    async fn request(&self, prompt: &str) -> Result<String, LlmError> {
        let mut req = self.client.post(&self.config.endpoint).json(&ChatRequest {
            model: &self.config.model,
            prompt,
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
        });
        if let Some(key) = &self.config.api_key {
            req = req.bearer_auth(key);
        }
        let resp = req.send().await?.error_for_status()?;
        let body: ChatResponse = resp.json().await?;
        Ok(body.text)
    }
}
