use thiserror::Error;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("llm request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("llm response failed schema validation: {0}")]
    Schema(String),

    #[error("circuit breaker is open")]
    CircuitOpen,
}
