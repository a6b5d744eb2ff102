use thiserror::Error;

#[derive(Debug, Error)]
pub enum NlpError {
    #[error("failed to compile pattern: {0}")]
    Pattern(String),
}
