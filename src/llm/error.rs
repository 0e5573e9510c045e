//! Errors from language model calls.

use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("Request to model provider failed: {0}")]
    Network(String),

    #[error("Model call timed out after {0:?}")]
    Timeout(Duration),

    /// Non-success HTTP status with the provider's body
    #[error("Model provider returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Failed to parse model response: {0}")]
    Parse(String),

    #[error("Model returned no content")]
    EmptyResponse,
}
