//! LLM Gateway port
//!
//! Defines the interface for calling the structured-output oracle.

use async_trait::async_trait;
use lattia_domain::TurnContract;
use thiserror::Error;

/// Errors that can occur during LLM gateway operations
#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Request failed: {0}")]
    RequestFailed(String),

    /// The model declined to answer.
    #[error("Model refused: {0}")]
    Refused(String),

    /// The model answered but the payload was unusable.
    #[error("Malformed response: {0}")]
    Malformed(String),

    #[error("Timeout")]
    Timeout,

    #[error("Other error: {0}")]
    Other(String),
}

/// One structured completion call.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub system_prompt: String,
    pub user_prompt: String,
    /// Contract whose JSON schema constrains the response.
    pub contract: TurnContract,
}

impl CompletionRequest {
    pub fn new(
        system_prompt: impl Into<String>,
        user_prompt: impl Into<String>,
        contract: TurnContract,
    ) -> Self {
        Self {
            system_prompt: system_prompt.into(),
            user_prompt: user_prompt.into(),
            contract,
        }
    }
}

/// Gateway for LLM communication
///
/// Implementations (adapters) live in the infrastructure layer. The returned
/// string is the raw JSON text of the decision; parsing happens in the
/// application layer so that every adapter is validated the same way.
#[async_trait]
pub trait LlmGateway: Send + Sync {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, GatewayError>;

    /// Model identifier, for logs.
    fn model_name(&self) -> &str {
        "unknown"
    }
}
