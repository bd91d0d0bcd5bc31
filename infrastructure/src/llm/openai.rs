//! OpenAI-compatible chat completions gateway with JSON-schema output

use crate::config::FileLlmConfig;
use async_trait::async_trait;
use lattia_application::ports::llm_gateway::{CompletionRequest, GatewayError, LlmGateway};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{debug, info};

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    refusal: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: String,
}

pub struct OpenAiGateway {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
    temperature: f32,
    max_tokens: u32,
}

impl OpenAiGateway {
    pub fn new(config: &FileLlmConfig, api_key: impl Into<String>) -> Result<Self, GatewayError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| GatewayError::ConnectionError(e.to_string()))?;

        info!("OpenAiGateway initialized (model: {})", config.model);

        Ok(Self {
            client,
            endpoint: format!("{}/chat/completions", config.base_url.trim_end_matches('/')),
            api_key: api_key.into(),
            model: config.model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        })
    }

    /// Build from config, reading the key from the configured env var.
    pub fn from_config(config: &FileLlmConfig) -> Result<Self, GatewayError> {
        let api_key = config.api_key().ok_or_else(|| {
            GatewayError::ConnectionError(format!("{} is not set", config.api_key_env))
        })?;
        Self::new(config, api_key)
    }

    fn build_request_body(&self, request: &CompletionRequest) -> Value {
        json!({
            "model": self.model,
            "temperature": self.temperature,
            "max_tokens": self.max_tokens,
            "messages": [
                {"role": "system", "content": request.system_prompt},
                {"role": "user", "content": request.user_prompt},
            ],
            "response_format": {
                "type": "json_schema",
                "json_schema": {
                    "name": request.contract.as_str(),
                    "schema": request.contract.response_schema(),
                },
            },
        })
    }
}

/// Extract the decision text from a completion, classifying refusals and
/// unusable output.
fn parse_completion(body: &str) -> Result<String, GatewayError> {
    let response: ChatResponse = serde_json::from_str(body)
        .map_err(|e| GatewayError::Malformed(format!("Failed to parse response: {}", e)))?;

    let choice = response
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| GatewayError::Malformed("response has no choices".to_string()))?;

    if let Some(refusal) = choice.message.refusal.filter(|r| !r.trim().is_empty()) {
        return Err(GatewayError::Refused(refusal));
    }
    if choice.finish_reason.as_deref() == Some("length") {
        return Err(GatewayError::Malformed(
            "response was truncated at max_tokens".to_string(),
        ));
    }

    match choice.message.content {
        Some(content) if !content.trim().is_empty() => Ok(content),
        _ => Err(GatewayError::Malformed("response has no content".to_string())),
    }
}

fn map_http_error(status: u16, body: &str) -> GatewayError {
    let message = serde_json::from_str::<ErrorResponse>(body)
        .map(|e| e.error.message)
        .unwrap_or_else(|_| body.to_string());
    match status {
        401 | 403 => GatewayError::ConnectionError(format!("authentication failed: {}", message)),
        408 | 504 => GatewayError::Timeout,
        _ => GatewayError::RequestFailed(format!("HTTP {}: {}", status, message)),
    }
}

fn map_reqwest_error(e: reqwest::Error) -> GatewayError {
    if e.is_timeout() {
        GatewayError::Timeout
    } else if e.is_connect() {
        GatewayError::ConnectionError(e.to_string())
    } else {
        GatewayError::RequestFailed(e.to_string())
    }
}

#[async_trait]
impl LlmGateway for OpenAiGateway {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, GatewayError> {
        let body = self.build_request_body(request);
        debug!(
            "POST {} ({}, {} prompt bytes)",
            self.endpoint,
            request.contract,
            request.user_prompt.len()
        );

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status().as_u16();
        let text = response.text().await.map_err(map_reqwest_error)?;

        if status != 200 {
            return Err(map_http_error(status, &text));
        }

        parse_completion(&text)
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lattia_domain::TurnContract;

    fn gateway() -> OpenAiGateway {
        let config = FileLlmConfig {
            base_url: "http://localhost:9999/v1/".to_string(),
            ..FileLlmConfig::default()
        };
        OpenAiGateway::new(&config, "test-key").unwrap()
    }

    #[test]
    fn test_endpoint_joins_base_url() {
        assert_eq!(gateway().endpoint, "http://localhost:9999/v1/chat/completions");
    }

    #[test]
    fn test_request_body_carries_contract_schema() {
        let request = CompletionRequest::new("system", "user", TurnContract::PostInterview);
        let body = gateway().build_request_body(&request);

        assert_eq!(body["model"], "gpt-4.1-2025-04-14");
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["content"], "user");
        assert_eq!(body["response_format"]["type"], "json_schema");
        assert_eq!(
            body["response_format"]["json_schema"]["name"],
            "post_interview_turn"
        );
        assert!(body["response_format"]["json_schema"]["schema"].is_object());
    }

    #[test]
    fn test_parse_completion_content() {
        let body = r#"{"choices":[{"message":{"content":"{\"followup\":\"Hi\"}"},"finish_reason":"stop"}]}"#;
        assert_eq!(parse_completion(body).unwrap(), r#"{"followup":"Hi"}"#);
    }

    #[test]
    fn test_parse_completion_refusal() {
        let body = r#"{"choices":[{"message":{"content":null,"refusal":"I can't help with that."}}]}"#;
        assert!(matches!(parse_completion(body), Err(GatewayError::Refused(_))));
    }

    #[test]
    fn test_parse_completion_unusable() {
        assert!(matches!(
            parse_completion(r#"{"choices":[]}"#),
            Err(GatewayError::Malformed(_))
        ));
        assert!(matches!(
            parse_completion(r#"{"choices":[{"message":{"content":"{"},"finish_reason":"length"}]}"#),
            Err(GatewayError::Malformed(_))
        ));
        assert!(matches!(
            parse_completion("<html>"),
            Err(GatewayError::Malformed(_))
        ));
    }

    #[test]
    fn test_map_http_error() {
        let body = r#"{"error":{"message":"Invalid API key"}}"#;
        assert!(matches!(
            map_http_error(401, body),
            GatewayError::ConnectionError(m) if m.contains("Invalid API key")
        ));
        assert!(matches!(map_http_error(504, ""), GatewayError::Timeout));
        assert!(matches!(
            map_http_error(500, "oops"),
            GatewayError::RequestFailed(m) if m.contains("500")
        ));
    }
}
