//! Claude API integration.
//!
//! Implements the AIProvider trait for Claude.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{AIError, AIProvider, Generation, GenerationRequest};

const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";

/// Claude API provider.
pub struct ClaudeProvider {
    client: Client,
    api_key: String,
    base_url: String,
}

impl ClaudeProvider {
    /// Create a new Claude provider.
    ///
    /// Reads API key from ANTHROPIC_API_KEY environment variable.
    pub fn new() -> anyhow::Result<Self> {
        let api_key = std::env::var("ANTHROPIC_API_KEY")
            .map_err(|_| anyhow::anyhow!("ANTHROPIC_API_KEY not set"))?;
        Ok(Self::with_api_key(api_key))
    }

    /// Create with an explicit API key.
    pub fn with_api_key(api_key: impl Into<String>) -> Self {
        Self { client: Client::new(), api_key: api_key.into(), base_url: DEFAULT_BASE_URL.to_string() }
    }

    /// Point at a different API host.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[async_trait]
impl AIProvider for ClaudeProvider {
    async fn generate(&self, request: &GenerationRequest) -> anyhow::Result<Generation> {
        let body = ClaudeRequest {
            model: &request.model,
            max_tokens: request.max_tokens,
            system: &request.system,
            messages: vec![Message { role: "user", content: &request.user_message }],
        };

        tracing::debug!(task = %request.task, model = %request.model, "Sending Claude request");

        let response = self
            .client
            .post(format!("{}/v1/messages", self.base_url.trim_end_matches('/')))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", "2023-06-01")
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AIError::ApiError(format!("{status}: {body}")).into());
        }

        let response: ClaudeResponse = response.json().await?;
        parse_response(response, &request.model)
    }

    fn name(&self) -> &str {
        "claude"
    }

    async fn is_available(&self) -> bool {
        !self.api_key.is_empty()
    }
}

/// Pull the first text block out of a response.
fn parse_response(response: ClaudeResponse, requested_model: &str) -> anyhow::Result<Generation> {
    let content = response
        .content
        .into_iter()
        .find(|block| block.kind == "text")
        .and_then(|block| block.text)
        .ok_or(AIError::NoResponse)?;

    Ok(Generation {
        content,
        model: response.model.unwrap_or_else(|| requested_model.to_string()),
        input_tokens: response.usage.as_ref().map_or(0, |u| u.input_tokens),
        output_tokens: response.usage.as_ref().map_or(0, |u| u.output_tokens),
    })
}

/// Claude API request structure.
#[derive(Debug, Serialize)]
struct ClaudeRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    system: &'a str,
    messages: Vec<Message<'a>>,
}

/// Message in a Claude request.
#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

/// Claude API response structure.
#[derive(Debug, Deserialize)]
struct ClaudeResponse {
    content: Vec<ContentBlock>,
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    usage: Option<Usage>,
}

/// Content block in a Claude response.
#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    input_tokens: u64,
    output_tokens: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_claude_provider_creation_fails_without_key() {
        let saved = std::env::var("ANTHROPIC_API_KEY").ok();
        std::env::remove_var("ANTHROPIC_API_KEY");

        assert!(ClaudeProvider::new().is_err());

        if let Some(key) = saved {
            std::env::set_var("ANTHROPIC_API_KEY", key);
        }
    }

    #[test]
    fn test_request_serialization() {
        let body = ClaudeRequest {
            model: "claude-sonnet-4-20250514",
            max_tokens: 8192,
            system: "sys",
            messages: vec![Message { role: "user", content: "hola" }],
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["max_tokens"], 8192);
        assert_eq!(json["messages"][0]["role"], "user");
        assert_eq!(json["messages"][0]["content"], "hola");
    }

    #[test]
    fn test_parse_response_takes_first_text_block() {
        let response: ClaudeResponse = serde_json::from_str(
            r#"{
                "model": "claude-opus-4-20250514",
                "content": [
                    {"type": "thinking", "thinking": "..."},
                    {"type": "text", "text": "Dossier listo"}
                ],
                "usage": {"input_tokens": 120, "output_tokens": 40}
            }"#,
        )
        .unwrap();

        let generation = parse_response(response, "fallback").unwrap();
        assert_eq!(generation.content, "Dossier listo");
        assert_eq!(generation.model, "claude-opus-4-20250514");
        assert_eq!(generation.input_tokens, 120);
        assert_eq!(generation.output_tokens, 40);
    }

    #[test]
    fn test_parse_response_without_text_is_no_response() {
        let response: ClaudeResponse = serde_json::from_str(r#"{"content": []}"#).unwrap();
        let err = parse_response(response, "m").unwrap_err();
        assert!(matches!(err.downcast_ref::<AIError>(), Some(AIError::NoResponse)));
    }
}
