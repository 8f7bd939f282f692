// src/services/llm.rs

//! Language model completion capability.
//!
//! The extractor only depends on [`LlmProvider`]; the HTTP-backed
//! [`OpenAiCompatibleProvider`] is one implementation of it.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::models::LlmConfig;

/// Sampling options for a single completion.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompletionOptions {
    /// Ask the model for a JSON object only
    pub json_mode: bool,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl From<&LlmConfig> for CompletionOptions {
    fn from(config: &LlmConfig) -> Self {
        Self {
            json_mode: true,
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        }
    }
}

/// A pluggable text completion backend.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    async fn complete(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        options: &CompletionOptions,
    ) -> Result<String>;
}

/// Chat-completions client for OpenAI-compatible endpoints.
pub struct OpenAiCompatibleProvider {
    client: reqwest::Client,
    endpoint: String,
    model: String,
    api_key: String,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    temperature: f32,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Deserialize)]
struct ChatReply {
    #[serde(default)]
    content: Option<String>,
}

impl OpenAiCompatibleProvider {
    pub fn new(
        endpoint: impl Into<String>,
        model: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
            model: model.into(),
            api_key: api_key.into(),
        })
    }

    /// Build a provider from config, reading the API key from the environment.
    ///
    /// Returns `Ok(None)` when the provider is disabled or no key is set, so
    /// the caller can run without the language model pass.
    pub fn from_config(config: &LlmConfig) -> Result<Option<Self>> {
        if !config.enabled {
            log::info!("LLM extraction disabled by configuration");
            return Ok(None);
        }
        let api_key = match std::env::var(&config.api_key_env) {
            Ok(key) if !key.trim().is_empty() => key,
            _ => {
                log::warn!(
                    "{} is not set; LLM extraction unavailable",
                    config.api_key_env
                );
                return Ok(None);
            }
        };
        Self::new(
            &config.endpoint,
            &config.model,
            api_key,
            Duration::from_secs(config.timeout_secs),
        )
        .map(Some)
    }
}

#[async_trait]
impl LlmProvider for OpenAiCompatibleProvider {
    async fn complete(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        options: &CompletionOptions,
    ) -> Result<String> {
        let request = ChatRequest {
            model: &self.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: system_prompt,
                },
                ChatMessage {
                    role: "user",
                    content: user_prompt,
                },
            ],
            temperature: options.temperature,
            max_tokens: options.max_tokens,
            response_format: options.json_mode.then_some(ResponseFormat {
                kind: "json_object",
            }),
        };

        let response: ChatResponse = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or_else(|| AppError::llm("completion returned no content"))
    }
}

/// Slice the outermost JSON object out of a model reply.
pub fn extract_json_object(raw: &str) -> Option<&str> {
    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    (end >= start).then(|| &raw[start..=end])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_json_object_from_fenced_reply() {
        let raw = "```json\n{\"faculties\": []}\n```";
        assert_eq!(extract_json_object(raw), Some("{\"faculties\": []}"));
        assert_eq!(extract_json_object("no json here"), None);
        assert_eq!(extract_json_object("} {"), None);
    }

    #[test]
    fn test_options_from_config() {
        let options = CompletionOptions::from(&LlmConfig::default());
        assert!(options.json_mode);
        assert_eq!(options.max_tokens, 4096);
    }

    #[test]
    fn test_request_serialization() {
        let request = ChatRequest {
            model: "m",
            messages: [
                ChatMessage {
                    role: "system",
                    content: "s",
                },
                ChatMessage {
                    role: "user",
                    content: "u",
                },
            ],
            temperature: 0.1,
            max_tokens: 10,
            response_format: Some(ResponseFormat {
                kind: "json_object",
            }),
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["response_format"]["type"], "json_object");
        assert_eq!(json["messages"][1]["role"], "user");
    }

    #[test]
    fn test_from_config_disabled() {
        let config = LlmConfig {
            enabled: false,
            ..LlmConfig::default()
        };
        assert!(OpenAiCompatibleProvider::from_config(&config).unwrap().is_none());
    }

    #[test]
    fn test_from_config_missing_key() {
        let config = LlmConfig {
            api_key_env: "UNISCAN_TEST_KEY_THAT_IS_NEVER_SET".into(),
            ..LlmConfig::default()
        };
        assert!(OpenAiCompatibleProvider::from_config(&config).unwrap().is_none());
    }
}
