//! OpenAI-compatible text-generation client.
//!
//! Connects to any endpoint that implements the OpenAI Chat Completions API,
//! such as local models, cloud endpoints, or custom backends. One instance is
//! constructed per configured tier.

use async_trait::async_trait;
use reqwest::Client;
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use tokio::sync::OnceCell;

use crate::config::TierConfig;
use crate::error::LlmError;
use crate::llm::extract::extract_json_object;
use crate::llm::provider::{
    ChatMessage, GenerationRequest, GenerationResponse, Role, TextGenerator, TokenUsage,
};

/// Provider name constant to avoid magic strings.
const PROVIDER_NAME: &str = "openai_compatible";

/// OpenAI-compatible Chat Completions API client.
#[derive(Debug)]
pub struct OpenAiCompatibleGenerator {
    client: Client,
    config: TierConfig,
    initialized: OnceCell<()>,
}

impl OpenAiCompatibleGenerator {
    /// Create a new OpenAI-compatible generator.
    pub fn new(config: TierConfig) -> Result<Self, LlmError> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(120))
            .build()
            .map_err(|e| LlmError::RequestFailed {
                provider: PROVIDER_NAME.to_string(),
                reason: format!("Failed to build reqwest client: {}", e),
            })?;

        Ok(Self {
            client,
            config,
            initialized: OnceCell::new(),
        })
    }

    /// Construct API URL for a given path.
    /// Uses the base_url as-is and appends `/v1/{path}`.
    /// Strips trailing `/v1` from base_url to avoid double `/v1` issues.
    fn api_url(&self, path: &str) -> String {
        let base = self.config.base_url.trim_end_matches('/');
        let base = base.strip_suffix("/v1").unwrap_or(base);
        format!("{}/v1/{}", base, path.trim_start_matches('/'))
    }

    /// Add Authorization header if an API key is configured.
    fn add_auth_header(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self.config.api_key.as_ref() {
            Some(key) => request.header("Authorization", format!("Bearer {}", key.expose_secret())),
            None => request,
        }
    }

    /// Send a request to the chat completions API.
    async fn send_request(
        &self,
        body: &ChatCompletionRequest,
    ) -> Result<ChatCompletionResponse, LlmError> {
        let url = self.api_url("chat/completions");

        tracing::debug!("Sending request to OpenAI-compatible endpoint: {}", url);

        let request = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .json(body);

        let request = self.add_auth_header(request);

        let response = request.send().await.map_err(|e| {
            tracing::error!("OpenAI-compatible request failed: {}", e);
            LlmError::RequestFailed {
                provider: PROVIDER_NAME.to_string(),
                reason: e.to_string(),
            }
        })?;

        let status = response.status();
        let response_text = response.text().await.map_err(|e| LlmError::RequestFailed {
            provider: PROVIDER_NAME.to_string(),
            reason: format!("Response too large or failed to read: {}", e),
        })?;

        if !status.is_success() {
            if status.as_u16() == 401 {
                return Err(LlmError::AuthFailed {
                    provider: PROVIDER_NAME.to_string(),
                });
            }
            if status.as_u16() == 429 {
                return Err(LlmError::RateLimited {
                    provider: PROVIDER_NAME.to_string(),
                    retry_after: None,
                });
            }
            return Err(LlmError::RequestFailed {
                provider: PROVIDER_NAME.to_string(),
                reason: format!("HTTP {}: {}", status, clip(&response_text, 200)),
            });
        }

        serde_json::from_str(&response_text).map_err(|e| LlmError::InvalidResponse {
            provider: PROVIDER_NAME.to_string(),
            reason: format!("JSON parse error: {}. Raw: {}", e, clip(&response_text, 200)),
        })
    }

    /// Probe the models endpoint. A dead or misconfigured endpoint fails here
    /// instead of in the middle of a response cycle.
    async fn probe(&self) -> Result<(), LlmError> {
        let url = self.api_url("models");
        let request = self.add_auth_header(self.client.get(&url));

        let response = request.send().await.map_err(|e| LlmError::RequestFailed {
            provider: PROVIDER_NAME.to_string(),
            reason: format!("Failed to reach models endpoint: {}", e),
        })?;

        let status = response.status();
        if status.as_u16() == 401 {
            return Err(LlmError::AuthFailed {
                provider: PROVIDER_NAME.to_string(),
            });
        }
        if !status.is_success() {
            return Err(LlmError::RequestFailed {
                provider: PROVIDER_NAME.to_string(),
                reason: format!("models endpoint returned HTTP {}", status),
            });
        }
        Ok(())
    }

    fn first_choice_content(response: ChatCompletionResponse) -> Result<(String, String, Option<TokenUsage>), LlmError> {
        let model = response.model.unwrap_or_default();
        let usage = response.usage.map(|u| TokenUsage {
            input_tokens: u.prompt_tokens,
            output_tokens: u.completion_tokens,
        });

        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| LlmError::InvalidResponse {
                provider: PROVIDER_NAME.to_string(),
                reason: "No choices in response".to_string(),
            })?;

        Ok((choice.message.content.unwrap_or_default(), model, usage))
    }
}

#[async_trait]
impl TextGenerator for OpenAiCompatibleGenerator {
    fn provider_name(&self) -> &str {
        PROVIDER_NAME
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }

    async fn initialize(&self) -> Result<(), LlmError> {
        self.initialized
            .get_or_try_init(|| self.probe())
            .await
            .map(|_| ())
    }

    async fn generate_text(
        &self,
        request: GenerationRequest,
    ) -> Result<GenerationResponse, LlmError> {
        let body = ChatCompletionRequest {
            model: self.config.model.clone(),
            messages: request.messages.iter().map(to_wire_message).collect(),
            temperature: request.temperature,
            max_tokens: request.max_tokens.or(self.config.max_tokens),
            response_format: None,
        };

        let response = self.send_request(&body).await?;
        let (content, model, usage) = Self::first_choice_content(response)?;

        Ok(GenerationResponse {
            content,
            model: if model.is_empty() {
                self.config.model.clone()
            } else {
                model
            },
            usage,
        })
    }

    async fn generate_json(
        &self,
        messages: Vec<ChatMessage>,
        temperature: Option<f32>,
    ) -> Result<serde_json::Value, LlmError> {
        let body = ChatCompletionRequest {
            model: self.config.model.clone(),
            messages: messages.iter().map(to_wire_message).collect(),
            temperature,
            max_tokens: self.config.max_tokens,
            response_format: Some(ResponseFormat {
                format_type: "json_object".to_string(),
            }),
        };

        let response = self.send_request(&body).await?;
        let (content, _, _) = Self::first_choice_content(response)?;

        match serde_json::from_str(&content) {
            Ok(value @ serde_json::Value::Object(_)) => Ok(value),
            // Some endpoints ignore response_format and wrap the object in
            // prose or a fenced block; scrape it out before giving up.
            _ => extract_json_object(&content).ok_or_else(|| LlmError::InvalidResponse {
                provider: PROVIDER_NAME.to_string(),
                reason: format!("expected a JSON object, got: {}", clip(&content, 200)),
            }),
        }
    }
}

/// Truncate to at most `max` characters without splitting a code point.
fn clip(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((index, _)) => &text[..index],
        None => text,
    }
}

fn to_wire_message(message: &ChatMessage) -> ChatCompletionMessage {
    let role = match message.role {
        Role::System => "system",
        Role::User => "user",
        Role::Assistant => "assistant",
    };
    ChatCompletionMessage {
        role: role.to_string(),
        content: message.content.clone(),
    }
}

// OpenAI-compatible Chat Completions API types

#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatCompletionMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    format_type: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatCompletionMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    model: Option<String>,
    choices: Vec<ChatCompletionChoice>,
    #[serde(default)]
    usage: Option<ChatCompletionUsage>,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionChoice {
    message: ChatCompletionResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_generator(base_url: &str) -> OpenAiCompatibleGenerator {
        let config = TierConfig {
            base_url: base_url.to_string(),
            model: "test-model".to_string(),
            api_key: None,
            max_tokens: None,
        };
        OpenAiCompatibleGenerator::new(config).unwrap()
    }

    #[test]
    fn api_url_trailing_slash() {
        let generator = create_generator("https://api.example.com/");
        assert_eq!(
            generator.api_url("chat/completions"),
            "https://api.example.com/v1/chat/completions"
        );
    }

    #[test]
    fn api_url_already_has_v1() {
        let generator = create_generator("https://openrouter.ai/api/v1");
        assert_eq!(
            generator.api_url("chat/completions"),
            "https://openrouter.ai/api/v1/chat/completions"
        );
    }

    #[test]
    fn wire_message_roles() {
        let wire = to_wire_message(&ChatMessage::system("rules"));
        assert_eq!(wire.role, "system");
        let wire = to_wire_message(&ChatMessage::user("hello"));
        assert_eq!(wire.role, "user");
    }

    #[test]
    fn response_parses_without_usage_or_model() {
        let raw = r#"{"choices": [{"message": {"content": "こんにちは"}}]}"#;
        let response: ChatCompletionResponse = serde_json::from_str(raw).unwrap();
        let (content, model, usage) =
            OpenAiCompatibleGenerator::first_choice_content(response).unwrap();
        assert_eq!(content, "こんにちは");
        assert!(model.is_empty());
        assert!(usage.is_none());
    }

    #[test]
    fn empty_choices_is_invalid_response() {
        let raw = r#"{"model": "m", "choices": []}"#;
        let response: ChatCompletionResponse = serde_json::from_str(raw).unwrap();
        let err = OpenAiCompatibleGenerator::first_choice_content(response).unwrap_err();
        assert!(matches!(err, LlmError::InvalidResponse { .. }));
    }
}
