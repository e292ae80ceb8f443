//! Text-generation client trait and message types.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::LlmError;

/// Role in a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// A message in a conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    /// Create a system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    /// Create a user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    /// Create an assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Request for plain text generation.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub messages: Vec<ChatMessage>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
}

impl GenerationRequest {
    /// Create a new generation request.
    pub fn new(messages: Vec<ChatMessage>) -> Self {
        Self {
            messages,
            temperature: None,
            max_tokens: None,
        }
    }

    /// Set temperature.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Set max tokens.
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }
}

/// Response from a generation call.
#[derive(Debug, Clone)]
pub struct GenerationResponse {
    pub content: String,
    /// Model that actually served the request.
    pub model: String,
    pub usage: Option<TokenUsage>,
}

/// Token accounting, when the endpoint reports it.
#[derive(Debug, Clone, Copy)]
pub struct TokenUsage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

/// Trait for tiered text-generation clients.
///
/// Every consumer must tolerate absence of a client and failure of any call;
/// nothing behind this trait is allowed to take down a response cycle.
#[async_trait]
pub trait TextGenerator: Send + Sync + std::fmt::Debug {
    /// Short provider identifier for logs and errors.
    fn provider_name(&self) -> &str;

    /// Get the configured model name.
    fn model_name(&self) -> &str;

    /// Prepare the client for use. Idempotent; a second call is a no-op.
    async fn initialize(&self) -> Result<(), LlmError>;

    /// Complete a conversation into free text.
    async fn generate_text(
        &self,
        request: GenerationRequest,
    ) -> Result<GenerationResponse, LlmError>;

    /// Complete a conversation into a JSON object. Implementations request
    /// JSON output from the model and may scrape the first object out of
    /// free-form text as a best-effort secondary parse.
    async fn generate_json(
        &self,
        messages: Vec<ChatMessage>,
        temperature: Option<f32>,
    ) -> Result<serde_json::Value, LlmError>;

    /// Complete a conversation into a JSON object validated against `schema`.
    async fn generate_structured(
        &self,
        messages: Vec<ChatMessage>,
        schema: &serde_json::Value,
    ) -> Result<serde_json::Value, LlmError> {
        let validator =
            jsonschema::validator_for(schema).map_err(|e| LlmError::InvalidResponse {
                provider: self.provider_name().to_string(),
                reason: format!("invalid schema: {e}"),
            })?;

        let value = self.generate_json(messages, None).await?;

        if !validator.is_valid(&value) {
            let reason = validator
                .iter_errors(&value)
                .map(|e| e.to_string())
                .collect::<Vec<_>>()
                .join("; ");
            return Err(LlmError::InvalidResponse {
                provider: self.provider_name().to_string(),
                reason: format!("schema validation failed: {reason}"),
            });
        }

        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    /// Generator that returns a fixed JSON payload.
    #[derive(Debug)]
    struct FixedJson(serde_json::Value);

    #[async_trait]
    impl TextGenerator for FixedJson {
        fn provider_name(&self) -> &str {
            "fixed"
        }

        fn model_name(&self) -> &str {
            "fixed-model"
        }

        async fn initialize(&self) -> Result<(), LlmError> {
            Ok(())
        }

        async fn generate_text(
            &self,
            _request: GenerationRequest,
        ) -> Result<GenerationResponse, LlmError> {
            Ok(GenerationResponse {
                content: self.0.to_string(),
                model: "fixed-model".to_string(),
                usage: None,
            })
        }

        async fn generate_json(
            &self,
            _messages: Vec<ChatMessage>,
            _temperature: Option<f32>,
        ) -> Result<serde_json::Value, LlmError> {
            Ok(self.0.clone())
        }
    }

    fn intent_schema() -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "intent": { "type": "string" },
                "confidence": { "type": "number" }
            },
            "required": ["intent"]
        })
    }

    #[tokio::test]
    async fn structured_accepts_conforming_payload() {
        let generator = FixedJson(json!({"intent": "chat", "confidence": 0.9}));
        let value = generator
            .generate_structured(vec![ChatMessage::user("hi")], &intent_schema())
            .await
            .unwrap();
        assert_eq!(value["intent"], "chat");
    }

    #[tokio::test]
    async fn structured_rejects_nonconforming_payload() {
        let generator = FixedJson(json!({"confidence": "high"}));
        let err = generator
            .generate_structured(vec![ChatMessage::user("hi")], &intent_schema())
            .await
            .unwrap_err();
        assert!(matches!(err, LlmError::InvalidResponse { .. }));
    }

    #[test]
    fn message_constructors_set_roles() {
        assert_eq!(ChatMessage::system("s").role, Role::System);
        assert_eq!(ChatMessage::user("u").role, Role::User);
        assert_eq!(ChatMessage::assistant("a").role, Role::Assistant);
    }
}
