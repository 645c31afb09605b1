mod client;
pub(crate) mod schema;
pub(crate) mod types;

pub use schema::StructuredOutput;

use std::time::Duration;

use tracing::debug;

use crate::error::{AiError, Result};
use client::OpenAiClient;
use types::{accepts_temperature, ChatRequest, JsonSchemaFormat, ResponseFormat, WireMessage};

pub const OPENAI_API_URL: &str = "https://api.openai.com/v1";
pub const DEEPSEEK_API_URL: &str = "https://api.deepseek.com";

/// Per-call sampling options for free-text completions.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ChatOptions {
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
}

impl ChatOptions {
    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }
}

// =============================================================================
// OpenAi Agent
// =============================================================================

/// Handle to one model on an OpenAI-compatible endpoint.
///
/// Cheap to clone; clones share the underlying connection pool. Construct it
/// once at startup and hand it to whatever needs a model.
#[derive(Clone)]
pub struct OpenAi {
    client: OpenAiClient,
    model: String,
}

impl OpenAi {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: OpenAiClient::new(&api_key.into(), OPENAI_API_URL),
            model: model.into(),
        }
    }

    /// OpenAI-compatible DeepSeek endpoint.
    pub fn deepseek(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: OpenAiClient::new(&api_key.into(), DEEPSEEK_API_URL),
            model: model.into(),
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.client = self.client.with_base_url(&url.into());
        self
    }

    /// Bound every request made through this handle.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.client = self.client.with_timeout(timeout);
        self
    }

    /// Same endpoint and credentials, different model.
    pub fn with_model(&self, model: impl Into<String>) -> Self {
        Self {
            client: self.client.clone(),
            model: model.into(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn base_url(&self) -> &str {
        self.client.base_url()
    }

    // =========================================================================
    // Completions
    // =========================================================================

    /// Free-text chat completion.
    pub async fn chat(
        &self,
        system: impl Into<String>,
        user: impl Into<String>,
        options: ChatOptions,
    ) -> Result<String> {
        let temperature = options.temperature.filter(|_| accepts_temperature(&self.model));
        let request = ChatRequest::new(&self.model)
            .message(WireMessage::system(system))
            .message(WireMessage::user(user))
            .temperature(temperature)
            .token_limit(options.max_tokens);

        self.client.complete(&request).await
    }

    /// Strict JSON-schema structured output, deserialized into `T`.
    pub async fn extract<T: StructuredOutput>(
        &self,
        system: impl Into<String>,
        user: impl Into<String>,
    ) -> Result<T> {
        let temperature = Some(0.0).filter(|_| accepts_temperature(&self.model));
        let request = ChatRequest::new(&self.model)
            .message(WireMessage::system(system))
            .message(WireMessage::user(user))
            .temperature(temperature)
            .response_format(ResponseFormat::JsonSchema {
                json_schema: JsonSchemaFormat {
                    name: T::schema_label(),
                    strict: true,
                    schema: T::openai_schema(),
                },
            });

        debug!(type_name = %T::schema_label(), "Structured output extraction");

        let json_str = self.client.complete(&request).await?;
        serde_json::from_str(&json_str)
            .map_err(|e| AiError::Parse(format!("Failed to deserialize response: {e}")))
    }
}
