//! OpenAI-compatible provider
//!
//! Works with any API that implements the OpenAI chat completions format and
//! accepts inline `image_url` content parts (OpenAI, vLLM, LM Studio, ...).
//!
//! # Configuration
//!
//! ```toml
//! [llm]
//! base_url = "https://api.openai.com/v1"
//! model = "gpt-4o"
//! ```

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use crate::config::LlmConfig;
use crate::conversation::{Content, Message, Role};

use super::{ChatCompletion, CompletionRequest, ProviderError};

/// OpenAI-compatible chat message
#[derive(Debug, Clone, Serialize)]
struct ChatMessage {
    role: Role,
    content: ChatContent,
}

/// Plain string content, or a list of typed parts for vision requests
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
enum ChatContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentPart {
    ImageUrl { image_url: ImageUrl },
    Text { text: String },
}

#[derive(Debug, Clone, Serialize)]
struct ImageUrl {
    url: String,
}

impl From<&Message> for ChatMessage {
    fn from(msg: &Message) -> Self {
        let content = match &msg.content {
            Content::Text(text) => ChatContent::Text(text.clone()),
            Content::TextWithImage {
                image_data_uri,
                text,
            } => ChatContent::Parts(vec![
                ContentPart::ImageUrl {
                    image_url: ImageUrl {
                        url: image_data_uri.clone(),
                    },
                },
                ContentPart::Text { text: text.clone() },
            ]),
        };

        Self {
            role: msg.role,
            content,
        }
    }
}

/// Chat completion request
#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    temperature: f32,
    max_tokens: u32,
}

/// Chat completion response
#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Error response from API
#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ApiError,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    message: String,
    #[serde(rename = "type", default)]
    error_type: Option<String>,
}

/// OpenAI-compatible provider configuration
#[derive(Debug, Clone)]
pub struct OpenAICompatConfig {
    /// Base URL for the API (e.g., https://api.openai.com/v1)
    pub base_url: String,
    /// Optional organization ID (OpenAI)
    pub organization: Option<String>,
    /// Request timeout; `None` keeps the transport default
    pub timeout_secs: Option<u64>,
}

impl Default for OpenAICompatConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            organization: None,
            timeout_secs: None,
        }
    }
}

impl From<&LlmConfig> for OpenAICompatConfig {
    fn from(llm: &LlmConfig) -> Self {
        Self {
            base_url: llm.base_url.trim_end_matches('/').to_string(),
            organization: llm.organization.clone(),
            timeout_secs: llm.timeout_secs,
        }
    }
}

/// OpenAI-compatible API provider
pub struct OpenAICompatProvider {
    config: OpenAICompatConfig,
    client: Client,
}

impl OpenAICompatProvider {
    /// Create a new provider with the given configuration
    pub fn new(config: OpenAICompatConfig) -> Result<Self, ProviderError> {
        let mut builder = Client::builder();
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder.build()?;

        Ok(Self { config, client })
    }
}

#[async_trait]
impl ChatCompletion for OpenAICompatProvider {
    async fn complete(
        &self,
        request: &CompletionRequest,
        api_key: &SecretString,
    ) -> Result<String, ProviderError> {
        let url = format!("{}/chat/completions", self.config.base_url);

        let body = ChatCompletionRequest {
            model: &request.model,
            messages: request.messages.iter().map(ChatMessage::from).collect(),
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        };

        let mut req_builder = self
            .client
            .post(&url)
            .bearer_auth(api_key.expose_secret());

        // Add organization header if provided (OpenAI specific)
        if let Some(ref org) = self.config.organization {
            req_builder = req_builder.header("OpenAI-Organization", org);
        }

        let response = req_builder.json(&body).send().await?;

        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            // Try to parse error response
            if let Ok(error_resp) = serde_json::from_str::<ErrorResponse>(&text) {
                tracing::warn!(
                    status = status.as_u16(),
                    error_type = ?error_resp.error.error_type,
                    "Chat completion rejected"
                );
                return Err(ProviderError::Api {
                    status: status.as_u16(),
                    message: error_resp.error.message,
                });
            }
            return Err(ProviderError::Api {
                status: status.as_u16(),
                message: text,
            });
        }

        let completion: ChatCompletionResponse = serde_json::from_str(&text).map_err(|e| {
            ProviderError::InvalidResponse(format!("Failed to parse response: {} - Body: {}", e, text))
        })?;

        completion
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| ProviderError::InvalidResponse("No choices in response".to_string()))?
            .message
            .content
            .ok_or_else(|| ProviderError::InvalidResponse("Reply has no text content".to_string()))
    }
}
