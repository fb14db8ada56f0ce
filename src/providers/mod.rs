//! Chat completion provider integrations

pub mod openai_compat;

use async_trait::async_trait;
use secrecy::SecretString;
use thiserror::Error;

use crate::conversation::Message;

pub use openai_compat::{OpenAICompatConfig, OpenAICompatProvider};

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("Request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    #[error("API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// Everything the service needs besides the credential
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub model: String,
    pub messages: Vec<Message>,
    pub temperature: f32,
    pub max_tokens: u32,
}

/// A backend able to answer a chat completion request
#[async_trait]
pub trait ChatCompletion: Send + Sync {
    /// Send `request` and return the assistant's reply text
    async fn complete(
        &self,
        request: &CompletionRequest,
        api_key: &SecretString,
    ) -> Result<String, ProviderError>;
}
