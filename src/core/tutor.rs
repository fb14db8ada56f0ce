//! Tutor client and reply policy
//!
//! [`TutorClient::ask`] returns a typed result. [`TutorReply::from_result`]
//! is the one place that decides what the student sees: failures become an
//! assistant reply carrying [`prompts::FAILURE_MARKER`] and are recorded in
//! the conversation like any other answer, with the outcome kind kept next
//! to the text so a client can render them differently.

use std::sync::Arc;

use secrecy::SecretString;
use serde::Serialize;

use crate::config::{prompts, LlmConfig};
use crate::conversation::Message;
use crate::providers::{ChatCompletion, CompletionRequest, ProviderError};

#[derive(Debug, thiserror::Error)]
pub enum TutorError {
    #[error("No API credential configured")]
    MissingCredential,

    #[error(transparent)]
    Service(#[from] ProviderError),
}

/// Sends composed conversations to the chat completion backend
#[derive(Clone)]
pub struct TutorClient {
    backend: Arc<dyn ChatCompletion>,
    model: String,
    temperature: f32,
    max_tokens: u32,
}

impl TutorClient {
    pub fn new(backend: Arc<dyn ChatCompletion>, llm: &LlmConfig) -> Self {
        Self {
            backend,
            model: llm.model.clone(),
            temperature: llm.temperature,
            max_tokens: llm.max_tokens,
        }
    }

    /// Ask the backend for the next assistant reply.
    ///
    /// Without a credential this returns immediately and the backend is
    /// never contacted.
    pub async fn ask(
        &self,
        messages: Vec<Message>,
        credential: Option<&SecretString>,
    ) -> Result<String, TutorError> {
        let api_key = credential.ok_or(TutorError::MissingCredential)?;

        let request = CompletionRequest {
            model: self.model.clone(),
            messages,
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };

        tracing::debug!(
            model = %request.model,
            messages = request.messages.len(),
            "Sending chat completion"
        );

        Ok(self.backend.complete(&request, api_key).await?)
    }
}

/// How a submitted question was resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplyOutcome {
    Answered,
    CredentialMissing,
    ServiceFailed,
}

/// The assistant text to record for one question
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TutorReply {
    pub text: String,
    pub outcome: ReplyOutcome,
}

impl TutorReply {
    pub fn from_result(result: Result<String, TutorError>) -> Self {
        match result {
            Ok(text) => Self {
                text,
                outcome: ReplyOutcome::Answered,
            },
            Err(TutorError::MissingCredential) => Self {
                text: prompts::MISSING_CREDENTIAL_WARNING.to_string(),
                outcome: ReplyOutcome::CredentialMissing,
            },
            Err(TutorError::Service(err)) => {
                tracing::warn!(error = %err, "Chat completion failed");
                Self {
                    text: format!(
                        "{} {}\n\n{}",
                        prompts::FAILURE_MARKER,
                        err,
                        prompts::FAILURE_ADVICE
                    ),
                    outcome: ReplyOutcome::ServiceFailed,
                }
            }
        }
    }
}
