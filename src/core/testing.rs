//! Test doubles for the chat completion backend

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use secrecy::SecretString;

use crate::providers::{ChatCompletion, CompletionRequest, ProviderError};

enum Behaviour {
    Reply(String),
    Fail(String),
}

/// Records every request and answers with a canned reply or failure
pub struct FakeBackend {
    behaviour: Behaviour,
    calls: AtomicUsize,
    last_request: Mutex<Option<CompletionRequest>>,
}

impl FakeBackend {
    pub fn replying(text: &str) -> Arc<Self> {
        Self::with(Behaviour::Reply(text.to_string()))
    }

    /// Fails every call as if the transport had dropped
    pub fn failing(detail: &str) -> Arc<Self> {
        Self::with(Behaviour::Fail(detail.to_string()))
    }

    fn with(behaviour: Behaviour) -> Arc<Self> {
        Arc::new(Self {
            behaviour,
            calls: AtomicUsize::new(0),
            last_request: Mutex::new(None),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_request(&self) -> Option<CompletionRequest> {
        self.last_request.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatCompletion for FakeBackend {
    async fn complete(
        &self,
        request: &CompletionRequest,
        _api_key: &SecretString,
    ) -> Result<String, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_request.lock().unwrap() = Some(request.clone());

        match &self.behaviour {
            Behaviour::Reply(text) => Ok(text.clone()),
            Behaviour::Fail(detail) => Err(ProviderError::InvalidResponse(detail.clone())),
        }
    }
}
