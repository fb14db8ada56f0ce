//! Per-student session state
//!
//! A [`Session`] owns everything one student has set up: the conversation,
//! the chosen topic, preferences, a pending photo and the API credential.
//! Each method is one user action. None of them edits or removes an
//! individual past turn.

use chrono::{DateTime, Utc};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::prompts;
use crate::conversation::{Conversation, Turn};
use crate::curriculum::{Difficulty, Topic};
use crate::media::EncodedImage;

use super::composer::{self, PromptSettings};
use super::tutor::{ReplyOutcome, TutorClient, TutorReply};

/// Student preferences that shape the tutor's answers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preferences {
    pub difficulty: Difficulty,
    pub show_steps: bool,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            difficulty: Difficulty::Medium,
            show_steps: true,
        }
    }
}

/// Partial preference change; absent fields are left alone
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct PreferenceUpdate {
    #[serde(default)]
    pub difficulty: Option<Difficulty>,
    #[serde(default)]
    pub show_steps: Option<bool>,
}

/// Reasons a question is refused before anything is recorded
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    #[error("{}", prompts::CHOOSE_TOPIC_FIRST)]
    NoTopic,

    #[error("{}", prompts::EMPTY_QUESTION)]
    EmptyQuestion,
}

/// Result of a submitted question
#[derive(Debug, Clone, Serialize)]
pub struct Exchange {
    pub reply: String,
    pub outcome: ReplyOutcome,
    pub image_attached: bool,
    pub turn_count: usize,
}

#[derive(Debug)]
pub struct Session {
    id: Uuid,
    created_at: DateTime<Utc>,
    conversation: Conversation,
    topic: Option<Topic>,
    preferences: Preferences,
    pending_image: Option<EncodedImage>,
    credential: Option<SecretString>,
}

impl Session {
    /// Start a session, optionally seeded with a pre-provisioned credential
    pub fn new(credential: Option<SecretString>) -> Self {
        Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            conversation: Conversation::new(),
            topic: None,
            preferences: Preferences::default(),
            pending_image: None,
            credential,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    pub fn topic(&self) -> Option<Topic> {
        self.topic
    }

    pub fn preferences(&self) -> Preferences {
        self.preferences
    }

    pub fn pending_image(&self) -> Option<&EncodedImage> {
        self.pending_image.as_ref()
    }

    pub fn has_credential(&self) -> bool {
        self.credential.is_some()
    }

    pub fn select_topic(&mut self, topic: Topic) {
        tracing::debug!(session_id = %self.id, %topic, "Topic selected");
        self.topic = Some(topic);
    }

    pub fn update_preferences(&mut self, update: PreferenceUpdate) {
        if let Some(difficulty) = update.difficulty {
            self.preferences.difficulty = difficulty;
        }
        if let Some(show_steps) = update.show_steps {
            self.preferences.show_steps = show_steps;
        }
    }

    pub fn set_credential(&mut self, api_key: SecretString) {
        self.credential = Some(api_key);
    }

    pub fn clear_credential(&mut self) {
        self.credential = None;
    }

    /// Hold a photo for the next question
    pub fn attach_image(&mut self, image: EncodedImage) {
        self.pending_image = Some(image);
    }

    /// Drop the pending photo, returning whether there was one
    pub fn discard_image(&mut self) -> bool {
        self.pending_image.take().is_some()
    }

    /// Empty the conversation; topic, preferences and credential are kept
    pub fn clear_history(&mut self) {
        self.conversation.clear();
    }

    /// Send `question` to the tutor and record the exchange.
    ///
    /// The question is recorded exactly as typed; only a blank one is refused.
    /// Refusals leave the session untouched. Otherwise the pending photo is
    /// consumed, attached to this question only, and exactly one user turn
    /// plus one assistant turn are appended, whatever the backend did.
    pub async fn submit_question(
        &mut self,
        tutor: &TutorClient,
        question: &str,
    ) -> Result<Exchange, SessionError> {
        let topic = self.topic.ok_or(SessionError::NoTopic)?;
        if question.trim().is_empty() {
            return Err(SessionError::EmptyQuestion);
        }

        let settings = PromptSettings {
            topic,
            difficulty: self.preferences.difficulty,
            show_steps: self.preferences.show_steps,
        };

        let image = self.pending_image.take();
        let mut history = Vec::with_capacity(self.conversation.len() + 1);
        history.extend_from_slice(self.conversation.turns());
        history.push(Turn::user(question));
        let messages = composer::compose(&settings, &history, image.as_ref());

        let result = tutor.ask(messages, self.credential.as_ref()).await;
        let reply = TutorReply::from_result(result);

        self.conversation.record_exchange(question, &reply.text);

        tracing::info!(
            session_id = %self.id,
            %topic,
            outcome = ?reply.outcome,
            image_attached = image.is_some(),
            turns = self.conversation.len(),
            "Question answered"
        );

        Ok(Exchange {
            reply: reply.text,
            outcome: reply.outcome,
            image_attached: image.is_some(),
            turn_count: self.conversation.len(),
        })
    }
}
