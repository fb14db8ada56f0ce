//! Prompt composition
//!
//! Turns a session's settings and history into the exact message list sent
//! to the chat completion service: one system message, then every turn in
//! order, with the photo (if any) folded into the last user turn.

use std::fmt::Write as _;

use crate::config::prompts;
use crate::conversation::{Content, Message, Speaker, Turn};
use crate::curriculum::{Difficulty, Topic};
use crate::media::EncodedImage;

/// Session settings that shape the system prompt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PromptSettings {
    pub topic: Topic,
    pub difficulty: Difficulty,
    pub show_steps: bool,
}

/// Build the system instruction for the given settings
pub fn system_prompt(settings: &PromptSettings) -> String {
    let steps_directive = if settings.show_steps {
        prompts::STEPS_DETAILED
    } else {
        prompts::STEPS_CONCISE
    };

    let directives = prompts::DIRECTIVES_BEFORE_STEPS
        .iter()
        .copied()
        .chain(std::iter::once(steps_directive))
        .chain(prompts::DIRECTIVES_AFTER_STEPS.iter().copied());

    let mut prompt = format!(
        "{}\n\nSujet actuel: {}\nNiveau de difficulté: {}\nMontrer les étapes: {}\n\nDirectives importantes:\n",
        prompts::TUTOR_PERSONA,
        settings.topic.label(),
        settings.difficulty.label(),
        if settings.show_steps { "Oui" } else { "Non" },
    );
    for (n, directive) in directives.enumerate() {
        // Writing to a String cannot fail
        let _ = writeln!(prompt, "{}. {}", n + 1, directive);
    }
    prompt.push('\n');
    prompt.push_str(prompts::CLOSING_REMINDER);
    prompt
}

/// Assemble the outbound message list.
///
/// `history` must already end with the question being submitted. When
/// `image` is present only the last user turn becomes multi-part.
pub fn compose(
    settings: &PromptSettings,
    history: &[Turn],
    image: Option<&EncodedImage>,
) -> Vec<Message> {
    let mut messages = Vec::with_capacity(history.len() + 1);
    messages.push(Message::system(system_prompt(settings)));
    messages.extend(history.iter().map(Message::from));

    if let Some(image) = image {
        let last_user = history.iter().rposition(|turn| turn.role == Speaker::User);
        if let Some(index) = last_user {
            // +1 for the system message
            let message = &mut messages[index + 1];
            message.content = Content::TextWithImage {
                image_data_uri: image.data_uri(),
                text: history[index].content.clone(),
            };
        }
    }

    messages
}
