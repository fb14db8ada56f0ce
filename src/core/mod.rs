//! Core tutoring components
//!
//! Session state, prompt composition, the tutor client and the registry of
//! live sessions.

pub mod composer;
mod session;
mod store;
mod tutor;

#[cfg(test)]
pub(crate) mod testing;

pub use session::{Exchange, PreferenceUpdate, Preferences, Session, SessionError};
pub use store::{SessionHandle, SessionStore};
pub use tutor::TutorClient;
