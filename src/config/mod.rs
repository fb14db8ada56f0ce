//! Application configuration

pub mod prompts;
pub mod tutor;

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;
use serde::{Deserialize, Serialize};

pub use tutor::{ConfigError, LlmConfig, TutorConfig};

/// Idle time after which an abandoned session is dropped
const DEFAULT_SESSION_TTL_SECS: u64 = 3600;

/// Process-level settings read from the environment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub host: String,
    pub port: u16,
    /// Pre-provisioned credential seeded into every new session
    #[serde(skip)]
    pub openai_api_key: Option<SecretString>,
    /// Optional TOML file with model and image settings
    pub tutor_config_path: Option<PathBuf>,
    /// Seconds a session may sit idle before it is evicted
    pub session_ttl_secs: u64,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Self {
            host: env::var("HOST").unwrap_or_else(|_| "127.0.0.1".into()),
            port: env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(3000),
            openai_api_key: env::var("OPENAI_API_KEY")
                .ok()
                .filter(|key| !key.trim().is_empty())
                .map(SecretString::new),
            tutor_config_path: env::var("TUTOR_CONFIG").ok().map(PathBuf::from),
            session_ttl_secs: env::var("SESSION_TTL_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|secs| *secs > 0)
                .unwrap_or(DEFAULT_SESSION_TTL_SECS),
        })
    }

    pub fn session_ttl(&self) -> Duration {
        Duration::from_secs(self.session_ttl_secs)
    }

    /// Load the tutor settings, falling back to defaults when no file is set
    pub fn tutor_config(&self) -> Result<TutorConfig, ConfigError> {
        let config = match &self.tutor_config_path {
            Some(path) => TutorConfig::from_file(path)?,
            None => TutorConfig::default(),
        };
        config.validate()?;
        Ok(config)
    }
}
