//! Math Tutor - session-scoped tutoring API
//!
//! Students pick a mathematics topic, optionally attach a photo of a
//! problem, and chat with an AI tutor backed by an OpenAI-compatible chat
//! completion service. Sessions live in memory only.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod config;
mod conversation;
mod core;
mod curriculum;
mod media;
mod providers;
mod routes;

use config::Config;
use crate::core::{SessionStore, TutorClient};
use media::PhotoEncoder;
use providers::{OpenAICompatConfig, OpenAICompatProvider};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub sessions: Arc<SessionStore>,
    pub tutor: TutorClient,
    pub encoder: PhotoEncoder,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "math_tutor=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;
    let tutor_config = config.tutor_config()?;
    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;

    let provider = OpenAICompatProvider::new(OpenAICompatConfig::from(&tutor_config.llm))?;
    let tutor = TutorClient::new(Arc::new(provider), &tutor_config.llm);

    if config.openai_api_key.is_some() {
        tracing::info!("🔑 Pre-provisioned API key will seed new sessions");
    } else {
        tracing::warn!("No OPENAI_API_KEY set; students must enter their own key");
    }

    let sessions = Arc::new(SessionStore::new(config.openai_api_key.clone()));
    let ttl = config.session_ttl();
    sessions
        .clone()
        .spawn_eviction(ttl, ttl.min(Duration::from_secs(60)));
    tracing::info!(ttl_secs = ttl.as_secs(), "Idle sessions will be evicted");

    let state = AppState {
        sessions,
        tutor,
        encoder: PhotoEncoder::new(
            tutor_config.image.max_dimension,
            tutor_config.image.jpeg_quality,
        ),
    };

    let app = Router::new()
        .merge(routes::router(tutor_config.image.max_upload_bytes))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    tracing::info!(
        model = %tutor_config.llm.model,
        "📐 Math tutor running at http://{}",
        addr
    );

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
