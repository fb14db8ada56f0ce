//! In-memory registry of live sessions
//!
//! Sessions are never written to disk. Each one sits behind its own mutex,
//! so an action (including its network call) completes before the next
//! action on the same session is handled, while other sessions proceed
//! independently. Sessions nobody has touched for longer than the idle
//! TTL are dropped by [`SessionStore::evict_idle`].

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use secrecy::SecretString;
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use uuid::Uuid;

use super::session::Session;

pub type SessionHandle = Arc<Mutex<Session>>;

struct Entry {
    handle: SessionHandle,
    last_active: Instant,
}

#[derive(Default)]
pub struct SessionStore {
    sessions: RwLock<HashMap<Uuid, Entry>>,
    /// Credential every new session starts with, if one was provisioned
    default_credential: Option<SecretString>,
}

impl SessionStore {
    pub fn new(default_credential: Option<SecretString>) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            default_credential,
        }
    }

    /// Open a new session and return its handle
    pub async fn create(&self) -> SessionHandle {
        let session = Session::new(self.default_credential.clone());
        let id = session.id();
        let handle = Arc::new(Mutex::new(session));

        let mut sessions = self.sessions.write().await;
        sessions.insert(
            id,
            Entry {
                handle: handle.clone(),
                last_active: Instant::now(),
            },
        );
        tracing::info!(session_id = %id, live = sessions.len(), "Session created");

        handle
    }

    /// Look up a session and mark it active
    pub async fn get(&self, id: Uuid) -> Option<SessionHandle> {
        let mut sessions = self.sessions.write().await;
        let entry = sessions.get_mut(&id)?;
        entry.last_active = Instant::now();
        Some(entry.handle.clone())
    }

    /// End a session, returning whether it existed
    pub async fn remove(&self, id: Uuid) -> bool {
        let removed = self.sessions.write().await.remove(&id).is_some();
        if removed {
            tracing::info!(session_id = %id, "Session ended");
        }
        removed
    }

    /// Drop sessions idle for at least `ttl`, returning how many went.
    ///
    /// A session whose handle is still held by a request is kept.
    pub async fn evict_idle(&self, ttl: Duration) -> usize {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|id, entry| {
            let keep =
                entry.last_active.elapsed() < ttl || Arc::strong_count(&entry.handle) > 1;
            if !keep {
                tracing::info!(session_id = %id, "Session expired");
            }
            keep
        });
        let evicted = before - sessions.len();
        if evicted > 0 {
            tracing::debug!(evicted, live = sessions.len(), "Idle sessions evicted");
        }
        evicted
    }

    /// Run [`evict_idle`](Self::evict_idle) every `period` until the runtime stops
    pub fn spawn_eviction(self: Arc<Self>, ttl: Duration, period: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                self.evict_idle(ttl).await;
            }
        })
    }
}
