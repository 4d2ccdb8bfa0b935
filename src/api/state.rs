use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use crate::ai::chat::{Session, SessionBuilder};
use crate::ai::gateway::{BoxedGateway, OpenAiGateway};
use crate::core::AppConfig;

pub struct AppState {
    pub config: AppConfig,
    // Holds the provider credential; browsers only ever talk to us
    pub gateway: BoxedGateway,
    // Live sessions keyed by ID. Nothing survives a restart.
    sessions: HashMap<String, Arc<Session>>,
}

impl AppState {
    pub fn new(config: AppConfig) -> Self {
        let gateway = Arc::new(OpenAiGateway::from_config(&config));
        Self::with_gateway(config, gateway)
    }

    pub fn with_gateway(config: AppConfig, gateway: BoxedGateway) -> Self {
        Self {
            config,
            gateway,
            sessions: HashMap::new(),
        }
    }

    /// Start a new session. Sessions abandoned by their clients are
    /// swept out first.
    pub fn create_session(&mut self) -> Arc<Session> {
        self.evict_idle(self.config.session_idle());

        let session = Arc::new(
            SessionBuilder::new(Arc::clone(&self.gateway))
                .timeout(self.config.request_timeout())
                .build(),
        );
        self.sessions.insert(session.id.clone(), Arc::clone(&session));
        session
    }

    /// Look up a session, counting the lookup as activity.
    pub fn session(&self, id: &str) -> Option<Arc<Session>> {
        self.sessions.get(id).inspect(|s| s.touch()).cloned()
    }

    /// Drop a session and everything in it. Returns false if it didn't
    /// exist.
    pub fn end_session(&mut self, id: &str) -> bool {
        self.sessions.remove(id).is_some()
    }

    /// Drop every session unused for at least `max_idle`. A session
    /// with a request in flight is never dropped. Returns how many were
    /// removed.
    pub fn evict_idle(&mut self, max_idle: Duration) -> usize {
        let before = self.sessions.len();
        self.sessions
            .retain(|_, session| session.is_pending() || session.idle_for() < max_idle);

        let evicted = before - self.sessions.len();
        if evicted > 0 {
            tracing::info!(evicted, remaining = self.sessions.len(), "Dropped idle sessions");
        }
        evicted
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }
}
