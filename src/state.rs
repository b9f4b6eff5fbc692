use std::sync::Arc;

use axum::extract::FromRef;
use tokio::sync::RwLock;

use crate::{
    config::Config,
    services::sessions::SessionRegistry,
    store::{AttemptStore, RuleTable},
};

/// The attempt log. Appends go through the write lock, one at a time.
pub type SharedStore = Arc<RwLock<AttemptStore>>;

#[derive(Clone)]
pub struct AppState {
    pub store: SharedStore,
    pub rules: Arc<RuleTable>,
    pub sessions: Arc<SessionRegistry>,
    pub config: Config,
}

impl AppState {
    pub fn new(store: AttemptStore, rules: RuleTable, config: Config) -> Self {
        Self {
            store: Arc::new(RwLock::new(store)),
            rules: Arc::new(rules),
            sessions: Arc::new(SessionRegistry::new(config.session_ttl)),
            config,
        }
    }
}

impl FromRef<AppState> for SharedStore {
    fn from_ref(state: &AppState) -> Self {
        state.store.clone()
    }
}

impl FromRef<AppState> for Arc<RuleTable> {
    fn from_ref(state: &AppState) -> Self {
        state.rules.clone()
    }
}

impl FromRef<AppState> for Arc<SessionRegistry> {
    fn from_ref(state: &AppState) -> Self {
        state.sessions.clone()
    }
}

impl FromRef<AppState> for Config {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}
