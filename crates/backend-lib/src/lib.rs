// ============================
// authgate-backend/src/lib.rs
// ============================
//! Core backend functionality for the `authgate` session service.

pub mod auth;
pub mod config;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod logging;
pub mod metrics;
pub mod router;
pub mod storage;
pub mod validation;

use std::sync::Arc;

use crate::auth::{AuthService, DefaultAuth, SessionValidator};
use crate::config::Settings;
use crate::storage::{FlatFileUserStore, UserStore};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    /// Authentication service
    pub auth: Arc<dyn AuthService>,
    /// Token issuance and validation
    pub sessions: Arc<SessionValidator>,
    /// Settings the process started with
    pub settings: Arc<Settings>,
}

impl AppState {
    /// Create a new application state over `store`
    pub fn new(store: Arc<dyn UserStore>, settings: Settings) -> Self {
        let sessions = SessionValidator::new(settings.server_secret(), settings.session_ttl());
        let auth = Arc::new(DefaultAuth::new(store, sessions.clone(), settings.password));

        Self {
            auth,
            sessions: Arc::new(sessions),
            settings: Arc::new(settings),
        }
    }

    /// Create the application state backed by the flat-file user store
    pub async fn from_settings(settings: Settings) -> anyhow::Result<Self> {
        let store = FlatFileUserStore::open(&settings.data_dir).await?;
        Ok(Self::new(Arc::new(store), settings))
    }
}
