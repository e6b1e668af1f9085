use std::sync::{Arc, Mutex, MutexGuard};

use rusqlite::Connection;

use crate::config::AppConfig;
use crate::services::auth::SessionSigner;

pub struct AppState {
    pub db: Arc<Mutex<Connection>>,
    pub config: AppConfig,
    pub sessions: SessionSigner,
}

impl AppState {
    pub fn new(conn: Connection, config: AppConfig) -> anyhow::Result<Self> {
        let sessions = SessionSigner::new(&config.session_secret)?;
        Ok(Self {
            db: Arc::new(Mutex::new(conn)),
            config,
            sessions,
        })
    }

    /// The connection is the unit of work for a request. Never hold the guard
    /// across an `.await`.
    pub fn db(&self) -> MutexGuard<'_, Connection> {
        self.db.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn session_ttl(&self) -> chrono::Duration {
        chrono::Duration::hours(self.config.session_ttl_hours)
    }
}
