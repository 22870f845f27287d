use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use rusqlite::Connection;

use crate::config::AppConfig;
use crate::models::KnowledgeBase;
use crate::services::ai::LlmProvider;

pub struct AppState {
    pub db: Arc<Mutex<Connection>>,
    pub config: AppConfig,
    pub kb: KnowledgeBase,
    pub llm: Box<dyn LlmProvider>,
    session_locks: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl AppState {
    pub fn new(
        conn: Connection,
        config: AppConfig,
        kb: KnowledgeBase,
        llm: Box<dyn LlmProvider>,
    ) -> Self {
        Self {
            db: Arc::new(Mutex::new(conn)),
            config,
            kb,
            llm,
            session_locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_db<T>(
        &self,
        f: impl FnOnce(&Connection) -> anyhow::Result<T>,
    ) -> anyhow::Result<T> {
        let db = self
            .db
            .lock()
            .map_err(|_| anyhow::anyhow!("database lock poisoned"))?;
        f(&db)
    }

    /// Lock serializing load-process-save for one session id. Hold the
    /// returned mutex's guard for the whole read-modify-write.
    pub fn session_lock(&self, session_id: &str) -> anyhow::Result<Arc<tokio::sync::Mutex<()>>> {
        let mut locks = self
            .session_locks
            .lock()
            .map_err(|_| anyhow::anyhow!("session lock table poisoned"))?;
        // Drop entries nobody is holding.
        locks.retain(|_, lock| Arc::strong_count(lock) > 1);
        Ok(locks
            .entry(session_id.to_string())
            .or_default()
            .clone())
    }
}
