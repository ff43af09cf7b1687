use std::sync::{Arc, RwLock};

use mongodb::{Client, Database};
use tokio::sync::OnceCell;

use crate::error::DbError;

/// Single point of truth for "which database is the current operation
/// against", hiding connect/pool lifecycle from callers.
///
/// An explicit context object passed by reference, not a process-wide
/// singleton — callers share it via `Arc`. The cached client lives behind a
/// resettable cell: concurrent first users all await the same in-flight
/// connect attempt, and [`reset`](DbContext::reset) swaps the cell so the
/// next access re-establishes against the last known target.
pub struct DbContext {
    uri: String,
    default_db: String,
    client: RwLock<Arc<OnceCell<Client>>>,
    /// Ambient target name; empty means the configured default.
    current: RwLock<String>,
}

impl DbContext {
    pub fn new(uri: impl Into<String>, default_db: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            default_db: default_db.into(),
            client: RwLock::new(Arc::new(OnceCell::new())),
            current: RwLock::new(String::new()),
        }
    }

    /// The cached client, connecting lazily on first use. Connection
    /// failure propagates to the caller that triggered it and is not
    /// retried here; the failed cell stays empty so a later call retries.
    pub async fn client(&self) -> Result<Client, DbError> {
        let cell = self.client.read().unwrap().clone();
        let client = cell
            .get_or_try_init(|| async {
                tracing::debug!("establishing mongodb connection");
                Client::with_uri_str(&self.uri)
                    .await
                    .map_err(|e| DbError::Connection(e.to_string()))
            })
            .await?;
        Ok(client.clone())
    }

    /// Switch the ambient target to `name` (or the configured default when
    /// omitted or empty) and return a handle bound to it. Idempotent when
    /// called repeatedly with the same name.
    pub async fn use_database(&self, name: Option<&str>) -> Result<Database, DbError> {
        let resolved = self.resolve(name);
        *self.current.write().unwrap() = resolved.clone();
        Ok(self.client().await?.database(&resolved))
    }

    /// Handle for the ambient target, lazily connecting if needed.
    pub async fn handle(&self) -> Result<Database, DbError> {
        let name = self.current_target();
        Ok(self.client().await?.database(&name))
    }

    /// Handle scoped to an explicit per-call target. Unlike
    /// [`use_database`](DbContext::use_database) this never mutates the
    /// ambient target, so concurrent callers with different explicit names
    /// cannot interfere with each other.
    pub async fn database_for(&self, name: Option<&str>) -> Result<Database, DbError> {
        match name {
            Some(n) if !n.is_empty() => Ok(self.client().await?.database(n)),
            _ => self.handle().await,
        }
    }

    /// Drop the cached client. The next access re-establishes against the
    /// last known target.
    pub fn reset(&self) {
        *self.client.write().unwrap() = Arc::new(OnceCell::new());
    }

    /// The currently resolved target name.
    pub fn current_target(&self) -> String {
        let current = self.current.read().unwrap();
        if current.is_empty() {
            self.default_db.clone()
        } else {
            current.clone()
        }
    }

    fn resolve(&self, name: Option<&str>) -> String {
        match name {
            Some(n) if !n.is_empty() => n.to_string(),
            _ => self.default_db.clone(),
        }
    }
}
