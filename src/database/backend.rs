//! Engine backends.
//!
//! The gateway never speaks a database wire protocol itself. Each engine is
//! served by a [`DatabaseAdmin`] implementation registered in [`Backends`] at
//! startup; engines without one answer every request with an error envelope.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::database::credentials::Credentials;
use crate::database::types::{DatabaseName, QueryActivity};

/// Supported database engines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Engine {
    #[serde(rename = "mysql")]
    MySql,
    Postgres,
    Mongo,
}

impl Engine {
    pub const ALL: [Engine; 3] = [Engine::MySql, Engine::Postgres, Engine::Mongo];

    /// Path segment and action prefix.
    pub fn as_str(&self) -> &'static str {
        match self {
            Engine::MySql => "mysql",
            Engine::Postgres => "postgres",
            Engine::Mongo => "mongo",
        }
    }
}

impl fmt::Display for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Engine {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Engine::ALL
            .into_iter()
            .find(|engine| engine.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown engine '{s}' (expected mysql, postgres or mongo)"))
    }
}

/// Failure reported by a backend.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("connection failed: {0}")]
    Connection(String),

    #[error("{0}")]
    Operation(String),

    #[error("{operation} is not supported by this engine")]
    Unsupported { operation: &'static str },
}

/// Administrative operations against one database engine.
#[async_trait]
pub trait DatabaseAdmin: Send + Sync {
    /// Create the database and a user owning it with `credentials`.
    async fn create_database(
        &self,
        name: &DatabaseName,
        credentials: &Credentials,
    ) -> Result<(), BackendError>;

    /// Drop the users attached to the database and grant it to a new one.
    async fn reset_credentials(
        &self,
        name: &DatabaseName,
        credentials: &Credentials,
    ) -> Result<(), BackendError>;

    async fn rename_database(
        &self,
        from: &DatabaseName,
        to: &DatabaseName,
    ) -> Result<(), BackendError>;

    async fn delete_database(&self, name: &DatabaseName) -> Result<(), BackendError>;

    /// Engine-specific storage statistics.
    async fn database_stats(&self, name: &DatabaseName)
        -> Result<serde_json::Value, BackendError>;

    /// Per-user query totals across the instance.
    async fn query_activity(&self) -> Result<Vec<QueryActivity>, BackendError> {
        Err(BackendError::Unsupported {
            operation: "query activity",
        })
    }
}

/// Backends registered per engine.
#[derive(Clone, Default)]
pub struct Backends {
    inner: HashMap<Engine, Arc<dyn DatabaseAdmin>>,
}

impl Backends {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style registration.
    pub fn with(mut self, engine: Engine, admin: Arc<dyn DatabaseAdmin>) -> Self {
        self.register(engine, admin);
        self
    }

    /// Register `admin` for `engine`, replacing any previous backend.
    pub fn register(&mut self, engine: Engine, admin: Arc<dyn DatabaseAdmin>) {
        self.inner.insert(engine, admin);
    }

    pub fn get(&self, engine: Engine) -> Option<Arc<dyn DatabaseAdmin>> {
        self.inner.get(&engine).cloned()
    }

    /// Engines with a registered backend, in a stable order.
    pub fn configured(&self) -> Vec<Engine> {
        Engine::ALL
            .into_iter()
            .filter(|engine| self.inner.contains_key(engine))
            .collect()
    }
}

impl fmt::Debug for Backends {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Backends")
            .field("configured", &self.configured())
            .finish()
    }
}
