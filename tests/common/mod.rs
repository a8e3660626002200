//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use db_gateway::config::GatewayConfig;
use db_gateway::database::backend::BackendError;
use db_gateway::database::{Backends, Credentials, DatabaseAdmin, DatabaseName, QueryActivity};
use db_gateway::http::HttpServer;
use db_gateway::lifecycle::Shutdown;

pub const API_KEY: &str = "test-key";

/// Config with a known API key and a generous rate limit.
pub fn test_config() -> GatewayConfig {
    let mut config = GatewayConfig::default();
    config.listener.bind_address = "127.0.0.1:0".into();
    config.auth.api_key = API_KEY.into();
    config.rate_limit.refill_rate = 1000.0;
    config.rate_limit.burst_capacity = 1000;
    config
}

/// A running gateway bound to an ephemeral port. Shuts down on drop.
pub struct TestGateway {
    pub addr: SocketAddr,
    pub client: reqwest::Client,
    shutdown: Shutdown,
}

impl TestGateway {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub fn get(&self, path: &str) -> reqwest::RequestBuilder {
        self.client.get(self.url(path)).header("X-API-KEY", API_KEY)
    }

    pub fn post(&self, path: &str) -> reqwest::RequestBuilder {
        self.client.post(self.url(path)).header("X-API-KEY", API_KEY)
    }

    pub fn patch(&self, path: &str) -> reqwest::RequestBuilder {
        self.client.patch(self.url(path)).header("X-API-KEY", API_KEY)
    }

    pub fn delete(&self, path: &str) -> reqwest::RequestBuilder {
        self.client.delete(self.url(path)).header("X-API-KEY", API_KEY)
    }
}

impl Drop for TestGateway {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

pub async fn spawn_gateway(config: GatewayConfig, backends: Backends) -> TestGateway {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let (_, config_updates) = mpsc::unbounded_channel();
    let server = HttpServer::new(config, backends).expect("invalid test config");
    let server_shutdown = shutdown.subscribe();

    tokio::spawn(async move {
        let _ = server.run(listener, config_updates, server_shutdown).await;
    });

    let client = reqwest::Client::builder()
        .no_proxy()
        .build()
        .unwrap();

    TestGateway {
        addr,
        client,
        shutdown,
    }
}

pub async fn json_body(res: reqwest::Response) -> Value {
    res.json().await.expect("response body is not JSON")
}

/// In-memory engine backend.
#[derive(Default)]
pub struct MemoryAdmin {
    databases: Mutex<HashMap<String, Credentials>>,
}

impl MemoryAdmin {
    pub fn contains(&self, name: &str) -> bool {
        self.databases.lock().unwrap().contains_key(name)
    }

    pub fn credentials(&self, name: &str) -> Option<Credentials> {
        self.databases.lock().unwrap().get(name).cloned()
    }
}

#[async_trait]
impl DatabaseAdmin for MemoryAdmin {
    async fn create_database(
        &self,
        name: &DatabaseName,
        credentials: &Credentials,
    ) -> Result<(), BackendError> {
        let mut dbs = self.databases.lock().unwrap();
        if dbs.contains_key(name.as_str()) {
            return Err(BackendError::Operation(format!(
                "database {} already exists",
                name
            )));
        }
        dbs.insert(name.to_string(), credentials.clone());
        Ok(())
    }

    async fn reset_credentials(
        &self,
        name: &DatabaseName,
        credentials: &Credentials,
    ) -> Result<(), BackendError> {
        let mut dbs = self.databases.lock().unwrap();
        match dbs.get_mut(name.as_str()) {
            Some(current) => {
                *current = credentials.clone();
                Ok(())
            }
            None => Err(BackendError::Operation(format!(
                "database {} does not exist",
                name
            ))),
        }
    }

    async fn rename_database(
        &self,
        from: &DatabaseName,
        to: &DatabaseName,
    ) -> Result<(), BackendError> {
        let mut dbs = self.databases.lock().unwrap();
        if dbs.contains_key(to.as_str()) {
            return Err(BackendError::Operation(format!(
                "database {} already exists",
                to
            )));
        }
        let credentials = dbs.remove(from.as_str()).ok_or_else(|| {
            BackendError::Operation(format!("database {} does not exist", from))
        })?;
        dbs.insert(to.to_string(), credentials);
        Ok(())
    }

    async fn delete_database(&self, name: &DatabaseName) -> Result<(), BackendError> {
        self.databases
            .lock()
            .unwrap()
            .remove(name.as_str())
            .map(|_| ())
            .ok_or_else(|| BackendError::Operation(format!("database {} does not exist", name)))
    }

    async fn database_stats(&self, name: &DatabaseName) -> Result<Value, BackendError> {
        if !self.contains(name.as_str()) {
            return Err(BackendError::Operation(format!(
                "database {} does not exist",
                name
            )));
        }
        Ok(json!([{ "table": "users", "size_mb": 0.02 }]))
    }

    async fn query_activity(&self) -> Result<Vec<QueryActivity>, BackendError> {
        let dbs = self.databases.lock().unwrap();
        let mut activity: Vec<_> = dbs
            .iter()
            .map(|(name, credentials)| QueryActivity {
                username: credentials.username.clone(),
                database_name: name.clone(),
                total_queries: 1,
            })
            .collect();
        activity.sort_by(|a, b| a.database_name.cmp(&b.database_name));
        Ok(activity)
    }
}

/// Backend whose connection always fails.
pub struct UnreachableAdmin;

#[async_trait]
impl DatabaseAdmin for UnreachableAdmin {
    async fn create_database(&self, _: &DatabaseName, _: &Credentials) -> Result<(), BackendError> {
        Err(refused())
    }

    async fn reset_credentials(&self, _: &DatabaseName, _: &Credentials) -> Result<(), BackendError> {
        Err(refused())
    }

    async fn rename_database(&self, _: &DatabaseName, _: &DatabaseName) -> Result<(), BackendError> {
        Err(refused())
    }

    async fn delete_database(&self, _: &DatabaseName) -> Result<(), BackendError> {
        Err(refused())
    }

    async fn database_stats(&self, _: &DatabaseName) -> Result<Value, BackendError> {
        Err(refused())
    }
}

fn refused() -> BackendError {
    BackendError::Connection("connection refused".into())
}
