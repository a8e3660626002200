//! HTTP gateway for database administration.
//!
//! Every request passes a per-client token-bucket admission check and a
//! static API key check before reaching a handler, and every handler answers
//! with the same JSON envelope.

pub mod config;
pub mod database;
pub mod host;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod security;

pub use config::GatewayConfig;
pub use database::{Backends, DatabaseAdmin, Engine};
pub use http::HttpServer;
pub use lifecycle::Shutdown;
