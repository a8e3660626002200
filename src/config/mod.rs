//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! .env + config file (TOML)
//!     → loader.rs (parse, environment overrides)
//!     → validation.rs (semantic checks)
//!     → GatewayConfig (validated, immutable)
//!
//! On file change:
//!     watcher.rs detects change
//!     → loader.rs loads new config
//!     → validation.rs validates
//!     → server swaps in the new API key
//! ```
//!
//! Rate limit settings are fixed when the admission controller is built and
//! are not affected by reloads.

pub mod loader;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use loader::{load_config, load_with_env, ConfigError};
pub use schema::{
    AuthConfig, GatewayConfig, LimitsConfig, ListenerConfig, LogFormat, ObservabilityConfig,
    RateLimitConfig, TimeoutConfig,
};
