//! Database administration surface.
//!
//! # Data Flow
//! ```text
//! /{engine}/databases/...
//!     → handlers.rs (bind JSON, validate)
//!     → types.rs (DatabaseName, request schemas)
//!     → credentials.rs (fresh username/password)
//!     → backend.rs (DatabaseAdmin registered for the engine)
//!     → envelope
//! ```

pub mod backend;
pub mod credentials;
pub mod handlers;
pub mod types;

pub use backend::{BackendError, Backends, DatabaseAdmin, Engine};
pub use credentials::Credentials;
pub use types::{DatabaseName, QueryActivity};
