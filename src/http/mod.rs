//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware stack)
//!     → request.rs (capture request start, request ID)
//!     → security (admission, API key)
//!     → handler (host info or database operation)
//!     → envelope.rs (uniform JSON result)
//!     → Send to client
//! ```

pub mod envelope;
pub mod error;
pub mod request;
pub mod server;

pub use envelope::{emit_error, emit_error_with_status, emit_success, Envelope};
pub use error::ApiError;
pub use request::{RequestStart, X_REQUEST_ID};
pub use server::HttpServer;
