//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → headers.rs (resolve client identity)
//!     → rate_limit.rs (per-client token bucket, 429 on exhaustion)
//!     → auth.rs (X-API-KEY check, 401 on mismatch)
//!     → Pass to handlers
//! ```
//!
//! Admission runs before authentication, so unauthenticated traffic spends
//! the budget of the IP it comes from.

pub mod auth;
pub mod headers;
pub mod rate_limit;

pub use auth::{api_key_middleware, ApiKey, X_API_KEY};
pub use rate_limit::{rate_limit_middleware, AdmissionController, RateLimitError, RateLimitState};
