//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Bind listener → Start watcher → Build server → Serve
//!
//! Shutdown (shutdown.rs):
//!     Signal received → Stop accepting → Drain requests → Exit
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger graceful shutdown
//! ```
//!
//! Shutdown has a deadline: the server task is abandoned after
//! `timeouts.shutdown_secs`.

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::Shutdown;
