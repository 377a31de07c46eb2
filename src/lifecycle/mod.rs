//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Shutdown (shutdown.rs):
//!     trigger → broadcast → admin server drains, monitor loop exits
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → trigger graceful shutdown
//! ```
//!
//! # Design Decisions
//! - One broadcast channel; every long-running task subscribes
//! - Nothing is flushed on exit beyond the write-through cache store

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;
pub use signals::{forward_signals, shutdown_signal};
