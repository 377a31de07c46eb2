//! Network health subsystem.
//!
//! # Data Flow
//! ```text
//! Orchestrator validate step / admin `GET /admin/network`
//!     → probe.rs (Horizon GET + Soroban getHealth, concurrently)
//!     → NetworkHealth { horizon, soroban, errors }
//!     → gauges in observability::metrics
//!
//! Background (monitor.rs):
//!     Periodic timer → probe → network-status cache entry
//! ```
//!
//! # Design Decisions
//! - A probe never fails; unreachability is data, not an error
//! - Both endpoints must be up for the network to count as healthy

pub mod monitor;
pub mod probe;

pub use monitor::NetworkMonitor;
pub use probe::{HealthCheck, HttpHealthChecker, NetworkHealth, UNHEALTHY_TTL};
