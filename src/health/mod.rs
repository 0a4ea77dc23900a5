//! Health checking subsystem.
//!
//! # Data Flow
//! ```text
//! Active health checks (active.rs):
//!     Periodic timer
//!     → Probe each backend concurrently (probe.rs), bounded by a timeout
//!     → Store the result in the backend's health flag
//! ```
//!
//! # Design Decisions
//! - Only the active monitor writes health state; request failures never do
//! - One failed probe marks a backend unhealthy, one success restores it
//! - Health state is per-backend, not per-pool

pub mod active;
pub mod probe;

pub use active::HealthMonitor;
pub use probe::{HealthProbe, HttpProbe, ProbeError};
