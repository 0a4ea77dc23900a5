//! Load balancing subsystem.
//!
//! # Data Flow
//! ```text
//! Inbound request
//!     → pool.rs (fixed, ordered list of backends)
//!     → round_robin.rs (rotate through backends, skip unhealthy)
//!     → backend.rs (count the dispatch)
//!     → Return backend or None (pool exhausted)
//! ```
//!
//! # Design Decisions
//! - The pool is fixed after startup; no insertion or removal
//! - Health flags and request counters are per-backend atomics
//! - The rotation cursor belongs to the selector, not to a global

use std::fmt::Debug;
use std::sync::Arc;

pub mod backend;
pub mod pool;
pub mod round_robin;

pub use backend::Backend;
pub use pool::{BackendPool, BackendStatus};
pub use round_robin::RoundRobin;

/// Selection policy over an ordered set of backends.
pub trait LoadBalancer: Debug + Send + Sync {
    /// Pick the next backend to receive a request, or `None` when no
    /// backend is eligible.
    fn next_server(&self, backends: &[Arc<Backend>]) -> Option<Arc<Backend>>;
}

/// Errors raised while building the backend pool.
#[derive(Debug, thiserror::Error)]
pub enum PoolError {
    #[error("backend pool is empty")]
    Empty,

    #[error("invalid backend address {address:?}: {reason}")]
    InvalidAddress { address: String, reason: String },

    #[error("unsupported scheme {scheme:?} in backend address {address:?} (only http is supported)")]
    UnsupportedScheme { address: String, scheme: String },
}
