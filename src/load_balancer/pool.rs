//! Backend pool management.
//!
//! # Responsibilities
//! - Build the fixed, ordered backend list from configuration
//! - Apply the load balancing algorithm to select a backend
//! - Expose a read-only view for health checking and status reporting

use std::sync::Arc;

use serde::Serialize;

use crate::config::BackendConfig;
use crate::load_balancer::{backend::Backend, round_robin::RoundRobin, LoadBalancer, PoolError};

/// Point-in-time view of one backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BackendStatus {
    pub url: String,
    pub healthy: bool,
    pub requests: u64,
}

/// The shared pool of backends and the selector that rotates over it.
#[derive(Debug)]
pub struct BackendPool {
    backends: Vec<Arc<Backend>>,
    balancer: Box<dyn LoadBalancer>,
}

impl BackendPool {
    /// Build a round-robin pool from configuration.
    ///
    /// Any malformed address is an error; a pool is never built from a
    /// partial list.
    pub fn from_config(configs: &[BackendConfig]) -> Result<Self, PoolError> {
        let backends = configs
            .iter()
            .map(|config| Backend::parse(&config.address).map(Arc::new))
            .collect::<Result<Vec<_>, _>>()?;

        Self::with_balancer(backends, Box::new(RoundRobin::new()))
    }

    /// Build a pool with an explicit selection policy.
    pub fn with_balancer(
        backends: Vec<Arc<Backend>>,
        balancer: Box<dyn LoadBalancer>,
    ) -> Result<Self, PoolError> {
        if backends.is_empty() {
            return Err(PoolError::Empty);
        }

        for backend in &backends {
            tracing::debug!(backend = %backend, "Registered backend");
        }

        Ok(Self { backends, balancer })
    }

    /// Select the next healthy backend, or `None` if the pool is exhausted.
    pub fn pick(&self) -> Option<Arc<Backend>> {
        let picked = self.balancer.next_server(&self.backends);
        if picked.is_none() {
            tracing::debug!(backend_count = self.backends.len(), "No healthy backends in pool");
        }
        picked
    }

    /// All backends in rotation order.
    pub fn backends(&self) -> &[Arc<Backend>] {
        &self.backends
    }

    pub fn len(&self) -> usize {
        self.backends.len()
    }

    pub fn is_empty(&self) -> bool {
        self.backends.is_empty()
    }

    pub fn healthy_count(&self) -> usize {
        self.backends.iter().filter(|b| b.is_healthy()).count()
    }

    pub fn snapshot(&self) -> Vec<BackendStatus> {
        self.backends
            .iter()
            .map(|b| BackendStatus {
                url: b.address().to_string(),
                healthy: b.is_healthy(),
                requests: b.request_count(),
            })
            .collect()
    }
}
