//! Round-robin load balancing strategy.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::load_balancer::{backend::Backend, LoadBalancer};

/// Round-robin selector that skips unhealthy backends.
///
/// The cursor advances once per candidate inspected, so skipped backends
/// still move the rotation forward and low indices are not favored.
#[derive(Debug, Default)]
pub struct RoundRobin {
    counter: AtomicUsize,
}

impl RoundRobin {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current raw cursor value.
    pub fn cursor(&self) -> usize {
        self.counter.load(Ordering::Relaxed)
    }
}

impl LoadBalancer for RoundRobin {
    fn next_server(&self, backends: &[Arc<Backend>]) -> Option<Arc<Backend>> {
        if backends.is_empty() {
            return None;
        }

        // Claim a start position, then scan a private window of `len`
        // positions. Concurrent callers each see every backend exactly once.
        let start = self.counter.fetch_add(1, Ordering::Relaxed);
        let len = backends.len();

        for skipped in 0..len {
            let backend = &backends[start.wrapping_add(skipped) % len];
            if backend.is_healthy() {
                if skipped > 0 {
                    self.counter.fetch_add(skipped, Ordering::Relaxed);
                }
                return Some(backend.clone());
            }
        }

        self.counter.fetch_add(len - 1, Ordering::Relaxed);
        None
    }
}
