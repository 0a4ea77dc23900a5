//! Active health checking.
//!
//! # Responsibilities
//! - Periodically probe every backend
//! - Bound each probe by a timeout so one slow backend cannot stall a sweep
//! - Update backend health state based on results

use std::sync::Arc;
use std::time::Duration;

use futures_util::future::join_all;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};

use crate::config::HealthCheckConfig;
use crate::health::probe::{HealthProbe, HttpProbe, ProbeError};
use crate::load_balancer::{Backend, BackendPool};
use crate::observability::metrics;

pub struct HealthMonitor<P = HttpProbe> {
    backends: Arc<BackendPool>,
    probe: P,
    interval: Duration,
    timeout: Duration,
}

impl HealthMonitor<HttpProbe> {
    pub fn new(backends: Arc<BackendPool>, config: &HealthCheckConfig) -> Self {
        Self::with_probe(
            backends,
            HttpProbe::new(config.path.clone()),
            config.interval(),
            config.timeout(),
        )
    }
}

impl<P: HealthProbe> HealthMonitor<P> {
    pub fn with_probe(
        backends: Arc<BackendPool>,
        probe: P,
        interval: Duration,
        timeout: Duration,
    ) -> Self {
        Self {
            backends,
            probe,
            interval,
            timeout,
        }
    }

    /// Run the probe loop on a new task until `shutdown` fires.
    pub fn spawn(self, shutdown: broadcast::Receiver<()>) -> JoinHandle<()> {
        tokio::spawn(self.run(shutdown))
    }

    /// Sweep all backends every interval, starting immediately.
    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        tracing::info!(
            interval = ?self.interval,
            timeout = ?self.timeout,
            backends = self.backends.len(),
            "Health monitor starting"
        );

        let mut ticker = time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.check_all().await;
                }
                _ = shutdown.recv() => {
                    tracing::info!("Health monitor received shutdown signal, exiting loop");
                    break;
                }
            }
        }
    }

    /// Probe every backend once, concurrently.
    pub async fn check_all(&self) {
        let checks: Vec<_> = self
            .backends
            .backends()
            .iter()
            .map(|backend| self.check_one(backend))
            .collect();

        join_all(checks).await;

        tracing::debug!(
            healthy = self.backends.healthy_count(),
            total = self.backends.len(),
            "Health sweep complete"
        );
    }

    async fn check_one(&self, backend: &Backend) {
        let outcome = match time::timeout(self.timeout, self.probe.probe(backend)).await {
            Ok(result) => result,
            Err(_) => Err(ProbeError::Timeout(self.timeout)),
        };

        let healthy = outcome.is_ok();
        let was_healthy = backend.set_healthy(healthy);

        match (&outcome, was_healthy) {
            (Err(e), true) => {
                tracing::warn!(backend = %backend, error = %e, "Backend is unhealthy");
            }
            (Err(e), false) => {
                tracing::debug!(backend = %backend, error = %e, "Backend still unhealthy");
            }
            (Ok(()), false) => {
                tracing::info!(backend = %backend, "Backend recovered");
            }
            (Ok(()), true) => {
                tracing::trace!(backend = %backend, "Backend is healthy");
            }
        }

        metrics::record_backend_health(backend.address(), healthy);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BackendConfig;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[derive(Clone, Copy)]
    enum Behavior {
        Up,
        Down,
        Hang,
    }

    #[derive(Default)]
    struct FakeProbe {
        behaviors: Mutex<HashMap<String, Behavior>>,
        calls: AtomicUsize,
    }

    impl FakeProbe {
        fn set(&self, backend: &Backend, behavior: Behavior) {
            self.behaviors
                .lock()
                .unwrap()
                .insert(backend.address().to_string(), behavior);
        }
    }

    impl HealthProbe for Arc<FakeProbe> {
        async fn probe(&self, backend: &Backend) -> Result<(), ProbeError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let behavior = self
                .behaviors
                .lock()
                .unwrap()
                .get(backend.address())
                .copied()
                .unwrap_or(Behavior::Up);

            match behavior {
                Behavior::Up => Ok(()),
                Behavior::Down => Err(ProbeError::Status(axum::http::StatusCode::SERVICE_UNAVAILABLE)),
                Behavior::Hang => {
                    time::sleep(Duration::from_secs(3600)).await;
                    Ok(())
                }
            }
        }
    }

    fn pool(n: usize) -> Arc<BackendPool> {
        let configs: Vec<BackendConfig> = (0..n)
            .map(|i| BackendConfig::from(format!("127.0.0.1:{}", 7000 + i).as_str()))
            .collect();
        Arc::new(BackendPool::from_config(&configs).unwrap())
    }

    fn monitor(pool: &Arc<BackendPool>, probe: &Arc<FakeProbe>) -> HealthMonitor<Arc<FakeProbe>> {
        HealthMonitor::with_probe(
            pool.clone(),
            probe.clone(),
            Duration::from_secs(10),
            Duration::from_secs(2),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_marks_unhealthy_within_one_timeout() {
        let pool = pool(3);
        let probe = Arc::new(FakeProbe::default());
        probe.set(&pool.backends()[1], Behavior::Hang);
        let monitor = monitor(&pool, &probe);

        let start = time::Instant::now();
        monitor.check_all().await;

        assert!(start.elapsed() <= Duration::from_secs(2) + Duration::from_millis(10));
        assert!(pool.backends()[0].is_healthy());
        assert!(!pool.backends()[1].is_healthy());
        assert!(pool.backends()[2].is_healthy());
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_probes_do_not_serialize() {
        let pool = pool(4);
        let probe = Arc::new(FakeProbe::default());
        for b in pool.backends() {
            probe.set(b, Behavior::Hang);
        }
        let monitor = monitor(&pool, &probe);

        let start = time::Instant::now();
        monitor.check_all().await;

        // Four hanging probes still finish in one timeout, not four.
        assert!(start.elapsed() < Duration::from_secs(4));
        assert_eq!(pool.healthy_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_recovery_on_next_sweep() {
        let pool = pool(2);
        let probe = Arc::new(FakeProbe::default());
        let target = pool.backends()[0].clone();
        probe.set(&target, Behavior::Down);
        let monitor = monitor(&pool, &probe);

        monitor.check_all().await;
        assert!(!target.is_healthy());

        monitor.check_all().await;
        assert!(!target.is_healthy());

        probe.set(&target, Behavior::Up);
        monitor.check_all().await;
        assert!(target.is_healthy());
        assert!(pool.backends()[1].is_healthy());
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_sweeps_periodically_and_stops_on_shutdown() {
        let pool = pool(2);
        let probe = Arc::new(FakeProbe::default());
        let shutdown = crate::lifecycle::Shutdown::new();

        let handle = monitor(&pool, &probe).spawn(shutdown.subscribe());

        // Sweeps at t=0, t=10 and t=20.
        time::sleep(Duration::from_secs(25)).await;
        let calls = probe.calls.load(Ordering::SeqCst);
        assert!(calls >= 4, "expected at least two sweeps, got {} probes", calls);

        probe.set(&pool.backends()[1], Behavior::Down);
        time::sleep(Duration::from_secs(10)).await;
        assert!(!pool.backends()[1].is_healthy());

        shutdown.trigger();
        time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("monitor did not stop")
            .unwrap();
    }
}
