//! Round-robin HTTP load balancer.
//!
//! # Architecture Overview
//!
//! ```text
//!                         ┌──────────────────────────────────────────────┐
//!                         │                LOAD BALANCER                 │
//!                         │                                              │
//!     Client Request      │  ┌─────────┐    ┌──────────────┐             │
//!     ────────────────────┼─▶│  http   │───▶│ load_balancer│             │
//!                         │  │ server  │    │ pool + round │             │
//!                         │  └─────────┘    │    robin     │             │
//!                         │                 └──────┬───────┘             │
//!                         │                        ▼                     │
//!     Client Response     │  ┌─────────┐    ┌──────────────┐             │
//!     ◀───────────────────┼──│response │◀───│ hyper client │◀────────────┼──── Backend
//!                         │  │  relay  │    └──────────────┘             │
//!                         │  └─────────┘                                 │
//!                         │                                              │
//!                         │  ┌────────────────┐   ┌───────────────────┐  │
//!                         │  │ health monitor │──▶│ backend health    │  │
//!                         │  │ (periodic GET) │   │ flags (atomics)   │  │
//!                         │  └────────────────┘   └───────────────────┘  │
//!                         └──────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use loadbalancer::config::{read_config, validate_config, BackendConfig, ConfigError, ProxyConfig};
use loadbalancer::lifecycle::{wait_for_signal, Shutdown};
use loadbalancer::observability::logging;
use loadbalancer::HttpServer;

#[derive(Parser, Debug)]
#[command(name = "loadbalancer")]
#[command(about = "Round-robin HTTP load balancer with active health checks", long_about = None)]
struct Cli {
    /// TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Listen address, overrides the config file.
    #[arg(short, long)]
    bind: Option<String>,

    /// Backend address; repeat for several. Replaces the configured list.
    #[arg(long = "backend")]
    backends: Vec<String>,

    /// Seconds between health sweeps.
    #[arg(long)]
    health_interval: Option<u64>,
}

impl Cli {
    /// Config file (or defaults) with flags applied, validated once.
    fn into_config(self) -> Result<ProxyConfig, ConfigError> {
        let base = match &self.config {
            Some(path) => read_config(path)?,
            None => ProxyConfig::default(),
        };

        let config = self.apply_overrides(base);
        validate_config(&config).map_err(ConfigError::Validation)?;
        Ok(config)
    }

    fn apply_overrides(self, mut config: ProxyConfig) -> ProxyConfig {
        if let Some(bind) = self.bind {
            config.listener.bind_address = bind;
        }
        if !self.backends.is_empty() {
            config.backends = self
                .backends
                .iter()
                .map(|a| BackendConfig::from(a.as_str()))
                .collect();
        }
        if let Some(secs) = self.health_interval {
            config.health_check.interval_secs = secs;
        }
        config
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Cli::parse().into_config()?;

    logging::init(&config.observability.log_level);

    tracing::info!("loadbalancer v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        backends = config.backends.len(),
        health_interval_secs = config.health_check.interval_secs,
        probe_timeout_ms = config.health_check.timeout_ms,
        "Configuration loaded"
    );

    let server = HttpServer::new(config.clone())?;

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Load balancer listening");

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        wait_for_signal().await;
        shutdown.trigger();
    });

    server.run(listener, server_shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
