//! HTTP server setup and request dispatch.
//!
//! # Responsibilities
//! - Create Axum Router with the proxy fallback and status endpoint
//! - Wire up middleware (tracing, request ID)
//! - Start the health monitor alongside the listener
//! - Select a backend per request and forward to it
//! - Map dispatch failures to 502/503/504 without touching health state

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::Request,
    response::{IntoResponse, Response},
    Router,
};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use tracing::Span;

use crate::admin;
use crate::config::ProxyConfig;
use crate::health::HealthMonitor;
use crate::http::request::{prepare_upstream_request, X_REQUEST_ID};
use crate::http::response::{relay, DispatchError};
use crate::lifecycle::shutdown::recv_or_closed;
use crate::load_balancer::{BackendPool, PoolError};
use crate::observability::metrics;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub pool: Arc<BackendPool>,
    pub client: Client<HttpConnector, Body>,
    pub upstream_timeout: Duration,
}

/// HTTP server for the load balancer.
pub struct HttpServer {
    router: Router,
    config: ProxyConfig,
    pool: Arc<BackendPool>,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    ///
    /// Fails if any backend address is malformed or the list is empty.
    pub fn new(config: ProxyConfig) -> Result<Self, PoolError> {
        let pool = Arc::new(BackendPool::from_config(&config.backends)?);

        let client = Client::builder(TokioExecutor::new()).build(HttpConnector::new());

        let state = AppState {
            pool: pool.clone(),
            client,
            upstream_timeout: config.timeouts.upstream(),
        };

        let router = Self::build_router(&config, state);
        Ok(Self {
            router,
            config,
            pool,
        })
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(config: &ProxyConfig, state: AppState) -> Router {
        let mut router = Router::new();
        if config.admin.enabled {
            router = router.merge(admin::routes(&config.admin));
        }

        router
            .fallback(proxy_handler)
            .with_state(state)
            .layer(
                ServiceBuilder::new()
                    .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                    .layer(TraceLayer::new_for_http().make_span_with(request_span))
                    .layer(PropagateRequestIdLayer::x_request_id()),
            )
    }

    /// Run the server until `shutdown` fires, probing backends in the background.
    pub async fn run(
        self,
        listener: TcpListener,
        shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            backends = self.pool.len(),
            "HTTP server starting"
        );

        let monitor = if self.config.health_check.enabled {
            let monitor = HealthMonitor::new(self.pool.clone(), &self.config.health_check);
            Some(monitor.spawn(shutdown.resubscribe()))
        } else {
            tracing::info!("Active health checks disabled");
            None
        };

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(recv_or_closed(shutdown))
            .await?;

        // The monitor normally exits on the same signal; a receiver created
        // after the trigger would miss it, so stop it explicitly.
        if let Some(handle) = monitor {
            handle.abort();
            if let Err(e) = handle.await {
                if e.is_panic() {
                    tracing::error!(error = %e, "Health monitor task panicked");
                }
            }
        }

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Router with state applied, for driving requests without a socket.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    pub fn pool(&self) -> Arc<BackendPool> {
        self.pool.clone()
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &ProxyConfig {
        &self.config
    }
}

fn request_span(request: &Request<Body>) -> Span {
    let request_id = request
        .headers()
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "request",
        method = %request.method(),
        uri = %request.uri(),
        request_id = %request_id,
    )
}

/// Main proxy handler.
/// Selects a backend and forwards the request to it.
pub(crate) async fn proxy_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let start_time = Instant::now();
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let client_ip = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip());

    let backend = match state.pool.pick() {
        Some(b) => b,
        None => {
            tracing::warn!(method = %method, path = %path, "No healthy backends");
            metrics::record_request(method.as_str(), 503, "none", start_time);
            return DispatchError::Unavailable.into_response();
        }
    };

    let dispatched = backend.record_request();
    tracing::debug!(
        backend = %backend,
        method = %method,
        path = %path,
        dispatched,
        "Routing request to backend"
    );

    let upstream = match prepare_upstream_request(request, &backend, client_ip) {
        Ok(req) => req,
        Err(e) => {
            tracing::error!(backend = %backend, error = %e, "Failed to build upstream request");
            metrics::record_request(method.as_str(), 502, backend.address(), start_time);
            return DispatchError::BadGateway.into_response();
        }
    };

    match tokio::time::timeout(state.upstream_timeout, state.client.request(upstream)).await {
        Ok(Ok(response)) => {
            metrics::record_request(
                method.as_str(),
                response.status().as_u16(),
                backend.address(),
                start_time,
            );
            relay(response)
        }
        Ok(Err(e)) => {
            tracing::error!(backend = %backend, error = %e, "Upstream error");
            metrics::record_request(method.as_str(), 502, backend.address(), start_time);
            DispatchError::BadGateway.into_response()
        }
        Err(_) => {
            tracing::warn!(
                backend = %backend,
                timeout = ?state.upstream_timeout,
                "Upstream timed out"
            );
            metrics::record_request(method.as_str(), 504, backend.address(), start_time);
            DispatchError::GatewayTimeout.into_response()
        }
    }
}
