//! Liveness probes.
//!
//! # Responsibilities
//! - Issue a single health request to one backend
//! - Classify the outcome: exactly `200 OK` is healthy, anything else is not
//!
//! The monitor owns the timeout; a probe only reports what the backend said.

use std::future::Future;
use std::time::Duration;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};

use crate::load_balancer::Backend;

pub const USER_AGENT: &str = "loadbalancer-health-check";

/// Why a backend failed its liveness check.
#[derive(Debug, thiserror::Error)]
pub enum ProbeError {
    #[error("timed out after {0:?}")]
    Timeout(Duration),

    #[error("connection error: {0}")]
    Connect(#[from] hyper_util::client::legacy::Error),

    #[error("non-OK status {0}")]
    Status(StatusCode),

    #[error("invalid probe request: {0}")]
    Request(#[from] axum::http::Error),
}

/// Something that can check whether a backend is alive.
pub trait HealthProbe: Send + Sync + 'static {
    fn probe(&self, backend: &Backend) -> impl Future<Output = Result<(), ProbeError>> + Send;
}

/// HTTP `GET <path>` probe.
#[derive(Debug, Clone)]
pub struct HttpProbe {
    client: Client<HttpConnector, Body>,
    path: String,
}

impl HttpProbe {
    pub fn new(path: impl Into<String>) -> Self {
        let client = Client::builder(TokioExecutor::new()).build(HttpConnector::new());
        Self {
            client,
            path: path.into(),
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }
}

impl HealthProbe for HttpProbe {
    async fn probe(&self, backend: &Backend) -> Result<(), ProbeError> {
        let request = Request::builder()
            .method(Method::GET)
            .uri(backend.uri_for(&self.path)?)
            .header(header::USER_AGENT, USER_AGENT)
            .body(Body::empty())?;

        let response = self.client.request(request).await?;
        let status = response.status();

        if status == StatusCode::OK {
            Ok(())
        } else {
            Err(ProbeError::Status(status))
        }
    }
}
