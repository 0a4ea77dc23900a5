//! Response handling and transformation.
//!
//! # Responsibilities
//! - Relay the backend response to the client as a stream
//! - Strip hop-by-hop headers
//! - Map dispatch failures to gateway status codes
//!
//! # Design Decisions
//! - Streaming responses avoid buffering the entire body
//! - 503 means no backend, 502 means the backend failed, 504 means it was too slow

use axum::body::Body;
use axum::http::{Response, StatusCode};
use axum::response::IntoResponse;

use crate::http::request::strip_hop_by_hop;

/// Turn an upstream response into a client response without buffering.
pub fn relay(response: Response<hyper::body::Incoming>) -> Response<Body> {
    let (mut parts, body) = response.into_parts();
    strip_hop_by_hop(&mut parts.headers);
    Response::from_parts(parts, Body::new(body))
}

/// Failures the dispatcher reports to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchError {
    /// No healthy backend.
    Unavailable,
    /// Connection refused, reset or closed before a response arrived.
    BadGateway,
    /// No response headers within the upstream timeout.
    GatewayTimeout,
}

impl DispatchError {
    pub fn status(self) -> StatusCode {
        match self {
            DispatchError::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
            DispatchError::BadGateway => StatusCode::BAD_GATEWAY,
            DispatchError::GatewayTimeout => StatusCode::GATEWAY_TIMEOUT,
        }
    }

    fn message(self) -> &'static str {
        match self {
            DispatchError::Unavailable => "No backend available",
            DispatchError::BadGateway => "Upstream request failed",
            DispatchError::GatewayTimeout => "Upstream request timed out",
        }
    }
}

impl IntoResponse for DispatchError {
    fn into_response(self) -> axum::response::Response {
        (self.status(), self.message()).into_response()
    }
}
