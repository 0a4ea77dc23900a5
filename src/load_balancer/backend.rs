//! Backend abstraction.
//!
//! # Responsibilities
//! - Represent a single backend server by its address
//! - Track health state (written by the health monitor only)
//! - Count dispatched requests

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use axum::http::uri::{Authority, PathAndQuery, Scheme};
use axum::http::Uri;
use url::Url;

use crate::load_balancer::PoolError;

/// A single backend server.
#[derive(Debug)]
pub struct Backend {
    /// Normalized address, e.g. `http://127.0.0.1:8081`.
    address: String,
    /// `host:port` used for the upstream URI and the `Host` header.
    authority: Authority,
    healthy: AtomicBool,
    request_count: AtomicU64,
}

impl Backend {
    /// Create a backend from a configured address.
    ///
    /// Backends start out healthy; the first health sweep corrects this.
    pub fn parse(address: &str) -> Result<Self, PoolError> {
        let url = parse_backend_url(address)?;
        let host = url.host_str().ok_or_else(|| PoolError::InvalidAddress {
            address: address.to_string(),
            reason: "missing host".to_string(),
        })?;
        let port = url.port_or_known_default().unwrap_or(80);

        let authority: Authority = format!("{}:{}", host, port).parse().map_err(
            |e: axum::http::uri::InvalidUri| PoolError::InvalidAddress {
                address: address.to_string(),
                reason: e.to_string(),
            },
        )?;

        Ok(Self {
            address: format!("http://{}", authority),
            authority,
            healthy: AtomicBool::new(true),
            request_count: AtomicU64::new(0),
        })
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn authority(&self) -> &Authority {
        &self.authority
    }

    /// Absolute URI of `path` on this backend.
    pub fn uri_for(&self, path: &str) -> Result<Uri, axum::http::Error> {
        let path_and_query: PathAndQuery = path.parse()?;
        let uri = Uri::builder()
            .scheme(Scheme::HTTP)
            .authority(self.authority.clone())
            .path_and_query(path_and_query)
            .build()?;
        Ok(uri)
    }

    pub fn is_healthy(&self) -> bool {
        self.healthy.load(Ordering::Acquire)
    }

    /// Store the health flag and return the previous value.
    pub fn set_healthy(&self, healthy: bool) -> bool {
        self.healthy.swap(healthy, Ordering::AcqRel)
    }

    /// Count one dispatch to this backend. Returns the new total.
    pub fn record_request(&self) -> u64 {
        self.request_count.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub fn request_count(&self) -> u64 {
        self.request_count.load(Ordering::Relaxed)
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.address)
    }
}

/// Parse and check a backend address.
///
/// Bare `host:port` addresses are treated as `http://host:port`. Only plain
/// HTTP origins are accepted: no path, query, fragment or credentials.
pub fn parse_backend_url(address: &str) -> Result<Url, PoolError> {
    let trimmed = address.trim();
    let invalid = |reason: &str| PoolError::InvalidAddress {
        address: address.to_string(),
        reason: reason.to_string(),
    };

    if trimmed.is_empty() {
        return Err(invalid("empty address"));
    }

    let candidate = if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("http://{}", trimmed)
    };

    let url = Url::parse(&candidate).map_err(|e| invalid(&e.to_string()))?;

    if url.scheme() != "http" {
        return Err(PoolError::UnsupportedScheme {
            address: address.to_string(),
            scheme: url.scheme().to_string(),
        });
    }
    if url.host_str().map_or(true, str::is_empty) {
        return Err(invalid("missing host"));
    }
    if !url.username().is_empty() || url.password().is_some() {
        return Err(invalid("credentials are not supported"));
    }
    if url.path() != "/" || url.query().is_some() || url.fragment().is_some() {
        return Err(invalid("path, query and fragment are not supported"));
    }

    Ok(url)
}
