//! Operational endpoints served next to the proxy.

pub mod handlers;

use axum::{routing::get, Router};

use crate::config::AdminConfig;
use crate::http::server::{proxy_handler, AppState};
use self::handlers::get_backends;

/// Routes that are answered locally instead of being proxied.
///
/// Only GET is local; other methods on the same path still reach a backend.
pub fn routes(config: &AdminConfig) -> Router<AppState> {
    Router::new().route(
        &config.status_path,
        get(get_backends).fallback(proxy_handler),
    )
}
