use axum::{extract::State, Json};

use crate::http::server::AppState;
use crate::load_balancer::BackendStatus;

/// Health flag and request count of every backend, in rotation order.
pub async fn get_backends(State(state): State<AppState>) -> Json<Vec<BackendStatus>> {
    Json(state.pool.snapshot())
}
