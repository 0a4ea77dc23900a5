//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID, tracing)
//!     → [load balancer picks a backend]
//!     → request.rs (rewrite URI and Host, strip hop-by-hop headers)
//!     → hyper client → backend
//!     → response.rs (stream back, or 502/503/504)
//!     → Send to client
//! ```

pub mod request;
pub mod response;
pub mod server;

pub use request::X_REQUEST_ID;
pub use response::DispatchError;
pub use server::{AppState, HttpServer};
