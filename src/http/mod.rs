//! Demo HTTP endpoint.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, tracing, x-request-id)
//!     → request.rs (fresh ambient context + request_id)
//!     → handler logs through the configured Logger
//!     → JSON response echoing the request id
//! ```

pub mod request;
pub mod server;

pub use request::{bind_request_context, extract_request_id, X_REQUEST_ID};
pub use server::{shutdown_signal, DemoServer, DemoState};
