//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID, timeout)
//!     → relay (cookie → Authorization, or terminal rejection)
//!     → server.rs (forward to upstream, stream response back)
//!     → Send to client
//! ```

pub mod server;

pub use server::{AppState, BuildError, HttpServer};
