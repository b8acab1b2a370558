//! Cookie-to-bearer token relay for reverse proxies.
//!
//! Browser sessions often keep the access token inside a cookie, while the
//! services behind the proxy expect `Authorization: Bearer <token>`. The
//! [`relay::TokenRelay`] step bridges the two; [`http::HttpServer`] runs it in
//! front of a single upstream.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod relay;

pub use config::GatewayConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use relay::{RelayError, TokenRelay};
