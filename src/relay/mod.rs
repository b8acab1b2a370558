//! Cookie-to-bearer token relay.
//!
//! # Data Flow
//! ```text
//! Incoming request
//!     → cookie.rs (first cookie named `cookie_name`)         ✗ 401
//!     → payload.rs (strip `base64-` prefix)                    ✗ 400
//!     → payload.rs (standard base64 decode)                    ✗ 400
//!     → payload.rs (parse JSON object)                         ✗ 400
//!     → payload.rs (`access_token` must be a string)           ✗ 401
//!     → step.rs (set `Authorization: Bearer <token>`)
//!     → next step in the chain
//! ```
//!
//! # Design Decisions
//! - The token is relayed as an opaque string; nothing about it is verified
//! - Every rejection is terminal and the next step never runs
//! - Configuration is per relay instance, never process-wide

pub mod cookie;
pub mod error;
pub mod exchange;
pub mod payload;
pub mod step;

pub use error::{InvalidRelayConfig, RelayError};
pub use exchange::{Exchange, NextStep};
pub use payload::{
    decode_session_cookie, encode_access_token, encode_session_cookie, ACCESS_TOKEN_FIELD,
    COOKIE_PREFIX,
};
pub use step::{apply, relay_middleware, TokenRelay};
