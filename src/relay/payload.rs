//! Session cookie payload codec.
//!
//! Wire format: `base64-` followed by standard, padded base64 of a UTF-8
//! JSON object carrying at least `"access_token": "<string>"`. Unused bits
//! in the final base64 symbol are ignored on decode.

use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig};
use base64::Engine as _;
use serde_json::{Map, Value};

use crate::relay::error::RelayError;

/// Literal prefix every session cookie value must start with.
pub const COOKIE_PREFIX: &str = "base64-";

/// Payload key holding the token to relay.
pub const ACCESS_TOKEN_FIELD: &str = "access_token";

/// Standard alphabet, padding required, trailing bits tolerated.
const SESSION_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_allow_trailing_bits(true),
);

/// Extract the access token from a raw session cookie value.
pub fn decode_session_cookie(raw: &str) -> Result<String, RelayError> {
    let encoded = raw
        .strip_prefix(COOKIE_PREFIX)
        .ok_or(RelayError::MissingPrefix)?;

    let decoded = SESSION_ENGINE
        .decode(encoded)
        .map_err(RelayError::InvalidBase64)?;

    // Decoding into a map rejects arrays, scalars and `null` at the top level.
    let mut payload: Map<String, Value> =
        serde_json::from_slice(&decoded).map_err(RelayError::InvalidJson)?;

    match payload.remove(ACCESS_TOKEN_FIELD) {
        Some(Value::String(token)) => Ok(token),
        _ => Err(RelayError::InvalidToken),
    }
}

/// Build a session cookie value from a JSON payload.
pub fn encode_session_cookie(payload: &Map<String, Value>) -> String {
    // Serializing a map of JSON values cannot fail.
    let json = Value::Object(payload.clone()).to_string();
    format!("{}{}", COOKIE_PREFIX, SESSION_ENGINE.encode(json))
}

/// Build a session cookie value carrying only `access_token`.
pub fn encode_access_token(token: &str) -> String {
    let mut payload = Map::new();
    payload.insert(ACCESS_TOKEN_FIELD.to_string(), Value::String(token.to_string()));
    encode_session_cookie(&payload)
}
