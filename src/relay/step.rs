//! The token relay step.
//!
//! # Responsibilities
//! - Find the configured session cookie
//! - Decode it and pull out `access_token`
//! - Publish it as `Authorization: Bearer <token>`
//! - Reject with a terminal status otherwise; the chain stops there

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::HeaderValue,
    middleware::{self, Next},
    response::{IntoResponse, Response},
    Router,
};

use crate::config::RelayConfig;
use crate::observability::metrics;
use crate::relay::error::{InvalidRelayConfig, RelayError};
use crate::relay::exchange::{Exchange, NextStep};
use crate::relay::payload::decode_session_cookie;

/// Relays a cookie-held access token into the `Authorization` header.
///
/// Cloning is cheap; clones share the same immutable configuration.
#[derive(Debug, Clone)]
pub struct TokenRelay {
    config: Arc<RelayConfig>,
}

impl TokenRelay {
    /// Bind a relay to its configuration.
    pub fn new(config: RelayConfig) -> Result<Self, InvalidRelayConfig> {
        if config.cookie_name.is_empty() {
            return Err(InvalidRelayConfig::EmptyCookieName);
        }

        Ok(Self {
            config: Arc::new(config),
        })
    }

    pub fn config(&self) -> &RelayConfig {
        &self.config
    }

    /// Rewrite `exchange` and hand it to `next`.
    ///
    /// On any error `next` is dropped without being invoked and the error is
    /// the terminal response for the request.
    pub async fn handle<E, N>(&self, mut exchange: E, next: N) -> Result<N::Output, RelayError>
    where
        E: Exchange,
        N: NextStep<E>,
    {
        let token = self.extract_token(&exchange)?;
        exchange.set_authorization(bearer(&token)?);
        Ok(next.process(exchange).await)
    }

    /// Read and decode the session cookie without touching the exchange.
    pub fn extract_token<E: Exchange>(&self, exchange: &E) -> Result<String, RelayError> {
        let raw = exchange
            .cookie(&self.config.cookie_name)
            .ok_or(RelayError::CookieNotFound)?;

        decode_session_cookie(raw)
    }
}

/// `Bearer <token>` as a redacted header value.
fn bearer(token: &str) -> Result<HeaderValue, RelayError> {
    let mut value =
        HeaderValue::try_from(format!("Bearer {token}")).map_err(|_| RelayError::InvalidToken)?;
    value.set_sensitive(true);
    Ok(value)
}

/// axum adapter running [`TokenRelay::handle`] in a middleware chain.
pub async fn relay_middleware(
    State(relay): State<TokenRelay>,
    req: Request,
    next: Next,
) -> Response {
    match relay.handle(req, next).await {
        Ok(response) => {
            metrics::record_relay_outcome("relayed");
            response
        }
        Err(err) => {
            match std::error::Error::source(&err) {
                Some(cause) => tracing::debug!(
                    reason = err.kind(),
                    status = %err.status(),
                    cause = %cause,
                    "Request rejected by token relay"
                ),
                None => tracing::debug!(
                    reason = err.kind(),
                    status = %err.status(),
                    "Request rejected by token relay"
                ),
            }
            metrics::record_relay_outcome(err.kind());
            err.into_response()
        }
    }
}

/// Put the relay in front of every route of `router`.
pub fn apply<S>(router: Router<S>, relay: TokenRelay) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    router.layer(middleware::from_fn_with_state(relay, relay_middleware))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::relay::payload::{encode_access_token, encode_session_cookie, COOKIE_PREFIX};
    use axum::body::Body;
    use axum::http::{header, HeaderMap, StatusCode};
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine as _;
    use serde_json::json;
    use std::future::Future;
    use std::sync::Mutex;
    use tower::ServiceExt;

    /// Stands in for the downstream chain and remembers what it saw.
    #[derive(Clone, Default)]
    struct Recorder {
        seen: Arc<Mutex<Vec<HeaderMap>>>,
    }

    impl Recorder {
        fn calls(&self) -> usize {
            self.seen.lock().unwrap().len()
        }

        fn last_authorization(&self) -> Option<String> {
            self.seen
                .lock()
                .unwrap()
                .last()
                .and_then(|h| h.get(header::AUTHORIZATION))
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        }
    }

    impl NextStep<axum::http::Request<Body>> for Recorder {
        type Output = StatusCode;

        fn process(
            self,
            exchange: axum::http::Request<Body>,
        ) -> impl Future<Output = StatusCode> + Send {
            async move {
                self.seen.lock().unwrap().push(exchange.headers().clone());
                StatusCode::OK
            }
        }
    }

    fn relay() -> TokenRelay {
        TokenRelay::new(RelayConfig::default()).unwrap()
    }

    fn request_with_cookie(value: &str) -> axum::http::Request<Body> {
        axum::http::Request::builder()
            .uri("http://localhost/")
            .header(header::COOKIE, format!("sb-api-auth-token={value}"))
            .body(Body::empty())
            .unwrap()
    }

    fn wrap_json(body: &str) -> String {
        format!("{}{}", COOKIE_PREFIX, STANDARD.encode(body))
    }

    #[test]
    fn test_new_rejects_empty_cookie_name() {
        let config = RelayConfig {
            cookie_name: String::new(),
            ..RelayConfig::default()
        };
        assert_eq!(
            TokenRelay::new(config).unwrap_err(),
            InvalidRelayConfig::EmptyCookieName
        );
    }

    #[test]
    fn test_new_accepts_any_non_empty_name() {
        for name in ["a", "test_cookie", "sb-api-auth-token", " "] {
            let config = RelayConfig {
                cookie_name: name.to_string(),
                ..RelayConfig::default()
            };
            let relay = TokenRelay::new(config).unwrap();
            assert_eq!(relay.config().cookie_name, name);
        }
    }

    #[tokio::test]
    async fn test_valid_cookie_sets_bearer_header() {
        let next = Recorder::default();
        let req = request_with_cookie(&encode_access_token("test-jwt-token"));

        let out = relay().handle(req, next.clone()).await.unwrap();

        assert_eq!(out, StatusCode::OK);
        assert_eq!(next.calls(), 1);
        assert_eq!(next.last_authorization().as_deref(), Some("Bearer test-jwt-token"));
    }

    #[tokio::test]
    async fn test_existing_authorization_is_replaced() {
        let next = Recorder::default();
        let mut req = request_with_cookie(&encode_access_token("fresh"));
        req.headers_mut()
            .append(header::AUTHORIZATION, HeaderValue::from_static("Basic Zm9vOmJhcg=="));
        req.headers_mut()
            .append(header::AUTHORIZATION, HeaderValue::from_static("Bearer stale"));

        relay().handle(req, next.clone()).await.unwrap();

        let seen = next.seen.lock().unwrap();
        let values: Vec<_> = seen[0].get_all(header::AUTHORIZATION).iter().collect();
        assert_eq!(values, vec![&HeaderValue::from_static("Bearer fresh")]);
    }

    #[tokio::test]
    async fn test_header_value_is_sensitive() {
        let next = Recorder::default();
        relay()
            .handle(request_with_cookie(&encode_access_token("secret")), next.clone())
            .await
            .unwrap();

        let seen = next.seen.lock().unwrap();
        assert!(seen[0].get(header::AUTHORIZATION).unwrap().is_sensitive());
    }

    #[tokio::test]
    async fn test_missing_cookie() {
        let next = Recorder::default();
        let req = axum::http::Request::builder()
            .header(header::COOKIE, "unrelated=1")
            .body(Body::empty())
            .unwrap();

        let err = relay().handle(req, next.clone()).await.unwrap_err();

        assert!(matches!(err, RelayError::CookieNotFound));
        assert_eq!(err.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(next.calls(), 0);
    }

    #[tokio::test]
    async fn test_bare_or_space_led_cookie_fails_prefix() {
        let token = encode_access_token("t");
        for line in ["sb-api-auth-token".to_string(), format!("sb-api-auth-token= {token}")] {
            let next = Recorder::default();
            let req = axum::http::Request::builder()
                .header(header::COOKIE, line.as_str())
                .body(Body::empty())
                .unwrap();

            let err = relay().handle(req, next.clone()).await.unwrap_err();

            assert!(matches!(err, RelayError::MissingPrefix), "{line:?}");
            assert_eq!(err.status(), StatusCode::BAD_REQUEST);
            assert_eq!(next.calls(), 0);
        }
    }

    #[tokio::test]
    async fn test_rejections_never_reach_next() {
        let cases = [
            ("invalid-prefix-xyz".to_string(), StatusCode::BAD_REQUEST, "Cookie value does not start with 'base64-'"),
            (String::new(), StatusCode::BAD_REQUEST, "Cookie value does not start with 'base64-'"),
            ("base64-not-base64-content".to_string(), StatusCode::BAD_REQUEST, "Failed to decode cookie value"),
            (wrap_json("invalid json"), StatusCode::BAD_REQUEST, "Failed to parse JSON"),
            (wrap_json("[\"access_token\"]"), StatusCode::BAD_REQUEST, "Failed to parse JSON"),
            (wrap_json("\"scalar\""), StatusCode::BAD_REQUEST, "Failed to parse JSON"),
            (wrap_json(r#"{"other_field":"value"}"#), StatusCode::UNAUTHORIZED, "No valid access_token found"),
            (wrap_json(r#"{"access_token":42}"#), StatusCode::UNAUTHORIZED, "No valid access_token found"),
            (wrap_json(r#"{"access_token":{"a":"b"}}"#), StatusCode::UNAUTHORIZED, "No valid access_token found"),
        ];

        for (value, status, message) in cases {
            let next = Recorder::default();
            let err = relay()
                .handle(request_with_cookie(&value), next.clone())
                .await
                .unwrap_err();

            assert_eq!(err.status(), status, "status for {value:?}");
            assert_eq!(err.to_string(), message, "message for {value:?}");
            assert_eq!(next.calls(), 0, "next invoked for {value:?}");
        }
    }

    #[tokio::test]
    async fn test_token_with_control_characters_is_rejected() {
        let mut payload = serde_json::Map::new();
        payload.insert("access_token".into(), json!("line\nbreak"));
        let next = Recorder::default();

        let err = relay()
            .handle(request_with_cookie(&encode_session_cookie(&payload)), next.clone())
            .await
            .unwrap_err();

        assert!(matches!(err, RelayError::InvalidToken));
        assert_eq!(next.calls(), 0);
    }

    #[tokio::test]
    async fn test_independent_exchanges_get_same_header() {
        let relay = relay();
        let cookie = encode_access_token("test-jwt-token");
        let first = Recorder::default();
        let second = Recorder::default();

        relay.handle(request_with_cookie(&cookie), first.clone()).await.unwrap();
        relay.handle(request_with_cookie(&cookie), second.clone()).await.unwrap();

        assert_eq!(first.last_authorization(), second.last_authorization());
        assert_eq!(first.last_authorization().as_deref(), Some("Bearer test-jwt-token"));
    }

    #[tokio::test]
    async fn test_relays_are_configured_independently() {
        let custom = TokenRelay::new(RelayConfig {
            cookie_name: "custom".into(),
            ..RelayConfig::default()
        })
        .unwrap();
        let default = relay();

        let req = || {
            axum::http::Request::builder()
                .header(header::COOKIE, format!("custom={}", encode_access_token("c")))
                .body(Body::empty())
                .unwrap()
        };

        assert!(custom.handle(req(), Recorder::default()).await.is_ok());
        assert!(matches!(
            default.handle(req(), Recorder::default()).await,
            Err(RelayError::CookieNotFound)
        ));
    }

    async fn echo_authorization(req: Request) -> String {
        req.headers()
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string()
    }

    #[tokio::test]
    async fn test_middleware_in_router() {
        let app = apply(
            Router::new().route("/", axum::routing::get(echo_authorization)),
            relay(),
        );

        let ok = app
            .clone()
            .oneshot(request_with_cookie(&encode_access_token("test-jwt-token")))
            .await
            .unwrap();
        assert_eq!(ok.status(), StatusCode::OK);
        let body = axum::body::to_bytes(ok.into_body(), 1024).await.unwrap();
        assert_eq!(&body[..], b"Bearer test-jwt-token");

        let rejected = app
            .oneshot(request_with_cookie("invalid-prefix-xyz"))
            .await
            .unwrap();
        assert_eq!(rejected.status(), StatusCode::BAD_REQUEST);
        let body = axum::body::to_bytes(rejected.into_body(), 1024).await.unwrap();
        assert_eq!(&body[..], b"Cookie value does not start with 'base64-'");
    }
}
