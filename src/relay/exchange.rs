//! Seams between the relay step and the host chain.

use std::future::Future;

use axum::{
    extract::Request,
    http::{header, HeaderMap, HeaderValue},
    middleware::Next,
    response::Response,
};

use crate::relay::cookie::find_cookie;

/// Per-request view of what the relay needs from the host.
pub trait Exchange {
    /// Raw value of the first cookie named `name`.
    fn cookie(&self, name: &str) -> Option<&str>;

    /// Outbound request headers.
    fn headers_mut(&mut self) -> &mut HeaderMap;

    /// Replace every `Authorization` value with `value`.
    fn set_authorization(&mut self, value: HeaderValue) {
        self.headers_mut().insert(header::AUTHORIZATION, value);
    }
}

impl<B> Exchange for axum::http::Request<B> {
    fn cookie(&self, name: &str) -> Option<&str> {
        find_cookie(self.headers(), name)
    }

    fn headers_mut(&mut self) -> &mut HeaderMap {
        axum::http::Request::headers_mut(self)
    }
}

/// The rest of the chain, invoked once the exchange has been rewritten.
pub trait NextStep<E> {
    type Output;

    fn process(self, exchange: E) -> impl Future<Output = Self::Output> + Send;
}

impl NextStep<Request> for Next {
    type Output = Response;

    fn process(self, exchange: Request) -> impl Future<Output = Response> + Send {
        self.run(exchange)
    }
}
