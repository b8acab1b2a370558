//! Request cookie lookup.
//!
//! # Design Decisions
//! - Exact, case-sensitive name match
//! - First match wins across every `Cookie` header (HTTP/2 may split them)
//! - Header lines are split as bytes, so one bad pair never hides its siblings
//! - A pair without `=` is a cookie with an empty value
//! - Only the pair and its name are trimmed; the value keeps inner spaces
//! - Surrounding double quotes are stripped from the value
//! - Pairs with bytes that are not legal in a cookie value are skipped

use axum::http::{header, HeaderMap};

/// Find the first cookie named `name` in the request headers.
pub fn find_cookie<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .flat_map(|line| line.as_bytes().split(|b| *b == b';'))
        .map(|pair| pair.trim_ascii())
        .filter(|pair| !pair.is_empty())
        .filter_map(|pair| {
            let (key, value) = match pair.iter().position(|b| *b == b'=') {
                Some(eq) => (&pair[..eq], &pair[eq + 1..]),
                None => (pair, &b""[..]),
            };
            (key.trim_ascii() == name.as_bytes()).then_some(value)
        })
        .find_map(parse_value)
}

fn parse_value(raw: &[u8]) -> Option<&str> {
    let value = match raw {
        [b'"', inner @ .., b'"'] => inner,
        _ => raw,
    };

    if !value.iter().copied().all(is_cookie_octet) {
        return None;
    }
    std::str::from_utf8(value).ok()
}

fn is_cookie_octet(b: u8) -> bool {
    (0x20..0x7f).contains(&b) && b != b'"' && b != b';' && b != b'\\'
}
