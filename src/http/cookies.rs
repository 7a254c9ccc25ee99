//! Storefront cookies.
//!
//! Parsing goes through `cookie::Cookie::split_parse` so quoting and
//! whitespace follow RFC 6265; malformed pairs are skipped.

use axum::http::header::{COOKIE, SET_COOKIE};
use axum::http::{HeaderMap, HeaderValue};
use cookie::time::Duration;
use cookie::Cookie;

/// Opaque per-client session identifier.
pub const SESSION_COOKIE: &str = "shop_session-id";

/// Selected display currency.
pub const CURRENCY_COOKIE: &str = "shop_currency";

/// Lifetime of both cookies: 48 hours.
pub const COOKIE_MAX_AGE_SECS: i64 = 172_800;

fn request_cookies(headers: &HeaderMap) -> impl Iterator<Item = Cookie<'_>> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(Cookie::split_parse)
        .filter_map(Result::ok)
}

/// Value of cookie `name` on the request, if present and non-empty.
pub fn request_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    request_cookies(headers)
        .find(|cookie| cookie.name() == name)
        .map(|cookie| cookie.value().to_string())
        .filter(|value| !value.is_empty())
}

/// Names of every cookie the request carries, without duplicates.
pub fn request_cookie_names(headers: &HeaderMap) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for cookie in request_cookies(headers) {
        if !names.iter().any(|n| n == cookie.name()) {
            names.push(cookie.name().to_string());
        }
    }
    names
}

/// `Set-Cookie` value for a cookie that lives for [`COOKIE_MAX_AGE_SECS`].
pub fn persistent(name: &str, value: &str) -> String {
    Cookie::build((name, value))
        .path("/")
        .max_age(Duration::seconds(COOKIE_MAX_AGE_SECS))
        .build()
        .to_string()
}

/// `Set-Cookie` value that makes the browser drop `name`.
pub fn expired(name: &str) -> String {
    Cookie::build((name, ""))
        .path("/")
        .max_age(Duration::ZERO)
        .build()
        .to_string()
}

/// Append `cookie` as a `Set-Cookie` header. Values that are not valid header text are skipped.
pub fn append_set_cookie(headers: &mut HeaderMap, cookie: &str) {
    match HeaderValue::from_str(cookie) {
        Ok(value) => {
            headers.append(SET_COOKIE, value);
        }
        Err(_) => tracing::warn!("Dropping Set-Cookie with invalid header characters"),
    }
}

/// Whether the response already sets cookie `name`.
pub fn response_sets(headers: &HeaderMap, name: &str) -> bool {
    headers
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .filter_map(|value| Cookie::parse(value).ok())
        .any(|cookie| cookie.name() == name)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_cookie(value: &'static str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_static(value));
        headers
    }

    #[test]
    fn finds_cookie_among_several() {
        let headers = with_cookie("a=1; shop_session-id=abc; shop_currency=EUR");
        assert_eq!(request_cookie(&headers, SESSION_COOKIE).as_deref(), Some("abc"));
        assert_eq!(request_cookie(&headers, CURRENCY_COOKIE).as_deref(), Some("EUR"));
        assert_eq!(request_cookie(&headers, "missing"), None);
    }

    #[test]
    fn empty_value_counts_as_absent() {
        let headers = with_cookie("shop_session-id=");
        assert_eq!(request_cookie(&headers, SESSION_COOKIE), None);
    }

    #[test]
    fn reads_multiple_cookie_headers() {
        let mut headers = with_cookie("a=1");
        headers.append(COOKIE, HeaderValue::from_static("b=2; a=3"));
        assert_eq!(request_cookie_names(&headers), vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn persistent_cookie_carries_max_age_and_path() {
        let cookie = persistent(SESSION_COOKIE, "abc");
        assert!(cookie.starts_with("shop_session-id=abc"));
        assert!(cookie.contains("Max-Age=172800"));
        assert!(cookie.contains("Path=/"));
    }

    #[test]
    fn expired_cookie_has_zero_max_age() {
        let cookie = expired(CURRENCY_COOKIE);
        assert!(cookie.starts_with("shop_currency="));
        assert!(cookie.contains("Max-Age=0"));
    }

    #[test]
    fn detects_set_cookie_on_response() {
        let mut headers = HeaderMap::new();
        append_set_cookie(&mut headers, &expired(SESSION_COOKIE));
        assert!(response_sets(&headers, SESSION_COOKIE));
        assert!(!response_sets(&headers, CURRENCY_COOKIE));
    }
}
