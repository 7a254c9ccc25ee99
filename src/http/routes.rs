//! Dispatcher handlers owned by the gateway itself.
//!
//! Page handlers forward to the [`Storefront`]; currency selection, logout,
//! robots and health are answered here.

use axum::extract::{Form, Path, State};
use axum::http::header::{LOCATION, REFERER};
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};

use crate::http::cookies::{self, CURRENCY_COOKIE};
use crate::http::currency::CurrencyCode;
use crate::http::request::RequestContext;
use crate::http::response::HandlerError;
use crate::http::server::AppState;
use crate::http::storefront::{FormFields, HandlerResult, Storefront};

pub const ROBOTS_TXT: &str = "User-agent: *\nDisallow: /";

pub async fn home<S: Storefront>(State(state): State<AppState<S>>, ctx: RequestContext) -> HandlerResult {
    state.storefront.home(ctx).await
}

pub async fn product<S: Storefront>(
    State(state): State<AppState<S>>,
    ctx: RequestContext,
    Path(id): Path<String>,
) -> HandlerResult {
    state.storefront.product(ctx, id).await
}

pub async fn view_cart<S: Storefront>(
    State(state): State<AppState<S>>,
    ctx: RequestContext,
) -> HandlerResult {
    state.storefront.view_cart(ctx).await
}

pub async fn add_to_cart<S: Storefront>(
    State(state): State<AppState<S>>,
    ctx: RequestContext,
    Form(form): Form<FormFields>,
) -> HandlerResult {
    state.storefront.add_to_cart(ctx, form).await
}

pub async fn empty_cart<S: Storefront>(
    State(state): State<AppState<S>>,
    ctx: RequestContext,
) -> HandlerResult {
    state.storefront.empty_cart(ctx).await
}

pub async fn place_order<S: Storefront>(
    State(state): State<AppState<S>>,
    ctx: RequestContext,
    Form(form): Form<FormFields>,
) -> HandlerResult {
    state.storefront.place_order(ctx, form).await
}

/// `POST /setCurrency`: store the chosen currency and go back where the user came from.
pub async fn set_currency(headers: HeaderMap, Form(form): Form<FormFields>) -> HandlerResult {
    let requested = form.get("currency_code").map(String::as_str).unwrap_or_default();
    let currency = requested
        .parse::<CurrencyCode>()
        .map_err(|e| HandlerError::BadRequest(format!("{e}")))?;

    let location = headers
        .get(REFERER)
        .filter(|value| !value.is_empty())
        .cloned()
        .unwrap_or(HeaderValue::from_static("/"));

    tracing::debug!(currency = %currency, "Currency updated");
    Ok(found(
        location,
        [cookies::persistent(CURRENCY_COOKIE, currency.as_str())],
    ))
}

/// `GET /logout`: expire every cookie the client sent.
pub async fn logout(headers: HeaderMap) -> Response {
    let expired = cookies::request_cookie_names(&headers)
        .into_iter()
        .map(|name| cookies::expired(&name));
    found(HeaderValue::from_static("/"), expired)
}

pub async fn robots() -> &'static str {
    ROBOTS_TXT
}

pub async fn healthz() -> &'static str {
    "ok"
}

pub async fn not_found() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, "404 page not found")
}

/// 302 to `location` with the given `Set-Cookie` values.
fn found(location: HeaderValue, set_cookies: impl IntoIterator<Item = String>) -> Response {
    let mut response = StatusCode::FOUND.into_response();
    let headers = response.headers_mut();
    headers.insert(LOCATION, location);
    for cookie in set_cookies {
        cookies::append_set_cookie(headers, &cookie);
    }
    response
}
