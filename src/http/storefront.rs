//! Page handlers the dispatcher delegates to.
//!
//! Rendering and business logic live behind [`Storefront`]. Every method has
//! a default that answers 501, so an implementation only overrides the pages
//! it serves.

use std::collections::HashMap;
use std::future::Future;

use axum::response::Response;

use crate::http::request::RequestContext;
use crate::http::response::HandlerError;

/// Decoded `application/x-www-form-urlencoded` body.
pub type FormFields = HashMap<String, String>;

pub type HandlerResult = Result<Response, HandlerError>;

pub trait Storefront: Send + Sync + 'static {
    fn home(&self, _ctx: RequestContext) -> impl Future<Output = HandlerResult> + Send {
        async { Err(HandlerError::NotImplemented("home page")) }
    }

    fn product(
        &self,
        _ctx: RequestContext,
        _id: String,
    ) -> impl Future<Output = HandlerResult> + Send {
        async { Err(HandlerError::NotImplemented("product page")) }
    }

    fn view_cart(&self, _ctx: RequestContext) -> impl Future<Output = HandlerResult> + Send {
        async { Err(HandlerError::NotImplemented("cart page")) }
    }

    fn add_to_cart(
        &self,
        _ctx: RequestContext,
        _form: FormFields,
    ) -> impl Future<Output = HandlerResult> + Send {
        async { Err(HandlerError::NotImplemented("add to cart")) }
    }

    fn empty_cart(&self, _ctx: RequestContext) -> impl Future<Output = HandlerResult> + Send {
        async { Err(HandlerError::NotImplemented("empty cart")) }
    }

    fn place_order(
        &self,
        _ctx: RequestContext,
        _form: FormFields,
    ) -> impl Future<Output = HandlerResult> + Send {
        async { Err(HandlerError::NotImplemented("checkout")) }
    }
}

/// Storefront with no pages linked in; every page answers 501.
#[derive(Debug, Clone, Copy, Default)]
pub struct NotLinkedStorefront;

impl Storefront for NotLinkedStorefront {}
