//! The fixed set of backend RPC services the gateway talks to.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A named backend service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendService {
    ProductCatalog,
    Currency,
    Cart,
    Recommendation,
    Checkout,
    Shipping,
    Ad,
}

impl BackendService {
    /// Every service, in dial order.
    pub const ALL: [BackendService; 7] = [
        BackendService::Currency,
        BackendService::ProductCatalog,
        BackendService::Cart,
        BackendService::Recommendation,
        BackendService::Shipping,
        BackendService::Checkout,
        BackendService::Ad,
    ];

    /// Environment variable holding this service's `host:port`.
    pub fn env_var(self) -> &'static str {
        match self {
            BackendService::ProductCatalog => "PRODUCT_CATALOG_SERVICE_ADDR",
            BackendService::Currency => "CURRENCY_SERVICE_ADDR",
            BackendService::Cart => "CART_SERVICE_ADDR",
            BackendService::Recommendation => "RECOMMENDATION_SERVICE_ADDR",
            BackendService::Checkout => "CHECKOUT_SERVICE_ADDR",
            BackendService::Shipping => "SHIPPING_SERVICE_ADDR",
            BackendService::Ad => "AD_SERVICE_ADDR",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            BackendService::ProductCatalog => "productcatalog",
            BackendService::Currency => "currency",
            BackendService::Cart => "cart",
            BackendService::Recommendation => "recommendation",
            BackendService::Checkout => "checkout",
            BackendService::Shipping => "shipping",
            BackendService::Ad => "ad",
        }
    }
}

impl fmt::Display for BackendService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
