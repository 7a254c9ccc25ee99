//! Backend connection lifecycle.
//!
//! # Responsibilities
//! - Resolve one address per backend service
//! - Dial every backend once at startup, bounded by the dial timeout
//! - Wrap each channel with the trace-propagating interceptor
//! - Hand out cheap clones of the shared channels
//!
//! # Design Decisions
//! - Plaintext HTTP/2 (`http://`): demo-grade transport, no TLS
//! - Fail fast: the first missing address or failed dial aborts startup and
//!   drops every channel built so far
//! - No reconnect or retry policy of our own. A tonic `Channel` re-establishes
//!   its connection on the next call after a drop; calls issued while the
//!   backend is unreachable fail with `Unavailable` and are not retried here

use std::fmt;
use std::time::Duration;

use thiserror::Error;
use tokio::time::timeout;
use tonic::service::interceptor::InterceptedService;
use tonic::transport::{Channel, Endpoint};

use crate::backends::interceptor::TracePropagation;
use crate::backends::service::BackendService;
use crate::config::BackendAddresses;

/// Channel handle given to handlers; every call carries the trace context.
pub type BackendChannel = InterceptedService<Channel, TracePropagation>;

/// Errors raised while establishing backend connections.
#[derive(Debug, Error)]
pub enum ConnectError {
    #[error("no address configured for {service} ({var})")]
    MissingAddress {
        service: BackendService,
        var: &'static str,
    },

    #[error("grpc: invalid address {address} for {service}: {source}")]
    InvalidAddress {
        service: BackendService,
        address: String,
        #[source]
        source: tonic::transport::Error,
    },

    #[error("grpc: failed to connect {address} ({service}): {source}")]
    Dial {
        service: BackendService,
        address: String,
        #[source]
        source: tonic::transport::Error,
    },

    #[error("grpc: failed to connect {address} ({service}): timed out after {timeout:?}")]
    Timeout {
        service: BackendService,
        address: String,
        timeout: Duration,
    },
}

/// One connected backend.
#[derive(Clone)]
pub struct BackendEndpoint {
    service: BackendService,
    address: String,
    channel: BackendChannel,
}

impl BackendEndpoint {
    fn new(service: BackendService, address: String, channel: Channel) -> Self {
        Self {
            service,
            address,
            channel: InterceptedService::new(channel, TracePropagation),
        }
    }

    pub fn service(&self) -> BackendService {
        self.service
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn channel(&self) -> BackendChannel {
        self.channel.clone()
    }
}

impl fmt::Debug for BackendEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackendEndpoint")
            .field("service", &self.service)
            .field("address", &self.address)
            .finish_non_exhaustive()
    }
}

/// The fixed set of backend connections, immutable after construction.
#[derive(Debug, Clone)]
pub struct ConnectionManager {
    product_catalog: BackendEndpoint,
    currency: BackendEndpoint,
    cart: BackendEndpoint,
    recommendation: BackendEndpoint,
    checkout: BackendEndpoint,
    shipping: BackendEndpoint,
    ad: BackendEndpoint,
}

impl ConnectionManager {
    /// Dial every backend. Any failure aborts the whole set.
    pub async fn connect(
        addresses: &BackendAddresses,
        dial_timeout: Duration,
    ) -> Result<Self, ConnectError> {
        let dial = |service| dial(addresses, service, dial_timeout);

        // Same order as BackendService::ALL.
        let currency = dial(BackendService::Currency).await?;
        let product_catalog = dial(BackendService::ProductCatalog).await?;
        let cart = dial(BackendService::Cart).await?;
        let recommendation = dial(BackendService::Recommendation).await?;
        let shipping = dial(BackendService::Shipping).await?;
        let checkout = dial(BackendService::Checkout).await?;
        let ad = dial(BackendService::Ad).await?;

        Ok(Self {
            product_catalog,
            currency,
            cart,
            recommendation,
            checkout,
            shipping,
            ad,
        })
    }

    /// Build channels without dialing; each connects on first use.
    ///
    /// Must be called inside a Tokio runtime. Used by tests and tooling that
    /// exercise the HTTP pipeline without live backends.
    pub fn connect_lazy(addresses: &BackendAddresses) -> Result<Self, ConnectError> {
        let lazy = |service| -> Result<BackendEndpoint, ConnectError> {
            let address = resolve(addresses, service)?;
            let channel = endpoint(service, &address)?.connect_lazy();
            Ok(BackendEndpoint::new(service, address, channel))
        };

        Ok(Self {
            product_catalog: lazy(BackendService::ProductCatalog)?,
            currency: lazy(BackendService::Currency)?,
            cart: lazy(BackendService::Cart)?,
            recommendation: lazy(BackendService::Recommendation)?,
            checkout: lazy(BackendService::Checkout)?,
            shipping: lazy(BackendService::Shipping)?,
            ad: lazy(BackendService::Ad)?,
        })
    }

    pub fn endpoint(&self, service: BackendService) -> &BackendEndpoint {
        match service {
            BackendService::ProductCatalog => &self.product_catalog,
            BackendService::Currency => &self.currency,
            BackendService::Cart => &self.cart,
            BackendService::Recommendation => &self.recommendation,
            BackendService::Checkout => &self.checkout,
            BackendService::Shipping => &self.shipping,
            BackendService::Ad => &self.ad,
        }
    }

    /// Shared channel for `service`.
    pub fn connection(&self, service: BackendService) -> BackendChannel {
        self.endpoint(service).channel()
    }
}

fn resolve(addresses: &BackendAddresses, service: BackendService) -> Result<String, ConnectError> {
    addresses
        .address(service)
        .map(str::to_owned)
        .ok_or(ConnectError::MissingAddress {
            service,
            var: service.env_var(),
        })
}

fn endpoint(service: BackendService, address: &str) -> Result<Endpoint, ConnectError> {
    Endpoint::from_shared(format!("http://{address}")).map_err(|source| {
        ConnectError::InvalidAddress {
            service,
            address: address.to_string(),
            source,
        }
    })
}

async fn dial(
    addresses: &BackendAddresses,
    service: BackendService,
    dial_timeout: Duration,
) -> Result<BackendEndpoint, ConnectError> {
    let address = resolve(addresses, service)?;
    let endpoint = endpoint(service, &address)?.connect_timeout(dial_timeout);

    tracing::debug!(service = %service, address = %address, "Dialing backend");

    let channel = match timeout(dial_timeout, endpoint.connect()).await {
        Ok(Ok(channel)) => channel,
        Ok(Err(source)) => {
            return Err(ConnectError::Dial {
                service,
                address,
                source,
            })
        }
        Err(_) => {
            return Err(ConnectError::Timeout {
                service,
                address,
                timeout: dial_timeout,
            })
        }
    };

    tracing::info!(service = %service, address = %address, "Backend connected");
    Ok(BackendEndpoint::new(service, address, channel))
}
