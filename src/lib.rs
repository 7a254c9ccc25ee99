//! # Storefront Gateway
//!
//! Edge gateway for a microservice storefront. Terminates browser HTTP,
//! assigns sessions, instruments every request and holds one long-lived
//! gRPC channel per backend service.
//!
//! ## Architecture Overview
//!
//! ```text
//!                              ┌──────────────────────────────────────────────────────────┐
//!                              │                   STOREFRONT GATEWAY                      │
//!                              │                                                          │
//!     Browser Request          │  ┌─────────┐   ┌─────────┐   ┌─────────┐   ┌──────────┐  │
//!     ─────────────────────────┼─▶│ request │──▶│ session │──▶│ request │──▶│telemetry │  │
//!                              │  │  span   │   │ cookie  │   │ logger  │   │ counters │  │
//!                              │  └─────────┘   └─────────┘   └─────────┘   └────┬─────┘  │
//!                              │                                                 │        │
//!                              │                                                 ▼        │
//!     Browser Response         │  ┌──────────────┐    ┌────────────┐     ┌────────────┐   │
//!     ◀────────────────────────┼──│  storefront  │◀───│ dispatcher │◀────│  routes    │   │
//!                              │  │  handlers    │    └────────────┘     └────────────┘   │
//!                              │  └──────┬───────┘                                        │
//!                              │         │ gRPC + traceparent                             │
//!                              │         ▼                                                │
//!                              │  ┌──────────────────────────────┐                        │
//!                              │  │ connection manager (7 chans) │────────────────────────┼──▶ Backends
//!                              │  └──────────────────────────────┘                        │
//!                              │                                                          │
//!                              │  ┌────────────────────────────────────────────────────┐  │
//!                              │  │              Cross-Cutting Concerns                 │  │
//!                              │  │  ┌─────────┐ ┌───────────────┐ ┌─────────────────┐  │  │
//!                              │  │  │ config  │ │ observability │ │    lifecycle    │  │  │
//!                              │  │  │ env+toml│ │ logs/otel/prom│ │ startup/shutdown│  │  │
//!                              │  │  └─────────┘ └───────────────┘ └─────────────────┘  │  │
//!                              │  └────────────────────────────────────────────────────┘  │
//!                              └──────────────────────────────────────────────────────────┘
//! ```

// Core subsystems
pub mod backends;
pub mod config;
pub mod http;

// Cross-cutting concerns
pub mod lifecycle;
pub mod observability;
