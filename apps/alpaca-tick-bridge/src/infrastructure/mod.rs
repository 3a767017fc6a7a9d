//! Infrastructure Layer - Adapters and external integrations.
//!
//! This layer contains the concrete implementations of the port interfaces
//! defined in the application layer.

/// Downstream tick aggregator (broadcast fan-out).
pub mod aggregator;

/// Alpaca stock stream client.
pub mod alpaca;

/// Configuration loading.
pub mod config;

/// Exchange-hours database (instrument time zones).
pub mod exchange_hours;

/// Health check HTTP endpoint.
pub mod health;

/// Prometheus metrics instrumentation.
pub mod metrics;

/// OpenTelemetry tracing integration.
pub mod telemetry;
