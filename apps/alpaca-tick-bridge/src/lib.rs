#![cfg_attr(
    test,
    allow(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::significant_drop_tightening,
        clippy::too_many_lines,
        clippy::needless_pass_by_value,
        clippy::items_after_statements
    )
)]

//! Alpaca Tick Bridge - Live Market Data Normalizer
//!
//! Keeps equity symbols subscribed on Alpaca's real-time stock stream and
//! turns the feed's quote/trade events into ticks stamped in each
//! instrument's exchange time zone, handed to a downstream aggregator.
//!
//! # Layers (inside → outside)
//!
//! - **Domain**: Core market data types and rules
//!   - `symbol`: Instrument identifiers
//!   - `streaming`: Upstream events and canonical ticks
//!   - `subscription`: Subscription set and the eligibility rule
//!
//! - **Application**: Use cases and port definitions
//!   - `ports`: Streaming feed, tick sink, exchange-hours provider
//!   - `services`: Subscription registry, time zone cache, event normalizer
//!
//! - **Infrastructure**: Adapters and external integrations
//!   - `alpaca`: WebSocket client for the stock stream
//!   - `aggregator`: Broadcast-backed tick sink
//!   - `exchange_hours`: Static exchange time zone table
//!   - `config`: Environment configuration
//!   - `health`: Health check HTTP endpoint
//!
//! # Data Flow
//!
//! ```text
//!                 subscribe/unsubscribe
//! Registry ──────────────────────────────► Alpaca stock WS
//!    │                                          │
//!    │ subscription set        quote/trade      │
//!    ▼                                          ▼
//! Normalizer ◄──────────────────────────────────┘
//!    │  (UTC → exchange time)
//!    ▼
//! Aggregator ──► subscriber 1 .. N
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]

// =============================================================================
// Module Declarations
// =============================================================================

/// Domain layer - Core market data types with no I/O.
pub mod domain;

/// Application layer - Use cases and port definitions.
pub mod application;

/// Infrastructure layer - Adapters and external integrations.
pub mod infrastructure;

// =============================================================================
// Re-exports
// =============================================================================

// Domain types
pub use domain::streaming::{QuoteEvent, Tick, TickKind, TradeEvent};
pub use domain::subscription::{
    SubscriptionChanges, SubscriptionDataConfig, SubscriptionSet, SubscriptionStats,
    can_subscribe,
};
pub use domain::symbol::{Market, SecurityType, Symbol};

// Ports and services
pub use application::ports::{
    ExchangeHoursError, ExchangeHoursProvider, FeedError, StreamEventHandler, StreamingFeed,
    TickSink, TickStream,
};
pub use application::services::{
    BridgeError, EventNormalizer, ExchangeTimeZoneCache, NormalizeOutcome, SubscriptionRegistry,
    TickBridge,
};

// Infrastructure config
pub use infrastructure::config::{
    AggregatorSettings, BridgeConfig, ConfigError, ServerSettings, StreamSettings,
};

// Adapters
pub use infrastructure::aggregator::{AggregatorConfig, TickAggregator};
pub use infrastructure::alpaca::{
    AlpacaStreamClient, Credentials, DataFeed, StreamClientConfig, StreamClientError,
};
pub use infrastructure::exchange_hours::MarketHoursDatabase;

// Health server
pub use infrastructure::health::{HealthServer, HealthServerError, HealthServerState};

// Metrics
pub use infrastructure::metrics::init_metrics;

// Telemetry
pub use infrastructure::telemetry::{TelemetryConfig, TelemetryGuard, init as init_telemetry};
