//! Tick Aggregator
//!
//! Downstream sink for normalized ticks. Ticks are fanned out over a single
//! tokio broadcast channel; each subscriber gets a lazy stream filtered to
//! its descriptor's symbol and tick kinds.
//!
//! # Backpressure
//!
//! The channel holds a fixed number of ticks. A subscriber that falls more
//! than that far behind skips the overwritten ticks and keeps going; the
//! emitting side never waits.

use tokio::sync::broadcast;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use uuid::Uuid;

use crate::AggregatorSettings;
use crate::application::ports::{TickSink, TickStream};
use crate::domain::streaming::Tick;
use crate::domain::subscription::SubscriptionDataConfig;
use crate::infrastructure::metrics;

// =============================================================================
// Configuration
// =============================================================================

/// Aggregator channel configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AggregatorConfig {
    /// Number of ticks buffered for slow subscribers.
    pub capacity: usize,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self { capacity: 10_000 }
    }
}

impl From<AggregatorSettings> for AggregatorConfig {
    fn from(settings: AggregatorSettings) -> Self {
        Self {
            capacity: settings.tick_capacity,
        }
    }
}

// =============================================================================
// Aggregator
// =============================================================================

/// Broadcast-backed [`TickSink`].
#[derive(Debug)]
pub struct TickAggregator {
    ticks_tx: broadcast::Sender<Tick>,
}

impl TickAggregator {
    /// Create a new aggregator with the given configuration.
    #[must_use]
    pub fn new(config: AggregatorConfig) -> Self {
        Self {
            ticks_tx: broadcast::channel(config.capacity.max(1)).0,
        }
    }

    /// Create a new aggregator with default configuration.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(AggregatorConfig::default())
    }

    /// Send a tick to all subscribers.
    ///
    /// Returns the number of subscribers that received the tick, or `None`
    /// if there are no active subscribers.
    pub fn send(&self, tick: Tick) -> Option<usize> {
        self.ticks_tx.send(tick).ok()
    }

    /// Get the number of live subscriber streams.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.ticks_tx.receiver_count()
    }
}

impl TickSink for TickAggregator {
    fn emit(&self, tick: Tick) {
        if self.send(tick).is_none() {
            tracing::trace!("No subscribers for tick");
        }
    }

    fn add(&self, config: &SubscriptionDataConfig) -> TickStream {
        let subscriber_id = Uuid::new_v4();
        let config = config.clone();

        tracing::debug!(
            subscriber_id = %subscriber_id,
            symbol = %config.symbol(),
            "Adding tick subscriber"
        );

        let stream = BroadcastStream::new(self.ticks_tx.subscribe()).filter_map(move |item| match item {
            Ok(tick) if config.accepts(&tick) => Some(tick),
            Ok(_) => None,
            Err(BroadcastStreamRecvError::Lagged(skipped)) => {
                tracing::warn!(
                    subscriber_id = %subscriber_id,
                    symbol = %config.symbol(),
                    skipped,
                    "Subscriber lagged, ticks skipped"
                );
                metrics::record_subscriber_lagged(skipped);
                None
            }
        });

        Box::pin(stream)
    }
}

// =============================================================================
// Tests
// =============================================================================
