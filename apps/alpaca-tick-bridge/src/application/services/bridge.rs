//! Tick Bridge
//!
//! Descriptor-keyed public surface of the bridge. A subscriber hands in a
//! [`SubscriptionDataConfig`]; the bridge makes sure the symbol is live on
//! the upstream feed and returns the subscriber's tick sequence from the
//! sink.

use std::sync::Arc;

use thiserror::Error;

use crate::application::ports::{
    ExchangeHoursProvider, FeedError, StreamingFeed, TickSink, TickStream,
};
use crate::domain::subscription::SubscriptionDataConfig;

use super::{EventNormalizer, ExchangeTimeZoneCache, SubscriptionRegistry};

/// Bridge error.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// Upstream subscription request failed.
    #[error("Upstream feed error: {0}")]
    Feed(#[from] FeedError),
}

/// Wires the subscription registry, the event normalizer and the sink.
pub struct TickBridge {
    registry: SubscriptionRegistry,
    normalizer: Arc<EventNormalizer>,
    sink: Arc<dyn TickSink>,
}

impl TickBridge {
    /// Create a bridge over the three external collaborators.
    #[must_use]
    pub fn new(
        feed: Arc<dyn StreamingFeed>,
        sink: Arc<dyn TickSink>,
        exchange_hours: Arc<dyn ExchangeHoursProvider>,
    ) -> Self {
        let registry = SubscriptionRegistry::new(feed);
        let normalizer = Arc::new(EventNormalizer::new(
            registry.subscription_set(),
            ExchangeTimeZoneCache::new(exchange_hours),
            Arc::clone(&sink),
        ));

        Self {
            registry,
            normalizer,
            sink,
        }
    }

    /// Subscribe the descriptor's symbol and return its tick sequence.
    ///
    /// Ineligible symbols never reach the feed; their sequence simply
    /// stays empty.
    ///
    /// # Errors
    ///
    /// Returns an error if the upstream subscription request fails.
    pub fn subscribe(&self, config: &SubscriptionDataConfig) -> Result<TickStream, BridgeError> {
        self.registry.subscribe([config.symbol()])?;
        Ok(self.sink.add(config))
    }

    /// Unsubscribe the descriptor's symbol upstream.
    ///
    /// Existing tick sequences end when their owners drop them.
    ///
    /// # Errors
    ///
    /// Returns an error if the upstream unsubscribe request fails.
    pub fn unsubscribe(&self, config: &SubscriptionDataConfig) -> Result<(), BridgeError> {
        self.registry.unsubscribe([config.symbol()])?;
        Ok(())
    }

    /// Handler to register with the upstream transport.
    #[must_use]
    pub fn event_handler(&self) -> Arc<EventNormalizer> {
        Arc::clone(&self.normalizer)
    }

    /// Access the subscription registry.
    #[must_use]
    pub const fn registry(&self) -> &SubscriptionRegistry {
        &self.registry
    }
}

impl std::fmt::Debug for TickBridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TickBridge")
            .field("registry", &self.registry)
            .field("normalizer", &self.normalizer)
            .finish_non_exhaustive()
    }
}
