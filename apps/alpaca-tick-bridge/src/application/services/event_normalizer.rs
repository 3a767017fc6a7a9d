//! Event Normalizer
//!
//! Converts upstream quote/trade events into canonical ticks stamped in the
//! instrument's exchange time zone, and hands them to the downstream sink.
//! Events for symbols not in the subscription set are dropped; they are
//! expected in flight right after an unsubscribe.

use std::sync::Arc;

use crate::application::ports::{ExchangeHoursError, StreamEventHandler, TickSink};
use crate::domain::streaming::{QuoteEvent, Tick, TickKind, TradeEvent};
use crate::domain::subscription::SubscriptionSet;
use crate::infrastructure::metrics;

use super::ExchangeTimeZoneCache;

/// What happened to one upstream event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NormalizeOutcome {
    /// A tick of this kind was handed to the sink.
    Emitted(TickKind),
    /// The symbol is not subscribed; nothing was emitted.
    Dropped,
}

/// Upstream event handler producing canonical ticks.
pub struct EventNormalizer {
    subscriptions: Arc<SubscriptionSet>,
    time_zones: ExchangeTimeZoneCache,
    sink: Arc<dyn TickSink>,
}

impl EventNormalizer {
    /// Create a normalizer reading the given subscription set.
    #[must_use]
    pub fn new(
        subscriptions: Arc<SubscriptionSet>,
        time_zones: ExchangeTimeZoneCache,
        sink: Arc<dyn TickSink>,
    ) -> Self {
        Self {
            subscriptions,
            time_zones,
            sink,
        }
    }

    /// Normalize a quote event.
    ///
    /// # Errors
    ///
    /// Returns an error if the exchange time zone cannot be resolved; the
    /// event is lost and nothing is emitted.
    pub fn on_quote_received(&self, event: QuoteEvent) -> Result<NormalizeOutcome, ExchangeHoursError> {
        let Some(symbol) = self.subscriptions.get(&event.symbol) else {
            tracing::trace!(symbol = %event.symbol, "Dropping quote for unsubscribed symbol");
            metrics::record_event_dropped(TickKind::Quote);
            return Ok(NormalizeOutcome::Dropped);
        };

        let tz = self.time_zones.resolve(&symbol)?;
        let tick = Tick::quote(
            symbol,
            event.time.with_timezone(&tz),
            event.bid_price,
            event.bid_size,
            event.ask_price,
            event.ask_size,
        );

        Ok(self.emit(tick))
    }

    /// Normalize a trade event.
    ///
    /// # Errors
    ///
    /// Returns an error if the exchange time zone cannot be resolved; the
    /// event is lost and nothing is emitted.
    pub fn on_trade_received(&self, event: TradeEvent) -> Result<NormalizeOutcome, ExchangeHoursError> {
        let Some(symbol) = self.subscriptions.get(&event.symbol) else {
            tracing::trace!(symbol = %event.symbol, "Dropping trade for unsubscribed symbol");
            metrics::record_event_dropped(TickKind::Trade);
            return Ok(NormalizeOutcome::Dropped);
        };

        let tz = self.time_zones.resolve(&symbol)?;
        let tick = Tick::trade(symbol, event.time.with_timezone(&tz), event.price, event.size);

        Ok(self.emit(tick))
    }

    /// Exchange time zone cache backing this normalizer.
    #[must_use]
    pub const fn time_zones(&self) -> &ExchangeTimeZoneCache {
        &self.time_zones
    }

    fn emit(&self, tick: Tick) -> NormalizeOutcome {
        let kind = tick.kind;
        self.sink.emit(tick);
        metrics::record_tick_emitted(kind);
        NormalizeOutcome::Emitted(kind)
    }
}

impl StreamEventHandler for EventNormalizer {
    fn on_quote(&self, event: QuoteEvent) {
        let symbol = event.symbol.clone();
        if let Err(e) = self.on_quote_received(event) {
            tracing::warn!(symbol = %symbol, error = %e, "Failed to normalize quote");
        }
    }

    fn on_trade(&self, event: TradeEvent) {
        let symbol = event.symbol.clone();
        if let Err(e) = self.on_trade_received(event) {
            tracing::warn!(symbol = %symbol, error = %e, "Failed to normalize trade");
        }
    }
}

impl std::fmt::Debug for EventNormalizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventNormalizer")
            .field("subscriptions", &self.subscriptions.len())
            .field("time_zones", &self.time_zones)
            .finish_non_exhaustive()
    }
}
