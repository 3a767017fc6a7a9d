//! Subscription Registry
//!
//! Tracks which symbols hold an active upstream subscription and issues the
//! upstream quote/trade requests exactly once per symbol transition.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::application::ports::{FeedError, StreamingFeed};
use crate::domain::streaming::TickKind;
use crate::domain::subscription::{
    SubscriptionChanges, SubscriptionSet, SubscriptionStats, can_subscribe,
};
use crate::domain::symbol::Symbol;
use crate::infrastructure::metrics::{self, RequestAction};

/// Gatekeeper for upstream subscriptions.
///
/// Transitions are serialized so concurrent callers never issue duplicate
/// upstream requests for the same symbol. Readers of the subscription set
/// (the event normalizer) never wait on that lock.
pub struct SubscriptionRegistry {
    feed: Arc<dyn StreamingFeed>,
    subscriptions: Arc<SubscriptionSet>,
    transitions: Mutex<()>,
}

impl SubscriptionRegistry {
    /// Create a registry issuing requests to the given feed.
    #[must_use]
    pub fn new(feed: Arc<dyn StreamingFeed>) -> Self {
        Self {
            feed,
            subscriptions: Arc::new(SubscriptionSet::new()),
            transitions: Mutex::new(()),
        }
    }

    /// Subscribe eligible symbols that are not yet subscribed.
    ///
    /// Each new symbol gets one quote request followed by one trade request,
    /// then is recorded. Already subscribed and ineligible symbols are skipped.
    ///
    /// # Errors
    ///
    /// Returns the first upstream failure. Symbols processed before the
    /// failure stay subscribed; the failing symbol is not recorded.
    pub fn subscribe<'a>(
        &self,
        symbols: impl IntoIterator<Item = &'a Symbol>,
    ) -> Result<SubscriptionChanges, FeedError> {
        let _guard = self.transitions.lock();
        let mut changes = SubscriptionChanges::default();

        let result: Result<(), FeedError> = symbols.into_iter().try_for_each(|symbol| {
            if self.subscriptions.contains(symbol.value()) {
                tracing::debug!(symbol = %symbol, "Symbol already subscribed");
                return Ok(());
            }
            if !can_subscribe(symbol) {
                tracing::debug!(
                    symbol = %symbol,
                    security_type = %symbol.security_type(),
                    "Symbol not eligible for subscription"
                );
                return Ok(());
            }

            tracing::info!(symbol = %symbol, "Subscribing to symbol");
            self.feed.subscribe_quote(symbol.value())?;
            metrics::record_upstream_request(RequestAction::Subscribe, TickKind::Quote);
            self.feed.subscribe_trade(symbol.value())?;
            metrics::record_upstream_request(RequestAction::Subscribe, TickKind::Trade);

            self.subscriptions.insert(symbol.clone());
            changes.subscribe.push(symbol.clone());
            Ok(())
        });

        metrics::set_subscribed_symbols(self.subscriptions.len());
        result.map(|()| changes)
    }

    /// Unsubscribe eligible symbols that are currently subscribed.
    ///
    /// # Errors
    ///
    /// Returns the first upstream failure. Symbols processed before the
    /// failure stay unsubscribed; the failing symbol remains subscribed.
    pub fn unsubscribe<'a>(
        &self,
        symbols: impl IntoIterator<Item = &'a Symbol>,
    ) -> Result<SubscriptionChanges, FeedError> {
        let _guard = self.transitions.lock();
        let mut changes = SubscriptionChanges::default();

        let result: Result<(), FeedError> = symbols.into_iter().try_for_each(|symbol| {
            if !can_subscribe(symbol) || !self.subscriptions.contains(symbol.value()) {
                tracing::debug!(symbol = %symbol, "Symbol not subscribed, skipping");
                return Ok(());
            }

            tracing::info!(symbol = %symbol, "Unsubscribing from symbol");
            self.feed.unsubscribe_quote(symbol.value())?;
            metrics::record_upstream_request(RequestAction::Unsubscribe, TickKind::Quote);
            self.feed.unsubscribe_trade(symbol.value())?;
            metrics::record_upstream_request(RequestAction::Unsubscribe, TickKind::Trade);

            if let Some(removed) = self.subscriptions.remove(symbol.value()) {
                changes.unsubscribe.push(removed);
            }
            Ok(())
        });

        metrics::set_subscribed_symbols(self.subscriptions.len());
        result.map(|()| changes)
    }

    /// Check whether a symbol value is subscribed.
    #[must_use]
    pub fn is_subscribed(&self, value: &str) -> bool {
        self.subscriptions.contains(value)
    }

    /// Snapshot of subscribed symbols.
    #[must_use]
    pub fn subscribed_symbols(&self) -> Vec<Symbol> {
        self.subscriptions.symbols()
    }

    /// Get subscription statistics.
    #[must_use]
    pub fn stats(&self) -> SubscriptionStats {
        SubscriptionStats::from_set(&self.subscriptions)
    }

    /// Shared handle to the subscription set, for read-only consumers.
    ///
    /// Only the registry writes to the set.
    #[must_use]
    pub(crate) fn subscription_set(&self) -> Arc<SubscriptionSet> {
        Arc::clone(&self.subscriptions)
    }
}

impl std::fmt::Debug for SubscriptionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubscriptionRegistry")
            .field("subscriptions", &self.subscriptions.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::symbol::{Market, SecurityType};

    #[derive(Default)]
    struct RecordingFeed {
        calls: Mutex<Vec<String>>,
        fail_on: Option<String>,
    }

    impl RecordingFeed {
        fn failing_on(call: &str) -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
                fail_on: Some(call.to_string()),
            }
        }

        fn record(&self, call: String) -> Result<(), FeedError> {
            if self.fail_on.as_deref() == Some(call.as_str()) {
                return Err(FeedError::Rejected {
                    symbol: call,
                    message: "rejected".to_string(),
                });
            }
            self.calls.lock().push(call);
            Ok(())
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().clone()
        }
    }

    impl StreamingFeed for RecordingFeed {
        fn subscribe_quote(&self, symbol: &str) -> Result<(), FeedError> {
            self.record(format!("sq:{symbol}"))
        }
        fn unsubscribe_quote(&self, symbol: &str) -> Result<(), FeedError> {
            self.record(format!("uq:{symbol}"))
        }
        fn subscribe_trade(&self, symbol: &str) -> Result<(), FeedError> {
            self.record(format!("st:{symbol}"))
        }
        fn unsubscribe_trade(&self, symbol: &str) -> Result<(), FeedError> {
            self.record(format!("ut:{symbol}"))
        }
    }

    fn registry(feed: &Arc<RecordingFeed>) -> SubscriptionRegistry {
        SubscriptionRegistry::new(Arc::clone(feed) as Arc<dyn StreamingFeed>)
    }

    #[test]
    fn subscribe_issues_quote_then_trade() {
        let feed = Arc::new(RecordingFeed::default());
        let registry = registry(&feed);

        let changes = registry.subscribe(&[Symbol::equity("AAPL")]).unwrap();

        assert_eq!(changes.subscribe, vec![Symbol::equity("AAPL")]);
        assert_eq!(feed.calls(), vec!["sq:AAPL", "st:AAPL"]);
        assert!(registry.is_subscribed("AAPL"));
    }

    #[test]
    fn subscribe_twice_is_idempotent() {
        let feed = Arc::new(RecordingFeed::default());
        let registry = registry(&feed);

        registry.subscribe(&[Symbol::equity("AAPL")]).unwrap();
        let changes = registry.subscribe(&[Symbol::equity("AAPL")]).unwrap();

        assert!(changes.is_empty());
        assert_eq!(feed.calls().len(), 2);
    }

    #[test]
    fn ineligible_symbols_never_reach_feed() {
        let feed = Arc::new(RecordingFeed::default());
        let registry = registry(&feed);

        let option = Symbol::new("SPY240119C00470000", SecurityType::Option, Market::Usa);
        let universe = Symbol::equity("QC-UNIVERSE-COARSE");
        registry.subscribe([&option, &universe]).unwrap();
        registry.unsubscribe([&option, &universe]).unwrap();

        assert!(feed.calls().is_empty());
        assert_eq!(registry.stats().symbol_count, 0);
    }

    #[test]
    fn unsubscribe_unknown_symbol_is_noop() {
        let feed = Arc::new(RecordingFeed::default());
        let registry = registry(&feed);

        let changes = registry.unsubscribe(&[Symbol::equity("MSFT")]).unwrap();

        assert!(changes.is_empty());
        assert!(feed.calls().is_empty());
    }

    #[test]
    fn unsubscribe_removes_symbol() {
        let feed = Arc::new(RecordingFeed::default());
        let registry = registry(&feed);

        registry.subscribe(&[Symbol::equity("AAPL")]).unwrap();
        let changes = registry.unsubscribe(&[Symbol::equity("AAPL")]).unwrap();

        assert_eq!(changes.unsubscribe, vec![Symbol::equity("AAPL")]);
        assert_eq!(feed.calls(), vec!["sq:AAPL", "st:AAPL", "uq:AAPL", "ut:AAPL"]);
        assert!(!registry.is_subscribed("AAPL"));
    }

    #[test]
    fn failure_mid_batch_keeps_earlier_symbols() {
        let feed = Arc::new(RecordingFeed::failing_on("st:MSFT"));
        let registry = registry(&feed);

        let result = registry.subscribe(&[
            Symbol::equity("AAPL"),
            Symbol::equity("MSFT"),
            Symbol::equity("GOOG"),
        ]);

        assert!(matches!(result, Err(FeedError::Rejected { .. })));
        assert!(registry.is_subscribed("AAPL"));
        assert!(!registry.is_subscribed("MSFT"));
        assert!(!registry.is_subscribed("GOOG"));
        assert_eq!(feed.calls(), vec!["sq:AAPL", "st:AAPL", "sq:MSFT"]);
    }

    #[test]
    fn unsubscribe_failure_mid_batch_keeps_later_symbols() {
        let feed = Arc::new(RecordingFeed::failing_on("ut:MSFT"));
        let registry = registry(&feed);
        let symbols = [
            Symbol::equity("AAPL"),
            Symbol::equity("MSFT"),
            Symbol::equity("GOOG"),
        ];
        registry.subscribe(&symbols).unwrap();

        let result = registry.unsubscribe(&symbols);

        assert!(matches!(result, Err(FeedError::Rejected { .. })));
        assert!(!registry.is_subscribed("AAPL"));
        assert!(registry.is_subscribed("MSFT"));
        assert!(registry.is_subscribed("GOOG"));
        assert_eq!(registry.stats().symbol_count, 2);
        assert_eq!(
            &feed.calls()[6..],
            ["uq:AAPL", "ut:AAPL", "uq:MSFT"]
        );
    }

    #[test]
    fn stats_track_subscriptions() {
        let feed = Arc::new(RecordingFeed::default());
        let registry = registry(&feed);

        registry
            .subscribe(&[Symbol::equity("AAPL"), Symbol::equity("MSFT")])
            .unwrap();

        let stats = registry.stats();
        assert_eq!(stats.symbol_count, 2);
        assert_eq!(stats.upstream_channels, 4);
        assert_eq!(registry.subscribed_symbols().len(), 2);
    }
}
