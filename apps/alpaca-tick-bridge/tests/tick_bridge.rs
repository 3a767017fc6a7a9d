//! Tick Bridge Integration Tests
//!
//! Drives the bridge end to end with a recording feed, a counting
//! exchange-hours provider and the broadcast aggregator.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use chrono::{TimeZone, Utc};
use chrono_tz::Tz;
use futures::StreamExt;
use parking_lot::Mutex;
use rust_decimal_macros::dec;
use tokio::time::timeout;

use alpaca_tick_bridge::{
    ExchangeHoursError, ExchangeHoursProvider, FeedError, Market, NormalizeOutcome, QuoteEvent,
    SecurityType, StreamEventHandler, StreamingFeed, SubscriptionDataConfig, Symbol,
    TickAggregator, TickBridge, TickKind, TickStream, TradeEvent,
};

// =============================================================================
// Test Doubles
// =============================================================================

#[derive(Default)]
struct RecordingFeed {
    calls: Mutex<Vec<String>>,
    reject: Mutex<Option<String>>,
}

impl RecordingFeed {
    fn reject(&self, call: &str) {
        *self.reject.lock() = Some(call.to_string());
    }

    fn record(&self, call: String) -> Result<(), FeedError> {
        if self.reject.lock().as_deref() == Some(call.as_str()) {
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
        self.record(format!("subscribe_quote:{symbol}"))
    }
    fn unsubscribe_quote(&self, symbol: &str) -> Result<(), FeedError> {
        self.record(format!("unsubscribe_quote:{symbol}"))
    }
    fn subscribe_trade(&self, symbol: &str) -> Result<(), FeedError> {
        self.record(format!("subscribe_trade:{symbol}"))
    }
    fn unsubscribe_trade(&self, symbol: &str) -> Result<(), FeedError> {
        self.record(format!("unsubscribe_trade:{symbol}"))
    }
}

struct CountingProvider {
    zones: HashMap<(Market, SecurityType), Tz>,
    calls: AtomicUsize,
}

impl CountingProvider {
    fn new_york() -> Self {
        Self {
            zones: HashMap::from([(
                (Market::Usa, SecurityType::Equity),
                chrono_tz::America::New_York,
            )]),
            calls: AtomicUsize::new(0),
        }
    }

    fn empty() -> Self {
        Self {
            zones: HashMap::new(),
            calls: AtomicUsize::new(0),
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl ExchangeHoursProvider for CountingProvider {
    fn exchange_time_zone(
        &self,
        market: Market,
        _symbol: &Symbol,
        security_type: SecurityType,
    ) -> Result<Tz, ExchangeHoursError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.zones
            .get(&(market, security_type))
            .copied()
            .ok_or(ExchangeHoursError::NotFound {
                market,
                security_type,
            })
    }
}

struct Harness {
    feed: Arc<RecordingFeed>,
    provider: Arc<CountingProvider>,
    aggregator: Arc<TickAggregator>,
    bridge: TickBridge,
}

fn harness() -> Harness {
    let feed = Arc::new(RecordingFeed::default());
    let provider = Arc::new(CountingProvider::new_york());
    let aggregator = Arc::new(TickAggregator::with_defaults());
    let bridge = TickBridge::new(feed.clone(), aggregator.clone(), provider.clone());

    Harness {
        feed,
        provider,
        aggregator,
        bridge,
    }
}

fn quote(symbol: &str) -> QuoteEvent {
    QuoteEvent {
        symbol: symbol.to_string(),
        time: Utc.with_ymd_and_hms(2024, 1, 2, 14, 30, 0).unwrap(),
        bid_price: dec!(100.0),
        bid_size: dec!(5),
        ask_price: dec!(100.2),
        ask_size: dec!(7),
    }
}

fn trade(symbol: &str) -> TradeEvent {
    TradeEvent {
        symbol: symbol.to_string(),
        time: Utc.with_ymd_and_hms(2024, 1, 2, 14, 30, 1).unwrap(),
        price: dec!(100.1),
        size: dec!(300),
    }
}

async fn next_tick(stream: &mut TickStream) -> alpaca_tick_bridge::Tick {
    timeout(Duration::from_secs(1), stream.next())
        .await
        .expect("timed out waiting for tick")
        .expect("tick stream ended")
}

// =============================================================================
// Tests
// =============================================================================

#[tokio::test]
async fn quote_and_trade_arrive_in_exchange_time() {
    let h = harness();
    let mut ticks = h
        .bridge
        .subscribe(&SubscriptionDataConfig::new(Symbol::equity("AAPL")))
        .unwrap();

    assert_eq!(
        h.feed.calls(),
        vec!["subscribe_quote:AAPL", "subscribe_trade:AAPL"]
    );

    let handler = h.bridge.event_handler();
    handler.on_quote(quote("AAPL"));
    handler.on_trade(trade("AAPL"));

    let q = next_tick(&mut ticks).await;
    assert_eq!(q.kind, TickKind::Quote);
    assert_eq!(q.symbol, Symbol::equity("AAPL"));
    assert_eq!(q.time.to_rfc3339(), "2024-01-02T09:30:00-05:00");
    assert_eq!(q.value, dec!(100.0));
    assert_eq!(q.bid_price, dec!(100.0));
    assert_eq!(q.ask_price, dec!(100.2));
    assert_eq!(q.bid_size, dec!(5));
    assert_eq!(q.ask_size, dec!(7));

    let t = next_tick(&mut ticks).await;
    assert_eq!(t.kind, TickKind::Trade);
    assert_eq!(t.time.to_rfc3339(), "2024-01-02T09:30:01-05:00");
    assert_eq!(t.value, dec!(100.1));
    assert_eq!(t.bid_price, dec!(100.1));
    assert_eq!(t.ask_price, dec!(100.1));
    assert_eq!(t.quantity, dec!(300));

    assert_eq!(h.provider.calls(), 1);
}

#[tokio::test]
async fn subscriber_only_sees_requested_kinds() {
    let h = harness();
    let config =
        SubscriptionDataConfig::new(Symbol::equity("MSFT")).with_tick_kinds(&[TickKind::Trade]);
    let mut ticks = h.bridge.subscribe(&config).unwrap();

    let handler = h.bridge.event_handler();
    handler.on_quote(quote("MSFT"));
    handler.on_trade(trade("MSFT"));

    let tick = next_tick(&mut ticks).await;
    assert_eq!(tick.kind, TickKind::Trade);
    assert_eq!(h.aggregator.subscriber_count(), 1);
}

#[tokio::test]
async fn repeated_subscribe_issues_one_upstream_pair() {
    let h = harness();
    let config = SubscriptionDataConfig::new(Symbol::equity("AAPL"));

    let _first = h.bridge.subscribe(&config).unwrap();
    let _second = h.bridge.subscribe(&config).unwrap();

    assert_eq!(h.feed.calls().len(), 2);
    assert_eq!(h.aggregator.subscriber_count(), 2);
}

#[tokio::test]
async fn ineligible_symbols_stay_off_the_feed() {
    let h = harness();
    let option = Symbol::new("SPY240119C00470000", SecurityType::Option, Market::Usa);
    let universe = Symbol::equity("qc-universe-coarse");

    h.bridge
        .subscribe(&SubscriptionDataConfig::new(option.clone()))
        .unwrap();
    h.bridge
        .subscribe(&SubscriptionDataConfig::new(universe.clone()))
        .unwrap();
    h.bridge
        .unsubscribe(&SubscriptionDataConfig::new(option))
        .unwrap();
    h.bridge
        .unsubscribe(&SubscriptionDataConfig::new(universe))
        .unwrap();

    assert!(h.feed.calls().is_empty());
    assert!(h.bridge.registry().subscribed_symbols().is_empty());
}

#[test]
fn unsubscribing_unknown_symbol_is_a_noop() {
    let h = harness();

    h.bridge
        .unsubscribe(&SubscriptionDataConfig::new(Symbol::equity("GOOG")))
        .unwrap();

    assert!(h.feed.calls().is_empty());
}

#[test]
fn events_after_unsubscribe_are_dropped() {
    let h = harness();
    let config = SubscriptionDataConfig::new(Symbol::equity("AAPL"));
    h.bridge.subscribe(&config).unwrap();
    h.bridge.unsubscribe(&config).unwrap();

    assert_eq!(
        h.feed.calls(),
        vec![
            "subscribe_quote:AAPL",
            "subscribe_trade:AAPL",
            "unsubscribe_quote:AAPL",
            "unsubscribe_trade:AAPL",
        ]
    );

    let normalizer = h.bridge.event_handler();
    assert_eq!(
        normalizer.on_quote_received(quote("AAPL")).unwrap(),
        NormalizeOutcome::Dropped
    );
    assert_eq!(
        normalizer.on_trade_received(trade("AAPL")).unwrap(),
        NormalizeOutcome::Dropped
    );
    assert_eq!(h.provider.calls(), 0);
}

#[test]
fn events_for_unknown_symbols_are_dropped() {
    let h = harness();
    h.bridge
        .subscribe(&SubscriptionDataConfig::new(Symbol::equity("AAPL")))
        .unwrap();

    let outcome = h
        .bridge
        .event_handler()
        .on_quote_received(quote("TSLA"))
        .unwrap();

    assert_eq!(outcome, NormalizeOutcome::Dropped);
}

#[test]
fn time_zone_is_resolved_once_per_symbol() {
    let h = harness();
    let registry = h.bridge.registry();
    registry
        .subscribe(&[Symbol::equity("AAPL"), Symbol::equity("MSFT")])
        .unwrap();

    let normalizer = h.bridge.event_handler();
    for _ in 0..5 {
        normalizer.on_quote_received(quote("AAPL")).unwrap();
        normalizer.on_trade_received(trade("AAPL")).unwrap();
        normalizer.on_trade_received(trade("MSFT")).unwrap();
    }

    assert_eq!(h.provider.calls(), 2);
    assert_eq!(normalizer.time_zones().len(), 2);
}

#[test]
fn feed_failure_mid_batch_keeps_earlier_symbols() {
    let h = harness();
    h.feed.reject("subscribe_quote:MSFT");

    let result = h.bridge.registry().subscribe(&[
        Symbol::equity("AAPL"),
        Symbol::equity("MSFT"),
        Symbol::equity("GOOG"),
    ]);

    assert!(matches!(result, Err(FeedError::Rejected { .. })));
    assert!(h.bridge.registry().is_subscribed("AAPL"));
    assert!(!h.bridge.registry().is_subscribed("MSFT"));
    assert!(!h.bridge.registry().is_subscribed("GOOG"));
}

#[test]
fn concurrent_subscribe_of_same_symbol_issues_one_pair() {
    let feed = Arc::new(RecordingFeed::default());
    let bridge = Arc::new(TickBridge::new(
        feed.clone(),
        Arc::new(TickAggregator::with_defaults()),
        Arc::new(CountingProvider::new_york()),
    ));

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let bridge = Arc::clone(&bridge);
            std::thread::spawn(move || {
                bridge
                    .registry()
                    .subscribe(&[Symbol::equity("NVDA")])
                    .unwrap();
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(
        feed.calls(),
        vec!["subscribe_quote:NVDA", "subscribe_trade:NVDA"]
    );
}

#[test]
fn missing_exchange_hours_surface_as_error() {
    let feed = Arc::new(RecordingFeed::default());
    let provider = Arc::new(CountingProvider::empty());
    let aggregator = Arc::new(TickAggregator::with_defaults());
    let bridge = TickBridge::new(feed.clone(), aggregator, provider.clone());
    bridge
        .subscribe(&SubscriptionDataConfig::new(Symbol::equity("AAPL")))
        .unwrap();

    let normalizer = bridge.event_handler();
    let result = normalizer.on_trade_received(trade("AAPL"));

    assert_eq!(
        result,
        Err(ExchangeHoursError::NotFound {
            market: Market::Usa,
            security_type: SecurityType::Equity,
        })
    );
    assert!(normalizer.time_zones().is_empty());

    // Failures are not cached; the next event asks again
    let _ = normalizer.on_quote_received(quote("AAPL"));
    assert_eq!(provider.calls(), 2);
}
