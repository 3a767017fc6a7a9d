//! Market Data Streaming Types
//!
//! Upstream quote/trade events as delivered by the feed (UTC timestamps),
//! and the canonical tick handed to the downstream aggregator (exchange-local
//! timestamps). Both are codec-agnostic.

use std::fmt;

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use rust_decimal::Decimal;

use super::symbol::Symbol;

// =============================================================================
// Upstream Events
// =============================================================================

/// Quote event received from the upstream feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuoteEvent {
    /// Ticker as sent by the feed.
    pub symbol: String,
    /// Event time (UTC).
    pub time: DateTime<Utc>,
    /// Best bid price.
    pub bid_price: Decimal,
    /// Bid size.
    pub bid_size: Decimal,
    /// Best ask price.
    pub ask_price: Decimal,
    /// Ask size.
    pub ask_size: Decimal,
}

/// Trade event received from the upstream feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TradeEvent {
    /// Ticker as sent by the feed.
    pub symbol: String,
    /// Event time (UTC).
    pub time: DateTime<Utc>,
    /// Execution price.
    pub price: Decimal,
    /// Executed quantity.
    pub size: Decimal,
}

// =============================================================================
// Canonical Tick
// =============================================================================

/// Kind of market data observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TickKind {
    /// Bid/ask snapshot.
    Quote,
    /// Executed transaction.
    Trade,
}

impl TickKind {
    /// Get all tick kinds.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::Quote, Self::Trade]
    }

    /// Get the lowercase name (used as a metric label).
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Quote => "quote",
            Self::Trade => "trade",
        }
    }
}

impl fmt::Display for TickKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single normalized market data observation.
///
/// `value` is the tick's last price: the bid for quotes, the execution
/// price for trades. Trade ticks repeat their price in `bid_price` and
/// `ask_price` and leave the sizes at zero; quote ticks leave `quantity`
/// at zero.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tick {
    /// Instrument.
    pub symbol: Symbol,
    /// Event time in the instrument's exchange time zone.
    pub time: DateTime<Tz>,
    /// Quote or trade.
    pub kind: TickKind,
    /// Last price.
    pub value: Decimal,
    /// Bid price.
    pub bid_price: Decimal,
    /// Ask price.
    pub ask_price: Decimal,
    /// Bid size (quotes only).
    pub bid_size: Decimal,
    /// Ask size (quotes only).
    pub ask_size: Decimal,
    /// Traded quantity (trades only).
    pub quantity: Decimal,
}

impl Tick {
    /// Build a quote tick.
    #[must_use]
    pub const fn quote(
        symbol: Symbol,
        time: DateTime<Tz>,
        bid_price: Decimal,
        bid_size: Decimal,
        ask_price: Decimal,
        ask_size: Decimal,
    ) -> Self {
        Self {
            symbol,
            time,
            kind: TickKind::Quote,
            value: bid_price,
            bid_price,
            ask_price,
            bid_size,
            ask_size,
            quantity: Decimal::ZERO,
        }
    }

    /// Build a trade tick.
    #[must_use]
    pub const fn trade(symbol: Symbol, time: DateTime<Tz>, price: Decimal, quantity: Decimal) -> Self {
        Self {
            symbol,
            time,
            kind: TickKind::Trade,
            value: price,
            bid_price: price,
            ask_price: price,
            bid_size: Decimal::ZERO,
            ask_size: Decimal::ZERO,
            quantity,
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use chrono_tz::America::New_York;
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn quote_tick_duplicates_bid_as_last() {
        let time = New_York.with_ymd_and_hms(2024, 1, 2, 9, 30, 0).unwrap();
        let tick = Tick::quote(
            Symbol::equity("AAPL"),
            time,
            dec!(100.0),
            dec!(5),
            dec!(100.2),
            dec!(7),
        );

        assert_eq!(tick.kind, TickKind::Quote);
        assert_eq!(tick.value, dec!(100.0));
        assert_eq!(tick.bid_price, dec!(100.0));
        assert_eq!(tick.ask_price, dec!(100.2));
        assert_eq!(tick.bid_size, dec!(5));
        assert_eq!(tick.ask_size, dec!(7));
        assert_eq!(tick.quantity, Decimal::ZERO);
    }

    #[test]
    fn trade_tick_uses_single_price_point() {
        let time = New_York.with_ymd_and_hms(2024, 1, 2, 9, 30, 0).unwrap();
        let tick = Tick::trade(Symbol::equity("AAPL"), time, dec!(100.1), dec!(300));

        assert_eq!(tick.kind, TickKind::Trade);
        assert_eq!(tick.value, dec!(100.1));
        assert_eq!(tick.bid_price, dec!(100.1));
        assert_eq!(tick.ask_price, dec!(100.1));
        assert_eq!(tick.quantity, dec!(300));
        assert_eq!(tick.bid_size, Decimal::ZERO);
    }

    #[test]
    fn tick_kind_labels() {
        assert_eq!(TickKind::Quote.as_str(), "quote");
        assert_eq!(TickKind::Trade.to_string(), "trade");
        assert_eq!(TickKind::all().len(), 2);
    }
}
