//! Alpaca Stock Stream Message Types
//!
//! Wire format types for the real-time stock data stream. Only the control
//! messages and the quote/trade channels the bridge consumes are modelled.
//!
//! # References
//!
//! - [Stock Streaming](https://docs.alpaca.markets/docs/real-time-stock-pricing-data)

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::streaming::{QuoteEvent, TradeEvent};

// =============================================================================
// Control Messages
// =============================================================================

/// Success message indicating connection or authentication succeeded.
///
/// # Wire Format (JSON)
/// ```json
/// {"T": "success", "msg": "connected"}
/// {"T": "success", "msg": "authenticated"}
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuccessMessage {
    /// Message type (always "success")
    #[serde(rename = "T")]
    pub msg_type: String,

    /// Success message: "connected" or "authenticated"
    pub msg: SuccessKind,
}

/// Kind of success message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SuccessKind {
    /// Initial connection established
    Connected,
    /// Authentication successful
    Authenticated,
}

/// Error message with code and description.
///
/// # Wire Format (JSON)
/// ```json
/// {"T": "error", "code": 401, "msg": "not authenticated"}
/// ```
///
/// # Error Codes
/// - 400: Invalid syntax
/// - 401-404: Authentication
/// - 405: Symbol limit exceeded
/// - 406: Connection limit exceeded
/// - 407: Slow client
/// - 408: Insufficient subscription
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorMessage {
    /// Message type (always "error")
    #[serde(rename = "T")]
    pub msg_type: String,

    /// Error code
    pub code: i32,

    /// Error message
    pub msg: String,
}

/// Subscription confirmation, listing every active channel after a change.
///
/// # Wire Format (JSON)
/// ```json
/// {"T": "subscription", "trades": ["AAPL"], "quotes": ["AMD", "CLDR"]}
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionMessage {
    /// Message type (always "subscription")
    #[serde(rename = "T")]
    pub msg_type: String,

    /// Subscribed trade symbols
    #[serde(default)]
    pub trades: Vec<String>,

    /// Subscribed quote symbols
    #[serde(default)]
    pub quotes: Vec<String>,
}

// =============================================================================
// Market Data Messages
// =============================================================================

/// Real-time stock quote (NBBO).
///
/// # Wire Format (JSON)
/// ```json
/// {
///   "T": "q", "S": "AMD",
///   "bx": "U", "bp": 87.66, "bs": 1,
///   "ax": "Q", "ap": 87.68, "as": 4,
///   "t": "2021-02-22T15:51:45.335689322Z",
///   "c": ["R"], "z": "C"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockQuoteMessage {
    /// Message type (always "q")
    #[serde(rename = "T")]
    pub msg_type: String,

    /// Ticker symbol
    #[serde(rename = "S")]
    pub symbol: String,

    /// Bid exchange code
    #[serde(rename = "bx", default)]
    pub bid_exchange: String,

    /// Bid price
    #[serde(rename = "bp")]
    pub bid_price: Decimal,

    /// Bid size
    #[serde(rename = "bs")]
    pub bid_size: i64,

    /// Ask exchange code
    #[serde(rename = "ax", default)]
    pub ask_exchange: String,

    /// Ask price
    #[serde(rename = "ap")]
    pub ask_price: Decimal,

    /// Ask size
    #[serde(rename = "as")]
    pub ask_size: i64,

    /// Quote timestamp (RFC-3339, UTC)
    #[serde(rename = "t")]
    pub timestamp: DateTime<Utc>,

    /// Quote condition codes
    #[serde(rename = "c", default)]
    pub conditions: Vec<String>,

    /// Tape
    #[serde(rename = "z", default)]
    pub tape: String,
}

impl From<StockQuoteMessage> for QuoteEvent {
    fn from(msg: StockQuoteMessage) -> Self {
        Self {
            symbol: msg.symbol,
            time: msg.timestamp,
            bid_price: msg.bid_price,
            bid_size: Decimal::from(msg.bid_size),
            ask_price: msg.ask_price,
            ask_size: Decimal::from(msg.ask_size),
        }
    }
}

/// Real-time stock trade.
///
/// # Wire Format (JSON)
/// ```json
/// {
///   "T": "t", "i": 96921, "S": "AAPL", "x": "D",
///   "p": 126.55, "s": 1,
///   "t": "2021-02-22T15:51:44.208Z",
///   "c": ["@", "I"], "z": "C"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockTradeMessage {
    /// Message type (always "t")
    #[serde(rename = "T")]
    pub msg_type: String,

    /// Ticker symbol
    #[serde(rename = "S")]
    pub symbol: String,

    /// Trade ID (unique per exchange per day)
    #[serde(rename = "i", default)]
    pub trade_id: i64,

    /// Exchange code where the trade executed
    #[serde(rename = "x", default)]
    pub exchange: String,

    /// Trade price
    #[serde(rename = "p")]
    pub price: Decimal,

    /// Trade size (shares)
    #[serde(rename = "s")]
    pub size: i64,

    /// Trade timestamp (RFC-3339, UTC)
    #[serde(rename = "t")]
    pub timestamp: DateTime<Utc>,

    /// Trade condition codes
    #[serde(rename = "c", default)]
    pub conditions: Vec<String>,

    /// Tape
    #[serde(rename = "z", default)]
    pub tape: String,
}

impl From<StockTradeMessage> for TradeEvent {
    fn from(msg: StockTradeMessage) -> Self {
        Self {
            symbol: msg.symbol,
            time: msg.timestamp,
            price: msg.price,
            size: Decimal::from(msg.size),
        }
    }
}

// =============================================================================
// Outbound Messages (Client -> Server)
// =============================================================================

/// Authentication request.
#[derive(Debug, Clone, Serialize)]
pub struct AuthRequest {
    /// Action: "auth"
    pub action: &'static str,

    /// API key
    pub key: String,

    /// API secret
    pub secret: String,
}

impl AuthRequest {
    /// Create a new authentication request.
    #[must_use]
    pub const fn new(key: String, secret: String) -> Self {
        Self {
            action: "auth",
            key,
            secret,
        }
    }
}

/// Quote/trade subscription change.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SubscriptionRequest {
    /// Action: "subscribe" or "unsubscribe"
    pub action: &'static str,

    /// Trade symbols
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub trades: Vec<String>,

    /// Quote symbols
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub quotes: Vec<String>,
}

impl SubscriptionRequest {
    /// Create a subscribe request.
    #[must_use]
    pub fn subscribe() -> Self {
        Self {
            action: "subscribe",
            ..Default::default()
        }
    }

    /// Create an unsubscribe request.
    #[must_use]
    pub fn unsubscribe() -> Self {
        Self {
            action: "unsubscribe",
            ..Default::default()
        }
    }

    /// Set trade symbols.
    #[must_use]
    pub fn with_trades(mut self, symbols: Vec<String>) -> Self {
        self.trades = symbols;
        self
    }

    /// Set quote symbols.
    #[must_use]
    pub fn with_quotes(mut self, symbols: Vec<String>) -> Self {
        self.quotes = symbols;
        self
    }

    /// Check if the request names no symbols.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.trades.is_empty() && self.quotes.is_empty()
    }
}

// =============================================================================
// Incoming Message Enum
// =============================================================================

/// Any message the stock stream can deliver to the bridge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AlpacaMessage {
    /// Connection/authentication success
    Success(SuccessMessage),

    /// Error message
    Error(ErrorMessage),

    /// Subscription confirmation
    Subscription(SubscriptionMessage),

    /// Stock quote
    Quote(StockQuoteMessage),

    /// Stock trade
    Trade(StockTradeMessage),
}

impl AlpacaMessage {
    /// Short label used for metrics.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Success(_) => "success",
            Self::Error(_) => "error",
            Self::Subscription(_) => "subscription",
            Self::Quote(_) => "quote",
            Self::Trade(_) => "trade",
        }
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn deserialize_success_connected() {
        let json = r#"{"T":"success","msg":"connected"}"#;
        let msg: SuccessMessage = serde_json::from_str(json).unwrap();
        assert_eq!(msg.msg, SuccessKind::Connected);
    }

    #[test]
    fn deserialize_error() {
        let json = r#"{"T":"error","code":405,"msg":"symbol limit exceeded"}"#;
        let msg: ErrorMessage = serde_json::from_str(json).unwrap();
        assert_eq!(msg.code, 405);
        assert_eq!(msg.msg, "symbol limit exceeded");
    }

    #[test]
    fn quote_converts_to_event() {
        let json = r#"{
            "T": "q",
            "S": "AMD",
            "bx": "U",
            "bp": 87.66,
            "bs": 1,
            "ax": "Q",
            "ap": 87.68,
            "as": 4,
            "t": "2021-02-22T15:51:45.335689322Z",
            "c": ["R"],
            "z": "C"
        }"#;
        let msg: StockQuoteMessage = serde_json::from_str(json).unwrap();
        let event = QuoteEvent::from(msg);

        assert_eq!(event.symbol, "AMD");
        assert_eq!(event.bid_price, dec!(87.66));
        assert_eq!(event.ask_price, dec!(87.68));
        assert_eq!(event.bid_size, dec!(1));
        assert_eq!(event.ask_size, dec!(4));
        assert_eq!(event.time.to_rfc3339(), "2021-02-22T15:51:45.335689322+00:00");
    }

    #[test]
    fn trade_converts_to_event() {
        let json = r#"{
            "T": "t",
            "i": 96921,
            "S": "AAPL",
            "x": "D",
            "p": 126.55,
            "s": 300,
            "t": "2021-02-22T15:51:44.208Z",
            "c": ["@", "I"],
            "z": "C"
        }"#;
        let msg: StockTradeMessage = serde_json::from_str(json).unwrap();
        let event = TradeEvent::from(msg);

        assert_eq!(event.symbol, "AAPL");
        assert_eq!(event.price, dec!(126.55));
        assert_eq!(event.size, dec!(300));
    }

    #[test]
    fn serialize_subscription_request() {
        let req = SubscriptionRequest::subscribe().with_quotes(vec!["AAPL".to_string()]);

        let json = serde_json::to_string(&req).unwrap();
        assert_eq!(json, r#"{"action":"subscribe","quotes":["AAPL"]}"#);
        assert!(!req.is_empty());
        assert!(SubscriptionRequest::unsubscribe().is_empty());
    }

    #[test]
    fn serialize_auth_request() {
        let req = AuthRequest::new("key123".to_string(), "secret456".to_string());
        let json = serde_json::to_string(&req).unwrap();
        assert_eq!(json, r#"{"action":"auth","key":"key123","secret":"secret456"}"#);
    }
}
