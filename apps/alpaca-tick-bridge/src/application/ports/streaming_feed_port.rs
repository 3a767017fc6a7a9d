//! Streaming Feed Port (Driven Port)
//!
//! Interface for issuing quote/trade subscription commands to the upstream
//! real-time feed, and the callback contract the feed drives once events
//! start flowing.

use crate::domain::streaming::{QuoteEvent, TradeEvent};

/// Upstream feed error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FeedError {
    /// The feed refused the request.
    #[error("Feed rejected request for {symbol}: {message}")]
    Rejected {
        /// Symbol value the request was for.
        symbol: String,
        /// Error details.
        message: String,
    },

    /// The transport is gone and no longer accepts commands.
    #[error("Feed disconnected")]
    Disconnected,
}

/// Port for upstream subscription commands.
///
/// Calls are keyed by the symbol's display value. Implementations must not
/// block; the request is handed off to the transport and the call returns.
pub trait StreamingFeed: Send + Sync {
    /// Start receiving quotes for a symbol.
    fn subscribe_quote(&self, symbol: &str) -> Result<(), FeedError>;

    /// Stop receiving quotes for a symbol.
    fn unsubscribe_quote(&self, symbol: &str) -> Result<(), FeedError>;

    /// Start receiving trades for a symbol.
    fn subscribe_trade(&self, symbol: &str) -> Result<(), FeedError>;

    /// Stop receiving trades for a symbol.
    fn unsubscribe_trade(&self, symbol: &str) -> Result<(), FeedError>;
}

/// Callbacks invoked by the upstream transport.
///
/// Called on whatever task the transport runs on, possibly concurrently
/// with subscription changes. Handlers must not block.
pub trait StreamEventHandler: Send + Sync {
    /// A quote arrived.
    fn on_quote(&self, event: QuoteEvent);

    /// A trade arrived.
    fn on_trade(&self, event: TradeEvent);
}
