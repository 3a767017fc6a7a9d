//! Alpaca WebSocket Adapter
//!
//! Client for Alpaca's real-time stock stream (SIP or IEX feed), JSON
//! encoded. Acts as the bridge's upstream [`StreamingFeed`] and drives a
//! [`StreamEventHandler`] with decoded quotes and trades.
//!
//! [`StreamingFeed`]: crate::application::ports::StreamingFeed
//! [`StreamEventHandler`]: crate::application::ports::StreamEventHandler

pub mod auth;
pub mod codec;
pub mod messages;
pub mod stream;

pub use auth::{AuthError, AuthHandler, AuthState, Credentials};
pub use codec::{CodecError, JsonCodec};
pub use messages::{
    AlpacaMessage, AuthRequest, ErrorMessage, StockQuoteMessage, StockTradeMessage,
    SubscriptionMessage, SubscriptionRequest, SuccessKind, SuccessMessage,
};
pub use stream::{
    AlpacaStreamClient, DataFeed, StreamClientConfig, StreamClientError, SubscriptionState,
};
