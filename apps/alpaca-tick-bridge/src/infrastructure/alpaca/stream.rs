//! Alpaca Stock Stream Client
//!
//! Connects to Alpaca's real-time stock stream, authenticates, and forwards
//! quote/trade messages to a [`StreamEventHandler`]. Implements
//! [`StreamingFeed`] so the subscription registry can drive it.
//!
//! # Stream URL
//!
//! - `wss://stream.data.alpaca.markets/v2/sip` (full consolidated tape)
//! - `wss://stream.data.alpaca.markets/v2/iex` (IEX only)
//!
//! # Subscription flow
//!
//! The client keeps the desired quote/trade symbol sets. Feed calls made
//! before authentication only update that state; it is sent in a single
//! subscribe frame once the server confirms authentication. Calls made
//! afterwards are queued to the connection task as individual frames.
//!
//! The client runs one connection. It does not reconnect.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use futures_util::{SinkExt, StreamExt};
use parking_lot::{Mutex, RwLock};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::time::Instant;
use tokio_tungstenite::tungstenite::Message;
use tokio_util::sync::CancellationToken;

use super::auth::{AUTH_TIMEOUT, AuthError, AuthHandler, Credentials};
use super::codec::JsonCodec;
use super::messages::{AlpacaMessage, SubscriptionRequest};
use crate::application::ports::{FeedError, StreamEventHandler, StreamingFeed};
use crate::infrastructure::metrics;

// =============================================================================
// Error Type
// =============================================================================

/// Errors that can end the stream client.
#[derive(Debug, thiserror::Error)]
pub enum StreamClientError {
    /// WebSocket error.
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    /// Authentication failed.
    #[error("authentication failed: {0}")]
    AuthenticationFailed(#[from] AuthError),

    /// Outbound frame could not be encoded or sent.
    #[error("failed to send {what}: {message}")]
    SendFailed {
        /// Frame kind.
        what: &'static str,
        /// Error details.
        message: String,
    },

    /// `run` was called more than once.
    #[error("stream client already started")]
    AlreadyStarted,

    /// Connection closed by the server.
    #[error("connection closed")]
    ConnectionClosed,
}

// =============================================================================
// Configuration
// =============================================================================

/// Alpaca stock data feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DataFeed {
    /// Consolidated tape from all US exchanges.
    #[default]
    Sip,
    /// IEX exchange only.
    Iex,
}

impl DataFeed {
    /// Get the URL path segment.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Sip => "sip",
            Self::Iex => "iex",
        }
    }
}

impl fmt::Display for DataFeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DataFeed {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "sip" => Ok(Self::Sip),
            "iex" => Ok(Self::Iex),
            other => Err(format!("unknown data feed: {other}")),
        }
    }
}

/// Default capacity of the outbound command queue.
pub const DEFAULT_COMMAND_CAPACITY: usize = 1024;

/// Configuration for the stream client.
#[derive(Debug, Clone)]
pub struct StreamClientConfig {
    /// WebSocket URL.
    pub url: String,
    /// API credentials.
    pub credentials: Credentials,
    /// Outbound command queue capacity.
    pub command_capacity: usize,
}

impl StreamClientConfig {
    /// Create a new configuration.
    #[must_use]
    pub fn new(url: impl Into<String>, credentials: Credentials) -> Self {
        Self {
            url: url.into(),
            credentials,
            command_capacity: DEFAULT_COMMAND_CAPACITY,
        }
    }

    /// Configuration for a production data feed.
    ///
    /// Market data always uses the production host; paper and live accounts
    /// see the same data.
    #[must_use]
    pub fn for_feed(credentials: Credentials, feed: DataFeed) -> Self {
        Self::new(
            format!("wss://stream.data.alpaca.markets/v2/{feed}"),
            credentials,
        )
    }

    /// Set the outbound command queue capacity.
    #[must_use]
    pub fn with_command_capacity(mut self, capacity: usize) -> Self {
        self.command_capacity = capacity.max(1);
        self
    }
}

// =============================================================================
// Subscription State
// =============================================================================

/// Desired upstream subscriptions.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SubscriptionState {
    /// Symbols subscribed for quotes.
    pub quotes: BTreeSet<String>,
    /// Symbols subscribed for trades.
    pub trades: BTreeSet<String>,
}

impl SubscriptionState {
    /// Check if there are any active subscriptions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.quotes.is_empty() && self.trades.is_empty()
    }

    /// Create a subscribe request restoring all subscriptions.
    #[must_use]
    pub fn to_subscribe_request(&self) -> Option<SubscriptionRequest> {
        if self.is_empty() {
            return None;
        }

        Some(
            SubscriptionRequest::subscribe()
                .with_quotes(self.quotes.iter().cloned().collect())
                .with_trades(self.trades.iter().cloned().collect()),
        )
    }
}

#[derive(Debug, Clone, Copy)]
enum Channel {
    Quotes,
    Trades,
}

// =============================================================================
// Stream Client
// =============================================================================

/// Alpaca stock stream client.
pub struct AlpacaStreamClient {
    config: StreamClientConfig,
    codec: JsonCodec,
    cancel: CancellationToken,
    commands_tx: mpsc::Sender<SubscriptionRequest>,
    commands_rx: Mutex<Option<mpsc::Receiver<SubscriptionRequest>>>,
    subscriptions: RwLock<SubscriptionState>,
    authenticated: AtomicBool,
    stopped: AtomicBool,
}

impl AlpacaStreamClient {
    /// Create a new stream client.
    #[must_use]
    pub fn new(config: StreamClientConfig, cancel: CancellationToken) -> Self {
        let (commands_tx, commands_rx) = mpsc::channel(config.command_capacity.max(1));

        Self {
            config,
            codec: JsonCodec::new(),
            cancel,
            commands_tx,
            commands_rx: Mutex::new(Some(commands_rx)),
            subscriptions: RwLock::new(SubscriptionState::default()),
            authenticated: AtomicBool::new(false),
            stopped: AtomicBool::new(false),
        }
    }

    /// Check if the stream is connected and authenticated.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.authenticated.load(Ordering::SeqCst)
    }

    /// Get the desired subscriptions.
    #[must_use]
    pub fn subscriptions(&self) -> SubscriptionState {
        self.subscriptions.read().clone()
    }

    /// Run the connection until cancelled or the connection ends.
    ///
    /// Quote and trade messages are handed to `handler` on this task.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection, authentication or an outbound
    /// frame fails, or if the server closes the stream.
    pub async fn run(
        self: Arc<Self>,
        handler: Arc<dyn StreamEventHandler>,
    ) -> Result<(), StreamClientError> {
        let Some(mut commands_rx) = self.commands_rx.lock().take() else {
            return Err(StreamClientError::AlreadyStarted);
        };

        let result = self.connect_and_run(&mut commands_rx, handler.as_ref()).await;

        self.authenticated.store(false, Ordering::SeqCst);
        self.stopped.store(true, Ordering::SeqCst);
        commands_rx.close();

        match &result {
            Ok(()) => tracing::info!("Stock stream closed"),
            Err(e) => {
                metrics::record_upstream_error("connection");
                tracing::error!(error = %e, "Stock stream terminated");
            }
        }
        result
    }

    async fn connect_and_run(
        &self,
        commands_rx: &mut mpsc::Receiver<SubscriptionRequest>,
        handler: &dyn StreamEventHandler,
    ) -> Result<(), StreamClientError> {
        tracing::info!(url = %self.config.url, "Connecting to stock stream");

        let (ws_stream, _response) = tokio_tungstenite::connect_async(&self.config.url).await?;
        let (mut write, mut read) = ws_stream.split();

        let mut auth_handler = AuthHandler::new(self.config.credentials.clone());
        let auth_deadline = tokio::time::sleep_until(Instant::now() + AUTH_TIMEOUT);
        tokio::pin!(auth_deadline);

        loop {
            tokio::select! {
                () = self.cancel.cancelled() => {
                    let _ = write.send(Message::Close(None)).await;
                    return Ok(());
                }
                () = &mut auth_deadline, if !auth_handler.is_authenticated() => {
                    return Err(AuthError::Timeout.into());
                }
                Some(request) = commands_rx.recv() => {
                    self.send_request(&mut write, &request).await?;
                }
                msg = read.next() => {
                    match msg {
                        Some(Ok(Message::Text(text))) => {
                            self.handle_text_message(&text, &mut auth_handler, &mut write, handler)
                                .await?;
                        }
                        Some(Ok(Message::Ping(data))) => {
                            write.send(Message::Pong(data)).await?;
                        }
                        Some(Ok(Message::Close(_))) | None => {
                            tracing::info!("Server closed stock stream");
                            return Err(StreamClientError::ConnectionClosed);
                        }
                        Some(Ok(_)) => {}
                        Some(Err(e)) => return Err(e.into()),
                    }
                }
            }
        }
    }

    async fn handle_text_message<W>(
        &self,
        text: &str,
        auth_handler: &mut AuthHandler,
        write: &mut W,
        handler: &dyn StreamEventHandler,
    ) -> Result<(), StreamClientError>
    where
        W: SinkExt<Message> + Unpin,
        W::Error: fmt::Display,
    {
        let messages = match self.codec.decode(text) {
            Ok(messages) => messages,
            Err(e) => {
                metrics::record_upstream_error("decode");
                tracing::warn!(error = %e, "Failed to decode stream message");
                return Ok(());
            }
        };

        for msg in messages {
            metrics::record_upstream_message(msg.label());

            match msg {
                AlpacaMessage::Success(success) => {
                    if auth_handler.on_success(&success) {
                        tracing::info!("Stock stream authenticated");
                        if let Some(request) = self.mark_authenticated() {
                            self.send_request(write, &request).await?;
                        }
                    } else if auth_handler.state().can_authenticate() {
                        let request = auth_handler.create_auth_request();
                        let json = self.codec.encode(&request).map_err(|e| {
                            StreamClientError::SendFailed {
                                what: "auth",
                                message: e.to_string(),
                            }
                        })?;
                        write.send(Message::Text(json.into())).await.map_err(|e| {
                            StreamClientError::SendFailed {
                                what: "auth",
                                message: e.to_string(),
                            }
                        })?;
                    }
                }
                AlpacaMessage::Error(error) => {
                    if !auth_handler.is_authenticated() {
                        return Err(auth_handler.on_error(&error).into());
                    }
                    metrics::record_upstream_error(&error.code.to_string());
                    tracing::warn!(code = error.code, msg = %error.msg, "Stock stream error");
                }
                AlpacaMessage::Subscription(sub) => {
                    tracing::debug!(
                        quotes = ?sub.quotes,
                        trades = ?sub.trades,
                        "Subscription confirmed"
                    );
                }
                AlpacaMessage::Quote(quote) => handler.on_quote(quote.into()),
                AlpacaMessage::Trade(trade) => handler.on_trade(trade.into()),
            }
        }

        Ok(())
    }

    /// Flip to authenticated and snapshot the state to replay.
    ///
    /// Done under the state lock so a concurrent feed call either lands in
    /// the snapshot or is queued after it.
    fn mark_authenticated(&self) -> Option<SubscriptionRequest> {
        let subs = self.subscriptions.write();
        self.authenticated.store(true, Ordering::SeqCst);
        subs.to_subscribe_request()
    }

    async fn send_request<W>(
        &self,
        write: &mut W,
        request: &SubscriptionRequest,
    ) -> Result<(), StreamClientError>
    where
        W: SinkExt<Message> + Unpin,
        W::Error: fmt::Display,
    {
        let json = self
            .codec
            .encode(request)
            .map_err(|e| StreamClientError::SendFailed {
                what: request.action,
                message: e.to_string(),
            })?;

        tracing::debug!(
            action = request.action,
            quotes = ?request.quotes,
            trades = ?request.trades,
            "Sending subscription request"
        );

        write
            .send(Message::Text(json.into()))
            .await
            .map_err(|e| StreamClientError::SendFailed {
                what: request.action,
                message: e.to_string(),
            })
    }

    fn apply(&self, channel: Channel, symbol: &str, subscribe: bool) -> Result<(), FeedError> {
        if self.stopped.load(Ordering::SeqCst) {
            return Err(FeedError::Disconnected);
        }

        let mut subs = self.subscriptions.write();

        if self.authenticated.load(Ordering::SeqCst) {
            let base = if subscribe {
                SubscriptionRequest::subscribe()
            } else {
                SubscriptionRequest::unsubscribe()
            };
            let request = match channel {
                Channel::Quotes => base.with_quotes(vec![symbol.to_string()]),
                Channel::Trades => base.with_trades(vec![symbol.to_string()]),
            };

            self.commands_tx.try_send(request).map_err(|e| match e {
                TrySendError::Full(_) => FeedError::Rejected {
                    symbol: symbol.to_string(),
                    message: "command queue full".to_string(),
                },
                TrySendError::Closed(_) => FeedError::Disconnected,
            })?;
        }

        let set = match channel {
            Channel::Quotes => &mut subs.quotes,
            Channel::Trades => &mut subs.trades,
        };
        if subscribe {
            set.insert(symbol.to_string());
        } else {
            set.remove(symbol);
        }

        Ok(())
    }
}

impl StreamingFeed for AlpacaStreamClient {
    fn subscribe_quote(&self, symbol: &str) -> Result<(), FeedError> {
        self.apply(Channel::Quotes, symbol, true)
    }

    fn unsubscribe_quote(&self, symbol: &str) -> Result<(), FeedError> {
        self.apply(Channel::Quotes, symbol, false)
    }

    fn subscribe_trade(&self, symbol: &str) -> Result<(), FeedError> {
        self.apply(Channel::Trades, symbol, true)
    }

    fn unsubscribe_trade(&self, symbol: &str) -> Result<(), FeedError> {
        self.apply(Channel::Trades, symbol, false)
    }
}

impl fmt::Debug for AlpacaStreamClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AlpacaStreamClient")
            .field("url", &self.config.url)
            .field("authenticated", &self.is_connected())
            .field("stopped", &self.stopped.load(Ordering::SeqCst))
            .finish_non_exhaustive()
    }
}
