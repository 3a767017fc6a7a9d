//! Port Interfaces
//!
//! Defines the interfaces (ports) for external systems following
//! the Hexagonal Architecture pattern. These are the contracts that
//! infrastructure adapters must implement.
//!
//! ## Driven Ports (Outbound)
//!
//! - `StreamingFeed`: upstream quote/trade subscription commands
//! - `TickSink`: downstream aggregation of normalized ticks
//! - `ExchangeHoursProvider`: exchange time zone lookups
//!
//! ## Driver Ports (Inbound)
//!
//! - `StreamEventHandler`: callbacks the upstream transport invokes

mod exchange_hours_port;
mod streaming_feed_port;
mod tick_sink_port;

pub use exchange_hours_port::{ExchangeHoursError, ExchangeHoursProvider};
pub use streaming_feed_port::{FeedError, StreamEventHandler, StreamingFeed};
pub use tick_sink_port::{TickSink, TickStream};
