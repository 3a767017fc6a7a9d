//! Tick Sink Port (Driven Port)
//!
//! Interface for the downstream aggregator that receives normalized ticks
//! and serves per-subscriber sequences.

use std::pin::Pin;

use futures::Stream;

use crate::domain::streaming::Tick;
use crate::domain::subscription::SubscriptionDataConfig;

/// Lazy per-subscriber sequence of ticks.
pub type TickStream = Pin<Box<dyn Stream<Item = Tick> + Send>>;

/// Port for handing ticks downstream.
pub trait TickSink: Send + Sync {
    /// Hand a tick to the sink. Ownership transfers; buffering and
    /// backpressure are the sink's concern.
    fn emit(&self, tick: Tick);

    /// Register a subscriber and return its tick sequence.
    fn add(&self, config: &SubscriptionDataConfig) -> TickStream;
}
