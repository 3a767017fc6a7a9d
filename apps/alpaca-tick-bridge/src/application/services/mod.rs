//! Application Services
//!
//! Services that orchestrate domain logic and coordinate between ports.
//!
//! - `SubscriptionRegistry`: gates and tracks upstream subscriptions
//! - `ExchangeTimeZoneCache`: memoized exchange time zone lookups
//! - `EventNormalizer`: turns upstream events into canonical ticks
//! - `TickBridge`: descriptor-keyed facade over the three

mod bridge;
mod event_normalizer;
mod exchange_time_zones;
mod subscription_registry;

pub use bridge::{BridgeError, TickBridge};
pub use event_normalizer::{EventNormalizer, NormalizeOutcome};
pub use exchange_time_zones::ExchangeTimeZoneCache;
pub use subscription_registry::SubscriptionRegistry;
