//! Subscription Management Types
//!
//! Domain types for tracking which symbols hold an active upstream
//! subscription, and the rule deciding which symbols may reach the feed.
//!
//! # Design
//!
//! The subscription set is keyed by the symbol's display value, since that is
//! all the upstream feed echoes back on quote/trade events. It is shared
//! between the subscription registry (writer) and the event normalizer
//! (reader); a lookup either sees a fully constructed entry or none.

use std::collections::HashMap;

use parking_lot::RwLock;

use super::streaming::{Tick, TickKind};
use super::symbol::{SecurityType, Symbol};

// =============================================================================
// Eligibility Rule
// =============================================================================

/// The only security type forwarded to the live feed.
pub const SUPPORTED_SECURITY_TYPE: SecurityType = SecurityType::Equity;

/// Marker for synthetic/aggregate identifiers (matched case-insensitively).
pub const UNIVERSE_MARKER: &str = "universe";

/// Returns true if the symbol may be subscribed on the upstream feed.
///
/// Only equities are supported, and universe selection symbols (any value
/// containing "universe", in any case) never reach the feed.
#[must_use]
pub fn can_subscribe(symbol: &Symbol) -> bool {
    if symbol.security_type() != SUPPORTED_SECURITY_TYPE {
        return false;
    }

    !symbol.value().to_lowercase().contains(UNIVERSE_MARKER)
}

// =============================================================================
// Subscription Descriptor
// =============================================================================

/// Describes one downstream subscriber's data request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionDataConfig {
    symbol: Symbol,
    tick_kinds: Vec<TickKind>,
}

impl SubscriptionDataConfig {
    /// Request both quotes and trades for a symbol.
    #[must_use]
    pub fn new(symbol: Symbol) -> Self {
        Self {
            symbol,
            tick_kinds: TickKind::all().to_vec(),
        }
    }

    /// Restrict the request to the given tick kinds.
    #[must_use]
    pub fn with_tick_kinds(mut self, kinds: &[TickKind]) -> Self {
        self.tick_kinds = kinds.to_vec();
        self
    }

    /// Get the requested symbol.
    #[must_use]
    pub const fn symbol(&self) -> &Symbol {
        &self.symbol
    }

    /// Get the requested tick kinds.
    #[must_use]
    pub fn tick_kinds(&self) -> &[TickKind] {
        &self.tick_kinds
    }

    /// Check whether a tick belongs to this subscriber.
    #[must_use]
    pub fn accepts(&self, tick: &Tick) -> bool {
        tick.symbol == self.symbol && self.tick_kinds.contains(&tick.kind)
    }
}

// =============================================================================
// Subscription Changes
// =============================================================================

/// Symbols whose upstream subscription changed during one request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubscriptionChanges {
    /// Symbols newly subscribed upstream.
    pub subscribe: Vec<Symbol>,
    /// Symbols unsubscribed upstream.
    pub unsubscribe: Vec<Symbol>,
}

impl SubscriptionChanges {
    /// Check if there are any changes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.subscribe.is_empty() && self.unsubscribe.is_empty()
    }
}

// =============================================================================
// Subscription Set
// =============================================================================

/// Thread-safe set of symbols with an active upstream subscription.
///
/// Keyed by display value; a value appears at most once. Only the
/// subscription registry writes to it, so outside the crate it is read-only:
///
/// ```compile_fail
/// use alpaca_tick_bridge::{SubscriptionSet, Symbol};
///
/// let set = SubscriptionSet::new();
/// set.insert(Symbol::equity("TSLA"));
/// ```
#[derive(Debug, Default)]
pub struct SubscriptionSet {
    symbols: RwLock<HashMap<String, Symbol>>,
}

impl SubscriptionSet {
    /// Create an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Check whether a value is subscribed.
    #[must_use]
    pub fn contains(&self, value: &str) -> bool {
        self.symbols.read().contains_key(value)
    }

    /// Look up the subscribed symbol for a feed value.
    #[must_use]
    pub fn get(&self, value: &str) -> Option<Symbol> {
        self.symbols.read().get(value).cloned()
    }

    /// Record a symbol. Returns false if its value was already present.
    pub(crate) fn insert(&self, symbol: Symbol) -> bool {
        let mut symbols = self.symbols.write();
        if symbols.contains_key(symbol.value()) {
            return false;
        }
        symbols.insert(symbol.value().to_string(), symbol);
        true
    }

    /// Remove a value, returning the symbol it mapped to.
    pub(crate) fn remove(&self, value: &str) -> Option<Symbol> {
        self.symbols.write().remove(value)
    }

    /// Snapshot of all subscribed symbols.
    #[must_use]
    pub fn symbols(&self) -> Vec<Symbol> {
        self.symbols.read().values().cloned().collect()
    }

    /// Number of subscribed symbols.
    #[must_use]
    pub fn len(&self) -> usize {
        self.symbols.read().len()
    }

    /// Check if nothing is subscribed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.symbols.read().is_empty()
    }
}

// =============================================================================
// Statistics
// =============================================================================

/// Subscription statistics.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubscriptionStats {
    /// Number of subscribed symbols.
    pub symbol_count: usize,
    /// Upstream channels held open (one quote and one trade per symbol).
    pub upstream_channels: usize,
}

impl SubscriptionStats {
    /// Derive statistics from a subscription set.
    #[must_use]
    pub fn from_set(set: &SubscriptionSet) -> Self {
        let symbol_count = set.len();
        Self {
            symbol_count,
            upstream_channels: symbol_count * TickKind::all().len(),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
