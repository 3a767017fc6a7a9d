//! Exchange Time Zone Cache
//!
//! Memoizes exchange time zone lookups per symbol. Entries are written once
//! and never evicted; the key space is the set of instruments the process
//! has ever seen events for.

use std::collections::HashMap;
use std::sync::Arc;

use chrono_tz::Tz;
use parking_lot::RwLock;

use crate::application::ports::{ExchangeHoursError, ExchangeHoursProvider};
use crate::domain::symbol::Symbol;
use crate::infrastructure::metrics::{self, LookupResult};

/// Get-or-compute cache over an [`ExchangeHoursProvider`].
pub struct ExchangeTimeZoneCache {
    provider: Arc<dyn ExchangeHoursProvider>,
    zones: RwLock<HashMap<Symbol, Tz>>,
}

impl ExchangeTimeZoneCache {
    /// Create an empty cache.
    #[must_use]
    pub fn new(provider: Arc<dyn ExchangeHoursProvider>) -> Self {
        Self {
            provider,
            zones: RwLock::new(HashMap::new()),
        }
    }

    /// Resolve the exchange time zone for a symbol.
    ///
    /// The provider is consulted without holding the cache lock. If two
    /// callers race on the same symbol the first stored value wins.
    ///
    /// # Errors
    ///
    /// Returns the provider's error; nothing is cached on failure.
    pub fn resolve(&self, symbol: &Symbol) -> Result<Tz, ExchangeHoursError> {
        if let Some(tz) = self.zones.read().get(symbol) {
            metrics::record_time_zone_lookup(LookupResult::Hit);
            return Ok(*tz);
        }

        let resolved = self
            .provider
            .exchange_time_zone(symbol.market(), symbol, symbol.security_type())
            .inspect_err(|e| {
                metrics::record_time_zone_lookup(LookupResult::Error);
                tracing::debug!(symbol = %symbol, error = %e, "Exchange time zone lookup failed");
            })?;
        metrics::record_time_zone_lookup(LookupResult::Miss);

        let tz = *self.zones.write().entry(symbol.clone()).or_insert(resolved);
        tracing::debug!(symbol = %symbol, time_zone = %tz, "Cached exchange time zone");
        Ok(tz)
    }

    /// Number of cached entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.zones.read().len()
    }

    /// Check if nothing has been resolved yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.zones.read().is_empty()
    }
}

impl std::fmt::Debug for ExchangeTimeZoneCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExchangeTimeZoneCache")
            .field("entries", &self.len())
            .finish_non_exhaustive()
    }
}
