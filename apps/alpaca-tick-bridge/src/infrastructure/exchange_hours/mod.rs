//! Market Hours Database
//!
//! Static [`ExchangeHoursProvider`] keyed by (market, security type), with
//! optional per-symbol overrides for instruments listed away from their
//! market's default venue.

use std::collections::HashMap;

use chrono_tz::Tz;

use crate::application::ports::{ExchangeHoursError, ExchangeHoursProvider};
use crate::domain::symbol::{Market, SecurityType, Symbol};

/// In-memory exchange time zone table.
#[derive(Debug, Clone, Default)]
pub struct MarketHoursDatabase {
    entries: HashMap<(Market, SecurityType), Tz>,
    overrides: HashMap<String, Tz>,
}

impl MarketHoursDatabase {
    /// Create an empty database.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Database for US listed instruments.
    ///
    /// `default_tz` covers US equities, equity options and indices; CME and
    /// Cboe futures use their venue's zone.
    #[must_use]
    pub fn usa(default_tz: Tz) -> Self {
        Self::new()
            .with_entry(Market::Usa, SecurityType::Equity, default_tz)
            .with_entry(Market::Usa, SecurityType::Option, default_tz)
            .with_entry(Market::Usa, SecurityType::Index, default_tz)
            .with_entry(Market::Cme, SecurityType::Future, chrono_tz::America::Chicago)
            .with_entry(Market::Cboe, SecurityType::Future, chrono_tz::America::Chicago)
            .with_entry(Market::Ice, SecurityType::Future, chrono_tz::America::New_York)
    }

    /// Add or replace a (market, security type) entry.
    #[must_use]
    pub fn with_entry(mut self, market: Market, security_type: SecurityType, tz: Tz) -> Self {
        self.entries.insert((market, security_type), tz);
        self
    }

    /// Pin a single symbol value to a time zone, ahead of the table.
    #[must_use]
    pub fn with_symbol_override(mut self, value: &str, tz: Tz) -> Self {
        self.overrides.insert(value.to_uppercase(), tz);
        self
    }

    /// Number of (market, security type) entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the table has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl ExchangeHoursProvider for MarketHoursDatabase {
    fn exchange_time_zone(
        &self,
        market: Market,
        symbol: &Symbol,
        security_type: SecurityType,
    ) -> Result<Tz, ExchangeHoursError> {
        if let Some(tz) = self.overrides.get(symbol.value()) {
            return Ok(*tz);
        }

        self.entries
            .get(&(market, security_type))
            .copied()
            .ok_or(ExchangeHoursError::NotFound {
                market,
                security_type,
            })
    }
}

#[cfg(test)]
mod tests {
    use chrono_tz::America::{Chicago, New_York};
    use chrono_tz::Europe::London;
    use test_case::test_case;

    use super::*;

    #[test_case(Market::Usa, SecurityType::Equity => Some(New_York) ; "us equity")]
    #[test_case(Market::Usa, SecurityType::Option => Some(New_York) ; "us option")]
    #[test_case(Market::Cme, SecurityType::Future => Some(Chicago) ; "cme future")]
    #[test_case(Market::Usa, SecurityType::Forex => None ; "forex unknown")]
    #[test_case(Market::Cme, SecurityType::Equity => None ; "cme equity unknown")]
    fn usa_table(market: Market, security_type: SecurityType) -> Option<Tz> {
        let db = MarketHoursDatabase::usa(New_York);
        let symbol = Symbol::new("X", security_type, market);
        db.exchange_time_zone(market, &symbol, security_type).ok()
    }

    #[test]
    fn symbol_override_wins() {
        let db = MarketHoursDatabase::usa(New_York).with_symbol_override("bp", London);
        let bp = Symbol::equity("BP");

        let tz = db
            .exchange_time_zone(Market::Usa, &bp, SecurityType::Equity)
            .unwrap();
        assert_eq!(tz, London);
    }

    #[test]
    fn not_found_names_the_pair() {
        let db = MarketHoursDatabase::new();
        let err = db
            .exchange_time_zone(Market::Usa, &Symbol::equity("AAPL"), SecurityType::Equity)
            .unwrap_err();

        assert_eq!(
            err,
            ExchangeHoursError::NotFound {
                market: Market::Usa,
                security_type: SecurityType::Equity,
            }
        );
        assert!(db.is_empty());
    }
}
