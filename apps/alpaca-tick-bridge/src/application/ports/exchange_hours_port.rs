//! Exchange Hours Port (Driven Port)
//!
//! Interface for resolving the local time zone of the exchange an
//! instrument trades on.

use chrono_tz::Tz;

use crate::domain::symbol::{Market, SecurityType, Symbol};

/// Exchange hours lookup error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExchangeHoursError {
    /// No exchange hours entry for the market / security type pair.
    #[error("No exchange hours for {security_type} in market {market}")]
    NotFound {
        /// Market looked up.
        market: Market,
        /// Security type looked up.
        security_type: SecurityType,
    },
}

/// Port for exchange calendar lookups.
pub trait ExchangeHoursProvider: Send + Sync {
    /// Resolve the exchange time zone for a symbol.
    fn exchange_time_zone(
        &self,
        market: Market,
        symbol: &Symbol,
        security_type: SecurityType,
    ) -> Result<Tz, ExchangeHoursError>;
}
