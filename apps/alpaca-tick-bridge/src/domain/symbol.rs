//! Symbol value object for instrument identifiers.

use std::fmt;

/// Security type classifier carried by every symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SecurityType {
    /// Common stock / ETF.
    #[default]
    Equity,
    /// Listed option contract.
    Option,
    /// Futures contract.
    Future,
    /// Foreign exchange pair.
    Forex,
    /// Crypto asset pair.
    Crypto,
    /// Non-tradable index.
    Index,
}

impl SecurityType {
    /// Get the lowercase name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Equity => "equity",
            Self::Option => "option",
            Self::Future => "future",
            Self::Forex => "forex",
            Self::Crypto => "crypto",
            Self::Index => "index",
        }
    }
}

impl fmt::Display for SecurityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Market (venue family) an instrument is listed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Market {
    /// US equity and equity option venues.
    #[default]
    Usa,
    /// CME Globex.
    Cme,
    /// Cboe futures and index venues.
    Cboe,
    /// ICE futures venues.
    Ice,
}

impl Market {
    /// Get the lowercase name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Usa => "usa",
            Self::Cme => "cme",
            Self::Cboe => "cboe",
            Self::Ice => "ice",
        }
    }
}

impl fmt::Display for Market {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A tradable instrument identifier.
///
/// Immutable once constructed. The display value is normalized to uppercase,
/// so `"aapl"` and `"AAPL"` name the same instrument. Equality covers the
/// full identifier (value, security type and market).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Symbol {
    value: String,
    security_type: SecurityType,
    market: Market,
}

impl Symbol {
    /// Create a new symbol.
    #[must_use]
    pub fn new(value: impl Into<String>, security_type: SecurityType, market: Market) -> Self {
        Self {
            value: value.into().to_uppercase(),
            security_type,
            market,
        }
    }

    /// Create a US equity symbol.
    #[must_use]
    pub fn equity(value: impl Into<String>) -> Self {
        Self::new(value, SecurityType::Equity, Market::Usa)
    }

    /// Get the display value (ticker).
    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Get the security type.
    #[must_use]
    pub const fn security_type(&self) -> SecurityType {
        self.security_type
    }

    /// Get the market.
    #[must_use]
    pub const fn market(&self) -> Market {
        self.market
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value)
    }
}

impl AsRef<str> for Symbol {
    fn as_ref(&self) -> &str {
        &self.value
    }
}
