//! Bridge Configuration Settings
//!
//! Configuration types for the tick bridge, loaded from environment
//! variables.

use chrono_tz::Tz;

use crate::domain::symbol::Symbol;
use crate::infrastructure::alpaca::{Credentials, DataFeed};

/// Downstream aggregator settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AggregatorSettings {
    /// Ticks buffered for slow subscribers.
    pub tick_capacity: usize,
}

impl Default for AggregatorSettings {
    fn default() -> Self {
        Self {
            tick_capacity: 10_000,
        }
    }
}

/// Upstream stream settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamSettings {
    /// Capacity of the outbound subscription command queue.
    pub command_capacity: usize,
}

impl Default for StreamSettings {
    fn default() -> Self {
        Self {
            command_capacity: 1024,
        }
    }
}

/// Server port settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServerSettings {
    /// Health check HTTP port (also serves `/metrics`).
    pub health_port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self { health_port: 8083 }
    }
}

/// Complete bridge configuration.
#[derive(Debug, Clone)]
pub struct BridgeConfig {
    /// Market data feed.
    pub feed: DataFeed,
    /// API credentials.
    pub credentials: Credentials,
    /// Equities subscribed at start-up.
    pub symbols: Vec<Symbol>,
    /// Server port settings.
    pub server: ServerSettings,
    /// Aggregator settings.
    pub aggregator: AggregatorSettings,
    /// Upstream stream settings.
    pub stream: StreamSettings,
    /// Exchange time zone for US listed instruments.
    pub default_time_zone: Tz,
}

impl BridgeConfig {
    /// Create configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if required environment variables are missing or a
    /// value cannot be used.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Create configuration from an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// Returns an error if required keys are missing or a value cannot be
    /// used.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let api_key = required(&lookup, "ALPACA_KEY")?;
        let api_secret = required(&lookup, "ALPACA_SECRET")?;
        let credentials = Credentials::new(api_key, api_secret).map_err(|e| {
            ConfigError::InvalidValue {
                key: "ALPACA_KEY".to_string(),
                value: e.to_string(),
            }
        })?;

        let feed = lookup("ALPACA_FEED")
            .and_then(|s| s.parse().ok())
            .unwrap_or_default();

        let symbols = lookup("TICK_BRIDGE_SYMBOLS")
            .map(|s| parse_symbols(&s))
            .unwrap_or_default();

        let server = ServerSettings {
            health_port: parse_or(
                &lookup,
                "TICK_BRIDGE_HEALTH_PORT",
                ServerSettings::default().health_port,
            ),
        };

        let aggregator = AggregatorSettings {
            tick_capacity: parse_or(
                &lookup,
                "TICK_BRIDGE_TICK_CAPACITY",
                AggregatorSettings::default().tick_capacity,
            ),
        };

        let stream = StreamSettings {
            command_capacity: parse_or(
                &lookup,
                "TICK_BRIDGE_COMMAND_CAPACITY",
                StreamSettings::default().command_capacity,
            ),
        };

        let default_time_zone = match lookup("TICK_BRIDGE_DEFAULT_TIME_ZONE") {
            Some(name) if !name.trim().is_empty() => {
                name.trim()
                    .parse::<Tz>()
                    .map_err(|_| ConfigError::InvalidValue {
                        key: "TICK_BRIDGE_DEFAULT_TIME_ZONE".to_string(),
                        value: name.clone(),
                    })?
            }
            _ => chrono_tz::America::New_York,
        };

        Ok(Self {
            feed,
            credentials,
            symbols,
            server,
            aggregator,
            stream,
            default_time_zone,
        })
    }
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Required environment variable is missing.
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),
    /// Environment variable has empty value.
    #[error("environment variable {0} cannot be empty")]
    EmptyValue(String),
    /// Environment variable has an unusable value.
    #[error("invalid value for {key}: {value}")]
    InvalidValue {
        /// Variable name.
        key: String,
        /// Offending value.
        value: String,
    },
}

fn required(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Result<String, ConfigError> {
    let value = lookup(key).ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))?;
    if value.trim().is_empty() {
        return Err(ConfigError::EmptyValue(key.to_string()));
    }
    Ok(value)
}

fn parse_or<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> T {
    lookup(key)
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

fn parse_symbols(list: &str) -> Vec<Symbol> {
    list.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(Symbol::equity)
        .collect()
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    const CREDS: [(&str, &str); 2] = [("ALPACA_KEY", "key"), ("ALPACA_SECRET", "secret")];

    #[test]
    fn defaults() {
        let config = BridgeConfig::from_lookup(lookup(&CREDS)).unwrap();

        assert_eq!(config.feed, DataFeed::Sip);
        assert!(config.symbols.is_empty());
        assert_eq!(config.server.health_port, 8083);
        assert_eq!(config.aggregator.tick_capacity, 10_000);
        assert_eq!(config.stream.command_capacity, 1024);
        assert_eq!(config.default_time_zone, chrono_tz::America::New_York);
    }

    #[test]
    fn missing_key() {
        let err = BridgeConfig::from_lookup(lookup(&[("ALPACA_SECRET", "secret")])).unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnvVar(k) if k == "ALPACA_KEY"));
    }

    #[test]
    fn empty_secret() {
        let err = BridgeConfig::from_lookup(lookup(&[("ALPACA_KEY", "key"), ("ALPACA_SECRET", "")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::EmptyValue(k) if k == "ALPACA_SECRET"));
    }

    #[test]
    fn overrides() {
        let mut vars = CREDS.to_vec();
        vars.extend([
            ("ALPACA_FEED", "IEX"),
            ("TICK_BRIDGE_SYMBOLS", " aapl, MSFT ,,spy"),
            ("TICK_BRIDGE_HEALTH_PORT", "9000"),
            ("TICK_BRIDGE_TICK_CAPACITY", "512"),
            ("TICK_BRIDGE_COMMAND_CAPACITY", "not-a-number"),
            ("TICK_BRIDGE_DEFAULT_TIME_ZONE", "America/Chicago"),
        ]);

        let config = BridgeConfig::from_lookup(lookup(&vars)).unwrap();

        assert_eq!(config.feed, DataFeed::Iex);
        assert_eq!(
            config.symbols,
            vec![Symbol::equity("AAPL"), Symbol::equity("MSFT"), Symbol::equity("SPY")]
        );
        assert_eq!(config.server.health_port, 9000);
        assert_eq!(config.aggregator.tick_capacity, 512);
        assert_eq!(config.stream.command_capacity, 1024);
        assert_eq!(config.default_time_zone, chrono_tz::America::Chicago);
    }

    #[test]
    fn invalid_time_zone() {
        let mut vars = CREDS.to_vec();
        vars.push(("TICK_BRIDGE_DEFAULT_TIME_ZONE", "Mars/Olympus"));

        let err = BridgeConfig::from_lookup(lookup(&vars)).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidValue { ref key, .. } if key == "TICK_BRIDGE_DEFAULT_TIME_ZONE"
        ));
    }
}
