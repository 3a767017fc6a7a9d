//! Configuration Module
//!
//! Configuration loading for the bridge service.

mod settings;

pub use settings::{
    AggregatorSettings, BridgeConfig, ConfigError, ServerSettings, StreamSettings,
};
