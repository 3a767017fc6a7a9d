//! Domain Layer - Core market data types and subscription rules.
//!
//! This layer contains the instrument identifiers, the upstream event and
//! canonical tick records, and the subscription bookkeeping. Nothing here
//! performs I/O.

/// Instrument identifiers (symbol, security type, market).
pub mod symbol;

/// Market data streaming types (upstream events, canonical ticks).
pub mod streaming;

/// Subscription tracking and the eligibility rule.
pub mod subscription;
