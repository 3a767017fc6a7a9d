//! Application Layer - Use cases and port definitions.
//!
//! This layer contains the bridge services and the port interfaces that
//! define how the core talks to the upstream feed, the downstream sink and
//! the exchange calendar.

/// Port interfaces for external collaborators (feed, sink, calendar).
pub mod ports;

/// Application services for subscription tracking and tick normalization.
pub mod services;
