//! Prometheus Metrics Module
//!
//! Exposes bridge metrics via Prometheus format for monitoring.
//!
//! # Metrics Categories
//!
//! - **Ticks**: normalized ticks emitted and upstream events dropped, by kind
//! - **Subscriptions**: upstream subscribe/unsubscribe requests and the
//!   subscribed symbol count
//! - **Time zones**: exchange time zone cache hits, misses and failures
//! - **Upstream**: raw messages received and transport errors
//!
//! # Integration
//!
//! Metrics are exposed at `/metrics` on the health server port. Until
//! [`init_metrics`] runs, recording is a no-op.

use std::sync::OnceLock;

use metrics::{counter, describe_counter, describe_gauge, gauge};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};

use crate::domain::streaming::TickKind;

// =============================================================================
// Global Metrics Handle
// =============================================================================

static PROMETHEUS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Initialize the Prometheus metrics recorder.
///
/// Subsequent calls return the already installed handle.
///
/// # Errors
///
/// Returns an error if the global recorder cannot be installed.
pub fn init_metrics() -> Result<PrometheusHandle, BuildError> {
    if let Some(handle) = PROMETHEUS_HANDLE.get() {
        return Ok(handle.clone());
    }

    let handle = PrometheusBuilder::new().install_recorder()?;
    register_metrics();

    Ok(PROMETHEUS_HANDLE.get_or_init(|| handle).clone())
}

/// Get the Prometheus handle for rendering metrics.
///
/// Returns `None` if metrics have not been initialized.
#[must_use]
pub fn get_metrics_handle() -> Option<PrometheusHandle> {
    PROMETHEUS_HANDLE.get().cloned()
}

// =============================================================================
// Metric Registration
// =============================================================================

fn register_metrics() {
    // Tick flow
    describe_counter!(
        "tick_bridge_ticks_emitted_total",
        "Total normalized ticks handed to the aggregator"
    );
    describe_counter!(
        "tick_bridge_events_dropped_total",
        "Total upstream events dropped for symbols not subscribed"
    );
    describe_counter!(
        "tick_bridge_subscriber_lagged_total",
        "Total ticks skipped by subscribers that fell behind"
    );

    // Subscriptions
    describe_counter!(
        "tick_bridge_upstream_requests_total",
        "Total subscribe/unsubscribe requests issued to the upstream feed"
    );
    describe_gauge!(
        "tick_bridge_subscribed_symbols",
        "Number of symbols with an active upstream subscription"
    );

    // Time zones
    describe_counter!(
        "tick_bridge_time_zone_lookups_total",
        "Exchange time zone lookups by result"
    );

    // Upstream transport
    describe_counter!(
        "tick_bridge_upstream_messages_total",
        "Total messages received from the upstream feed by type"
    );
    describe_counter!(
        "tick_bridge_upstream_errors_total",
        "Total upstream transport errors by type"
    );
}

// =============================================================================
// Metric Recording Functions
// =============================================================================

/// Upstream request direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestAction {
    /// Start a channel.
    Subscribe,
    /// Stop a channel.
    Unsubscribe,
}

impl RequestAction {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Subscribe => "subscribe",
            Self::Unsubscribe => "unsubscribe",
        }
    }
}

/// Exchange time zone lookup result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupResult {
    /// Served from the cache.
    Hit,
    /// Resolved by the provider.
    Miss,
    /// Provider failed.
    Error,
}

impl LookupResult {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Hit => "hit",
            Self::Miss => "miss",
            Self::Error => "error",
        }
    }
}

/// Record a tick handed to the aggregator.
pub fn record_tick_emitted(kind: TickKind) {
    counter!(
        "tick_bridge_ticks_emitted_total",
        "kind" => kind.as_str()
    )
    .increment(1);
}

/// Record an upstream event dropped for an unknown symbol.
pub fn record_event_dropped(kind: TickKind) {
    counter!(
        "tick_bridge_events_dropped_total",
        "kind" => kind.as_str()
    )
    .increment(1);
}

/// Record ticks skipped by a lagging subscriber.
pub fn record_subscriber_lagged(count: u64) {
    counter!("tick_bridge_subscriber_lagged_total").increment(count);
}

/// Record an upstream subscribe/unsubscribe request.
pub fn record_upstream_request(action: RequestAction, channel: TickKind) {
    counter!(
        "tick_bridge_upstream_requests_total",
        "action" => action.as_str(),
        "channel" => channel.as_str()
    )
    .increment(1);
}

/// Update the subscribed symbol count.
#[allow(clippy::cast_precision_loss)]
pub fn set_subscribed_symbols(count: usize) {
    gauge!("tick_bridge_subscribed_symbols").set(count as f64);
}

/// Record an exchange time zone lookup.
pub fn record_time_zone_lookup(result: LookupResult) {
    counter!(
        "tick_bridge_time_zone_lookups_total",
        "result" => result.as_str()
    )
    .increment(1);
}

/// Record a message received from the upstream feed.
pub fn record_upstream_message(message_type: &'static str) {
    counter!(
        "tick_bridge_upstream_messages_total",
        "message_type" => message_type
    )
    .increment(1);
}

/// Record an upstream transport error.
pub fn record_upstream_error(error_type: &str) {
    counter!(
        "tick_bridge_upstream_errors_total",
        "error_type" => error_type.to_string()
    )
    .increment(1);
}

// =============================================================================
// Tests
// =============================================================================
