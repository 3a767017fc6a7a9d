//! Alpaca Tick Bridge Binary
//!
//! Starts the tick bridge.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin alpaca-tick-bridge
//! ```
//!
//! # Environment Variables
//!
//! ## Required
//! - `ALPACA_KEY`: Alpaca API key
//! - `ALPACA_SECRET`: Alpaca API secret
//!
//! ## Optional
//! - `ALPACA_FEED`: Market data feed - "sip" | "iex" (default: sip)
//! - `TICK_BRIDGE_SYMBOLS`: Comma-separated equities subscribed at start-up
//! - `TICK_BRIDGE_HEALTH_PORT`: Health check HTTP port (default: 8083)
//! - `TICK_BRIDGE_TICK_CAPACITY`: Aggregator buffer size (default: 10000)
//! - `TICK_BRIDGE_COMMAND_CAPACITY`: Upstream command queue size (default: 1024)
//! - `TICK_BRIDGE_DEFAULT_TIME_ZONE`: US exchange zone (default: America/New_York)
//! - `OTEL_ENABLED`: Enable OpenTelemetry (default: true)
//! - `OTEL_EXPORTER_OTLP_ENDPOINT`: OTLP endpoint (default: <http://localhost:4317>)
//! - `OTEL_SERVICE_NAME`: Service name (default: alpaca-tick-bridge)
//! - `RUST_LOG`: Log level (default: info)

use std::sync::Arc;
use std::time::Duration;

use alpaca_tick_bridge::infrastructure::telemetry;
use alpaca_tick_bridge::{
    AggregatorConfig, AlpacaStreamClient, BridgeConfig, HealthServer, HealthServerState,
    MarketHoursDatabase, StreamClientConfig, SubscriptionDataConfig, Symbol, TickAggregator,
    TickBridge, TickStream, init_metrics,
};
use anyhow::Context;
use futures::StreamExt;
use tokio::signal;
use tokio_util::sync::CancellationToken;

/// Graceful shutdown timeout.
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(30);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    rustls::crypto::ring::default_provider()
        .install_default()
        .map_err(|_| anyhow::anyhow!("failed to install rustls crypto provider"))?;

    load_dotenv();

    let _telemetry_guard = telemetry::init().context("failed to initialize telemetry")?;

    tracing::info!("Starting Alpaca Tick Bridge");

    let _metrics_handle = init_metrics().context("failed to install metrics recorder")?;

    let config = load_config(|key| std::env::var(key).ok())?;
    log_config(&config);

    let shutdown_token = CancellationToken::new();

    let aggregator = Arc::new(TickAggregator::new(AggregatorConfig::from(
        config.aggregator,
    )));

    let stream_config = StreamClientConfig::for_feed(config.credentials.clone(), config.feed)
        .with_command_capacity(config.stream.command_capacity);
    let stream_client = Arc::new(AlpacaStreamClient::new(
        stream_config,
        shutdown_token.clone(),
    ));

    let bridge = Arc::new(TickBridge::new(
        stream_client.clone(),
        aggregator.clone(),
        Arc::new(MarketHoursDatabase::usa(config.default_time_zone)),
    ));

    // Subscriptions made before the stream starts are sent on authentication
    for (symbol, ticks) in subscribe_startup_symbols(&bridge, &config.symbols)? {
        tokio::spawn(log_ticks(symbol.to_string(), ticks));
    }

    let health_state = Arc::new(HealthServerState::new(
        env!("CARGO_PKG_VERSION").to_string(),
        Arc::clone(&bridge),
        Arc::clone(&aggregator),
        Arc::clone(&stream_client),
    ));
    let health_server = HealthServer::new(
        config.server.health_port,
        health_state,
        shutdown_token.clone(),
    );

    let stream_shutdown = shutdown_token.clone();
    let stream_task = tokio::spawn({
        let client = Arc::clone(&stream_client);
        let handler = bridge.event_handler();
        async move {
            if let Err(e) = client.run(handler).await {
                tracing::error!(error = %e, "Stock stream client error");
            }
            stream_shutdown.cancel();
        }
    });

    let health_task = tokio::spawn(async move {
        if let Err(e) = health_server.run().await {
            tracing::error!(error = %e, "Health server error");
        }
    });

    tracing::info!("Tick bridge ready");

    await_shutdown(shutdown_token).await;

    let drained = tokio::time::timeout(SHUTDOWN_TIMEOUT, async {
        let _ = stream_task.await;
        let _ = health_task.await;
    })
    .await;
    if drained.is_err() {
        tracing::warn!(
            timeout_secs = SHUTDOWN_TIMEOUT.as_secs(),
            "Shutdown timed out"
        );
    }

    tracing::info!("Tick bridge stopped");
    Ok(())
}

/// Load configuration through `lookup`, attaching start-up context.
fn load_config(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<BridgeConfig> {
    BridgeConfig::from_lookup(lookup).context("failed to load configuration")
}

/// Subscribe the configured start-up symbols, stopping at the first failure.
fn subscribe_startup_symbols<'a>(
    bridge: &TickBridge,
    symbols: &'a [Symbol],
) -> anyhow::Result<Vec<(&'a Symbol, TickStream)>> {
    symbols
        .iter()
        .map(|symbol| {
            bridge
                .subscribe(&SubscriptionDataConfig::new(symbol.clone()))
                .map(|ticks| (symbol, ticks))
                .with_context(|| format!("failed to subscribe {symbol}"))
        })
        .collect()
}

/// Drain one start-up subscription, logging each tick.
async fn log_ticks(symbol: String, mut ticks: TickStream) {
    while let Some(tick) = ticks.next().await {
        tracing::debug!(
            symbol = %tick.symbol,
            kind = %tick.kind,
            time = %tick.time,
            value = %tick.value,
            "Tick"
        );
    }
    tracing::debug!(symbol = %symbol, "Tick stream ended");
}

/// Load .env file from current directory or any ancestor directory.
fn load_dotenv() {
    if dotenvy::dotenv().is_ok() {
        return;
    }

    if let Ok(cwd) = std::env::current_dir() {
        for dir in cwd.ancestors().skip(1) {
            let env_path = dir.join(".env");
            if env_path.exists() {
                let _ = dotenvy::from_path(&env_path);
                return;
            }
        }
    }
}

/// Log the parsed configuration.
fn log_config(config: &BridgeConfig) {
    tracing::info!(
        feed = config.feed.as_str(),
        symbols = config.symbols.len(),
        health_port = config.server.health_port,
        tick_capacity = config.aggregator.tick_capacity,
        default_time_zone = %config.default_time_zone,
        "Configuration loaded"
    );
}

/// Wait for a shutdown signal (SIGTERM or SIGINT) or an internal stop.
async fn await_shutdown(shutdown_token: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, initiating shutdown");
        }
        () = shutdown_token.cancelled() => {
            tracing::info!("Stock stream stopped, initiating shutdown");
        }
    }

    shutdown_token.cancel();
}
