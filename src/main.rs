//! jr-kafka-bridge daemon entry point.
//!
//! Startup order matters: configuration is frozen first, then the producer,
//! then the transport. After the producer exists, every exit branch runs the
//! teardown context so deliveries are flushed and transport files removed.

use std::sync::Arc;

use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use jr_kafka_bridge::bridge::Bridge;
use jr_kafka_bridge::config::{BrokerConfig, StartupConfig, LOG_ENV_VAR};
use jr_kafka_bridge::lifecycle::{self, CleanupGuard, ShutdownFlag, Teardown};
use jr_kafka_bridge::sink::KafkaSink;
use jr_kafka_bridge::transport;

/// Initialize tracing with the JR_BRIDGE_LOG environment variable.
///
/// Defaults to "info" level if JR_BRIDGE_LOG is not set.
fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_env(LOG_ENV_VAR)
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let config = StartupConfig::from_args();
    info!(topic = %config.topic, mode = ?config.mode, "Starting jr-kafka-bridge");

    let broker = BrokerConfig::load(&config.broker_config).map_err(|e| {
        error!("Failed to load broker configuration: {}", e);
        e
    })?;

    let sink = Arc::new(KafkaSink::new(&broker, &config.topic).map_err(|e| {
        error!("Failed to create producer: {}", e);
        e
    })?);

    let shutdown = ShutdownFlag::new();
    lifecycle::install_signal_handlers(&shutdown)?;

    let mut teardown = Teardown::new(sink.clone());

    let transport = match transport::bind(&config).await {
        Ok(transport) => transport,
        Err(err) => {
            error!(error = %err, "Failed to set up transport");
            teardown.run().await;
            return Err(err.into());
        }
    };
    if let Some(path) = transport.cleanup_path() {
        teardown.set_cleanup(CleanupGuard::new(path));
    }

    info!("Kafka producer created, waiting for messages");

    let result = Bridge::new(transport, sink, shutdown).run().await;
    teardown.run().await;
    result?;

    Ok(())
}
