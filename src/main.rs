//! Publish gateway
//!
//! Accepts published events over HTTP and, for every batch:
//! - filters it against the source/type/attribute deny-list
//! - admits it against the publisher's quota, notifying owners who just ran out
//! - forwards what was admitted to Redpanda and releases unused quota

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use tokio::signal;
use tracing::{error, info, warn};

use admission::{AdmissionController, InternalWriterConfig, PublishService};
use api::{router, AppState};
use gateway_core::{BatchFilter, DenyListHandle};
use redpanda::{Producer, RedpandaConfig};
use telemetry::{health, init_tracing_from_env, metrics};
use upstream::{
    reload_deny_list, spawn_deny_list_refresh, DenyListConfig, DenyListStore, HttpDenyListStore,
    HttpQuotaClient, QuotaConfig,
};

/// Application configuration.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
struct Config {
    #[serde(default = "default_host")]
    host: String,
    #[serde(default = "default_port")]
    port: u16,

    #[serde(default)]
    redpanda: RedpandaConfig,

    #[serde(default)]
    quota: QuotaConfig,

    #[serde(default)]
    deny_list: DenyListConfig,

    #[serde(default)]
    internal: InternalWriterConfig,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            redpanda: RedpandaConfig::default(),
            quota: QuotaConfig::default(),
            deny_list: DenyListConfig::default(),
            internal: InternalWriterConfig::default(),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // rustls 0.23+ requires explicit crypto provider selection
    rustls::crypto::ring::default_provider()
        .install_default()
        .map_err(|_| anyhow!("Failed to install rustls crypto provider"))?;

    // Load .env file if present
    dotenvy::dotenv().ok();

    init_tracing_from_env();

    info!("Starting publish gateway v{}", env!("CARGO_PKG_VERSION"));

    let config = load_config()?;

    info!(
        brokers = ?config.redpanda.brokers,
        topic = %config.redpanda.topic,
        quota_url = %config.quota.url,
        deny_list_url = %config.deny_list.url,
        "Loaded configuration"
    );

    // Deny-list must be in place before the first request is filtered
    let deny_list = DenyListHandle::default();
    let store: Arc<dyn DenyListStore> = Arc::new(
        HttpDenyListStore::new(&config.deny_list).context("Failed to create deny-list client")?,
    );
    reload_deny_list(store.as_ref(), &deny_list, config.deny_list.page_size)
        .await
        .context("Failed to load deny-list")?;

    let _refresh_handle = if config.deny_list.refresh_interval_secs > 0 {
        info!(
            interval_secs = config.deny_list.refresh_interval_secs,
            "Started deny-list refresh task"
        );
        Some(spawn_deny_list_refresh(
            store.clone(),
            deny_list.clone(),
            config.deny_list.page_size,
            Duration::from_secs(config.deny_list.refresh_interval_secs),
        ))
    } else {
        None
    };

    let quota = Arc::new(
        HttpQuotaClient::new(&config.quota).context("Failed to create quota client")?,
    );
    let producer = Arc::new(Producer::new(config.redpanda.clone()));

    check_health(&config, &quota).await;

    let controller = AdmissionController::new(quota.clone(), producer.clone(), producer.clone());
    let publisher = Arc::new(PublishService::new(
        BatchFilter::new(deny_list),
        controller,
        producer.clone(),
        config.internal.clone(),
    ));

    let state = AppState::new(publisher);

    let app = router(state);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .context("Invalid server address")?;

    info!("Listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    let snapshot = metrics().snapshot();
    info!(
        batches_received = snapshot.batches_received,
        events_received = snapshot.events_received,
        batches_denied = snapshot.batches_denied,
        quota_exhausted = snapshot.quota_exhausted,
        events_dropped_by_quota = snapshot.events_dropped_by_quota,
        events_forwarded = snapshot.events_forwarded,
        sink_errors = snapshot.sink_errors,
        publish_latency_mean_ms = snapshot.publish_latency_mean_ms,
        "Final metrics"
    );
    info!("Shutdown complete");
    Ok(())
}

/// Load configuration from files and environment.
fn load_config() -> Result<Config> {
    let config = config::Config::builder()
        // Start with defaults
        .add_source(config::Config::try_from(&Config::default())?)
        // Load from config file if exists
        .add_source(
            config::File::with_name("config/default")
                .required(false)
                .format(config::FileFormat::Toml),
        )
        // Override with environment variables
        .add_source(
            config::Environment::default()
                .separator("__")
                .prefix("GATEWAY")
                .try_parsing(true),
        )
        .build()
        .context("Failed to build configuration")?;

    let mut config: Config = config
        .try_deserialize()
        .context("Failed to deserialize configuration")?;

    // The config crate's nested parsing doesn't work reliably with underscored field names
    if let Ok(brokers) = std::env::var("GATEWAY_REDPANDA_BROKERS") {
        config.redpanda.brokers = brokers.split(',').map(|s| s.trim().to_string()).collect();
    }
    if let Ok(username) = std::env::var("GATEWAY_REDPANDA_SASL_USERNAME") {
        config.redpanda.sasl_username = Some(username);
    }
    if let Ok(password) = std::env::var("GATEWAY_REDPANDA_SASL_PASSWORD") {
        config.redpanda.sasl_password = Some(password);
    }
    if let Ok(topic) = std::env::var("GATEWAY_REDPANDA_TOPIC") {
        config.redpanda.topic = topic;
    }

    if let Ok(url) = std::env::var("GATEWAY_QUOTA_URL") {
        config.quota.url = url;
    }
    if let Ok(url) = std::env::var("GATEWAY_DENY_LIST_URL") {
        config.deny_list.url = url;
    }
    if let Ok(secs) = std::env::var("GATEWAY_DENY_LIST_REFRESH_INTERVAL_SECS") {
        config.deny_list.refresh_interval_secs = secs
            .parse()
            .context("Invalid GATEWAY_DENY_LIST_REFRESH_INTERVAL_SECS")?;
    }

    if let Ok(name) = std::env::var("GATEWAY_INTERNAL_MARKER_NAME") {
        config.internal.marker_name = name;
    }
    if let Ok(value) = std::env::var("GATEWAY_INTERNAL_MARKER_VALUE") {
        config.internal.marker_value = value
            .parse()
            .context("Invalid GATEWAY_INTERNAL_MARKER_VALUE")?;
    }
    if let Ok(rate) = std::env::var("GATEWAY_INTERNAL_RATE_PER_MINUTE") {
        config.internal.rate_per_minute = rate
            .parse()
            .context("Invalid GATEWAY_INTERNAL_RATE_PER_MINUTE")?;
    }

    Ok(config)
}

/// Check component health on startup.
async fn check_health(config: &Config, quota: &HttpQuotaClient) {
    let redpanda_healthy = redpanda::health::check_connection(&config.redpanda).await;
    if redpanda_healthy {
        health().redpanda.set_healthy();
        info!("Redpanda connection: healthy");
    } else {
        health().redpanda.set_unhealthy("Connection failed");
        error!("Redpanda connection: unhealthy");
    }

    if quota.is_healthy().await {
        health().quota.set_healthy();
        info!("Quota service: healthy");
    } else {
        health().quota.set_unhealthy("Health probe failed");
        warn!("Quota service: unhealthy");
    }
}

/// Graceful shutdown signal handler.
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal");
        }
        _ = terminate => {
            info!("Received terminate signal");
        }
    }
}
