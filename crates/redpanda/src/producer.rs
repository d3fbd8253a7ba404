//! Redpanda producer implementing both sink capabilities.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::Utc;
use gateway_core::{Error, Event, Result};
use rskafka::client::partition::{Compression, PartitionClient, UnknownTopicHandling};
use rskafka::record::Record;
use telemetry::metrics;
use tokio::sync::RwLock;
use tracing::{debug, error, info};

use crate::client::connect;
use crate::config::RedpandaConfig;
use crate::sink::{EventSink, InternalSink};

/// Record header telling consumers which path produced the event.
pub const ORIGIN_HEADER: &str = "origin";

/// Which publishing path a record came through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    Metered,
    Internal,
}

impl Origin {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Metered => "metered",
            Self::Internal => "internal",
        }
    }
}

/// Producer writing accepted events to a single topic partition.
pub struct Producer {
    config: RedpandaConfig,
    /// Lazily connected partition client
    client: RwLock<Option<Arc<PartitionClient>>>,
}

impl Producer {
    pub fn new(config: RedpandaConfig) -> Self {
        info!(
            brokers = %config.broker_string(),
            topic = %config.topic,
            partition = config.partition,
            "Creating Redpanda producer"
        );

        Self {
            config,
            client: RwLock::new(None),
        }
    }

    pub fn topic(&self) -> &str {
        &self.config.topic
    }

    /// Gets or creates the partition client.
    async fn partition_client(&self) -> Result<Arc<PartitionClient>> {
        {
            let client = self.client.read().await;
            if let Some(client) = client.as_ref() {
                return Ok(client.clone());
            }
        }

        let mut slot = self.client.write().await;
        if let Some(client) = slot.as_ref() {
            return Ok(client.clone());
        }

        let client = connect(&self.config).await?;
        let partition_client = client
            .partition_client(
                self.config.topic.clone(),
                self.config.partition,
                UnknownTopicHandling::Error,
            )
            .await
            .map_err(|e| Error::forwarding(format!("failed to get partition client: {}", e)))?;

        let partition_client = Arc::new(partition_client);
        *slot = Some(partition_client.clone());
        Ok(partition_client)
    }

    /// Drop the cached client so the next send reconnects.
    async fn reset_client(&self) {
        *self.client.write().await = None;
    }

    async fn produce(&self, events: &[Event], origin: Origin) -> Result<u32> {
        if events.is_empty() {
            return Ok(0);
        }

        let records = events
            .iter()
            .map(|event| to_record(event, origin))
            .collect::<Result<Vec<_>>>()?;

        let client = self.partition_client().await?;
        let start = Instant::now();
        let timeout = Duration::from_millis(self.config.request_timeout_ms);
        let compression = compression_from_str(&self.config.compression);

        let produced = tokio::time::timeout(timeout, client.produce(records, compression)).await;
        let elapsed = start.elapsed();
        metrics().sink_latency_ms.observe(elapsed.as_millis() as u64);

        match produced {
            Ok(Ok(offsets)) => {
                let acked = offsets.len().min(events.len()) as u32;
                metrics().events_forwarded.inc_by(acked as u64);
                debug!(
                    topic = %self.config.topic,
                    origin = origin.as_str(),
                    count = acked,
                    latency_ms = %elapsed.as_millis(),
                    "Produced events to Redpanda"
                );
                Ok(acked)
            }
            Ok(Err(e)) => {
                error!(origin = origin.as_str(), "Failed to produce to Redpanda: {}", e);
                metrics().sink_errors.inc();
                self.reset_client().await;
                Err(Error::forwarding(format!("failed to produce: {}", e)))
            }
            Err(_) => {
                error!(
                    origin = origin.as_str(),
                    timeout_ms = self.config.request_timeout_ms,
                    "Redpanda produce timed out"
                );
                metrics().sink_errors.inc();
                self.reset_client().await;
                Err(Error::forwarding("produce timed out"))
            }
        }
    }
}

#[async_trait]
impl EventSink for Producer {
    async fn publish(&self, events: &[Event]) -> Result<u32> {
        self.produce(events, Origin::Metered).await
    }
}

#[async_trait]
impl InternalSink for Producer {
    async fn publish_internal(&self, events: &[Event]) -> Result<u32> {
        self.produce(events, Origin::Internal).await
    }
}

/// Encode an event as a JSON record keyed by its source.
fn to_record(event: &Event, origin: Origin) -> Result<Record> {
    let value = serde_json::to_vec(event)?;

    let mut headers = BTreeMap::new();
    headers.insert(ORIGIN_HEADER.to_string(), origin.as_str().as_bytes().to_vec());

    Ok(Record {
        key: Some(event.source.as_bytes().to_vec()),
        value: Some(value),
        headers,
        timestamp: Utc::now(),
    })
}

fn compression_from_str(name: &str) -> Compression {
    match name {
        "gzip" => Compression::Gzip,
        "snappy" => Compression::Snappy,
        "lz4" => Compression::Lz4,
        "zstd" => Compression::Zstd,
        _ => Compression::NoCompression,
    }
}
