//! Redpanda configuration.

use serde::{Deserialize, Serialize};

/// Redpanda sink configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedpandaConfig {
    /// Broker addresses
    pub brokers: Vec<String>,
    /// Topic accepted events are written to
    #[serde(default = "default_topic")]
    pub topic: String,
    /// Partition written to
    #[serde(default)]
    pub partition: i32,
    /// Compression type (none, gzip, snappy, lz4, zstd)
    #[serde(default = "default_compression")]
    pub compression: String,
    /// Produce timeout in milliseconds
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
    /// SASL username (enables TLS + SCRAM-SHA-256 together with the password)
    #[serde(default)]
    pub sasl_username: Option<String>,
    /// SASL password
    #[serde(default)]
    pub sasl_password: Option<String>,
}

fn default_topic() -> String {
    "published".to_string()
}

fn default_compression() -> String {
    "lz4".to_string()
}

fn default_request_timeout_ms() -> u64 {
    10_000
}

impl Default for RedpandaConfig {
    fn default() -> Self {
        Self {
            brokers: vec!["localhost:9092".to_string()],
            topic: default_topic(),
            partition: 0,
            compression: default_compression(),
            request_timeout_ms: default_request_timeout_ms(),
            sasl_username: None,
            sasl_password: None,
        }
    }
}

impl RedpandaConfig {
    /// Returns the broker list as a comma-separated string.
    pub fn broker_string(&self) -> String {
        self.brokers.join(",")
    }

    /// SASL credentials, when both halves are configured.
    pub fn credentials(&self) -> Option<(&str, &str)> {
        match (&self.sasl_username, &self.sasl_password) {
            (Some(user), Some(pass)) => Some((user.as_str(), pass.as_str())),
            _ => None,
        }
    }
}
