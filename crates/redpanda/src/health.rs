//! Redpanda health checks.

use tracing::{debug, error};

use crate::client::connect;
use crate::config::RedpandaConfig;

/// Check that the brokers are reachable and the sink topic exists.
pub async fn check_connection(config: &RedpandaConfig) -> bool {
    let client = match connect(config).await {
        Ok(client) => client,
        Err(e) => {
            error!("Failed to connect to Redpanda: {}", e);
            return false;
        }
    };

    match client.list_topics().await {
        Ok(topics) => {
            let found = topics.iter().any(|t| t.name == config.topic);
            if found {
                debug!(topics = topics.len(), topic = %config.topic, "Redpanda connection healthy");
            } else {
                error!(topic = %config.topic, "Redpanda topic does not exist");
            }
            found
        }
        Err(e) => {
            error!("Failed to list Redpanda topics: {}", e);
            false
        }
    }
}
