//! Internal writer configuration.

use serde::{Deserialize, Serialize};

/// Settings for the unmetered internal publishing path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InternalWriterConfig {
    /// Attribute stamped on every internally written event
    #[serde(default = "default_marker_name")]
    pub marker_name: String,
    /// Integer value of the marker attribute
    #[serde(default)]
    pub marker_value: i32,
    /// Internal writes allowed per minute
    #[serde(default = "default_rate_per_minute")]
    pub rate_per_minute: u32,
}

fn default_marker_name() -> String {
    "gwinternal".to_string()
}

fn default_rate_per_minute() -> u32 {
    1
}

impl Default for InternalWriterConfig {
    fn default() -> Self {
        Self {
            marker_name: default_marker_name(),
            marker_value: 0,
            rate_per_minute: default_rate_per_minute(),
        }
    }
}
