//! Upstream service configuration.

use gateway_core::limits::DENY_LIST_PAGE_SIZE;
use serde::{Deserialize, Serialize};

/// Quota authority configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuotaConfig {
    /// Base URL (e.g., "http://usage:8080")
    #[serde(default = "default_quota_url")]
    pub url: String,
    /// Per-call timeout in milliseconds
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_quota_url() -> String {
    "http://usage:8080".to_string()
}

fn default_timeout_ms() -> u64 {
    5_000
}

impl Default for QuotaConfig {
    fn default() -> Self {
        Self {
            url: default_quota_url(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

/// Deny-list store configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DenyListConfig {
    /// Base URL (e.g., "http://denylist:8080")
    #[serde(default = "default_deny_list_url")]
    pub url: String,
    /// Entries requested per page
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    /// Full reload interval in seconds; 0 loads once at startup only
    #[serde(default)]
    pub refresh_interval_secs: u64,
    /// Per-call timeout in milliseconds
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_deny_list_url() -> String {
    "http://denylist:8080".to_string()
}

fn default_page_size() -> u32 {
    DENY_LIST_PAGE_SIZE
}

impl Default for DenyListConfig {
    fn default() -> Self {
        Self {
            url: default_deny_list_url(),
            page_size: default_page_size(),
            refresh_interval_secs: 0,
            timeout_ms: default_timeout_ms(),
        }
    }
}
