//! Deny-list store client and loader.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use gateway_core::{DenyEntry, DenyList, DenyListHandle, Error, Result};
use serde::Deserialize;
use telemetry::{health, metrics};
use tracing::{debug, error, info, warn};

use crate::config::DenyListConfig;

/// Paged, prefix-ordered access to the stored deny rules.
#[async_trait]
pub trait DenyListStore: Send + Sync {
    /// Return up to `limit` entries whose prefix sorts strictly after
    /// `cursor`, in ascending prefix order. An empty page ends the listing.
    async fn get_page(&self, limit: u32, cursor: &str) -> Result<Vec<DenyEntry>>;
}

#[derive(Debug, Deserialize)]
struct DenyListPage {
    #[serde(default)]
    entries: Vec<DenyEntry>,
}

/// Deny-list store reached over HTTP.
#[derive(Clone)]
pub struct HttpDenyListStore {
    base_url: String,
    http_client: reqwest::Client,
}

impl HttpDenyListStore {
    pub fn new(config: &DenyListConfig) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| Error::internal(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            base_url: config.url.trim_end_matches('/').to_string(),
            http_client,
        })
    }
}

#[async_trait]
impl DenyListStore for HttpDenyListStore {
    async fn get_page(&self, limit: u32, cursor: &str) -> Result<Vec<DenyEntry>> {
        let url = format!("{}/v1/denylist", self.base_url);
        debug!(url = %url, limit, cursor, "Fetching deny-list page");

        let response = self
            .http_client
            .get(&url)
            .query(&[("limit", limit.to_string()), ("cursor", cursor.to_string())])
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, "Deny-list store request failed");
                Error::internal(format!("deny-list store unreachable: {}", e))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            warn!(status = %status, body = %body, "Deny-list store returned error");
            return Err(Error::internal(format!(
                "deny-list store returned {}: {}",
                status, body
            )));
        }

        let page: DenyListPage = response.json().await.map_err(|e| {
            warn!(error = %e, "Failed to parse deny-list page");
            Error::internal(format!("invalid deny-list page: {}", e))
        })?;

        Ok(page.entries)
    }
}

/// Read every stored rule, page by page, into a fresh deny-list.
///
/// The cursor for each page is the last prefix of the previous one. A
/// store that returns a page not advancing past the cursor is treated as
/// an error rather than looped on.
pub async fn load_deny_list(store: &dyn DenyListStore, page_size: u32) -> Result<DenyList> {
    let page_size = page_size.max(1);
    let mut list = DenyList::new();
    let mut cursor = String::new();
    let mut pages = 0usize;

    loop {
        let page = store.get_page(page_size, &cursor).await?;
        let Some(last) = page.last() else {
            break;
        };

        if !cursor.is_empty() && last.prefix.as_str() <= cursor.as_str() {
            return Err(Error::internal(format!(
                "deny-list store did not advance past cursor {:?}",
                cursor
            )));
        }
        cursor = last.prefix.clone();
        pages += 1;

        for entry in page {
            list.put(&entry.prefix, entry.value);
        }
    }

    debug!(pages, entries = list.len(), "Deny-list loaded");
    Ok(list)
}

/// Load the deny-list and swap it into `handle`.
///
/// On failure the previous list stays in place.
pub async fn reload_deny_list(
    store: &dyn DenyListStore,
    handle: &DenyListHandle,
    page_size: u32,
) -> Result<usize> {
    match load_deny_list(store, page_size).await {
        Ok(list) => {
            let count = handle.replace(list);
            metrics().deny_list_reloads.inc();
            health().deny_list.set_healthy();
            info!(entries = count, "Deny-list reloaded");
            Ok(count)
        }
        Err(e) => {
            error!(error = %e, "Deny-list reload failed, keeping previous list");
            Err(e)
        }
    }
}

/// Spawn a task reloading the deny-list every `interval`.
pub fn spawn_deny_list_refresh(
    store: Arc<dyn DenyListStore>,
    handle: DenyListHandle,
    page_size: u32,
    interval: Duration,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        // The first tick completes immediately and startup already loaded.
        ticker.tick().await;

        loop {
            ticker.tick().await;
            let _ = reload_deny_list(store.as_ref(), &handle, page_size).await;
        }
    })
}
