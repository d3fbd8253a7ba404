//! Quota authority client.

use std::time::Duration;

use async_trait::async_trait;
use gateway_core::{Error, Permit, Principal, Result, Subject};
use reqwest::StatusCode;
use serde::Serialize;
use telemetry::metrics;
use tracing::{debug, warn};

use crate::config::QuotaConfig;

/// Grants and releases per-principal publishing allowance.
#[async_trait]
pub trait QuotaClient: Send + Sync {
    /// Ask for up to `count` units of `subject` on behalf of `principal`.
    ///
    /// Fails with [`Error::QuotaInvalidRequest`] when the authority rejects
    /// the request itself, and [`Error::QuotaUnavailable`] otherwise.
    async fn request(&self, principal: &Principal, subject: Subject, count: u32)
        -> Result<Permit>;

    /// Return `count` unused units to the counter identified by
    /// `(group_id, owner_id)`.
    async fn release(
        &self,
        group_id: &str,
        owner_id: &str,
        subject: Subject,
        count: u32,
    ) -> Result<()>;
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AllocateRequest<'a> {
    group_id: &'a str,
    user_id: &'a str,
    subject: Subject,
    count: u32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ReleaseRequest<'a> {
    group_id: &'a str,
    owner_id: &'a str,
    subject: Subject,
    count: u32,
}

/// Quota client talking JSON over HTTP to the usage service.
#[derive(Clone)]
pub struct HttpQuotaClient {
    /// Usage service URL (e.g., "http://usage:8080")
    base_url: String,
    http_client: reqwest::Client,
}

impl HttpQuotaClient {
    pub fn new(config: &QuotaConfig) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| Error::internal(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            base_url: config.url.trim_end_matches('/').to_string(),
            http_client,
        })
    }

    /// Probe the usage service's health endpoint.
    pub async fn is_healthy(&self) -> bool {
        let url = format!("{}/health", self.base_url);
        match self.http_client.get(&url).send().await {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                debug!(error = %e, "Usage service health probe failed");
                false
            }
        }
    }

    async fn post<B: Serialize + Sync>(&self, path: &str, body: &B) -> Result<reqwest::Response> {
        let url = format!("{}{}", self.base_url, path);
        debug!(url = %url, "Calling usage service");

        let response = self
            .http_client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, "Usage service request failed");
                Error::quota_unavailable(format!("usage service unreachable: {}", e))
            })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        warn!(status = %status, body = %body, "Usage service returned error");
        if status == StatusCode::BAD_REQUEST {
            Err(Error::quota_invalid(body))
        } else {
            Err(Error::quota_unavailable(format!(
                "usage service returned {}: {}",
                status, body
            )))
        }
    }
}

#[async_trait]
impl QuotaClient for HttpQuotaClient {
    async fn request(
        &self,
        principal: &Principal,
        subject: Subject,
        count: u32,
    ) -> Result<Permit> {
        metrics().permits_requested.inc();

        let request = AllocateRequest {
            group_id: &principal.group_id,
            user_id: &principal.user_id,
            subject,
            count,
        };

        let permit: Permit = self
            .post("/v1/permits/allocate", &request)
            .await
            .map_err(|e| {
                metrics().permit_errors.inc();
                e
            })?
            .json()
            .await
            .map_err(|e| {
                metrics().permit_errors.inc();
                warn!(error = %e, "Failed to parse permit");
                Error::quota_unavailable(format!("invalid permit response: {}", e))
            })?;

        // Never trust a grant larger than what was asked for.
        Ok(Permit {
            granted_count: permit.granted_count.min(count),
            ..permit
        })
    }

    async fn release(
        &self,
        group_id: &str,
        owner_id: &str,
        subject: Subject,
        count: u32,
    ) -> Result<()> {
        metrics().releases.inc();

        let request = ReleaseRequest {
            group_id,
            owner_id,
            subject,
            count,
        };

        self.post("/v1/permits/release", &request)
            .await
            .map_err(|e| {
                metrics().release_errors.inc();
                e
            })?;
        Ok(())
    }
}
