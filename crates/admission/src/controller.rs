//! Quota admission for filtered batches.
//!
//! One pass per batch:
//! 1. request a permit sized to the whole batch
//! 2. send a one-time notice when the permit just exhausted the owner's allowance
//! 3. forward the events the permit covers
//! 4. release whatever was granted but not acknowledged

use std::sync::Arc;

use gateway_core::{Error, Event, Permit, Principal, Result, Subject};
use redpanda::{EventSink, InternalSink};
use telemetry::metrics;
use tracing::{debug, error, info, warn};
use upstream::QuotaClient;

use crate::notice::{limit_reached_notice, should_notify};

/// Admits batches against the publisher's quota and forwards them.
pub struct AdmissionController {
    quota: Arc<dyn QuotaClient>,
    sink: Arc<dyn EventSink>,
    internal: Arc<dyn InternalSink>,
    subject: Subject,
}

impl AdmissionController {
    pub fn new(
        quota: Arc<dyn QuotaClient>,
        sink: Arc<dyn EventSink>,
        internal: Arc<dyn InternalSink>,
    ) -> Self {
        Self {
            quota,
            sink,
            internal,
            subject: Subject::PublishEvents,
        }
    }

    pub fn subject(&self) -> Subject {
        self.subject
    }

    /// Admit `events` for `principal` and return how many the sink
    /// acknowledged.
    ///
    /// Events beyond the granted count are dropped; the caller resubmits them
    /// if it wants them delivered.
    pub async fn admit(&self, principal: &Principal, mut events: Vec<Event>) -> Result<u32> {
        if events.is_empty() {
            return Ok(0);
        }

        let requested = u32::try_from(events.len()).unwrap_or(u32::MAX);
        let permit = self.request_permit(principal, requested).await?;

        debug!(
            group_id = %principal.group_id,
            user_id = %principal.user_id,
            requested,
            granted = permit.granted_count,
            owner_id = %permit.owner_id,
            just_exhausted = permit.just_exhausted,
            "Permit granted"
        );

        if permit.just_exhausted {
            self.notify_exhausted(principal, &permit, &events[0].source).await;
        }

        if permit.granted_count == 0 {
            metrics().quota_exhausted.inc();
            metrics().events_dropped_by_quota.inc_by(requested as u64);
            info!(
                group_id = %principal.group_id,
                user_id = %principal.user_id,
                owner_id = %permit.owner_id,
                requested,
                "Publishing quota exhausted"
            );
            return Err(Error::QuotaExhausted {
                owner: permit.owner_id,
            });
        }

        if (permit.granted_count as usize) < events.len() {
            let dropped = events.len() - permit.granted_count as usize;
            events.truncate(permit.granted_count as usize);
            metrics().events_dropped_by_quota.inc_by(dropped as u64);
            info!(
                group_id = %principal.group_id,
                user_id = %principal.user_id,
                requested,
                granted = permit.granted_count,
                dropped,
                "Batch truncated to granted count"
            );
        }

        let ack = match self.sink.publish(&events).await {
            Ok(ack) => ack.min(events.len() as u32),
            Err(e) => {
                error!(
                    group_id = %principal.group_id,
                    user_id = %principal.user_id,
                    count = events.len(),
                    error = %e,
                    "Forwarding batch failed"
                );
                self.release_unused(principal, &permit, permit.granted_count)
                    .await;
                return Err(match e {
                    Error::ForwardingFailed(_) => e,
                    other => Error::forwarding(other.to_string()),
                });
            }
        };

        let unused = permit.granted_count.saturating_sub(ack);
        if unused > 0 {
            self.release_unused(principal, &permit, unused).await;
        }

        Ok(ack)
    }

    async fn request_permit(&self, principal: &Principal, count: u32) -> Result<Permit> {
        self.quota
            .request(principal, self.subject, count)
            .await
            .map_err(|e| {
                warn!(
                    group_id = %principal.group_id,
                    user_id = %principal.user_id,
                    count,
                    error = %e,
                    "Permit request failed"
                );
                match e {
                    Error::QuotaUnavailable(_) | Error::QuotaInvalidRequest(_) => e,
                    other => Error::quota_unavailable(other.to_string()),
                }
            })
    }

    /// Send the limit-reached notice through the unmetered path. Failures are
    /// logged and swallowed.
    async fn notify_exhausted(&self, principal: &Principal, permit: &Permit, first_source: &str) {
        if !should_notify(&permit.owner_id, first_source) {
            debug!(
                owner_id = %permit.owner_id,
                "Skipping limit notice, no distinct owner"
            );
            return;
        }

        let notice = limit_reached_notice(first_source, &principal.group_id, &permit.owner_id);
        let notice_id = notice.id.clone();

        match self.internal.publish_internal(&[notice]).await {
            Ok(ack) => {
                metrics().limit_notices_sent.inc();
                info!(
                    group_id = %principal.group_id,
                    owner_id = %permit.owner_id,
                    notice_id = %notice_id,
                    ack,
                    "Publishing limit notice sent"
                );
            }
            Err(e) => {
                metrics().limit_notice_errors.inc();
                warn!(
                    group_id = %principal.group_id,
                    owner_id = %permit.owner_id,
                    notice_id = %notice_id,
                    error = %e,
                    "Failed to send publishing limit notice"
                );
            }
        }
    }

    /// Return unused units to the counter the permit was charged against.
    /// Best effort: failures are logged only.
    async fn release_unused(&self, principal: &Principal, permit: &Permit, count: u32) {
        if count == 0 {
            return;
        }

        if let Err(e) = self
            .quota
            .release(&principal.group_id, &permit.owner_id, self.subject, count)
            .await
        {
            warn!(
                group_id = %principal.group_id,
                owner_id = %permit.owner_id,
                count,
                error = %e,
                "Failed to release unused quota"
            );
        } else {
            debug!(
                group_id = %principal.group_id,
                owner_id = %permit.owner_id,
                count,
                "Released unused quota"
            );
        }
    }
}
