//! Publish service: the full path a published batch takes.

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use gateway_core::{
    keys, AttributeValue, BatchFilter, Error, Event, FilterDecision, Principal, Result,
};
use redpanda::InternalSink;
use telemetry::metrics;
use tracing::{debug, info, warn};

use crate::config::InternalWriterConfig;
use crate::controller::AdmissionController;

/// Filters, stamps and admits published batches.
pub struct PublishService {
    filter: BatchFilter,
    controller: AdmissionController,
    internal: Arc<dyn InternalSink>,
    internal_config: InternalWriterConfig,
}

impl PublishService {
    pub fn new(
        filter: BatchFilter,
        controller: AdmissionController,
        internal: Arc<dyn InternalSink>,
        internal_config: InternalWriterConfig,
    ) -> Self {
        Self {
            filter,
            controller,
            internal,
            internal_config,
        }
    }

    pub fn filter(&self) -> &BatchFilter {
        &self.filter
    }

    pub fn internal_config(&self) -> &InternalWriterConfig {
        &self.internal_config
    }

    /// Publish a batch on behalf of `principal`.
    ///
    /// Returns the number of events the sink acknowledged. A deny-list hit on
    /// the first event rejects the batch before any quota is requested.
    pub async fn publish(&self, principal: &Principal, events: Vec<Event>) -> Result<u32> {
        let start = Instant::now();
        metrics().batches_received.inc();
        metrics().events_received.inc_by(events.len() as u64);

        let submitted = events.len();
        let mut events = match self.filter.apply(events) {
            FilterDecision::Accept(events) => events,
            FilterDecision::Truncate { events, hit } => {
                metrics().batches_truncated_by_deny_list.inc();
                info!(
                    group_id = %principal.group_id,
                    user_id = %principal.user_id,
                    event_id = %hit.event_id,
                    prefix = %hit.prefix,
                    dimension = %hit.dimension,
                    value = %hit.value,
                    index = hit.index,
                    submitted,
                    "Batch truncated by deny-list"
                );
                events
            }
            FilterDecision::Reject(hit) => {
                metrics().batches_denied.inc();
                info!(
                    group_id = %principal.group_id,
                    user_id = %principal.user_id,
                    event_id = %hit.event_id,
                    prefix = %hit.prefix,
                    dimension = %hit.dimension,
                    value = %hit.value,
                    "Batch rejected by deny-list"
                );
                return Err(hit.into());
            }
        };

        stamp_publisher(&mut events, principal);
        let result = self.controller.admit(principal, events).await;

        metrics()
            .publish_latency_ms
            .observe(start.elapsed().as_millis() as u64);

        if let Ok(ack) = &result {
            debug!(
                group_id = %principal.group_id,
                user_id = %principal.user_id,
                submitted,
                ack,
                "Batch published"
            );
        }
        result
    }

    /// Publish a single event through the unmetered path.
    ///
    /// The deny-list and the quota are both skipped; the event is marked
    /// with the configured internal attribute instead.
    pub async fn publish_internal(&self, principal: &Principal, mut event: Event) -> Result<u32> {
        metrics().internal_events_received.inc();

        event.set_attribute(
            self.internal_config.marker_name.clone(),
            AttributeValue::CeInteger(self.internal_config.marker_value),
        );
        let mut events = vec![event];
        stamp_publisher(&mut events, principal);

        self.internal.publish_internal(&events).await.map_err(|e| {
            warn!(
                group_id = %principal.group_id,
                user_id = %principal.user_id,
                error = %e,
                "Internal publish failed"
            );
            match e {
                Error::ForwardingFailed(_) => e,
                other => Error::forwarding(other.to_string()),
            }
        })
    }
}

/// Stamp publisher identity and publish time on every event.
fn stamp_publisher(events: &mut [Event], principal: &Principal) {
    let now = Utc::now();
    for event in events.iter_mut() {
        event.set_attribute(keys::GROUP_ID, AttributeValue::string(&principal.group_id));
        event.set_attribute(keys::USER_ID, AttributeValue::string(&principal.user_id));
        event.set_attribute(keys::PUB_TIME, AttributeValue::CeTimestamp(now));
    }
}
