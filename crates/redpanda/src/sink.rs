//! Ingestion sink capabilities.
//!
//! Metered publishing and internal publishing are separate traits so that
//! code holding only an [`InternalSink`] cannot route events back through
//! quota admission, and vice versa.

use async_trait::async_trait;
use gateway_core::{Event, Result};

/// Sink for events that have passed quota admission.
#[async_trait]
pub trait EventSink: Send + Sync {
    /// Publish events in order; returns how many were acknowledged, never
    /// more than `events.len()`. Acknowledged events are always a prefix of
    /// `events`.
    async fn publish(&self, events: &[Event]) -> Result<u32>;
}

/// Unmetered sink for events the gateway produces itself.
#[async_trait]
pub trait InternalSink: Send + Sync {
    async fn publish_internal(&self, events: &[Event]) -> Result<u32>;
}
