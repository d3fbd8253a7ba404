//! Deterministic fakes for the admission collaborators.

use async_trait::async_trait;
use gateway_core::{Error, Event, Permit, Principal, Result, Subject};
use parking_lot::Mutex;
use std::sync::Arc;
use redpanda::{EventSink, InternalSink};
use upstream::QuotaClient;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseCall {
    pub group_id: String,
    pub owner_id: String,
    pub subject: Subject,
    pub count: u32,
}

/// Quota client answering every request with a scripted outcome.
pub struct ScriptedQuota {
    outcome: Mutex<Result<Permit>>,
    fail_release: bool,
    pub requests: Mutex<Vec<(Principal, Subject, u32)>>,
    pub releases: Mutex<Vec<ReleaseCall>>,
}

impl ScriptedQuota {
    pub fn granting(permit: Permit) -> Self {
        Self::with_outcome(Ok(permit))
    }

    pub fn failing(error: Error) -> Self {
        Self::with_outcome(Err(error))
    }

    fn with_outcome(outcome: Result<Permit>) -> Self {
        Self {
            outcome: Mutex::new(outcome),
            fail_release: false,
            requests: Mutex::new(Vec::new()),
            releases: Mutex::new(Vec::new()),
        }
    }

    pub fn with_failing_release(mut self) -> Self {
        self.fail_release = true;
        self
    }

    pub fn release_calls(&self) -> Vec<ReleaseCall> {
        self.releases.lock().clone()
    }
}

#[async_trait]
impl QuotaClient for ScriptedQuota {
    async fn request(
        &self,
        principal: &Principal,
        subject: Subject,
        count: u32,
    ) -> Result<Permit> {
        self.requests
            .lock()
            .push((principal.clone(), subject, count));
        match &*self.outcome.lock() {
            Ok(permit) => Ok(permit.clone()),
            Err(Error::QuotaInvalidRequest(msg)) => Err(Error::quota_invalid(msg.clone())),
            Err(e) => Err(Error::quota_unavailable(e.to_string())),
        }
    }

    async fn release(
        &self,
        group_id: &str,
        owner_id: &str,
        subject: Subject,
        count: u32,
    ) -> Result<()> {
        self.releases.lock().push(ReleaseCall {
            group_id: group_id.to_string(),
            owner_id: owner_id.to_string(),
            subject,
            count,
        });
        if self.fail_release {
            return Err(Error::quota_unavailable("release refused"));
        }
        Ok(())
    }
}

/// Call log shared between sinks, one entry per call: `metered` or `internal`.
pub type CallLog = Arc<Mutex<Vec<&'static str>>>;

/// Sink recording every batch it receives.
#[derive(Default)]
pub struct RecordingSink {
    /// Acknowledge at most this many events per call
    ack_limit: Option<u32>,
    fail: bool,
    log: Option<CallLog>,
    pub batches: Mutex<Vec<Vec<Event>>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn acking_at_most(limit: u32) -> Self {
        Self {
            ack_limit: Some(limit),
            ..Self::default()
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn logging_to(log: CallLog) -> Self {
        Self {
            log: Some(log),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.batches.lock().len()
    }

    pub fn events(&self) -> Vec<Event> {
        self.batches.lock().iter().flatten().cloned().collect()
    }

    fn record(&self, path: &'static str, events: &[Event]) -> Result<u32> {
        if let Some(log) = &self.log {
            log.lock().push(path);
        }
        self.batches.lock().push(events.to_vec());
        if self.fail {
            return Err(Error::forwarding("sink down"));
        }
        let sent = events.len() as u32;
        Ok(self.ack_limit.map_or(sent, |limit| limit.min(sent)))
    }
}

#[async_trait]
impl EventSink for RecordingSink {
    async fn publish(&self, events: &[Event]) -> Result<u32> {
        self.record("metered", events)
    }
}

#[async_trait]
impl InternalSink for RecordingSink {
    async fn publish_internal(&self, events: &[Event]) -> Result<u32> {
        self.record("internal", events)
    }
}
