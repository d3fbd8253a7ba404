//! Mock implementations for testing.

use async_trait::async_trait;
use gateway_core::{DenyEntry, Error, Event, Permit, Principal, Result, Subject};
use parking_lot::Mutex;
use redpanda::{EventSink, InternalSink};
use std::sync::Arc;
use upstream::{DenyListStore, QuotaClient};

/// Mock sink that captures events in memory.
///
/// Implements both sink capabilities like the real `Producer`, keeping
/// metered and internal writes apart so tests can see which path an event
/// took without a broker.
#[derive(Clone, Default)]
pub struct MockSink {
    metered: Arc<Mutex<Vec<Event>>>,
    internal: Arc<Mutex<Vec<Event>>>,
    /// Acknowledge at most this many events per metered call.
    ack_limit: Arc<Mutex<Option<u32>>>,
    should_fail: Arc<Mutex<bool>>,
}

impl MockSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Events written through the metered path.
    pub fn captured_events(&self) -> Vec<Event> {
        self.metered.lock().clone()
    }

    /// Events written through the internal path.
    pub fn internal_events(&self) -> Vec<Event> {
        self.internal.lock().clone()
    }

    pub fn event_count(&self) -> usize {
        self.metered.lock().len()
    }

    pub fn set_ack_limit(&self, limit: Option<u32>) {
        *self.ack_limit.lock() = limit;
    }

    /// Set failure mode for testing error handling.
    pub fn set_should_fail(&self, fail: bool) {
        *self.should_fail.lock() = fail;
    }
}

#[async_trait]
impl EventSink for MockSink {
    async fn publish(&self, events: &[Event]) -> Result<u32> {
        if *self.should_fail.lock() {
            return Err(Error::forwarding("Mock sink failure"));
        }

        let acked = match *self.ack_limit.lock() {
            Some(limit) => (limit as usize).min(events.len()),
            None => events.len(),
        };
        self.metered.lock().extend_from_slice(&events[..acked]);
        Ok(acked as u32)
    }
}

#[async_trait]
impl InternalSink for MockSink {
    async fn publish_internal(&self, events: &[Event]) -> Result<u32> {
        if *self.should_fail.lock() {
            return Err(Error::forwarding("Mock sink failure"));
        }
        self.internal.lock().extend_from_slice(events);
        Ok(events.len() as u32)
    }
}

/// How the mock quota authority answers the next requests.
#[derive(Debug, Clone)]
pub enum QuotaBehavior {
    /// Grant up to this many events, charged against `owner`.
    Grant {
        count: u32,
        owner: String,
        just_exhausted: bool,
    },
    /// Fail as unreachable.
    Unavailable,
    /// Reject the request as malformed.
    Invalid,
}

/// A release the mock quota authority received.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Release {
    pub group_id: String,
    pub owner_id: String,
    pub count: u32,
}

/// Scripted quota authority.
#[derive(Clone)]
pub struct MockQuota {
    behavior: Arc<Mutex<QuotaBehavior>>,
    requests: Arc<Mutex<Vec<(Principal, u32)>>>,
    releases: Arc<Mutex<Vec<Release>>>,
}

impl MockQuota {
    /// Grants every request in full, owned by the requesting user.
    pub fn unlimited() -> Self {
        Self::with_behavior(QuotaBehavior::Grant {
            count: u32::MAX,
            owner: String::new(),
            just_exhausted: false,
        })
    }

    pub fn with_behavior(behavior: QuotaBehavior) -> Self {
        Self {
            behavior: Arc::new(Mutex::new(behavior)),
            requests: Arc::new(Mutex::new(Vec::new())),
            releases: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn set_behavior(&self, behavior: QuotaBehavior) {
        *self.behavior.lock() = behavior;
    }

    pub fn requests(&self) -> Vec<(Principal, u32)> {
        self.requests.lock().clone()
    }

    pub fn releases(&self) -> Vec<Release> {
        self.releases.lock().clone()
    }
}

#[async_trait]
impl QuotaClient for MockQuota {
    async fn request(
        &self,
        principal: &Principal,
        _subject: Subject,
        count: u32,
    ) -> Result<Permit> {
        self.requests.lock().push((principal.clone(), count));

        match self.behavior.lock().clone() {
            QuotaBehavior::Grant {
                count: granted,
                owner,
                just_exhausted,
            } => {
                let owner = if owner.is_empty() {
                    principal.user_id.clone()
                } else {
                    owner
                };
                Ok(Permit {
                    granted_count: granted.min(count),
                    owner_id: owner,
                    just_exhausted,
                })
            }
            QuotaBehavior::Unavailable => Err(Error::quota_unavailable("Mock quota failure")),
            QuotaBehavior::Invalid => Err(Error::quota_invalid("Mock quota rejected request")),
        }
    }

    async fn release(
        &self,
        group_id: &str,
        owner_id: &str,
        _subject: Subject,
        count: u32,
    ) -> Result<()> {
        self.releases.lock().push(Release {
            group_id: group_id.to_string(),
            owner_id: owner_id.to_string(),
            count,
        });
        Ok(())
    }
}

/// Deny-list store serving a fixed rule set page by page.
pub struct MemoryDenyListStore {
    entries: Vec<DenyEntry>,
}

impl MemoryDenyListStore {
    pub fn new(prefixes: &[&str]) -> Self {
        let mut entries: Vec<_> = prefixes
            .iter()
            .map(|p| DenyEntry::new(*p, "integration test"))
            .collect();
        entries.sort_by(|a, b| a.prefix.cmp(&b.prefix));
        Self { entries }
    }
}

#[async_trait]
impl DenyListStore for MemoryDenyListStore {
    async fn get_page(&self, limit: u32, cursor: &str) -> Result<Vec<DenyEntry>> {
        Ok(self
            .entries
            .iter()
            .filter(|e| e.prefix.as_str() > cursor)
            .take(limit as usize)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_sink_captures_events() {
        let mock = MockSink::new();

        let events = vec![Event::new("e1", "https://feed", "post")];
        assert_eq!(mock.publish(&events).await.unwrap(), 1);
        assert_eq!(mock.event_count(), 1);
        assert!(mock.internal_events().is_empty());
    }

    #[tokio::test]
    async fn test_mock_sink_failure_mode() {
        let mock = MockSink::new();
        mock.set_should_fail(true);

        assert!(mock.publish(&[]).await.is_err());
        assert!(mock.publish_internal(&[]).await.is_err());
        assert_eq!(mock.event_count(), 0);
    }

    #[tokio::test]
    async fn test_mock_quota_caps_grant() {
        let quota = MockQuota::with_behavior(QuotaBehavior::Grant {
            count: 2,
            owner: String::new(),
            just_exhausted: false,
        });

        let permit = quota
            .request(&Principal::new("g1", "u1"), Subject::PublishEvents, 5)
            .await
            .unwrap();
        assert_eq!(permit.granted_count, 2);
        assert_eq!(permit.owner_id, "u1");
    }
}
