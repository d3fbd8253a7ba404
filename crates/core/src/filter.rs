//! Deny-list filtering of inbound batches.
//!
//! Each event is checked in submission order against three kinds of keys:
//! 1. `source:<source>`
//! 2. `type:<source>`
//! 3. `<attribute>:<value>` for every non-empty text-like attribute
//!
//! Step 2 deliberately keys the `type:` dimension on the event *source*, not
//! its type. Publishers and existing deny rules rely on this; switching it to
//! `event_type` changes which batches are rejected.
//!
//! A hit on the first event rejects the whole batch. A hit further in
//! truncates the batch just before the offending event.

use crate::denylist::{DenyList, DenyListHandle};
use crate::error::Error;
use crate::events::Event;

const DIMENSION_SOURCE: &str = "source";
const DIMENSION_TYPE: &str = "type";

/// A deny-list match for one event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DenyHit {
    /// Position of the event in the submitted batch
    pub index: usize,
    pub event_id: String,
    /// The registered prefix that matched
    pub prefix: String,
    /// `source`, `type` or the attribute name
    pub dimension: String,
    /// The event value reported for the dimension
    pub value: String,
}

impl From<DenyHit> for Error {
    fn from(hit: DenyHit) -> Self {
        Error::Rejected {
            prefix: hit.prefix,
            dimension: hit.dimension,
            value: hit.value,
        }
    }
}

/// Outcome of filtering one batch.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterDecision {
    /// No event matched.
    Accept(Vec<Event>),
    /// A later event matched; only the events before it remain.
    Truncate { events: Vec<Event>, hit: DenyHit },
    /// The first event matched; nothing may be forwarded.
    Reject(DenyHit),
}

impl FilterDecision {
    /// Events allowed through, empty on rejection.
    pub fn allowed(&self) -> &[Event] {
        match self {
            Self::Accept(events) | Self::Truncate { events, .. } => events,
            Self::Reject(_) => &[],
        }
    }

    pub fn is_rejected(&self) -> bool {
        matches!(self, Self::Reject(_))
    }

    pub fn hit(&self) -> Option<&DenyHit> {
        match self {
            Self::Accept(_) => None,
            Self::Truncate { hit, .. } | Self::Reject(hit) => Some(hit),
        }
    }

    /// Allowed events, or `Error::Rejected` when the batch was rejected.
    pub fn into_result(self) -> Result<Vec<Event>, Error> {
        match self {
            Self::Accept(events) | Self::Truncate { events, .. } => Ok(events),
            Self::Reject(hit) => Err(hit.into()),
        }
    }
}

/// Applies the current deny-list to batches.
#[derive(Debug, Clone, Default)]
pub struct BatchFilter {
    deny_list: DenyListHandle,
}

impl BatchFilter {
    pub fn new(deny_list: DenyListHandle) -> Self {
        Self { deny_list }
    }

    pub fn deny_list(&self) -> &DenyListHandle {
        &self.deny_list
    }

    /// Filter a batch, preserving the order of the events that remain.
    pub fn apply(&self, mut batch: Vec<Event>) -> FilterDecision {
        let list = self.deny_list.snapshot();

        let found = batch
            .iter()
            .enumerate()
            .find_map(|(index, event)| match_event(&list, event, index));

        match found {
            None => FilterDecision::Accept(batch),
            Some(hit) if hit.index == 0 => FilterDecision::Reject(hit),
            Some(hit) => {
                batch.truncate(hit.index);
                FilterDecision::Truncate { events: batch, hit }
            }
        }
    }
}

/// Check one event against the deny-list.
pub fn match_event(list: &DenyList, event: &Event, index: usize) -> Option<DenyHit> {
    let hit = |prefix: &str, dimension: &str, value: &str| DenyHit {
        index,
        event_id: event.id.clone(),
        prefix: prefix.to_string(),
        dimension: dimension.to_string(),
        value: value.to_string(),
    };

    let key = format!("{}:{}", DIMENSION_SOURCE, event.source);
    if let Some((prefix, _)) = list.find_longest_prefix(&key) {
        return Some(hit(prefix, DIMENSION_SOURCE, &event.source));
    }

    let key = format!("{}:{}", DIMENSION_TYPE, event.source);
    if let Some((prefix, _)) = list.find_longest_prefix(&key) {
        return Some(hit(prefix, DIMENSION_TYPE, &event.event_type));
    }

    for (name, value) in &event.attributes {
        let Some(text) = value.as_text().filter(|t| !t.is_empty()) else {
            continue;
        };
        let key = format!("{}:{}", name, text);
        if let Some((prefix, _)) = list.find_longest_prefix(&key) {
            return Some(hit(prefix, name, text));
        }
    }

    None
}
