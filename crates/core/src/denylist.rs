//! Deny-list rules and the shared, swappable matcher holding them.

use std::sync::Arc;

use arc_swap::ArcSwap;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::prefixes::PrefixMatcher;

/// Metadata kept for a deny rule. Not used in matching.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DenyValue {
    #[serde(rename = "created")]
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub reason: String,
}

/// One deny-list rule as stored and paged by the deny-list store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DenyEntry {
    /// Literal prefix matched against `"<dimension>:<value>"` keys
    pub prefix: String,
    #[serde(flatten)]
    pub value: DenyValue,
}

impl DenyEntry {
    pub fn new(prefix: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            value: DenyValue {
                created_at: Utc::now(),
                reason: reason.into(),
            },
        }
    }
}

/// An immutable deny-list.
pub type DenyList = PrefixMatcher<DenyValue>;

impl DenyList {
    /// Build a deny-list; a later duplicate prefix overwrites an earlier one.
    pub fn from_entries(entries: impl IntoIterator<Item = DenyEntry>) -> Self {
        let mut list = Self::new();
        for entry in entries {
            list.put(&entry.prefix, entry.value);
        }
        list
    }
}

/// Process-wide handle to the current deny-list.
///
/// Readers take a snapshot without locking; a reload builds a whole new
/// list and swaps it in, so an in-flight batch always sees one consistent
/// rule set.
#[derive(Debug, Clone)]
pub struct DenyListHandle {
    current: Arc<ArcSwap<DenyList>>,
}

impl Default for DenyListHandle {
    fn default() -> Self {
        Self::new(DenyList::new())
    }
}

impl DenyListHandle {
    pub fn new(list: DenyList) -> Self {
        Self {
            current: Arc::new(ArcSwap::from_pointee(list)),
        }
    }

    /// Current rule set.
    pub fn snapshot(&self) -> Arc<DenyList> {
        self.current.load_full()
    }

    /// Replace the rule set; returns the number of rules now active.
    pub fn replace(&self, list: DenyList) -> usize {
        let len = list.len();
        self.current.store(Arc::new(list));
        len
    }

    pub fn len(&self) -> usize {
        self.current.load().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
