//! Principal, quota subject and permit types.

use serde::{Deserialize, Serialize};

use crate::error::{AuthErrorCode, Error, Result, ValidationErrorCode};
use crate::limits::MAX_PRINCIPAL_ID_LEN;

/// The (group, user) pair a request is attributed to.
///
/// Both ids are established by the upstream authentication layer and
/// arrive already verified.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Principal {
    pub group_id: String,
    pub user_id: String,
}

impl Principal {
    pub fn new(group_id: impl Into<String>, user_id: impl Into<String>) -> Self {
        Self {
            group_id: group_id.into(),
            user_id: user_id.into(),
        }
    }

    /// Build a principal from the verified identity headers.
    ///
    /// The group id is mandatory; the user id may be empty for group-level
    /// publishers.
    pub fn from_headers(group_id: Option<&str>, user_id: Option<&str>) -> Result<Self> {
        let group_id = group_id.map(str::trim).unwrap_or_default();
        if group_id.is_empty() {
            return Err(Error::auth(
                AuthErrorCode::MissingPrincipal,
                "group id is required",
            ));
        }
        let user_id = user_id.map(str::trim).unwrap_or_default();

        if group_id.len() > MAX_PRINCIPAL_ID_LEN || user_id.len() > MAX_PRINCIPAL_ID_LEN {
            return Err(Error::validation(
                ValidationErrorCode::InvalidFormat,
                format!("principal id exceeds {} bytes", MAX_PRINCIPAL_ID_LEN),
            ));
        }

        Ok(Self::new(group_id, user_id))
    }
}

/// Which quota counter a request or release applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Subject {
    Undefined,
    Interests,
    PublishEvents,
}

impl Subject {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Undefined => "undefined",
            Self::Interests => "interests",
            Self::PublishEvents => "publish_events",
        }
    }
}

impl std::fmt::Display for Subject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of a quota request. Created fresh per request and never mutated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Permit {
    /// Number of events the caller may consume now; may be zero.
    #[serde(default)]
    pub granted_count: u32,
    /// Principal the permit was charged against. Empty for a group-level permit.
    #[serde(default)]
    pub owner_id: String,
    /// True only for the request that drove the allowance from positive to zero.
    #[serde(default)]
    pub just_exhausted: bool,
}

impl Permit {
    pub fn new(granted_count: u32, owner_id: impl Into<String>) -> Self {
        Self {
            granted_count,
            owner_id: owner_id.into(),
            just_exhausted: false,
        }
    }

    pub fn exhausted(mut self) -> Self {
        self.just_exhausted = true;
        self
    }

    pub fn is_group_level(&self) -> bool {
        self.owner_id.is_empty()
    }
}
