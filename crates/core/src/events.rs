//! Event type definitions for the publish gateway.
//!
//! Events follow the CloudEvents attribute model: a handful of top-level
//! context fields plus a map of typed extension attributes. The gateway only
//! inspects `source`, `type` and text-like attribute values; the payload is
//! passed through untouched.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Attribute names stamped or read by the gateway.
pub mod keys {
    /// Group of the publishing principal.
    pub const GROUP_ID: &str = "groupid";
    /// User of the publishing principal.
    pub const USER_ID: &str = "userid";
    /// Time the gateway accepted the event.
    pub const PUB_TIME: &str = "pubtime";
    /// Destination group of a notice.
    pub const TO_GROUP_ID: &str = "togroupid";
    /// Destination user of a notice.
    pub const TO_USER_ID: &str = "touserid";
}

/// Event type tags produced by the gateway itself.
pub mod types {
    /// Publishing limit reached notice.
    pub const LIMIT_REACHED: &str = "com_gateway_limit_reached";
}

/// CloudEvents spec version stamped on synthesized events.
pub const SPEC_VERSION: &str = "1.0";

/// A typed attribute value.
///
/// Serialized in the `{"ceString": "..."}` shape; snake_case spellings
/// (`ce_string`) are accepted on input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AttributeValue {
    #[serde(alias = "ce_boolean")]
    CeBoolean(bool),
    #[serde(alias = "ce_bytes")]
    CeBytes(#[serde(with = "base64_bytes")] Vec<u8>),
    #[serde(alias = "ce_integer")]
    CeInteger(i32),
    #[serde(alias = "ce_string")]
    CeString(String),
    #[serde(alias = "ce_timestamp")]
    CeTimestamp(DateTime<Utc>),
    #[serde(alias = "ce_uri")]
    CeUri(String),
    #[serde(alias = "ce_uri_ref")]
    CeUriRef(String),
}

impl AttributeValue {
    pub fn string(value: impl Into<String>) -> Self {
        Self::CeString(value.into())
    }

    /// Returns the value if it is text-like (string, URI or URI reference).
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::CeString(s) | Self::CeUri(s) | Self::CeUriRef(s) => Some(s),
            _ => None,
        }
    }
}

/// A single published event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    /// Event ID, unique per source
    #[validate(length(max = 256))]
    pub id: String,

    /// CloudEvents spec version
    #[serde(default, alias = "spec_version")]
    pub spec_version: String,

    /// Origin of the event (feed URL, channel, site...)
    #[serde(default)]
    #[validate(length(max = 2048))]
    pub source: String,

    /// Event type
    #[serde(rename = "type", default)]
    #[validate(length(max = 256))]
    pub event_type: String,

    /// Extension attributes
    #[serde(default)]
    pub attributes: BTreeMap<String, AttributeValue>,

    /// Text payload
    #[serde(default, alias = "text_data", skip_serializing_if = "Option::is_none")]
    pub text_data: Option<String>,
}

impl Event {
    pub fn new(
        id: impl Into<String>,
        source: impl Into<String>,
        event_type: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            spec_version: SPEC_VERSION.to_string(),
            source: source.into(),
            event_type: event_type.into(),
            attributes: BTreeMap::new(),
            text_data: None,
        }
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: AttributeValue) -> Self {
        self.attributes.insert(name.into(), value);
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text_data = Some(text.into());
        self
    }

    pub fn attribute(&self, name: &str) -> Option<&AttributeValue> {
        self.attributes.get(name)
    }

    /// Sets (or replaces) an attribute in place.
    pub fn set_attribute(&mut self, name: impl Into<String>, value: AttributeValue) {
        self.attributes.insert(name.into(), value);
    }
}

/// Base64 (standard alphabet) encoding for byte attributes.
mod base64_bytes {
    use base64::{engine::general_purpose::STANDARD, Engine as _};
    use serde::{de::Error as _, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        STANDARD.decode(encoded.as_bytes()).map_err(D::Error::custom)
    }
}
