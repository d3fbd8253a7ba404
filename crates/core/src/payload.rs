//! Request body decoding.
//!
//! Accepts a single event (`{ "id": ..., "source": ..., ... }`) or a batch
//! (`{ "events": [ ... ] }`). Field names may be camelCase or snake_case.

use serde::Deserialize;
use validator::Validate;

use crate::error::{Error, Result, ValidationErrorCode};
use crate::events::Event;
use crate::limits::MAX_BATCH_EVENTS;

#[derive(Debug, Deserialize)]
struct BatchBody {
    #[serde(default)]
    events: Vec<Event>,
}

/// Parse a single event body.
pub fn parse_event(bytes: &[u8]) -> Result<Event> {
    let event: Event = serde_json::from_slice(bytes)
        .map_err(|e| Error::invalid_format(format!("invalid event: {}", e)))?;
    validate_event(&event, 0)?;
    Ok(event)
}

/// Parse a batch body, preserving submission order.
pub fn parse_batch(bytes: &[u8]) -> Result<Vec<Event>> {
    let body: BatchBody = serde_json::from_slice(bytes)
        .map_err(|e| Error::invalid_format(format!("invalid event batch: {}", e)))?;

    if body.events.is_empty() {
        return Err(Error::validation(
            ValidationErrorCode::EmptyBatch,
            "batch has no events",
        ));
    }
    if body.events.len() > MAX_BATCH_EVENTS {
        return Err(Error::validation(
            ValidationErrorCode::BatchTooLarge,
            format!(
                "batch has {} events, exceeds {} limit",
                body.events.len(),
                MAX_BATCH_EVENTS
            ),
        ));
    }

    for (i, event) in body.events.iter().enumerate() {
        validate_event(event, i)?;
    }
    Ok(body.events)
}

fn validate_event(event: &Event, index: usize) -> Result<()> {
    event
        .validate()
        .map_err(|e| Error::invalid_format(format!("event[{}]: {}", index, e)))
}
