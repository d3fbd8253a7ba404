//! Publish endpoint handlers.
//!
//! `POST /v1/events` takes a single event, `POST /v1/events/batch` takes
//! `{ "events": [...] }`. Both are filtered against the deny-list and
//! admitted against the publisher's quota. `POST /v1/events/internal` writes
//! one event through the unmetered path and is throttled instead.

use axum::{body::Bytes, extract::State, Json};
use gateway_core::{
    error::ValidationErrorCode, limits::MAX_BATCH_SIZE_BYTES, parse_batch, parse_event, Error,
    Event, Principal,
};
use telemetry::metrics;
use tracing::{debug, warn};

use crate::extractors::Publisher;
use crate::response::{ApiError, PublishResponse};
use crate::state::AppState;

/// POST /v1/events - Publish a single event.
pub async fn publish_handler(
    State(state): State<AppState>,
    Publisher(principal): Publisher,
    body: Bytes,
) -> Result<Json<PublishResponse>, ApiError> {
    check_size(&body)?;
    let event = parse_event(&body)?;
    submit(&state, &principal, vec![event]).await
}

/// POST /v1/events/batch - Publish an ordered batch of events.
pub async fn publish_batch_handler(
    State(state): State<AppState>,
    Publisher(principal): Publisher,
    body: Bytes,
) -> Result<Json<PublishResponse>, ApiError> {
    check_size(&body)?;
    let events = parse_batch(&body)?;

    debug!(
        group_id = %principal.group_id,
        user_id = %principal.user_id,
        count = events.len(),
        payload_size = body.len(),
        "Received event batch"
    );

    submit(&state, &principal, events).await
}

/// POST /v1/events/internal - Publish one event without quota admission.
pub async fn publish_internal_handler(
    State(state): State<AppState>,
    Publisher(principal): Publisher,
    body: Bytes,
) -> Result<Json<PublishResponse>, ApiError> {
    if let Err(retry_after) = state.internal_limiter.check() {
        metrics().rate_limited_requests.inc();
        warn!(
            group_id = %principal.group_id,
            retry_after,
            "Internal publish rate limited"
        );
        return Err(ApiError::rate_limited(
            "internal publish rate exceeded",
            Some(retry_after),
        ));
    }

    check_size(&body)?;
    let event = parse_event(&body)?;

    let ack = state.publisher.publish_internal(&principal, event).await?;
    respond(ack)
}

async fn submit(
    state: &AppState,
    principal: &Principal,
    events: Vec<Event>,
) -> Result<Json<PublishResponse>, ApiError> {
    let ack = state.publisher.publish(principal, events).await?;
    respond(ack)
}

fn respond(ack_count: u32) -> Result<Json<PublishResponse>, ApiError> {
    if ack_count == 0 {
        return Err(ApiError::nothing_accepted());
    }
    Ok(Json(PublishResponse { ack_count }))
}

fn check_size(body: &Bytes) -> Result<(), Error> {
    if body.len() > MAX_BATCH_SIZE_BYTES {
        return Err(Error::validation(
            ValidationErrorCode::BatchTooLarge,
            format!(
                "Payload size {}KB exceeds {}KB limit",
                body.len() / 1024,
                MAX_BATCH_SIZE_BYTES / 1024
            ),
        ));
    }
    Ok(())
}
