//! Application state shared across handlers.

use std::sync::Arc;

use admission::PublishService;

use crate::middleware::rate_limit::{RateLimitConfig, RateLimiter, SharedRateLimiter};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Filter, quota admission and forwarding for published batches
    pub publisher: Arc<PublishService>,
    /// Throttle for the unmetered internal path
    pub internal_limiter: SharedRateLimiter,
}

impl AppState {
    pub fn new(publisher: Arc<PublishService>) -> Self {
        let config = RateLimitConfig::per_minute(publisher.internal_config().rate_per_minute);
        Self {
            publisher,
            internal_limiter: Arc::new(RateLimiter::new(config)),
        }
    }
}
