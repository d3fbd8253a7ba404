//! Token bucket rate limiting.

use parking_lot::Mutex;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Process-wide token bucket rate limiter.
///
/// One bucket is shared by every caller, so the configured rate bounds the
/// total throughput of the path it guards.
pub struct RateLimiter {
    bucket: Mutex<TokenBucket>,
    config: RateLimitConfig,
}

#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    /// Tokens added per second
    pub rate: f64,
    /// Bucket capacity
    pub burst: u32,
}

impl RateLimitConfig {
    /// `n` requests per minute with no burst beyond a single request.
    pub fn per_minute(n: u32) -> Self {
        Self {
            rate: n.max(1) as f64 / 60.0,
            burst: 1,
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self::per_minute(1)
    }
}

struct TokenBucket {
    tokens: f64,
    last_update: Instant,
}

impl TokenBucket {
    fn new(burst: u32, now: Instant) -> Self {
        Self {
            tokens: burst as f64,
            last_update: now,
        }
    }

    /// Take a token, or return how long until one is available.
    fn try_acquire(&mut self, rate: f64, burst: u32, now: Instant) -> Result<(), Duration> {
        let elapsed = now.saturating_duration_since(self.last_update).as_secs_f64();
        self.last_update = self.last_update.max(now);

        // Replenish tokens
        self.tokens = (self.tokens + elapsed * rate).min(burst as f64);

        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            Ok(())
        } else {
            Err(Duration::from_secs_f64((1.0 - self.tokens) / rate))
        }
    }
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self::starting_at(config, Instant::now())
    }

    fn starting_at(config: RateLimitConfig, now: Instant) -> Self {
        Self {
            bucket: Mutex::new(TokenBucket::new(config.burst, now)),
            config,
        }
    }

    /// Check if a request is allowed.
    ///
    /// On refusal returns the whole number of seconds to wait, at least 1.
    pub fn check(&self) -> Result<(), u64> {
        self.check_at(Instant::now())
    }

    fn check_at(&self, now: Instant) -> Result<(), u64> {
        self.bucket
            .lock()
            .try_acquire(self.config.rate, self.config.burst, now)
            .map_err(|wait| wait.as_secs_f64().ceil().max(1.0) as u64)
    }
}

/// Shared rate limiter state.
pub type SharedRateLimiter = Arc<RateLimiter>;
