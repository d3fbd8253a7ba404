//! Unified error types for the publish gateway.
//!
//! Error codes:
//! - AUTH_001: Authentication errors
//! - VALID_001-003: Validation errors
//! - DENY_001: Deny-list rejection
//! - QUOTA_001-003: Quota authority errors
//! - SINK_001-002: Ingestion sink errors
//! - RATE_001: Rate limit errors

use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Authentication error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthErrorCode {
    /// AUTH_001: Principal headers are missing
    MissingPrincipal,
}

impl AuthErrorCode {
    pub fn code(&self) -> &'static str {
        match self {
            Self::MissingPrincipal => "AUTH_001",
        }
    }

    pub fn http_status(&self) -> u16 {
        401
    }
}

/// Validation error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationErrorCode {
    /// VALID_001: Invalid JSON / Invalid format
    InvalidFormat,
    /// VALID_002: Batch exceeds the event or byte limit
    BatchTooLarge,
    /// VALID_003: Batch has no events
    EmptyBatch,
}

impl ValidationErrorCode {
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidFormat => "VALID_001",
            Self::BatchTooLarge => "VALID_002",
            Self::EmptyBatch => "VALID_003",
        }
    }

    pub fn http_status(&self) -> u16 {
        400
    }
}

/// Quota authority error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuotaErrorCode {
    /// QUOTA_001: Quota authority unreachable or failed internally
    Unavailable,
    /// QUOTA_002: Quota authority rejected the request as malformed
    InvalidRequest,
    /// QUOTA_003: Permit granted zero events
    Exhausted,
}

impl QuotaErrorCode {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Unavailable => "QUOTA_001",
            Self::InvalidRequest => "QUOTA_002",
            Self::Exhausted => "QUOTA_003",
        }
    }

    pub fn http_status(&self) -> u16 {
        match self {
            Self::Unavailable => 503,
            Self::InvalidRequest => 400,
            Self::Exhausted => 429,
        }
    }
}

/// Rate limit error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLimitErrorCode {
    /// RATE_001: Rate limit exceeded
    Exceeded,
}

impl RateLimitErrorCode {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Exceeded => "RATE_001",
        }
    }

    pub fn http_status(&self) -> u16 {
        429
    }
}

pub const DENY_REJECTED_CODE: &str = "DENY_001";
pub const SINK_FORWARDING_FAILED_CODE: &str = "SINK_001";
pub const SINK_NOTHING_ACCEPTED_CODE: &str = "SINK_002";

/// Unified error type for the publish gateway.
#[derive(Debug, Error)]
pub enum Error {
    /// Authentication error with code.
    #[error("[{code}] {message}")]
    Auth {
        code: &'static str,
        message: String,
        http_status: u16,
    },

    /// Validation error with code.
    #[error("[{code}] {message}")]
    Validation {
        code: &'static str,
        message: String,
        http_status: u16,
    },

    /// The quota authority call failed for reasons other than invalid input.
    #[error("quota unavailable: {0}")]
    QuotaUnavailable(String),

    /// The quota authority rejected the request as malformed.
    #[error("quota request invalid: {0}")]
    QuotaInvalidRequest(String),

    /// The permit granted zero events.
    #[error("publishing limit reached for owner {owner:?}")]
    QuotaExhausted { owner: String },

    /// The first event of the batch matched a deny-list prefix.
    #[error("forbidden by prefix: {prefix}")]
    Rejected {
        prefix: String,
        dimension: String,
        value: String,
    },

    /// The ingestion sink failed after quota was granted.
    #[error("forwarding failed: {0}")]
    ForwardingFailed(String),

    /// Rate limit error with code.
    #[error("[{code}] {message}")]
    RateLimit {
        code: &'static str,
        message: String,
        http_status: u16,
        retry_after: Option<u64>,
    },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    pub fn auth(code: AuthErrorCode, msg: impl Into<String>) -> Self {
        Self::Auth {
            code: code.code(),
            message: msg.into(),
            http_status: code.http_status(),
        }
    }

    pub fn validation(code: ValidationErrorCode, msg: impl Into<String>) -> Self {
        Self::Validation {
            code: code.code(),
            message: msg.into(),
            http_status: code.http_status(),
        }
    }

    /// Shorthand for an `InvalidFormat` validation error.
    pub fn invalid_format(msg: impl Into<String>) -> Self {
        Self::validation(ValidationErrorCode::InvalidFormat, msg)
    }

    pub fn rate_limit(
        code: RateLimitErrorCode,
        msg: impl Into<String>,
        retry_after: Option<u64>,
    ) -> Self {
        Self::RateLimit {
            code: code.code(),
            message: msg.into(),
            http_status: code.http_status(),
            retry_after,
        }
    }

    pub fn quota_unavailable(msg: impl Into<String>) -> Self {
        Self::QuotaUnavailable(msg.into())
    }

    pub fn quota_invalid(msg: impl Into<String>) -> Self {
        Self::QuotaInvalidRequest(msg.into())
    }

    pub fn forwarding(msg: impl Into<String>) -> Self {
        Self::ForwardingFailed(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Get the HTTP status code for this error.
    pub fn http_status(&self) -> u16 {
        match self {
            Self::Auth { http_status, .. } => *http_status,
            Self::Validation { http_status, .. } => *http_status,
            Self::RateLimit { http_status, .. } => *http_status,
            Self::QuotaUnavailable(_) => QuotaErrorCode::Unavailable.http_status(),
            Self::QuotaInvalidRequest(_) => QuotaErrorCode::InvalidRequest.http_status(),
            Self::QuotaExhausted { .. } => QuotaErrorCode::Exhausted.http_status(),
            Self::Rejected { .. } => 403,
            Self::ForwardingFailed(_) => 502,
            Self::Serialization(_) => 400,
            Self::Internal(_) => 500,
        }
    }

    /// Get the stable error code for this error.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Auth { code, .. } => code,
            Self::Validation { code, .. } => code,
            Self::RateLimit { code, .. } => code,
            Self::QuotaUnavailable(_) => QuotaErrorCode::Unavailable.code(),
            Self::QuotaInvalidRequest(_) => QuotaErrorCode::InvalidRequest.code(),
            Self::QuotaExhausted { .. } => QuotaErrorCode::Exhausted.code(),
            Self::Rejected { .. } => DENY_REJECTED_CODE,
            Self::ForwardingFailed(_) => SINK_FORWARDING_FAILED_CODE,
            Self::Serialization(_) => ValidationErrorCode::InvalidFormat.code(),
            Self::Internal(_) => "INTERNAL",
        }
    }
}
