//! Size limits for the publish gateway.
//!
//! The `#[validate]` derive macro requires literal values in attributes,
//! so event field limits are duplicated in `events.rs`. Keep both in sync
//! when modifying.

// === Batch Limits ===

/// Maximum request body size in bytes (1MB).
pub const MAX_BATCH_SIZE_BYTES: usize = 1024 * 1024;

/// Maximum events per batch.
pub const MAX_BATCH_EVENTS: usize = 1000;

// === String Field Limits (chars) ===

/// Event ID max length.
pub const MAX_EVENT_ID_LEN: usize = 256;

/// Event source max length (feed/site/channel URLs).
pub const MAX_SOURCE_LEN: usize = 2048;

/// Event type max length.
pub const MAX_TYPE_LEN: usize = 256;

/// Principal id max length (group or user).
pub const MAX_PRINCIPAL_ID_LEN: usize = 256;

// === Deny-list ===

/// Page size used when loading the deny-list from its store.
pub const DENY_LIST_PAGE_SIZE: u32 = 100;
