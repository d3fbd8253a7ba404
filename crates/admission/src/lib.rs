//! Admission of published batches.
//!
//! A batch first passes the deny-list filter, is stamped with the
//! publisher's identity, and is then admitted against the publisher's quota
//! before being forwarded to the ingestion sink.

pub mod config;
pub mod controller;
pub mod notice;
pub mod publisher;

#[cfg(test)]
pub(crate) mod testing;

pub use config::InternalWriterConfig;
pub use controller::AdmissionController;
pub use notice::{limit_reached_notice, LIMIT_REACHED_TEXT};
pub use publisher::PublishService;
