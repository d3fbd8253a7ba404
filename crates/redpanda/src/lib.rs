//! Redpanda ingestion sink for the publish gateway.

pub mod client;
pub mod config;
pub mod health;
pub mod producer;
pub mod sink;

pub use config::*;
pub use producer::*;
pub use sink::*;
