//! Shared helpers for the gateway's integration tests.

pub mod fixtures;
pub mod mocks;
