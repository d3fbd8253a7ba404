//! Clients for the quota authority and the deny-list store.

pub mod config;
pub mod denylist_store;
pub mod quota;

pub use config::*;
pub use denylist_store::*;
pub use quota::*;
