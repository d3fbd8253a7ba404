//! Core types, deny-list matching and batch filtering for the publish gateway.

pub mod denylist;
pub mod error;
pub mod events;
pub mod filter;
pub mod limits;
pub mod payload;
pub mod prefixes;
pub mod quota;

pub use denylist::*;
pub use error::{Error, Result};
pub use events::*;
pub use filter::*;
pub use payload::{parse_batch, parse_event};
pub use prefixes::PrefixMatcher;
pub use quota::*;
