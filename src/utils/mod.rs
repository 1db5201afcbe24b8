//! Utility functions
//!
//! Provides logging setup and storage limit parsing.

pub mod logging;
pub mod storage_limit;

pub use storage_limit::{INVALID_STORAGE_LIMIT, parse_storage_limit, try_parse_storage_limit};
