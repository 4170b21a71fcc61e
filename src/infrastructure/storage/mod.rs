//! Storage adapters for the directory.
//!
//! The embedded sled-backed store implements both the hospital and the
//! user/session persistence contracts.

pub mod sled_store;

pub use sled_store::{SledDirectoryStore, DEFAULT_CACHE_CAPACITY};
