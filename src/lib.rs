//! # File Server Gateway
//!
//! Facade over the gateway workspace crates.
//!
//! - [`storage`]: metadata store, local file cache and storage node client
//! - [`gateway`]: HTTP server resolving file requests through the cache

pub use fsg_cli as gateway;
pub use fsg_storage as storage;
