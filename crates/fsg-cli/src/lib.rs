//! # File Server Gateway
//!
//! Read-through HTTP gateway for files held on remote storage nodes.
//!
//! This crate provides:
//! - **File API**: `GET /<bucket...>/<file_name>` with metadata headers
//! - **Local cache**: Files are served from disk when present
//! - **Node fallback**: Misses are downloaded, persisted and returned
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │                   HTTP Clients                      │
//! └─────────────────────────┬───────────────────────────┘
//!                           │
//! ┌─────────────────────────▼───────────────────────────┐
//! │                   File Gateway                      │
//! ├─────────────────────────────────────────────────────┤
//! │  Request Id  │ Rate Limiter │ Path / Content-Type   │
//! ├─────────────────────────────────────────────────────┤
//! │                 File Handler                        │
//! ├─────────────────────────────────────────────────────┤
//! │                  fsg-storage                        │
//! │     (Redis metadata, local cache, node client)      │
//! └─────────────────────────────────────────────────────┘
//! ```

pub mod coalesce;
pub mod config;
pub mod content_type;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod path;
pub mod routes;
pub mod server;
pub mod state;

pub use config::GatewayConfig;
pub use error::{ApiError, GatewayErrorCode};
pub use path::RequestPath;
pub use server::{run_server, run_server_with_shutdown};
pub use state::AppState;
