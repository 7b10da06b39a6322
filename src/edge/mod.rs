//! # Caching Edge
//!
//! HTTP server that sits between the quiz front end and the trivia origin
//! and keeps the static site and the question endpoint usable while the
//! origin is unreachable.
//!
//! ## Key Components
//!
//! - `config.rs`: environment-driven settings and the precache list
//! - `asset_cache.rs`: named SQLite cache with install/activate lifecycle
//! - `upstream.rs`: forwarding client
//! - `handlers.rs`: network-first / cache-first routing
//! - `fallback.rs`: offline responses
//! - `init.rs`, `router.rs`, `state.rs`: application assembly

pub mod asset_cache;
pub mod config;
pub mod error;
pub mod fallback;
pub mod handlers;
pub mod init;
pub mod router;
pub mod state;
pub mod upstream;

pub use config::EdgeConfig;
pub use error::EdgeError;
pub use init::create_app;
