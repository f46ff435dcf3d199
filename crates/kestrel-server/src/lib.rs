//! Kestrel server - HTTP surface, orchestration, and the async worker
//!
//! Wires the engines, repository, cache, and event bus behind an axum API.
//! The binary entry point lives in `main.rs`; the library exposes the pieces
//! so integration tests can assemble the same stack in-process.

pub mod api;
pub mod config;
pub mod error;
pub mod service;
pub mod state;
pub mod velocity;
pub mod worker;

/// Server version, reported by `/health` and response metadata.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
