//! REST API
//!
//! Router, handlers, middleware, and wire types for the HTTP surface.

mod extractors;
mod handlers;
mod middleware;
mod router;
mod types;

pub use extractors::{JsonExtractor, TenantId, TraceId};
pub use router::create_router;
