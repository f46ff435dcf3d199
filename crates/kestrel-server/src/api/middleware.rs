//! Request middleware
//!
//! Tenant extraction (every route except /health and /ready) and
//! request/trace id propagation. CORS, HTTP tracing, and panic recovery are
//! tower-http layers applied in the router.

use super::extractors::{TenantId, TraceId};
use crate::error::ServerError;
use axum::extract::Request;
use axum::http::HeaderValue;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use uuid::Uuid;

pub(super) const TENANT_ID_HEADER: &str = "x-tenant-id";
pub(super) const REQUEST_ID_HEADER: &str = "x-request-id";
pub(super) const TRACE_ID_HEADER: &str = "x-trace-id";

/// Require `X-Tenant-ID` and stash it in request extensions.
pub(super) async fn tenant_middleware(mut req: Request, next: Next) -> Response {
    let tenant_id = req
        .headers()
        .get(TENANT_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .map(str::to_string);

    match tenant_id {
        Some(tenant_id) => {
            req.extensions_mut().insert(TenantId(tenant_id));
            next.run(req).await
        }
        None => {
            ServerError::BadRequest("X-Tenant-ID header is required".to_string()).into_response()
        }
    }
}

/// Assign request and trace ids, propagate them through extensions, and echo
/// them back as response headers.
pub(super) async fn tracing_middleware(mut req: Request, next: Next) -> Response {
    let request_id = header_value(&req, REQUEST_ID_HEADER)
        .unwrap_or_else(|| Uuid::new_v4().to_string());
    let trace_id = header_value(&req, TRACE_ID_HEADER).unwrap_or_else(|| request_id.clone());

    req.extensions_mut().insert(TraceId(trace_id.clone()));

    let mut response = next.run(req).await;

    let headers = response.headers_mut();
    if let Ok(value) = HeaderValue::from_str(&request_id) {
        headers.insert(REQUEST_ID_HEADER, value);
    }
    if let Ok(value) = HeaderValue::from_str(&trace_id) {
        headers.insert(TRACE_ID_HEADER, value);
    }

    response
}

fn header_value(req: &Request, name: &str) -> Option<String> {
    req.headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
