//! Custom extractors
//!
//! Tenant and trace identifiers are placed into request extensions by the
//! middleware; these extractors pull them out. The JSON extractor maps every
//! body parse failure onto a 400 with the standard error shape.

use crate::error::ServerError;
use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, FromRequestParts, Request};
use axum::http::request::Parts;
use axum::Json;

/// Tenant id extracted from the `X-Tenant-ID` header.
#[derive(Debug, Clone)]
pub struct TenantId(pub String);

impl<S> FromRequestParts<S> for TenantId
where
    S: Send + Sync,
{
    type Rejection = ServerError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts.extensions.get::<TenantId>().cloned().ok_or_else(|| {
            ServerError::BadRequest("X-Tenant-ID header is required".to_string())
        })
    }
}

/// Trace id assigned by the tracing middleware.
#[derive(Debug, Clone)]
pub struct TraceId(pub String);

impl<S> FromRequestParts<S> for TraceId
where
    S: Send + Sync,
{
    type Rejection = ServerError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // The middleware runs on every route; a missing id means a fresh one
        Ok(parts
            .extensions
            .get::<TraceId>()
            .cloned()
            .unwrap_or_else(|| TraceId(uuid::Uuid::new_v4().to_string())))
    }
}

/// JSON extractor that rejects malformed bodies with 400 instead of 422.
pub struct JsonExtractor<T>(pub T);

impl<S, T> FromRequest<S> for JsonExtractor<T>
where
    T: serde::de::DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ServerError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => {
                let message = match rejection {
                    JsonRejection::JsonDataError(_) | JsonRejection::JsonSyntaxError(_) => {
                        "invalid JSON request body".to_string()
                    }
                    JsonRejection::MissingJsonContentType(_) => {
                        "missing 'Content-Type: application/json' header".to_string()
                    }
                    other => format!("failed to read request body: {other}"),
                };
                Err(ServerError::BadRequest(message))
            }
        }
    }
}
