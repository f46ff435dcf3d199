//! Repository error types

use thiserror::Error;

/// Repository error type
#[derive(Error, Debug)]
pub enum RepositoryError {
    #[error("tenant id is required")]
    TenantRequired,

    #[error("record not found")]
    NotFound,

    #[error("unsupported driver: {0}")]
    UnsupportedDriver(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type RepositoryResult<T> = std::result::Result<T, RepositoryError>;

pub(crate) fn require_tenant(tenant_id: &str) -> RepositoryResult<()> {
    if tenant_id.is_empty() {
        Err(RepositoryError::TenantRequired)
    } else {
        Ok(())
    }
}
