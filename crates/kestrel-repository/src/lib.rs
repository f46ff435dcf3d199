//! Kestrel Repository - persistence for rules, typologies, transactions, and
//! evaluations
//!
//! Every operation is predicated on a tenant id; omitting it is a hard input
//! error. Two backends implement the same trait: SQLite (community profile)
//! and PostgreSQL (pro profile).

mod error;
mod postgres;
mod queries;
mod schema;
mod sqlite;
mod traits;

pub use error::{RepositoryError, RepositoryResult};
pub use postgres::PostgresRepository;
pub use sqlite::SqliteRepository;
pub use traits::Repository;

use std::sync::Arc;

/// Repository backend configuration.
#[derive(Debug, Clone)]
pub struct RepositoryConfig {
    /// "sqlite" or "postgres"
    pub driver: String,

    pub sqlite_path: String,

    pub postgres_host: String,
    pub postgres_port: u16,
    pub postgres_user: String,
    pub postgres_password: String,
    pub postgres_db: String,
    pub postgres_sslmode: String,

    pub max_connections: u32,
}

impl Default for RepositoryConfig {
    fn default() -> Self {
        Self {
            driver: "sqlite".to_string(),
            sqlite_path: "./kestrel.db".to_string(),
            postgres_host: "localhost".to_string(),
            postgres_port: 5432,
            postgres_user: "kestrel".to_string(),
            postgres_password: String::new(),
            postgres_db: "kestrel".to_string(),
            postgres_sslmode: "disable".to_string(),
            max_connections: 10,
        }
    }
}

/// Open a repository for the configured driver and run migrations.
pub async fn connect(config: &RepositoryConfig) -> RepositoryResult<Arc<dyn Repository>> {
    match config.driver.as_str() {
        "sqlite" => Ok(Arc::new(SqliteRepository::new(config).await?)),
        "postgres" => Ok(Arc::new(PostgresRepository::new(config).await?)),
        other => Err(RepositoryError::UnsupportedDriver(other.to_string())),
    }
}
