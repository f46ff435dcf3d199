//! Repository trait
//!
//! The persistence capability consumed by the orchestrator, the management
//! API, and the velocity service. All operations are async and tenant-scoped;
//! implementations must be `Send + Sync` for use across tasks.

use crate::RepositoryResult;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use kestrel_core::domain::{Evaluation, RuleConfig, Transaction, Typology};

/// Data persistence capability.
#[async_trait]
pub trait Repository: Send + Sync {
    // Transactions
    async fn save_transaction(&self, tenant_id: &str, tx: &Transaction) -> RepositoryResult<()>;
    async fn get_transaction(&self, tenant_id: &str, tx_id: &str)
        -> RepositoryResult<Transaction>;

    /// Count of transactions touching an entity (as debtor or creditor) since
    /// the given instant. Backs the velocity provider.
    async fn count_transactions_by_entity(
        &self,
        tenant_id: &str,
        entity_id: &str,
        since: DateTime<Utc>,
    ) -> RepositoryResult<i64>;

    // Rule configurations
    async fn save_rule_config(&self, tenant_id: &str, rule: &RuleConfig) -> RepositoryResult<()>;
    async fn get_rule_config(&self, tenant_id: &str, rule_id: &str)
        -> RepositoryResult<RuleConfig>;
    async fn list_rule_configs(&self, tenant_id: &str) -> RepositoryResult<Vec<RuleConfig>>;

    // Evaluations
    async fn save_evaluation(&self, tenant_id: &str, eval: &Evaluation) -> RepositoryResult<()>;
    async fn get_evaluation(&self, tenant_id: &str, eval_id: &str)
        -> RepositoryResult<Evaluation>;

    // Typologies
    async fn save_typology(&self, tenant_id: &str, typology: &Typology) -> RepositoryResult<()>;
    async fn get_typology(&self, tenant_id: &str, typology_id: &str)
        -> RepositoryResult<Typology>;
    async fn list_typologies(&self, tenant_id: &str) -> RepositoryResult<Vec<Typology>>;

    /// Soft-delete: disables the typology so reloads no longer pick it up.
    async fn delete_typology(&self, tenant_id: &str, typology_id: &str) -> RepositoryResult<()>;

    /// Health check.
    async fn ping(&self) -> RepositoryResult<()>;

    /// Release the connection pool. Must run before process exit.
    async fn close(&self) -> RepositoryResult<()>;
}
