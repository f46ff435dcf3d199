//! Velocity provider capability

use async_trait::async_trait;

/// Supplies the number of transactions an entity has made within a time
/// window. Wired into the rule engine so expressions can reference
/// `velocity_count`.
///
/// Provider failures never fail an evaluation; the engine logs them and
/// falls back to a count of 0.
#[async_trait]
pub trait VelocityProvider: Send + Sync {
    /// Count transactions touching `entity_id` (as debtor or creditor) for
    /// `tenant_id` within the trailing window.
    async fn transaction_count(
        &self,
        tenant_id: &str,
        entity_id: &str,
        window_secs: i64,
    ) -> anyhow::Result<i64>;
}
