//! PostgreSQL repository
//!
//! The pro-profile backend. Shares query text with the SQLite backend; the
//! `?` placeholders are rebound to `$1..$n` at call time.

use crate::error::require_tenant;
use crate::queries::{self, rebind};
use crate::schema::POSTGRES_SCHEMAS;
use crate::sqlite::status_from_str;
use crate::traits::Repository;
use crate::{RepositoryConfig, RepositoryError, RepositoryResult};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use kestrel_core::domain::{
    Evaluation, EvaluationMetadata, RuleConfig, Transaction, Typology,
};
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::Row;

/// PostgreSQL-backed repository.
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    /// Connect to PostgreSQL and run migrations.
    pub async fn new(config: &RepositoryConfig) -> RepositoryResult<Self> {
        let url = format!(
            "postgres://{}:{}@{}:{}/{}?sslmode={}",
            config.postgres_user,
            config.postgres_password,
            config.postgres_host,
            config.postgres_port,
            config.postgres_db,
            config.postgres_sslmode,
        );

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections.max(1))
            .connect(&url)
            .await?;

        let repo = Self { pool };
        repo.migrate().await?;
        Ok(repo)
    }

    /// Wrap an existing pool (tests, shared pools).
    pub fn with_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn migrate(&self) -> RepositoryResult<()> {
        for schema in POSTGRES_SCHEMAS {
            sqlx::raw_sql(schema).execute(&self.pool).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl Repository for PostgresRepository {
    async fn save_transaction(&self, tenant_id: &str, tx: &Transaction) -> RepositoryResult<()> {
        require_tenant(tenant_id)?;

        let metadata = tx
            .metadata
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;

        sqlx::query(&rebind(queries::INSERT_TRANSACTION))
            .bind(&tx.id)
            .bind(tenant_id)
            .bind(&tx.tx_type)
            .bind(&tx.debtor_id)
            .bind(&tx.debtor_account_id)
            .bind(&tx.creditor_id)
            .bind(&tx.creditor_account_id)
            .bind(tx.amount)
            .bind(&tx.currency)
            .bind(tx.timestamp)
            .bind(tx.created_at)
            .bind(metadata)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn get_transaction(
        &self,
        tenant_id: &str,
        tx_id: &str,
    ) -> RepositoryResult<Transaction> {
        require_tenant(tenant_id)?;

        let row = sqlx::query(&rebind(queries::SELECT_TRANSACTION))
            .bind(tenant_id)
            .bind(tx_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(RepositoryError::NotFound)?;

        let metadata: Option<String> = row.try_get("metadata")?;

        Ok(Transaction {
            id: row.try_get("id")?,
            tenant_id: row.try_get("tenant_id")?,
            tx_type: row.try_get("type")?,
            debtor_id: row.try_get("debtor_id")?,
            debtor_account_id: row.try_get("debtor_account_id")?,
            creditor_id: row.try_get("creditor_id")?,
            creditor_account_id: row.try_get("creditor_account_id")?,
            amount: row.try_get("amount")?,
            currency: row.try_get("currency")?,
            timestamp: row.try_get("timestamp")?,
            created_at: row.try_get("created_at")?,
            metadata: metadata.map(|m| serde_json::from_str(&m)).transpose()?,
        })
    }

    async fn count_transactions_by_entity(
        &self,
        tenant_id: &str,
        entity_id: &str,
        since: DateTime<Utc>,
    ) -> RepositoryResult<i64> {
        require_tenant(tenant_id)?;

        let row = sqlx::query(&rebind(queries::COUNT_TRANSACTIONS_BY_ENTITY))
            .bind(tenant_id)
            .bind(entity_id)
            .bind(entity_id)
            .bind(since)
            .fetch_one(&self.pool)
            .await?;

        Ok(row.try_get(0)?)
    }

    async fn save_rule_config(&self, tenant_id: &str, rule: &RuleConfig) -> RepositoryResult<()> {
        require_tenant(tenant_id)?;

        let bands = serde_json::to_string(&rule.bands)?;
        let now = Utc::now();

        sqlx::query(&rebind(queries::UPSERT_RULE_CONFIG))
            .bind(&rule.id)
            .bind(tenant_id)
            .bind(&rule.name)
            .bind(&rule.description)
            .bind(&rule.version)
            .bind(&rule.expression)
            .bind(bands)
            .bind(rule.weight)
            .bind(i32::from(rule.enabled))
            .bind(now)
            .bind(now)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn get_rule_config(
        &self,
        tenant_id: &str,
        rule_id: &str,
    ) -> RepositoryResult<RuleConfig> {
        require_tenant(tenant_id)?;

        let row = sqlx::query(&rebind(queries::SELECT_RULE_CONFIG))
            .bind(tenant_id)
            .bind(rule_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(RepositoryError::NotFound)?;

        rule_config_from_row(&row)
    }

    async fn list_rule_configs(&self, tenant_id: &str) -> RepositoryResult<Vec<RuleConfig>> {
        require_tenant(tenant_id)?;

        let rows = sqlx::query(&rebind(queries::LIST_RULE_CONFIGS))
            .bind(tenant_id)
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(rule_config_from_row).collect()
    }

    async fn save_evaluation(&self, tenant_id: &str, eval: &Evaluation) -> RepositoryResult<()> {
        require_tenant(tenant_id)?;

        sqlx::query(&rebind(queries::INSERT_EVALUATION))
            .bind(&eval.id)
            .bind(tenant_id)
            .bind(&eval.tx_id)
            .bind(eval.status.to_string())
            .bind(eval.score)
            .bind(eval.timestamp)
            .bind(serde_json::to_string(&eval.rule_results)?)
            .bind(serde_json::to_string(&eval.typology_results)?)
            .bind(serde_json::to_string(&eval.metadata)?)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn get_evaluation(
        &self,
        tenant_id: &str,
        eval_id: &str,
    ) -> RepositoryResult<Evaluation> {
        require_tenant(tenant_id)?;

        let row = sqlx::query(&rebind(queries::SELECT_EVALUATION))
            .bind(tenant_id)
            .bind(eval_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(RepositoryError::NotFound)?;

        let status: String = row.try_get("status")?;
        let rule_results: String = row.try_get("rule_results")?;
        let typology_results: Option<String> = row.try_get("typology_results")?;
        let metadata: String = row.try_get("metadata")?;

        Ok(Evaluation {
            id: row.try_get("id")?,
            tenant_id: row.try_get("tenant_id")?,
            tx_id: row.try_get("tx_id")?,
            status: status_from_str(&status),
            score: row.try_get("score")?,
            timestamp: row.try_get("timestamp")?,
            rule_results: serde_json::from_str(&rule_results)?,
            typology_results: typology_results
                .map(|t| serde_json::from_str(&t))
                .transpose()?
                .unwrap_or_default(),
            metadata: serde_json::from_str::<EvaluationMetadata>(&metadata)?,
        })
    }

    async fn save_typology(&self, tenant_id: &str, typology: &Typology) -> RepositoryResult<()> {
        require_tenant(tenant_id)?;

        let rules = serde_json::to_string(&typology.rules)?;
        let now = Utc::now();

        sqlx::query(&rebind(queries::UPSERT_TYPOLOGY))
            .bind(&typology.id)
            .bind(tenant_id)
            .bind(&typology.name)
            .bind(&typology.description)
            .bind(&typology.version)
            .bind(rules)
            .bind(typology.alert_threshold)
            .bind(i32::from(typology.enabled))
            .bind(now)
            .bind(now)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn get_typology(&self, tenant_id: &str, typology_id: &str) -> RepositoryResult<Typology> {
        require_tenant(tenant_id)?;

        let row = sqlx::query(&rebind(queries::SELECT_TYPOLOGY))
            .bind(tenant_id)
            .bind(typology_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(RepositoryError::NotFound)?;

        typology_from_row(&row)
    }

    async fn list_typologies(&self, tenant_id: &str) -> RepositoryResult<Vec<Typology>> {
        require_tenant(tenant_id)?;

        let rows = sqlx::query(&rebind(queries::LIST_TYPOLOGIES))
            .bind(tenant_id)
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(typology_from_row).collect()
    }

    async fn delete_typology(&self, tenant_id: &str, typology_id: &str) -> RepositoryResult<()> {
        require_tenant(tenant_id)?;

        let result = sqlx::query(&rebind(queries::DISABLE_TYPOLOGY))
            .bind(Utc::now())
            .bind(tenant_id)
            .bind(typology_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    async fn ping(&self) -> RepositoryResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn close(&self) -> RepositoryResult<()> {
        self.pool.close().await;
        Ok(())
    }
}

fn rule_config_from_row(row: &sqlx::postgres::PgRow) -> RepositoryResult<RuleConfig> {
    let bands: String = row.try_get("bands")?;
    let description: Option<String> = row.try_get("description")?;
    let enabled: i32 = row.try_get("enabled")?;

    Ok(RuleConfig {
        id: row.try_get("id")?,
        tenant_id: row.try_get("tenant_id")?,
        name: row.try_get("name")?,
        description: description.unwrap_or_default(),
        version: row.try_get("version")?,
        expression: row.try_get("expression")?,
        bands: serde_json::from_str(&bands)?,
        weight: row.try_get("weight")?,
        enabled: enabled == 1,
    })
}

fn typology_from_row(row: &sqlx::postgres::PgRow) -> RepositoryResult<Typology> {
    let rules: String = row.try_get("rules")?;
    let description: Option<String> = row.try_get("description")?;
    let enabled: i32 = row.try_get("enabled")?;

    Ok(Typology {
        id: row.try_get("id")?,
        tenant_id: row.try_get("tenant_id")?,
        name: row.try_get("name")?,
        description: description.unwrap_or_default(),
        version: row.try_get("version")?,
        rules: serde_json::from_str(&rules)?,
        alert_threshold: row.try_get("alert_threshold")?,
        enabled: enabled == 1,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}
