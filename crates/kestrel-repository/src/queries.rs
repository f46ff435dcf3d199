//! Shared SQL text
//!
//! Queries are written with `?` placeholders; the PostgreSQL backend rebinds
//! them to `$1..$n`. The SQL itself is dialect-neutral.

pub(crate) const INSERT_TRANSACTION: &str = r#"
INSERT INTO transactions (
    id, tenant_id, type, debtor_id, debtor_account_id,
    creditor_id, creditor_account_id, amount, currency,
    timestamp, created_at, metadata
) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
"#;

pub(crate) const SELECT_TRANSACTION: &str = r#"
SELECT id, tenant_id, type, debtor_id, debtor_account_id,
       creditor_id, creditor_account_id, amount, currency,
       timestamp, created_at, metadata
FROM transactions
WHERE tenant_id = ? AND id = ?
"#;

pub(crate) const COUNT_TRANSACTIONS_BY_ENTITY: &str = r#"
SELECT COUNT(*) FROM transactions
WHERE tenant_id = ?
  AND (debtor_id = ? OR creditor_id = ?)
  AND timestamp >= ?
"#;

pub(crate) const UPSERT_RULE_CONFIG: &str = r#"
INSERT INTO rule_configs (
    id, tenant_id, name, description, version, expression, bands, weight, enabled, created_at, updated_at
) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
ON CONFLICT(id, tenant_id, version) DO UPDATE SET
    name = excluded.name,
    description = excluded.description,
    expression = excluded.expression,
    bands = excluded.bands,
    weight = excluded.weight,
    enabled = excluded.enabled,
    updated_at = excluded.updated_at
"#;

pub(crate) const SELECT_RULE_CONFIG: &str = r#"
SELECT id, tenant_id, name, description, version, expression, bands, weight, enabled
FROM rule_configs
WHERE tenant_id = ? AND id = ? AND enabled = 1
ORDER BY version DESC
LIMIT 1
"#;

pub(crate) const LIST_RULE_CONFIGS: &str = r#"
SELECT id, tenant_id, name, description, version, expression, bands, weight, enabled
FROM rule_configs
WHERE tenant_id = ? AND enabled = 1
ORDER BY name
"#;

pub(crate) const INSERT_EVALUATION: &str = r#"
INSERT INTO evaluations (
    id, tenant_id, tx_id, status, score, timestamp,
    rule_results, typology_results, metadata
) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
"#;

pub(crate) const SELECT_EVALUATION: &str = r#"
SELECT id, tenant_id, tx_id, status, score, timestamp,
       rule_results, typology_results, metadata
FROM evaluations
WHERE tenant_id = ? AND id = ?
"#;

pub(crate) const UPSERT_TYPOLOGY: &str = r#"
INSERT INTO typologies (
    id, tenant_id, name, description, version, rules, alert_threshold, enabled, created_at, updated_at
) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
ON CONFLICT(id, tenant_id, version) DO UPDATE SET
    name = excluded.name,
    description = excluded.description,
    rules = excluded.rules,
    alert_threshold = excluded.alert_threshold,
    enabled = excluded.enabled,
    updated_at = excluded.updated_at
"#;

pub(crate) const SELECT_TYPOLOGY: &str = r#"
SELECT id, tenant_id, name, description, version, rules, alert_threshold, enabled, created_at, updated_at
FROM typologies
WHERE tenant_id = ? AND id = ? AND enabled = 1
ORDER BY version DESC
LIMIT 1
"#;

pub(crate) const LIST_TYPOLOGIES: &str = r#"
SELECT id, tenant_id, name, description, version, rules, alert_threshold, enabled, created_at, updated_at
FROM typologies
WHERE tenant_id = ? AND enabled = 1
ORDER BY name
"#;

pub(crate) const DISABLE_TYPOLOGY: &str = r#"
UPDATE typologies
SET enabled = 0, updated_at = ?
WHERE tenant_id = ? AND id = ?
"#;

/// Convert `?` placeholders to `$1..$n` for PostgreSQL.
pub(crate) fn rebind(query: &str) -> String {
    let mut result = String::with_capacity(query.len() + 8);
    let mut n = 1;

    for c in query.chars() {
        if c == '?' {
            result.push('$');
            result.push_str(&n.to_string());
            n += 1;
        } else {
            result.push(c);
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rebind_numbers_placeholders() {
        assert_eq!(
            rebind("SELECT * FROM t WHERE a = ? AND b = ?"),
            "SELECT * FROM t WHERE a = $1 AND b = $2"
        );
    }

    #[test]
    fn test_rebind_without_placeholders_is_identity() {
        assert_eq!(rebind("SELECT 1"), "SELECT 1");
    }
}
