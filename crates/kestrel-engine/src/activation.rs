//! Evaluation activation
//!
//! The activation is the read-only variable environment an expression runs
//! against. Every declared schema variable is always present; values from
//! `additional_data` are merged last so callers can override defaults such as
//! `old_balance` / `new_balance`.

use crate::engine::EvaluateInput;
use kestrel_core::Value;
use std::collections::HashMap;

/// Variable environment for one evaluation, shared read-only across workers.
pub type Activation = HashMap<String, Value>;

/// Build the activation for a transaction.
pub fn build_activation(input: &EvaluateInput, velocity_count: i64) -> Activation {
    let mut tx = HashMap::new();
    tx.insert("id".to_string(), Value::from(input.tx_id.as_str()));
    tx.insert("type".to_string(), Value::from(input.tx_type.as_str()));
    tx.insert("debtor_id".to_string(), Value::from(input.debtor_id.as_str()));
    tx.insert(
        "creditor_id".to_string(),
        Value::from(input.creditor_id.as_str()),
    );
    tx.insert("amount".to_string(), Value::from(input.amount));
    tx.insert("currency".to_string(), Value::from(input.currency.as_str()));

    let mut activation = HashMap::new();
    activation.insert("tx".to_string(), Value::Object(tx));
    activation.insert(
        "velocity_count".to_string(),
        Value::from(velocity_count as f64),
    );
    activation.insert("amount".to_string(), Value::from(input.amount));
    activation.insert("currency".to_string(), Value::from(input.currency.as_str()));
    activation.insert("debtor_id".to_string(), Value::from(input.debtor_id.as_str()));
    activation.insert(
        "creditor_id".to_string(),
        Value::from(input.creditor_id.as_str()),
    );
    activation.insert("tx_type".to_string(), Value::from(input.tx_type.as_str()));
    activation.insert("old_balance".to_string(), Value::from(0.0));
    activation.insert("new_balance".to_string(), Value::from(0.0));

    // Merge additional data last so it can override the defaults above
    for (key, value) in &input.additional_data {
        activation.insert(key.clone(), Value::from_json(value.clone()));
    }

    activation
}
