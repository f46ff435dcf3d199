//! Evaluation mode

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Evaluation strategy.
///
/// - `Detection`: rules → weighted score → alert. Fast and simple, no
///   typologies required.
/// - `Compliance`: rules → typologies → alert. Auditable composite risk
///   patterns; refuses evaluations until typologies are loaded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EvaluationMode {
    #[default]
    Detection,
    Compliance,
}

impl fmt::Display for EvaluationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EvaluationMode::Detection => f.write_str("detection"),
            EvaluationMode::Compliance => f.write_str("compliance"),
        }
    }
}

impl FromStr for EvaluationMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "detection" => Ok(EvaluationMode::Detection),
            "compliance" => Ok(EvaluationMode::Compliance),
            other => Err(format!("unknown evaluation mode: {other}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse() {
        assert_eq!(
            "detection".parse::<EvaluationMode>().unwrap(),
            EvaluationMode::Detection
        );
        assert_eq!(
            "Compliance".parse::<EvaluationMode>().unwrap(),
            EvaluationMode::Compliance
        );
        assert!("strict".parse::<EvaluationMode>().is_err());
    }
}
