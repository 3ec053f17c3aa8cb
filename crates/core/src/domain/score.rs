use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Feature name to signed contribution, in the order the backend sent them.
pub type Contributions = IndexMap<String, f64>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreditScore {
    pub score: i32,
    pub explanation: String,
    #[serde(default)]
    pub feature_contributions: Contributions,
    #[serde(default)]
    pub html_summary: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreHistoryPoint {
    pub date: String,
    pub score: i32,
    #[serde(default)]
    pub explanation: String,
}
