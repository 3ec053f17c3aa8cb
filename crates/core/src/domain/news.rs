use serde::{Deserialize, Serialize};

/// A news headline with its sentiment tag.
///
/// `sentiment` stays a raw string: the backend is expected to send
/// `positive`/`negative`/`neutral`, but anything else must still render
/// (see [`crate::present::Sentiment::parse`]).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewsItem {
    pub date: String,
    pub title: String,
    #[serde(default)]
    pub sentiment: String,
    #[serde(default)]
    pub url: String,
}
