use super::score::Contributions;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Company {
    pub id: i64,
    pub name: String,
    pub ticker: String,
}

impl Company {
    pub fn ticker_matches(&self, ticker: &str) -> bool {
        self.ticker.eq_ignore_ascii_case(ticker.trim())
    }

    /// Case-insensitive substring match on name or ticker. An empty term matches everything.
    pub fn matches_search(&self, term: &str) -> bool {
        let term = term.trim().to_lowercase();
        term.is_empty()
            || self.name.to_lowercase().contains(&term)
            || self.ticker.to_lowercase().contains(&term)
    }
}

/// Body of `POST /add_company/{ticker}`.
///
/// The backend answers with either a company row or a `{message, id, score, ...}` summary of
/// the freshly scored company, so only `id` is required.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddedCompany {
    pub id: i64,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub ticker: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub score: Option<i32>,
    #[serde(default)]
    pub explanation: Option<String>,
    #[serde(default)]
    pub feature_contributions: Option<Contributions>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn company(name: &str, ticker: &str) -> Company {
        Company {
            id: 1,
            name: name.to_string(),
            ticker: ticker.to_string(),
        }
    }

    #[test]
    fn search_matches_name_or_ticker_ignoring_case() {
        let c = company("Apple Inc.", "AAPL");
        assert!(c.matches_search("apple"));
        assert!(c.matches_search("aap"));
        assert!(c.matches_search(""));
        assert!(!c.matches_search("msft"));
    }

    #[test]
    fn ticker_match_ignores_case_and_whitespace() {
        let c = company("Apple Inc.", "AAPL");
        assert!(c.ticker_matches(" aapl "));
        assert!(!c.ticker_matches("AAP"));
    }

    #[test]
    fn added_company_accepts_summary_shape() {
        let v = json!({
            "message": "Company created and scored",
            "id": 7,
            "score": 712,
            "explanation": "Solid liquidity.",
            "feature_contributions": {"debt_to_equity": -12.5, "current_ratio": 20.0}
        });
        let added: AddedCompany = serde_json::from_value(v).unwrap();
        assert_eq!(added.id, 7);
        assert_eq!(added.score, Some(712));
        assert!(added.ticker.is_none());
        assert_eq!(
            added
                .feature_contributions
                .unwrap()
                .get("current_ratio")
                .copied(),
            Some(20.0)
        );
    }

    #[test]
    fn added_company_accepts_existing_company_shape() {
        let v = json!({"message": "Company already exists", "id": 3});
        let added: AddedCompany = serde_json::from_value(v).unwrap();
        assert_eq!(added.id, 3);
        assert_eq!(added.message.as_deref(), Some("Company already exists"));
    }
}
