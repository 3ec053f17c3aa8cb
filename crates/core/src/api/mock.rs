//! In-memory `ScoringApi` for unit tests.

use crate::api::error::{Operation, RequestFailed};
use crate::api::{ApiResult, ScoringApi};
use crate::domain::{AddedCompany, Company, CreditScore, NewsItem, ScoreHistoryPoint};
use std::collections::HashMap;
use std::sync::Mutex;
use tokio::sync::oneshot;

#[derive(Default)]
pub struct ScriptedApi {
    companies: Mutex<Vec<Company>>,
    failures: Mutex<HashMap<(Operation, String), RequestFailed>>,
    gates: Mutex<HashMap<(Operation, String), oneshot::Receiver<()>>>,
    calls: Mutex<Vec<(Operation, String)>>,
}

impl ScriptedApi {
    pub fn with_companies(tickers: &[&str]) -> Self {
        let api = Self::default();
        for ticker in tickers {
            api.insert_company(ticker);
        }
        api
    }

    fn insert_company(&self, ticker: &str) -> Company {
        let mut companies = self.companies.lock().unwrap();
        let company = Company {
            id: companies.len() as i64 + 1,
            name: format!("{ticker} Corp"),
            ticker: ticker.to_uppercase(),
        };
        companies.push(company.clone());
        company
    }

    /// Makes the next call for `(operation, ticker)` fail.
    pub fn fail(&self, operation: Operation, ticker: &str, detail: &str) {
        self.failures.lock().unwrap().insert(
            (operation, ticker.to_string()),
            RequestFailed::new(operation, detail).with_status(500),
        );
    }

    /// Holds the next call for `(operation, ticker)` until the returned sender fires.
    pub fn hold(&self, operation: Operation, ticker: &str) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.gates
            .lock()
            .unwrap()
            .insert((operation, ticker.to_string()), rx);
        tx
    }

    pub fn calls(&self) -> Vec<(Operation, String)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, operation: Operation) -> usize {
        self.calls().iter().filter(|(op, _)| *op == operation).count()
    }

    async fn enter(&self, operation: Operation, ticker: &str) -> ApiResult<()> {
        let key = (operation, ticker.to_string());
        self.calls.lock().unwrap().push(key.clone());
        let gate = self.gates.lock().unwrap().remove(&key);
        if let Some(gate) = gate {
            let _ = gate.await;
        }
        match self.failures.lock().unwrap().remove(&key) {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

#[async_trait::async_trait]
impl ScoringApi for ScriptedApi {
    async fn fetch_companies(&self) -> ApiResult<Vec<Company>> {
        self.enter(Operation::FetchCompanies, "").await?;
        Ok(self.companies.lock().unwrap().clone())
    }

    async fn fetch_company(&self, ticker: &str) -> ApiResult<Company> {
        self.enter(Operation::FetchCompany, ticker).await?;
        self.companies
            .lock()
            .unwrap()
            .iter()
            .find(|c| c.ticker_matches(ticker))
            .cloned()
            .ok_or_else(|| RequestFailed::new(Operation::FetchCompany, "HTTP 404").with_status(404))
    }

    async fn fetch_credit_score(&self, ticker: &str) -> ApiResult<CreditScore> {
        self.enter(Operation::FetchCreditScore, ticker).await?;
        Ok(CreditScore {
            score: 700,
            explanation: format!("{ticker} explanation"),
            feature_contributions: [("net_margin".to_string(), 10.0)].into_iter().collect(),
            html_summary: None,
        })
    }

    async fn fetch_score_history(&self, ticker: &str) -> ApiResult<Vec<ScoreHistoryPoint>> {
        self.enter(Operation::FetchScoreHistory, ticker).await?;
        Ok(vec![ScoreHistoryPoint {
            date: "2026-09-01".to_string(),
            score: 690,
            explanation: format!("{ticker} history"),
        }])
    }

    async fn fetch_news(&self, ticker: &str) -> ApiResult<Vec<NewsItem>> {
        self.enter(Operation::FetchNews, ticker).await?;
        Ok(vec![NewsItem {
            date: "2026-10-01".to_string(),
            title: format!("{ticker} headline"),
            sentiment: "positive".to_string(),
            url: format!("https://news.example.com/{ticker}"),
        }])
    }

    async fn add_company(&self, ticker: &str) -> ApiResult<AddedCompany> {
        self.enter(Operation::AddCompany, ticker).await?;
        let company = self.insert_company(ticker);
        Ok(AddedCompany {
            id: company.id,
            name: Some(company.name),
            ticker: Some(company.ticker),
            message: Some("Company created and scored".to_string()),
            score: None,
            explanation: None,
            feature_contributions: None,
        })
    }
}
