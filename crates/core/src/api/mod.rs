pub mod client;
pub mod error;
#[cfg(test)]
pub(crate) mod mock;

use crate::domain::{AddedCompany, Company, CreditScore, NewsItem, ScoreHistoryPoint};
use error::RequestFailed;

pub use client::HttpScoringClient;
pub use error::Operation;

pub type ApiResult<T> = Result<T, RequestFailed>;

/// The remote scoring/news backend. One call per method, no retries.
#[async_trait::async_trait]
pub trait ScoringApi: Send + Sync {
    async fn fetch_companies(&self) -> ApiResult<Vec<Company>>;

    async fn fetch_company(&self, ticker: &str) -> ApiResult<Company>;

    async fn fetch_credit_score(&self, ticker: &str) -> ApiResult<CreditScore>;

    async fn fetch_score_history(&self, ticker: &str) -> ApiResult<Vec<ScoreHistoryPoint>>;

    async fn fetch_news(&self, ticker: &str) -> ApiResult<Vec<NewsItem>>;

    async fn add_company(&self, ticker: &str) -> ApiResult<AddedCompany>;
}
