//! The four dashboard resources, each bound to one scoring API call.
//!
//! Failures carry their [`RequestFailed`](crate::api::error::RequestFailed) message, which falls back
//! to the operation's description (`Failed to fetch news`, ...) when the error has no detail.

use crate::api::ScoringApi;
use crate::domain::{Company, CreditScore, NewsItem, ScoreHistoryPoint};
use crate::resource::RemoteResource;
use std::sync::Arc;

/// Company list. Keyless: mounted with `fetch(())`, reloaded with `refetch()`.
pub type CompaniesResource = RemoteResource<(), Vec<Company>>;
pub type CreditScoreResource = RemoteResource<String, Option<CreditScore>>;
pub type ScoreHistoryResource = RemoteResource<String, Vec<ScoreHistoryPoint>>;
pub type NewsResource = RemoteResource<String, Vec<NewsItem>>;

pub fn companies(api: Arc<dyn ScoringApi>) -> CompaniesResource {
    RemoteResource::new("companies", move |()| {
        let api = Arc::clone(&api);
        async move { api.fetch_companies().await }
    })
}

pub fn credit_score(api: Arc<dyn ScoringApi>) -> CreditScoreResource {
    RemoteResource::new("credit_score", move |ticker: String| {
        let api = Arc::clone(&api);
        async move { api.fetch_credit_score(&ticker).await.map(Some) }
    })
}

pub fn score_history(api: Arc<dyn ScoringApi>) -> ScoreHistoryResource {
    RemoteResource::new("score_history", move |ticker: String| {
        let api = Arc::clone(&api);
        async move { api.fetch_score_history(&ticker).await }
    })
}

pub fn news(api: Arc<dyn ScoringApi>) -> NewsResource {
    RemoteResource::new("news", move |ticker: String| {
        let api = Arc::clone(&api);
        async move { api.fetch_news(&ticker).await }
    })
}
