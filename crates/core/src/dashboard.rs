//! Dashboard controller: the selected company, the add-company dialog, and the
//! fan-out of the selected ticker to the score, history and news resources.

use crate::api::{ApiResult, Operation, ScoringApi};
use crate::domain::{AddedCompany, Company, CreditScore, NewsItem, ScoreHistoryPoint};
use crate::hooks::{self, CompaniesResource, CreditScoreResource, NewsResource, ScoreHistoryResource};
use crate::resource::{FetchHandle, FetchOutcome, ResourceState};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::sync::watch;
use tokio::task::JoinHandle;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddCompanyDialog {
    pub open: bool,
    pub entry: String,
    pub adding: bool,
    pub error: Option<String>,
}

impl AddCompanyDialog {
    pub fn can_submit(&self) -> bool {
        !self.adding && !self.entry.trim().is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum AddCompanyOutcome {
    /// Nothing to submit (empty entry, or a request already in flight).
    Skipped,
    Added {
        added: AddedCompany,
        selected: Option<Company>,
    },
    Failed(String),
}

/// Everything the views need for one frame.
#[derive(Debug, Clone)]
pub struct DashboardSnapshot {
    pub companies: ResourceState<(), Vec<Company>>,
    pub score: ResourceState<String, Option<CreditScore>>,
    pub history: ResourceState<String, Vec<ScoreHistoryPoint>>,
    pub news: ResourceState<String, Vec<NewsItem>>,
    pub selected: Option<Company>,
    pub search: String,
    pub dialog: AddCompanyDialog,
}

impl DashboardSnapshot {
    pub fn is_loading(&self) -> bool {
        self.companies.loading || self.score.loading || self.history.loading || self.news.loading
    }
}

/// Output of a [`PendingAdd`].
#[derive(Debug)]
pub struct AddCompleted {
    pub ticker: String,
    pub result: Result<AddedCompany, String>,
}

/// An add-company request running on its own task.
#[derive(Debug)]
pub struct PendingAdd {
    ticker: String,
    task: JoinHandle<ApiResult<AddedCompany>>,
}

impl PendingAdd {
    pub fn ticker(&self) -> &str {
        &self.ticker
    }
}

impl Future for PendingAdd {
    type Output = AddCompleted;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<AddCompleted> {
        let this = &mut *self;
        Pin::new(&mut this.task).poll(cx).map(|joined| {
            let result = match joined {
                Ok(result) => result.map_err(|err| err.to_string()),
                Err(_) => Err(Operation::AddCompany.description().to_string()),
            };
            AddCompleted {
                ticker: this.ticker.clone(),
                result,
            }
        })
    }
}

/// Dropping a pending add cancels the request.
impl Drop for PendingAdd {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Waits for any of the dashboard's resources to publish a new state.
pub struct DashboardWatch {
    companies: watch::Receiver<ResourceState<(), Vec<Company>>>,
    score: watch::Receiver<ResourceState<String, Option<CreditScore>>>,
    history: watch::Receiver<ResourceState<String, Vec<ScoreHistoryPoint>>>,
    news: watch::Receiver<ResourceState<String, Vec<NewsItem>>>,
}

impl DashboardWatch {
    /// Returns `false` once the dashboard has been dropped.
    pub async fn changed(&mut self) -> bool {
        let res = tokio::select! {
            r = self.companies.changed() => r,
            r = self.score.changed() => r,
            r = self.history.changed() => r,
            r = self.news.changed() => r,
        };
        res.is_ok()
    }

    /// Marks every current state as seen.
    pub fn mark_seen(&mut self) {
        self.companies.borrow_and_update();
        self.score.borrow_and_update();
        self.history.borrow_and_update();
        self.news.borrow_and_update();
    }
}

pub struct Dashboard {
    api: Arc<dyn ScoringApi>,
    companies: CompaniesResource,
    score: CreditScoreResource,
    history: ScoreHistoryResource,
    news: NewsResource,
    selected: Option<Company>,
    search: String,
    dialog: AddCompanyDialog,
}

impl Dashboard {
    pub fn new(api: Arc<dyn ScoringApi>) -> Self {
        Self {
            companies: hooks::companies(Arc::clone(&api)),
            score: hooks::credit_score(Arc::clone(&api)),
            history: hooks::score_history(Arc::clone(&api)),
            news: hooks::news(Arc::clone(&api)),
            api,
            selected: None,
            search: String::new(),
            dialog: AddCompanyDialog::default(),
        }
    }

    /// Initial company list fetch.
    pub fn mount(&self) -> FetchHandle {
        self.companies.fetch(())
    }

    pub fn companies(&self) -> Vec<Company> {
        self.companies.snapshot().data
    }

    pub fn selected(&self) -> Option<&Company> {
        self.selected.as_ref()
    }

    /// Selects `company` and re-keys the per-company resources on its ticker.
    /// Re-selecting the current ticker fetches nothing.
    pub fn select_company(&mut self, company: Company) -> Vec<FetchHandle> {
        let ticker = company.ticker.clone();
        tracing::info!(%ticker, name = %company.name, "company selected");
        self.selected = Some(company);
        self.fan_out(Some(ticker))
    }

    /// Selects the listed company whose ticker matches case-insensitively.
    /// Returns `None` and keeps the selection when there is no such company.
    pub fn select_ticker(&mut self, ticker: &str) -> Option<Vec<FetchHandle>> {
        let company = self
            .companies
            .snapshot()
            .data
            .into_iter()
            .find(|c| c.ticker_matches(ticker))?;
        Some(self.select_company(company))
    }

    /// Drops the selection. Resources keep their last state and fetch nothing.
    pub fn clear_selection(&mut self) {
        self.selected = None;
        self.fan_out(None);
    }

    fn fan_out(&self, ticker: Option<String>) -> Vec<FetchHandle> {
        [
            self.score.set_key(ticker.clone()),
            self.history.set_key(ticker.clone()),
            self.news.set_key(ticker),
        ]
        .into_iter()
        .flatten()
        .collect()
    }

    /// Refetches the company list and, if a company is selected, its resources.
    pub fn refresh(&self) -> Vec<FetchHandle> {
        let mut handles = vec![self.companies.fetch(())];
        if self.selected.is_some() {
            handles.extend(
                [self.score.refetch(), self.history.refetch(), self.news.refetch()]
                    .into_iter()
                    .flatten(),
            );
        }
        handles
    }

    pub fn search(&self) -> &str {
        &self.search
    }

    pub fn set_search(&mut self, term: impl Into<String>) {
        self.search = term.into();
    }

    pub fn dialog(&self) -> &AddCompanyDialog {
        &self.dialog
    }

    pub fn open_dialog(&mut self) {
        self.dialog.open = true;
    }

    pub fn close_dialog(&mut self) {
        self.dialog.open = false;
    }

    pub fn set_entry(&mut self, text: impl Into<String>) {
        self.dialog.entry = text.into();
    }

    /// Starts submitting the dialog's ticker entry in the background.
    ///
    /// Returns `None` when there is nothing to submit (empty entry, or a request already in
    /// flight). The task calls the backend and, on success, refetches the company list; hand its
    /// output to [`Dashboard::finish_add`].
    pub fn start_add(&mut self) -> Option<PendingAdd> {
        if !self.dialog.can_submit() {
            return None;
        }
        let ticker = self.dialog.entry.trim().to_string();
        self.dialog.adding = true;
        self.dialog.error = None;

        let api = Arc::clone(&self.api);
        let companies = self.companies.clone();
        let requested = ticker.clone();
        let task = tokio::spawn(async move {
            let added = api.add_company(&requested).await?;
            if companies.fetch(()).finished().await != FetchOutcome::Applied {
                tracing::warn!(ticker = %requested, "company list refetch after add did not apply");
            }
            Ok(added)
        });
        Some(PendingAdd { ticker, task })
    }

    /// Applies a finished add: on success closes and clears the dialog and selects the new
    /// company if the refreshed list contains its ticker; on failure keeps the message on the
    /// dialog, which stays open.
    pub fn finish_add(&mut self, done: AddCompleted) -> AddCompanyOutcome {
        self.dialog.adding = false;
        let AddCompleted { ticker, result } = done;
        match result {
            Ok(added) => {
                self.dialog.open = false;
                self.dialog.entry.clear();

                let selected = match self.select_ticker(&ticker) {
                    Some(_) => self.selected.clone(),
                    None => {
                        tracing::debug!(%ticker, "added company not in refreshed list; selection unchanged");
                        None
                    }
                };
                AddCompanyOutcome::Added { added, selected }
            }
            Err(message) => {
                tracing::warn!(%ticker, error = %message, "add company failed");
                self.dialog.error = Some(message.clone());
                AddCompanyOutcome::Failed(message)
            }
        }
    }

    /// Submits the dialog's ticker entry and waits for the outcome.
    pub async fn add_company(&mut self) -> AddCompanyOutcome {
        match self.start_add() {
            Some(pending) => {
                let done = pending.await;
                self.finish_add(done)
            }
            None => AddCompanyOutcome::Skipped,
        }
    }

    pub fn snapshot(&self) -> DashboardSnapshot {
        DashboardSnapshot {
            companies: self.companies.snapshot(),
            score: self.score.snapshot(),
            history: self.history.snapshot(),
            news: self.news.snapshot(),
            selected: self.selected.clone(),
            search: self.search.clone(),
            dialog: self.dialog.clone(),
        }
    }

    /// Resolves once no resource is loading.
    pub async fn settle(&self) {
        let mut watch = self.watch();
        loop {
            watch.mark_seen();
            if !self.snapshot().is_loading() {
                return;
            }
            if !watch.changed().await {
                return;
            }
        }
    }

    pub fn watch(&self) -> DashboardWatch {
        DashboardWatch {
            companies: self.companies.subscribe(),
            score: self.score.subscribe(),
            history: self.history.subscribe(),
            news: self.news.subscribe(),
        }
    }
}

/// Awaits every handle, in order.
pub async fn wait_all(handles: Vec<FetchHandle>) -> Vec<FetchOutcome> {
    let mut out = Vec::with_capacity(handles.len());
    for handle in handles {
        out.push(handle.finished().await);
    }
    out
}
