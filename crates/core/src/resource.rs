//! A remote value fetched on demand and published through a `watch` channel.
//!
//! Every fetch bumps the resource's generation. A response only lands if its
//! generation is still the latest, so a slow reply for an old key (or an older
//! refetch) can never overwrite newer state.

use crate::api::ApiResult;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;

type FetchFuture<T> = Pin<Box<dyn Future<Output = ApiResult<T>> + Send + 'static>>;
type Fetcher<K, T> = Arc<dyn Fn(K) -> FetchFuture<T> + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Loading,
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResourceState<K, T> {
    pub phase: Phase,
    /// Key of the most recent fetch.
    pub key: Option<K>,
    /// Last successfully fetched value. Survives failures and in-flight fetches.
    pub data: T,
    /// Key `data` was fetched for.
    pub data_key: Option<K>,
    pub loading: bool,
    pub error: Option<String>,
    pub generation: u64,
}

impl<K, T: Default> Default for ResourceState<K, T> {
    fn default() -> Self {
        Self {
            phase: Phase::Idle,
            key: None,
            data: T::default(),
            data_key: None,
            loading: false,
            error: None,
            generation: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    Applied,
    Failed,
    /// A newer fetch was started before this one completed; its result was dropped.
    Stale,
    /// The fetch task panicked or was aborted.
    Aborted,
}

/// Completion handle for one fetch. Dropping it does not cancel the fetch.
#[derive(Debug)]
pub struct FetchHandle {
    generation: u64,
    task: JoinHandle<FetchOutcome>,
}

impl FetchHandle {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub async fn finished(self) -> FetchOutcome {
        self.task.await.unwrap_or(FetchOutcome::Aborted)
    }
}

pub struct RemoteResource<K, T> {
    name: &'static str,
    fetcher: Fetcher<K, T>,
    state: Arc<watch::Sender<ResourceState<K, T>>>,
}

/// Clones share the fetcher and the published state.
impl<K, T> Clone for RemoteResource<K, T> {
    fn clone(&self) -> Self {
        Self {
            name: self.name,
            fetcher: Arc::clone(&self.fetcher),
            state: Arc::clone(&self.state),
        }
    }
}

impl<K, T> fmt::Debug for RemoteResource<K, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteResource")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

impl<K, T> RemoteResource<K, T>
where
    K: Clone + PartialEq + fmt::Debug + Send + Sync + 'static,
    T: Clone + Default + Send + Sync + 'static,
{
    pub fn new<F, Fut>(name: &'static str, fetch: F) -> Self
    where
        F: Fn(K) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ApiResult<T>> + Send + 'static,
    {
        let fetcher: Fetcher<K, T> = Arc::new(move |key| Box::pin(fetch(key)));
        let (tx, _rx) = watch::channel(ResourceState::default());
        Self {
            name,
            fetcher,
            state: Arc::new(tx),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn snapshot(&self) -> ResourceState<K, T> {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<ResourceState<K, T>> {
        self.state.subscribe()
    }

    pub fn current_key(&self) -> Option<K> {
        self.state.borrow().key.clone()
    }

    /// Switches the resource to `key`.
    ///
    /// `None` never fetches: it forgets the current key and leaves data, phase and
    /// error in place. A key equal to the current one is a no-op. Any other key
    /// starts exactly one fetch.
    pub fn set_key(&self, key: Option<K>) -> Option<FetchHandle> {
        let Some(key) = key else {
            self.state.send_if_modified(|s| s.key.take().is_some());
            return None;
        };
        if self.state.borrow().key.as_ref() == Some(&key) {
            return None;
        }
        Some(self.fetch(key))
    }

    /// Fetches the current key again, if there is one.
    pub fn refetch(&self) -> Option<FetchHandle> {
        let key = self.current_key()?;
        Some(self.fetch(key))
    }

    /// Unconditionally starts a fetch for `key`. Must be called inside a tokio runtime.
    pub fn fetch(&self, key: K) -> FetchHandle {
        let mut generation = 0;
        self.state.send_modify(|s| {
            s.generation += 1;
            generation = s.generation;
            s.phase = Phase::Loading;
            s.loading = true;
            s.error = None;
            s.key = Some(key.clone());
        });
        tracing::debug!(resource = self.name, generation, ?key, "fetch started");

        let fut = (self.fetcher)(key.clone());
        let state = Arc::clone(&self.state);
        let name = self.name;

        let task = tokio::spawn(async move {
            let result = fut.await;
            let mut outcome = FetchOutcome::Stale;
            state.send_if_modified(|s| {
                if s.generation != generation {
                    return false;
                }
                s.loading = false;
                match result {
                    Ok(data) => {
                        s.phase = Phase::Success;
                        s.data = data;
                        s.data_key = Some(key.clone());
                        s.error = None;
                        outcome = FetchOutcome::Applied;
                    }
                    Err(err) => {
                        let message = err.to_string();
                        tracing::warn!(resource = name, generation, ?key, error = %message, "fetch failed");
                        s.phase = Phase::Error;
                        s.error = Some(message);
                        outcome = FetchOutcome::Failed;
                    }
                }
                true
            });

            if outcome == FetchOutcome::Stale {
                tracing::debug!(resource = name, generation, ?key, "dropping stale response");
            }
            outcome
        });

        FetchHandle { generation, task }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::error::{Operation, RequestFailed};
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use tokio::sync::oneshot;

    type Gates = Arc<Mutex<HashMap<String, oneshot::Receiver<ApiResult<String>>>>>;

    /// A resource whose responses are released by hand, per key.
    fn gated() -> (
        RemoteResource<String, String>,
        Gates,
        Arc<AtomicUsize>,
    ) {
        let gates: Gates = Arc::new(Mutex::new(HashMap::new()));
        let calls = Arc::new(AtomicUsize::new(0));
        let (g, c) = (Arc::clone(&gates), Arc::clone(&calls));
        let resource = RemoteResource::new("test", move |key: String| {
            c.fetch_add(1, Ordering::SeqCst);
            let rx = g.lock().unwrap().remove(&key);
            async move {
                match rx {
                    Some(rx) => rx.await.unwrap_or_else(|_| {
                        Err(RequestFailed::new(Operation::FetchNews, "gate dropped"))
                    }),
                    None => Ok(format!("data:{key}")),
                }
            }
        });
        (resource, gates, calls)
    }

    fn gate(gates: &Gates, key: &str) -> oneshot::Sender<ApiResult<String>> {
        let (tx, rx) = oneshot::channel();
        gates.lock().unwrap().insert(key.to_string(), rx);
        tx
    }

    #[tokio::test]
    async fn starts_idle_with_default_data() {
        let (r, _, calls) = gated();
        let s = r.snapshot();
        assert_eq!(s.phase, Phase::Idle);
        assert!(!s.loading);
        assert!(s.data.is_empty());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn loading_then_success() {
        let (r, gates, _) = gated();
        let tx = gate(&gates, "AAPL");

        let h = r.set_key(Some("AAPL".to_string())).unwrap();
        let s = r.snapshot();
        assert_eq!(s.phase, Phase::Loading);
        assert!(s.loading);

        tx.send(Ok("score".to_string())).unwrap();
        assert_eq!(h.finished().await, FetchOutcome::Applied);

        let s = r.snapshot();
        assert_eq!(s.phase, Phase::Success);
        assert!(!s.loading);
        assert_eq!(s.data, "score");
        assert_eq!(s.data_key.as_deref(), Some("AAPL"));
    }

    #[tokio::test]
    async fn failure_keeps_previous_data() {
        let (r, gates, _) = gated();
        r.set_key(Some("AAPL".to_string()))
            .unwrap()
            .finished()
            .await;

        let tx = gate(&gates, "MSFT");
        let h = r.set_key(Some("MSFT".to_string())).unwrap();
        tx.send(Err(RequestFailed::new(Operation::FetchNews, "HTTP 500")))
            .unwrap();
        assert_eq!(h.finished().await, FetchOutcome::Failed);

        let s = r.snapshot();
        assert_eq!(s.phase, Phase::Error);
        assert_eq!(s.error.as_deref(), Some("Failed to fetch news: HTTP 500"));
        assert_eq!(s.data, "data:AAPL");
        assert_eq!(s.data_key.as_deref(), Some("AAPL"));
        assert_eq!(s.key.as_deref(), Some("MSFT"));
    }

    #[tokio::test]
    async fn blank_failure_stores_operation_description() {
        let (r, gates, _) = gated();
        let tx = gate(&gates, "AAPL");
        let h = r.set_key(Some("AAPL".to_string())).unwrap();
        tx.send(Err(RequestFailed::new(Operation::FetchNews, "  "))).unwrap();
        assert_eq!(h.finished().await, FetchOutcome::Failed);
        assert_eq!(r.snapshot().error.as_deref(), Some("Failed to fetch news"));
    }

    #[tokio::test]
    async fn clones_share_state() {
        let (r, _, calls) = gated();
        let other = r.clone();
        other.fetch("AAPL".to_string()).finished().await;
        assert_eq!(r.snapshot().data, "data:AAPL");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn none_key_and_same_key_do_not_fetch() {
        let (r, _, calls) = gated();
        assert!(r.set_key(None).is_none());
        assert_eq!(r.snapshot().phase, Phase::Idle);

        r.set_key(Some("AAPL".to_string()))
            .unwrap()
            .finished()
            .await;
        assert!(r.set_key(Some("AAPL".to_string())).is_none());
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        assert!(r.set_key(None).is_none());
        let s = r.snapshot();
        assert_eq!(s.phase, Phase::Success);
        assert_eq!(s.data, "data:AAPL");
        assert!(s.key.is_none());
        assert!(r.refetch().is_none());

        // Coming back from no selection counts as a key change.
        r.set_key(Some("AAPL".to_string()))
            .unwrap()
            .finished()
            .await;
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn late_response_for_previous_key_is_dropped() {
        let (r, gates, _) = gated();
        let slow_a = gate(&gates, "A");
        let fast_b = gate(&gates, "B");

        let a = r.set_key(Some("A".to_string())).unwrap();
        let b = r.set_key(Some("B".to_string())).unwrap();
        assert!(b.generation() > a.generation());

        fast_b.send(Ok("from B".to_string())).unwrap();
        assert_eq!(b.finished().await, FetchOutcome::Applied);

        slow_a.send(Ok("from A".to_string())).unwrap();
        assert_eq!(a.finished().await, FetchOutcome::Stale);

        let s = r.snapshot();
        assert_eq!(s.phase, Phase::Success);
        assert_eq!(s.data, "from B");
        assert_eq!(s.data_key.as_deref(), Some("B"));
    }

    #[tokio::test]
    async fn late_failure_for_previous_key_does_not_mark_error() {
        let (r, gates, _) = gated();
        let slow_a = gate(&gates, "A");

        let a = r.set_key(Some("A".to_string())).unwrap();
        r.set_key(Some("B".to_string()))
            .unwrap()
            .finished()
            .await;

        slow_a
            .send(Err(RequestFailed::new(Operation::FetchNews, "boom")))
            .unwrap();
        assert_eq!(a.finished().await, FetchOutcome::Stale);

        let s = r.snapshot();
        assert_eq!(s.phase, Phase::Success);
        assert!(s.error.is_none());
    }

    #[tokio::test]
    async fn refetch_reissues_current_key() {
        let (r, _, calls) = gated();
        assert!(r.refetch().is_none());

        r.set_key(Some("AAPL".to_string()))
            .unwrap()
            .finished()
            .await;
        let h = r.refetch().unwrap();
        assert_eq!(h.finished().await, FetchOutcome::Applied);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn subscribers_see_loading_and_result() {
        let (r, gates, _) = gated();
        let mut rx = r.subscribe();
        let tx = gate(&gates, "AAPL");

        let h = r.set_key(Some("AAPL".to_string())).unwrap();
        rx.changed().await.unwrap();
        assert!(rx.borrow_and_update().loading);

        tx.send(Ok("x".to_string())).unwrap();
        h.finished().await;
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow_and_update().phase, Phase::Success);
    }
}
