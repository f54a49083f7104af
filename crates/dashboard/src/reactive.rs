//! Observable query state driven by explicit signal subscriptions.
//!
//! Signals are `tokio::sync::watch` receivers. A query derives an optional key
//! from its input signal: `None` disables the query, `Some(key)` enables it and
//! the query runs once per distinct key. Consumers observe the query through a
//! watch receiver of [`QueryState`].

use {
    serde::Serialize,
    std::{future::Future, sync::Arc},
    tokio::{
        sync::{Notify, watch},
        task::JoinHandle,
    },
};

/// The data/loading/error triad of a query.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "status", content = "data", rename_all = "camelCase")]
pub enum QueryState<T> {
    /// The enablement condition does not hold; nothing was requested.
    Disabled,
    Loading,
    Success(T),
    Error(String),
}

impl<T> QueryState<T> {
    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    /// Whether the last execution finished, successfully or not.
    pub fn is_settled(&self) -> bool {
        matches!(self, Self::Success(_) | Self::Error(_))
    }

    pub fn data(&self) -> Option<&T> {
        match self {
            Self::Success(data) => Some(data),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Error(err) => Some(err),
            _ => None,
        }
    }
}

/// Handle to a running query. Dropping it stops the query.
pub struct QueryHandle<T> {
    state: watch::Receiver<QueryState<T>>,
    refetch: Arc<Notify>,
    task: JoinHandle<()>,
}

impl<T: Clone> QueryHandle<T> {
    /// Current state of the query.
    pub fn state(&self) -> QueryState<T> {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<QueryState<T>> {
        self.state.clone()
    }

    /// Re-runs the query for the current key, if it is enabled.
    pub fn refetch(&self) {
        self.refetch.notify_one();
    }

    /// Waits until the query has finished an execution and returns the
    /// resulting state.
    pub async fn settled(&mut self) -> QueryState<T> {
        let settled = self
            .state
            .wait_for(QueryState::is_settled)
            .await
            .map(|state| state.clone());
        settled.unwrap_or_else(|_| self.state.borrow().clone())
    }
}

impl<T> Drop for QueryHandle<T> {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Spawns a task that executes `fetch` whenever the key derived from `inputs`
/// changes to a new enabled value.
///
/// In-flight executions are not cancelled. If the inputs change while an
/// execution is running, its result is discarded and the query runs again for
/// the new key.
pub fn spawn_query<I, K, T, E, F, Fut>(
    name: &'static str,
    mut inputs: watch::Receiver<I>,
    enabled_key: E,
    fetch: F,
) -> QueryHandle<T>
where
    I: Send + Sync + 'static,
    K: Clone + PartialEq + Send + Sync + 'static,
    T: Clone + Send + Sync + 'static,
    E: Fn(&I) -> Option<K> + Send + 'static,
    F: Fn(K) -> Fut + Send + 'static,
    Fut: Future<Output = anyhow::Result<T>> + Send + 'static,
{
    let (sender, state) = watch::channel(QueryState::Disabled);
    let refetch = Arc::new(Notify::new());

    let task = tokio::spawn({
        let refetch = refetch.clone();
        async move {
            let mut executed: Option<K> = None;
            loop {
                let key = enabled_key(&inputs.borrow_and_update());
                match key {
                    None => {
                        executed = None;
                        sender.send_if_modified(|state| {
                            let modified = !matches!(state, QueryState::Disabled);
                            *state = QueryState::Disabled;
                            modified
                        });
                    }
                    Some(key) if executed.as_ref() != Some(&key) => {
                        tracing::debug!(query = name, "executing query");
                        sender.send_replace(QueryState::Loading);
                        let result = fetch(key.clone()).await;

                        if enabled_key(&inputs.borrow()).as_ref() != Some(&key) {
                            tracing::debug!(query = name, "discarding stale query result");
                            executed = None;
                            continue;
                        }

                        executed = Some(key);
                        sender.send_replace(match result {
                            Ok(data) => QueryState::Success(data),
                            Err(err) => {
                                tracing::warn!(query = name, ?err, "query failed");
                                QueryState::Error(format!("{err:#}"))
                            }
                        });
                    }
                    Some(_) => (),
                }

                tokio::select! {
                    changed = inputs.changed() => {
                        if changed.is_err() {
                            tracing::debug!(query = name, "input signal closed");
                            break;
                        }
                    }
                    _ = refetch.notified() => executed = None,
                }
            }
        }
    });

    QueryHandle {
        state,
        refetch,
        task,
    }
}

/// Derives a signal holding the latest values of two signals.
pub fn combine<A, B>(
    mut a: watch::Receiver<A>,
    mut b: watch::Receiver<B>,
) -> watch::Receiver<(A, B)>
where
    A: Clone + Send + Sync + 'static,
    B: Clone + Send + Sync + 'static,
{
    let initial = (a.borrow_and_update().clone(), b.borrow_and_update().clone());
    let (sender, receiver) = watch::channel(initial);

    tokio::spawn(async move {
        loop {
            tokio::select! {
                changed = a.changed() => if changed.is_err() { break },
                changed = b.changed() => if changed.is_err() { break },
                _ = sender.closed() => break,
            }
            let combined = (a.borrow_and_update().clone(), b.borrow_and_update().clone());
            if sender.send(combined).is_err() {
                break;
            }
        }
    });

    receiver
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        std::{
            sync::{
                Mutex,
                atomic::{AtomicUsize, Ordering},
            },
            time::Duration,
        },
    };

    fn counting_query(
        inputs: watch::Receiver<Option<u32>>,
        calls: Arc<AtomicUsize>,
    ) -> QueryHandle<u32> {
        spawn_query("test", inputs, |input: &Option<u32>| *input, move |key| {
            let calls = calls.clone();
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                anyhow::ensure!(key != 0, "zero is not allowed");
                Ok(key * 2)
            }
        })
    }

    #[tokio::test]
    async fn runs_once_per_enabled_key() {
        let (inputs, receiver) = watch::channel(None);
        let calls = Arc::new(AtomicUsize::new(0));
        let mut query = counting_query(receiver, calls.clone());

        tokio::task::yield_now().await;
        assert_eq!(query.state(), QueryState::Disabled);
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        inputs.send_replace(Some(21));
        assert_eq!(query.settled().await, QueryState::Success(42));

        // Same key again does not refetch.
        inputs.send_replace(Some(21));
        tokio::task::yield_now().await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        inputs.send_replace(None);
        let mut state = query.subscribe();
        state.wait_for(|state| *state == QueryState::Disabled).await.unwrap();

        inputs.send_replace(Some(21));
        assert_eq!(query.settled().await, QueryState::Success(42));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn errors_are_surfaced_and_can_be_refetched() {
        let (_inputs, receiver) = watch::channel(Some(0));
        let calls = Arc::new(AtomicUsize::new(0));
        let mut query = counting_query(receiver, calls.clone());

        assert_eq!(
            query.settled().await,
            QueryState::Error("zero is not allowed".to_string())
        );

        let mut state = query.subscribe();
        state.mark_unchanged();
        query.refetch();
        state.changed().await.unwrap();
        state.wait_for(QueryState::is_settled).await.unwrap();
        assert!(query.state().error().is_some());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn discards_results_for_outdated_keys() {
        let (inputs, receiver) = watch::channel(Some(1_u32));
        let calls = Arc::new(Mutex::new(Vec::new()));
        let query = spawn_query("test", receiver, |input: &Option<u32>| *input, {
            let calls = calls.clone();
            move |key| {
                calls.lock().unwrap().push(key);
                async move {
                    tokio::time::sleep(Duration::from_secs(1)).await;
                    anyhow::Ok(key)
                }
            }
        });

        let mut state = query.subscribe();
        state.wait_for(QueryState::is_loading).await.unwrap();
        inputs.send_replace(Some(2));

        let mut published = Vec::new();
        loop {
            state.changed().await.unwrap();
            let current = state.borrow_and_update().clone();
            published.push(current.clone());
            if current.is_settled() {
                break;
            }
        }

        assert!(!published.contains(&QueryState::Success(1)));
        assert_eq!(published.last(), Some(&QueryState::Success(2)));
        assert_eq!(*calls.lock().unwrap(), vec![1, 2]);

        // The settled state stays with the current key.
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(query.state(), QueryState::Success(2));
    }

    #[tokio::test]
    async fn combines_latest_values() {
        let (a, a_receiver) = watch::channel(1);
        let (b, b_receiver) = watch::channel("x");
        let mut combined = combine(a_receiver, b_receiver);
        assert_eq!(*combined.borrow(), (1, "x"));

        a.send_replace(2);
        combined.wait_for(|value| *value == (2, "x")).await.unwrap();
        b.send_replace("y");
        combined.wait_for(|value| *value == (2, "y")).await.unwrap();
    }
}
