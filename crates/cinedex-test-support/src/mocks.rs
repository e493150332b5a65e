//! Scripted stand-ins for the network and local storage.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use cinedex_catalog::{KeyValueStore, MemoryStore, StorageError, Transport, TransportError, TransportResponse};
use serde_json::Value;
use url::Url;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Debug, Clone)]
enum Action {
    Respond(TransportResponse),
    ConnectError(String),
    Stall,
}

/// One scripted reply: an optional delay followed by an action.
#[derive(Debug, Clone)]
pub struct Step {
    delay: Duration,
    action: Action,
}

impl Step {
    /// Respond with a JSON body.
    #[must_use]
    pub fn json(status: u16, body: &Value) -> Self {
        Self::raw(status, body.to_string().as_bytes())
    }

    /// Respond with raw bytes.
    #[must_use]
    pub fn raw(status: u16, body: &[u8]) -> Self {
        Self {
            delay: Duration::ZERO,
            action: Action::Respond(TransportResponse {
                status,
                body: body.to_vec(),
            }),
        }
    }

    /// Never answer.
    #[must_use]
    pub const fn stall() -> Self {
        Self {
            delay: Duration::ZERO,
            action: Action::Stall,
        }
    }

    /// Fail as if the host were unreachable.
    #[must_use]
    pub fn connect_error(detail: &str) -> Self {
        Self {
            delay: Duration::ZERO,
            action: Action::ConnectError(detail.to_string()),
        }
    }

    /// Wait `delay` before acting.
    #[must_use]
    pub const fn after(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

/// Replies for requests matching a path and a set of query pairs.
///
/// Steps are consumed in order; the last one repeats.
#[derive(Debug, Clone)]
pub struct Route {
    path: String,
    query: Vec<(String, String)>,
    steps: VecDeque<Step>,
}

impl Route {
    /// Match requests to `path` (including any base path such as `/3`).
    #[must_use]
    pub fn get(path: &str) -> Self {
        Self {
            path: path.to_string(),
            query: Vec::new(),
            steps: VecDeque::new(),
        }
    }

    /// Additionally require `name=value` in the query string.
    #[must_use]
    pub fn with_query(mut self, name: &str, value: &str) -> Self {
        self.query.push((name.to_string(), value.to_string()));
        self
    }

    /// Append a reply.
    #[must_use]
    pub fn then(mut self, step: Step) -> Self {
        self.steps.push_back(step);
        self
    }

    fn matches(&self, url: &Url) -> bool {
        url.path() == self.path
            && self.query.iter().all(|(name, value)| {
                url.query_pairs()
                    .any(|(key, candidate)| key == name.as_str() && candidate == value.as_str())
            })
    }

    fn next_step(&mut self) -> Option<Step> {
        if self.steps.len() > 1 {
            self.steps.pop_front()
        } else {
            self.steps.front().cloned()
        }
    }
}

/// [`Transport`] answering from scripted [`Route`]s and recording every call.
///
/// Unmatched requests get a 404 with a provider error body.
#[derive(Debug, Default)]
pub struct ScriptedTransport {
    routes: Mutex<Vec<Route>>,
    calls: Mutex<Vec<Url>>,
}

impl ScriptedTransport {
    /// Transport with no routes.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a route; earlier routes win.
    #[must_use]
    pub fn with_route(self, route: Route) -> Self {
        lock(&self.routes).push(route);
        self
    }

    /// Every URL requested so far.
    #[must_use]
    pub fn calls(&self) -> Vec<Url> {
        lock(&self.calls).clone()
    }

    /// Number of requests made.
    #[must_use]
    pub fn call_count(&self) -> usize {
        lock(&self.calls).len()
    }

    /// Number of requests made to `path`.
    #[must_use]
    pub fn calls_to(&self, path: &str) -> usize {
        lock(&self.calls)
            .iter()
            .filter(|url| url.path() == path)
            .count()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn get(&self, url: &Url) -> Result<TransportResponse, TransportError> {
        lock(&self.calls).push(url.clone());
        let step = lock(&self.routes)
            .iter_mut()
            .find(|route| route.matches(url))
            .and_then(Route::next_step);
        let Some(step) = step else {
            return Ok(TransportResponse::json(
                404,
                &crate::fixtures::provider_error(34, "no scripted route"),
            ));
        };

        if !step.delay.is_zero() {
            tokio::time::sleep(step.delay).await;
        }
        match step.action {
            Action::Respond(response) => Ok(response),
            Action::ConnectError(detail) => Err(TransportError::Connect { detail }),
            Action::Stall => std::future::pending().await,
        }
    }
}

/// In-memory [`KeyValueStore`] that counts writes; clones share state.
#[derive(Debug, Clone, Default)]
pub struct CountingStore {
    inner: Arc<Mutex<MemoryStore>>,
    writes: Arc<AtomicUsize>,
}

impl CountingStore {
    /// Empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-populated with one value; the seed is not counted.
    #[must_use]
    pub fn seeded(key: &str, value: &str) -> Self {
        let store = Self::new();
        // MemoryStore writes are infallible.
        let _ = lock(&store.inner).set(key, value);
        store
    }

    /// Number of `set` calls.
    #[must_use]
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Current value under `key`.
    #[must_use]
    pub fn value(&self, key: &str) -> Option<String> {
        lock(&self.inner).get(key).ok().flatten()
    }
}

impl KeyValueStore for CountingStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        lock(&self.inner).get(key)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        lock(&self.inner).set(key, value)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn url(raw: &str) -> Url {
        Url::parse(raw).unwrap()
    }

    #[tokio::test]
    async fn routes_match_path_and_query_and_repeat_last_step() {
        let transport = ScriptedTransport::new().with_route(
            Route::get("/3/search/movie")
                .with_query("query", "alien")
                .then(Step::json(500, &json!({})))
                .then(Step::json(200, &json!({"page": 1}))),
        );
        let hit = url("https://api.test/3/search/movie?query=alien&page=1");
        assert_eq!(transport.get(&hit).await.unwrap().status, 500);
        assert_eq!(transport.get(&hit).await.unwrap().status, 200);
        assert_eq!(transport.get(&hit).await.unwrap().status, 200);

        let miss = url("https://api.test/3/search/movie?query=heat");
        assert_eq!(transport.get(&miss).await.unwrap().status, 404);
        assert_eq!(transport.call_count(), 4);
        assert_eq!(transport.calls_to("/3/search/movie"), 4);
    }

    #[test]
    fn counting_store_shares_state_between_clones() {
        let store = CountingStore::seeded("k", "v");
        let mut handle = store.clone();
        handle.set("k", "w").unwrap();
        assert_eq!(store.writes(), 1);
        assert_eq!(store.value("k").as_deref(), Some("w"));
    }
}
