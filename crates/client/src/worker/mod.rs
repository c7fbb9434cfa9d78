//! Tile cache worker.
//!
//! Intercepts GET requests for map tiles and map API calls, answers them
//! from the current cache generation while refreshing the entry in the
//! background (stale-while-revalidate), and prunes older generations when it
//! activates.
//!
//! Lifecycle: `Installing --install--> Waiting --activate--> Active`.
//! Requests are only intercepted once the worker is active.

pub mod scope;

pub use scope::HostScope;

use std::sync::Arc;

use futures_util::future::join_all;
use looproute_core::{CacheGeneration, Error, TileStore};
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;

use crate::fetch::{TileRequest, TileResponse, Upstream};

/// Worker lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    Installing,
    Waiting,
    Active,
}

impl WorkerState {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkerState::Installing => "installing",
            WorkerState::Waiting => "waiting",
            WorkerState::Active => "active",
        }
    }
}

/// Where an intercepted response came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseSource {
    /// Served from the cache; a refresh was started in the background.
    Cache,
    /// Fetched live (any status).
    Network,
    /// Network failed and nothing was cached.
    NetworkError,
}

impl ResponseSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResponseSource::Cache => "cache",
            ResponseSource::Network => "network",
            ResponseSource::NetworkError => "network_error",
        }
    }
}

/// Result of offering a request to the worker.
#[derive(Debug)]
pub enum FetchOutcome {
    /// Not intercepted; the caller performs its default handling.
    PassThrough(TileRequest),
    /// The worker answered the request.
    Responded { response: TileResponse, source: ResponseSource },
}

/// Stale-while-revalidate cache in front of an [`Upstream`].
pub struct TileCacheWorker {
    store: TileStore,
    upstream: Arc<dyn Upstream>,
    scope: HostScope,
    generation: CacheGeneration,
    state: RwLock<WorkerState>,
    background: Mutex<Vec<JoinHandle<()>>>,
}

impl TileCacheWorker {
    /// Create a worker in the `Installing` state.
    pub fn new(store: TileStore, upstream: Arc<dyn Upstream>, scope: HostScope, generation: CacheGeneration) -> Self {
        Self {
            store,
            upstream,
            scope,
            generation,
            state: RwLock::new(WorkerState::Installing),
            background: Mutex::new(Vec::new()),
        }
    }

    pub async fn state(&self) -> WorkerState {
        *self.state.read().await
    }

    pub fn generation(&self) -> &CacheGeneration {
        &self.generation
    }

    pub fn scope(&self) -> &HostScope {
        &self.scope
    }

    pub fn store(&self) -> &TileStore {
        &self.store
    }

    /// Finish installation. Nothing is pre-fetched.
    pub async fn install(&self) {
        let mut state = self.state.write().await;
        if *state == WorkerState::Installing {
            *state = WorkerState::Waiting;
            tracing::info!(generation = %self.generation, "tile cache worker installed");
        }
    }

    /// Delete stale generations, then start intercepting requests.
    ///
    /// Returns the names of the deleted caches.
    ///
    /// # Errors
    ///
    /// Returns `Error::WorkerState` if the worker has not been installed, or
    /// a storage error if pruning fails (the worker then stays inactive).
    pub async fn activate(&self) -> Result<Vec<String>, Error> {
        let mut state = self.state.write().await;
        if *state == WorkerState::Installing {
            return Err(Error::WorkerState("install must complete before activation".into()));
        }

        let pruned = self.store.prune_generations(&self.generation).await?;
        if !pruned.is_empty() {
            tracing::info!(?pruned, "deleted stale tile cache generations");
        }

        *state = WorkerState::Active;
        tracing::info!(generation = %self.generation, "tile cache worker active");

        Ok(pruned)
    }

    /// Offer a request to the worker.
    ///
    /// Network failures never surface as errors: they fall back to a cached
    /// entry or to [`TileResponse::network_error`]. Only cache lookup
    /// failures are returned as `Err`.
    pub async fn handle_fetch(&self, request: TileRequest) -> Result<FetchOutcome, Error> {
        if self.state().await != WorkerState::Active || !self.scope.intercepts(&request) {
            return Ok(FetchOutcome::PassThrough(request));
        }

        let cache_name = self.generation.name();
        self.store.open_cache(&cache_name).await?;

        if let Some(entry) = self.lookup(&cache_name, &request).await? {
            tracing::debug!(url = %request.url, "tile cache hit");
            self.revalidate(cache_name, request).await;
            return Ok(FetchOutcome::Responded { response: TileResponse::from(entry), source: ResponseSource::Cache });
        }

        tracing::debug!(url = %request.url, "tile cache miss");
        match self.upstream.fetch(&request).await {
            Ok(response) => {
                if response.is_ok() {
                    self.store_copy(&cache_name, &request, &response).await;
                }
                Ok(FetchOutcome::Responded { response, source: ResponseSource::Network })
            }
            Err(err) => {
                tracing::debug!(url = %request.url, error = %err, "tile fetch failed");
                // A concurrent request may have filled the entry meanwhile.
                match self.lookup(&cache_name, &request).await {
                    Ok(Some(entry)) => {
                        Ok(FetchOutcome::Responded { response: TileResponse::from(entry), source: ResponseSource::Cache })
                    }
                    Ok(None) | Err(_) => Ok(FetchOutcome::Responded {
                        response: TileResponse::network_error(),
                        source: ResponseSource::NetworkError,
                    }),
                }
            }
        }
    }

    /// Wait for every background revalidation started so far.
    pub async fn settle(&self) {
        let handles = std::mem::take(&mut *self.background.lock().await);
        for result in join_all(handles).await {
            if let Err(err) = result {
                tracing::warn!(error = %err, "background revalidation task aborted");
            }
        }
    }

    async fn lookup(
        &self, cache_name: &str, request: &TileRequest,
    ) -> Result<Option<looproute_core::CachedResponse>, Error> {
        self.store
            .match_entry(cache_name, request.method.as_str(), request.url.as_str())
            .await
    }

    async fn store_copy(&self, cache_name: &str, request: &TileRequest, response: &TileResponse) {
        if let Err(err) = self.store.put_entry(&response.to_cached(cache_name, request)).await {
            tracing::warn!(url = %request.url, error = %err, "failed to store tile response");
        }
    }

    async fn revalidate(&self, cache_name: String, request: TileRequest) {
        let store = self.store.clone();
        let upstream = Arc::clone(&self.upstream);

        let handle = tokio::spawn(async move {
            match upstream.fetch(&request).await {
                Ok(fresh) if fresh.is_ok() => match store.put_entry(&fresh.to_cached(&cache_name, &request)).await {
                    Ok(()) => tracing::debug!(url = %request.url, "tile cache entry refreshed"),
                    Err(err) => tracing::warn!(url = %request.url, error = %err, "failed to store refreshed tile"),
                },
                Ok(fresh) => {
                    tracing::debug!(url = %request.url, status = fresh.status, "refresh not ok; keeping cached tile")
                }
                Err(err) => tracing::debug!(url = %request.url, error = %err, "refresh failed; keeping cached tile"),
            }
        });

        let mut background = self.background.lock().await;
        background.retain(|h| !h.is_finished());
        background.push(handle);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::{FetchError, ResponseKind};
    use async_trait::async_trait;
    use bytes::Bytes;
    use reqwest::Method;
    use reqwest::header::HeaderMap;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    const TILE: &str = "https://a.tiles.mapbox.com/v4/mapbox.mapbox-streets-v8/14/13963/6345.vector.pbf";

    enum Step {
        Respond(u16, &'static [u8]),
        Slow(Duration, u16, &'static [u8]),
        Fail,
    }

    #[derive(Default)]
    struct ScriptedUpstream {
        steps: std::sync::Mutex<VecDeque<Step>>,
        calls: AtomicUsize,
    }

    impl ScriptedUpstream {
        fn with(steps: Vec<Step>) -> Arc<Self> {
            Arc::new(Self { steps: std::sync::Mutex::new(steps.into()), calls: AtomicUsize::new(0) })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    fn response(status: u16, body: &'static [u8]) -> TileResponse {
        TileResponse { kind: ResponseKind::Basic, status, headers: HeaderMap::new(), body: Bytes::from_static(body) }
    }

    #[async_trait]
    impl Upstream for ScriptedUpstream {
        async fn fetch(&self, _request: &TileRequest) -> Result<TileResponse, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let step = self.steps.lock().unwrap().pop_front();
            match step {
                Some(Step::Respond(status, body)) => Ok(response(status, body)),
                Some(Step::Slow(delay, status, body)) => {
                    tokio::time::sleep(delay).await;
                    Ok(response(status, body))
                }
                Some(Step::Fail) | None => Err(FetchError::Network("connection reset".into())),
            }
        }
    }

    async fn active_worker(upstream: Arc<ScriptedUpstream>) -> TileCacheWorker {
        let store = TileStore::open_in_memory().await.unwrap();
        let worker = TileCacheWorker::new(
            store,
            upstream,
            HostScope::new(["api.mapbox.com", "events.mapbox.com"], ".tiles.mapbox.com"),
            CacheGeneration::current("mapbox-tiles"),
        );
        worker.install().await;
        worker.activate().await.unwrap();
        worker
    }

    fn responded(outcome: FetchOutcome) -> (TileResponse, ResponseSource) {
        match outcome {
            FetchOutcome::Responded { response, source } => (response, source),
            FetchOutcome::PassThrough(request) => panic!("expected a response, got pass-through for {}", request.url),
        }
    }

    async fn cached_body(worker: &TileCacheWorker) -> Option<Vec<u8>> {
        worker
            .store()
            .match_entry(&worker.generation().name(), "GET", TILE)
            .await
            .unwrap()
            .map(|entry| entry.body)
    }

    #[tokio::test]
    async fn test_second_request_served_from_cache_without_waiting() {
        let upstream = ScriptedUpstream::with(vec![
            Step::Respond(200, b"tile-v1"),
            Step::Slow(Duration::from_secs(30), 200, b"tile-v2"),
        ]);
        let worker = active_worker(upstream.clone()).await;

        let (first, source) = responded(worker.handle_fetch(TileRequest::get(TILE).unwrap()).await.unwrap());
        assert_eq!(source, ResponseSource::Network);
        assert_eq!(first.body.as_ref(), b"tile-v1");

        let second = tokio::time::timeout(Duration::from_secs(2), worker.handle_fetch(TileRequest::get(TILE).unwrap()))
            .await
            .expect("cache hit must not wait for the network")
            .unwrap();
        let (second, source) = responded(second);
        assert_eq!(source, ResponseSource::Cache);
        assert_eq!(second.status, 200);
        assert_eq!(second.body.as_ref(), b"tile-v1");
    }

    #[tokio::test]
    async fn test_successful_revalidation_refreshes_entry() {
        let upstream = ScriptedUpstream::with(vec![Step::Respond(200, b"tile-v1"), Step::Respond(200, b"tile-v2")]);
        let worker = active_worker(upstream.clone()).await;

        worker.handle_fetch(TileRequest::get(TILE).unwrap()).await.unwrap();
        let (hit, _) = responded(worker.handle_fetch(TileRequest::get(TILE).unwrap()).await.unwrap());
        assert_eq!(hit.body.as_ref(), b"tile-v1");

        worker.settle().await;
        assert_eq!(upstream.calls(), 2);
        assert_eq!(cached_body(&worker).await, Some(b"tile-v2".to_vec()));
    }

    #[tokio::test]
    async fn test_failed_revalidation_keeps_entry() {
        let upstream = ScriptedUpstream::with(vec![Step::Respond(200, b"tile-v1"), Step::Fail]);
        let worker = active_worker(upstream).await;

        worker.handle_fetch(TileRequest::get(TILE).unwrap()).await.unwrap();
        let (hit, source) = responded(worker.handle_fetch(TileRequest::get(TILE).unwrap()).await.unwrap());
        assert_eq!(source, ResponseSource::Cache);
        assert_eq!(hit.body.as_ref(), b"tile-v1");

        worker.settle().await;
        assert_eq!(cached_body(&worker).await, Some(b"tile-v1".to_vec()));
    }

    #[tokio::test]
    async fn test_non_ok_revalidation_keeps_entry() {
        let upstream = ScriptedUpstream::with(vec![Step::Respond(200, b"tile-v1"), Step::Respond(503, b"busy")]);
        let worker = active_worker(upstream).await;

        worker.handle_fetch(TileRequest::get(TILE).unwrap()).await.unwrap();
        worker.handle_fetch(TileRequest::get(TILE).unwrap()).await.unwrap();
        worker.settle().await;

        assert_eq!(cached_body(&worker).await, Some(b"tile-v1".to_vec()));
    }

    #[tokio::test]
    async fn test_primary_failure_without_entry_yields_error_response() {
        let upstream = ScriptedUpstream::with(vec![Step::Fail]);
        let worker = active_worker(upstream).await;

        let (response, source) = responded(worker.handle_fetch(TileRequest::get(TILE).unwrap()).await.unwrap());
        assert_eq!(source, ResponseSource::NetworkError);
        assert_eq!(response.kind, ResponseKind::Error);
        assert_eq!(response.status, 0);
        assert_eq!(cached_body(&worker).await, None);
    }

    #[tokio::test]
    async fn test_non_ok_primary_response_is_returned_but_not_cached() {
        let upstream = ScriptedUpstream::with(vec![Step::Respond(404, b"no tile"), Step::Respond(200, b"tile")]);
        let worker = active_worker(upstream).await;

        let (response, source) = responded(worker.handle_fetch(TileRequest::get(TILE).unwrap()).await.unwrap());
        assert_eq!(source, ResponseSource::Network);
        assert_eq!(response.status, 404);
        assert_eq!(response.body.as_ref(), b"no tile");
        assert_eq!(cached_body(&worker).await, None);

        let (response, source) = responded(worker.handle_fetch(TileRequest::get(TILE).unwrap()).await.unwrap());
        assert_eq!(source, ResponseSource::Network);
        assert_eq!(response.status, 200);
    }

    #[tokio::test]
    async fn test_cached_response_round_trips_status_and_body() {
        let body: &'static [u8] = b"\x1a\x0b\x0a\x05water\x12\x02\x00\x00";
        let upstream = ScriptedUpstream::with(vec![Step::Respond(200, body), Step::Fail]);
        let worker = active_worker(upstream).await;

        let (live, _) = responded(worker.handle_fetch(TileRequest::get(TILE).unwrap()).await.unwrap());
        let (cached, source) = responded(worker.handle_fetch(TileRequest::get(TILE).unwrap()).await.unwrap());

        assert_eq!(source, ResponseSource::Cache);
        assert_eq!(cached.status, live.status);
        assert_eq!(cached.body, live.body);
        assert_eq!(cached.body_sha256(), live.body_sha256());
    }

    #[tokio::test]
    async fn test_non_get_and_foreign_hosts_pass_through() {
        let upstream = ScriptedUpstream::with(vec![Step::Respond(200, b"anything")]);
        let worker = active_worker(upstream.clone()).await;

        let mut post = TileRequest::get("https://events.mapbox.com/events/v2").unwrap();
        post.method = Method::POST;
        let foreign = TileRequest::get("https://unpkg.com/maplibre-gl/dist/maplibre-gl.js").unwrap();

        for request in [post, foreign] {
            let outcome = worker.handle_fetch(request).await.unwrap();
            assert!(matches!(outcome, FetchOutcome::PassThrough(_)));
        }

        assert_eq!(upstream.calls(), 0);
        assert_eq!(worker.store().count_entries(&worker.generation().name()).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_query_variants_are_distinct_entries() {
        let upstream = ScriptedUpstream::with(vec![Step::Respond(200, b"a"), Step::Respond(200, b"b")]);
        let worker = active_worker(upstream.clone()).await;

        let base = "https://api.mapbox.com/styles/v1/mapbox/streets-v12";
        worker.handle_fetch(TileRequest::get(&format!("{base}?access_token=a")).unwrap()).await.unwrap();
        let (second, source) =
            responded(worker.handle_fetch(TileRequest::get(&format!("{base}?access_token=b")).unwrap()).await.unwrap());

        assert_eq!(source, ResponseSource::Network);
        assert_eq!(second.body.as_ref(), b"b");
        assert_eq!(upstream.calls(), 2);
        assert_eq!(worker.store().count_entries(&worker.generation().name()).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_requests_pass_through_until_active() {
        let upstream = ScriptedUpstream::with(vec![]);
        let store = TileStore::open_in_memory().await.unwrap();
        let worker = TileCacheWorker::new(
            store,
            upstream.clone(),
            HostScope::new(["api.mapbox.com"], ".tiles.mapbox.com"),
            CacheGeneration::current("mapbox-tiles"),
        );

        assert_eq!(worker.state().await, WorkerState::Installing);
        assert!(matches!(worker.activate().await, Err(Error::WorkerState(_))));

        worker.install().await;
        assert_eq!(worker.state().await, WorkerState::Waiting);
        let outcome = worker.handle_fetch(TileRequest::get(TILE).unwrap()).await.unwrap();
        assert!(matches!(outcome, FetchOutcome::PassThrough(_)));
        assert_eq!(upstream.calls(), 0);
    }

    #[tokio::test]
    async fn test_activation_prunes_previous_generations() {
        let store = TileStore::open_in_memory().await.unwrap();
        let generation = CacheGeneration::current("mapbox-tiles");
        store.open_cache("mapbox-tiles-1999-01").await.unwrap();
        store.open_cache(&generation.name()).await.unwrap();
        store.open_cache("route-history").await.unwrap();

        let worker = TileCacheWorker::new(
            store.clone(),
            ScriptedUpstream::with(vec![]),
            HostScope::new(["api.mapbox.com"], ".tiles.mapbox.com"),
            generation.clone(),
        );
        worker.install().await;
        let pruned = worker.activate().await.unwrap();

        assert_eq!(pruned, vec!["mapbox-tiles-1999-01".to_string()]);
        let names: Vec<String> = store.cache_summaries().await.unwrap().into_iter().map(|s| s.name).collect();
        assert_eq!(names, vec![generation.name(), "route-history".to_string()]);
        assert_eq!(worker.state().await, WorkerState::Active);
    }
}
