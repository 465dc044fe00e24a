//! Offline shell worker: lifecycle and request routing.
//!
//! Keeps the application's static shell available without network access and
//! keeps exactly one cache generation alive. Routing, evaluated per request:
//!
//! 1. Paths under the reserved API prefix bypass the store entirely and
//!    always go to the network; network errors propagate as-is.
//! 2. Page navigations go network-first; a network failure substitutes the
//!    cached root document as the offline shell.
//! 3. Manifest paths are cache-first; a miss falls back to the network
//!    without re-storing the result.
//! 4. Anything else: try the store; on a miss fetch from the network and
//!    store a copy opportunistically; with no cached copy the failure
//!    propagates.
//!
//! Pinned assets prioritize availability, API calls prioritize freshness,
//! everything else balances the two opportunistically. HTTP error statuses
//! are ordinary captured responses here; only transport failures trigger
//! fallbacks.

pub mod lifecycle;

pub use lifecycle::Phase;

use crate::fetch::{Fetch, FetchResponse, RequestMode, ShellRequest, path};
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::StatusCode;
use taskshell_core::manifest::SHELL_DOCUMENT;
use taskshell_core::{AssetManifest, CACHE_VERSION, CachedResponse, Error, StoreDb};

/// Requests under this prefix are never cached and never served stale.
pub const API_PREFIX: &str = "/api/";

/// The offline shell worker.
///
/// `install` and `activate` take `&mut self`: lifecycle transitions have a
/// single writer, and routing (`handle`) is only shared once activation is
/// done. Awaiting the transition methods to completion is what keeps a
/// half-populated or half-swept generation from ever being observed.
pub struct ShellWorker<N: Fetch> {
    store: StoreDb,
    network: N,
    manifest: AssetManifest,
    version: String,
    phase: Phase,
}

impl<N: Fetch> ShellWorker<N> {
    /// Create a worker for the current deployment version.
    pub fn new(store: StoreDb, network: N, manifest: AssetManifest) -> Self {
        Self::with_version(store, network, manifest, CACHE_VERSION)
    }

    /// Create a worker pinned to an explicit store tag.
    pub fn with_version(store: StoreDb, network: N, manifest: AssetManifest, version: impl Into<String>) -> Self {
        Self { store, network, manifest, version: version.into(), phase: Phase::New }
    }

    /// Current lifecycle phase.
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Store tag this worker populates and serves.
    pub fn version(&self) -> &str {
        &self.version
    }

    /// The backing response store.
    pub fn store(&self) -> &StoreDb {
        &self.store
    }

    /// Whether the current generation already holds every manifest asset.
    pub async fn is_installed(&self) -> Result<bool, Error> {
        let count = self.store.count_tag(&self.version).await?;
        Ok(count >= self.manifest.len() as u64)
    }

    /// Populate the current generation from the asset manifest.
    ///
    /// All-or-nothing: every manifest entry must fetch with a success status
    /// before anything is written, and the writes land in one transaction.
    /// On failure the store is untouched and the worker stays in `New`, so
    /// a previously active generation keeps serving.
    pub async fn install(&mut self) -> Result<(), Error> {
        if !self.phase.needs_install() {
            tracing::debug!("install skipped in phase {:?}", self.phase);
            return Ok(());
        }

        // A generation that is already fully mirrored (a previous run
        // installed it) skips straight to Installed without touching the
        // network, so activation works offline.
        if self.is_installed().await? {
            self.phase = Phase::Installed;
            tracing::debug!("generation {} already populated", self.version);
            return Ok(());
        }

        let mut rows = Vec::with_capacity(self.manifest.len());
        for asset in self.manifest.paths() {
            let response = self.network.fetch(&ShellRequest::get(asset.clone())).await?;
            if !response.status.is_success() {
                return Err(Error::HttpStatus { path: response.path, status: response.status.as_u16() });
            }
            rows.push(capture(&self.version, &response));
        }

        self.store.put_all(rows).await?;
        self.phase = Phase::Installed;
        tracing::info!("installed {} shell assets under {}", self.manifest.len(), self.version);
        Ok(())
    }

    /// Sweep stale generations and take over routing.
    ///
    /// The sweep is best-effort: a failed delete of one stale tag is logged
    /// and does not block deletion of the others, and never fails
    /// activation. Routing takes effect for all callers as soon as this
    /// returns, with no reload or waiting period.
    pub async fn activate(&mut self) -> Result<(), Error> {
        if self.phase.is_activated() {
            return Ok(());
        }
        if !self.phase.can_activate() {
            return Err(Error::Lifecycle(format!("activate before install (phase {:?})", self.phase)));
        }

        for tag in self.store.list_tags().await? {
            if tag == self.version {
                continue;
            }
            match self.store.delete_tag(&tag).await {
                Ok(deleted) => tracing::info!("swept stale cache {} ({} entries)", tag, deleted),
                Err(e) => tracing::warn!("failed to sweep stale cache {}: {}", tag, e),
            }
        }

        self.phase = Phase::Activated;
        Ok(())
    }

    /// Route one request per the decision tree in the module docs.
    ///
    /// Before activation every request passes straight to the network (an
    /// uncontrolled client).
    pub async fn handle(&self, request: &ShellRequest) -> Result<FetchResponse, Error> {
        if !self.phase.is_activated() {
            return self.network.fetch(request).await;
        }

        let identity = path::normalize(&request.path).map_err(|e| Error::InvalidPath(e.to_string()))?;

        if identity.starts_with(API_PREFIX) {
            return self.network.fetch(request).await;
        }

        if request.mode == RequestMode::Navigate {
            return match self.network.fetch(request).await {
                Ok(response) => Ok(response),
                Err(err) => match self.store.get_response(&self.version, SHELL_DOCUMENT).await? {
                    Some(stored) => {
                        tracing::debug!("navigation offline ({}), serving cached shell", err);
                        served(stored)
                    }
                    None => Err(err),
                },
            };
        }

        if self.manifest.contains(path::without_query(&identity)) {
            if let Some(stored) = self.store.get_response(&self.version, &identity).await? {
                return served(stored);
            }
            return self.network.fetch(request).await;
        }

        if let Some(stored) = self.store.get_response(&self.version, &identity).await? {
            return served(stored);
        }

        match self.network.fetch(request).await {
            Ok(response) => {
                let row = capture(&self.version, &response);
                if let Err(e) = self.store.put_response(&row).await {
                    tracing::warn!("failed to store copy of {}: {}", identity, e);
                }
                Ok(response)
            }
            // No cached copy exists at this point, so the failure is the
            // caller's to see.
            Err(err) => Err(err),
        }
    }
}

#[async_trait]
impl<N: Fetch> Fetch for ShellWorker<N> {
    async fn fetch(&self, request: &ShellRequest) -> Result<FetchResponse, Error> {
        self.handle(request).await
    }
}

/// Capture a network response as a store row under the given tag.
fn capture(tag: &str, response: &FetchResponse) -> CachedResponse {
    let headers_json = serde_json::to_string(&response.headers).ok();
    CachedResponse::new(
        tag,
        &response.path,
        response.status.as_u16(),
        response.content_type.clone(),
        headers_json,
        response.body.to_vec(),
    )
}

/// Rehydrate a stored row into a response.
fn served(stored: CachedResponse) -> Result<FetchResponse, Error> {
    let status = StatusCode::from_u16(stored.status)
        .map_err(|e| Error::InvalidInput(format!("stored status {}: {e}", stored.status)))?;
    let headers: Vec<(String, String)> = match stored.headers_json.as_deref() {
        Some(json) => serde_json::from_str(json).unwrap_or_default(),
        None => Vec::new(),
    };

    Ok(FetchResponse {
        path: stored.path,
        status,
        content_type: stored.content_type,
        headers,
        body: Bytes::from(stored.body),
        fetch_ms: 0,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    struct StubState {
        responses: HashMap<String, (u16, String)>,
        online: bool,
        calls: Vec<String>,
    }

    /// In-memory transport: serves registered paths, errors on everything
    /// else, and can be taken offline.
    struct StubNetwork {
        state: Mutex<StubState>,
    }

    impl StubNetwork {
        fn new() -> Arc<Self> {
            Arc::new(Self { state: Mutex::new(StubState { responses: HashMap::new(), online: true, calls: Vec::new() }) })
        }

        fn respond(&self, path: &str, status: u16, body: &str) {
            self.state
                .lock()
                .unwrap()
                .responses
                .insert(path.to_string(), (status, body.to_string()));
        }

        fn set_online(&self, online: bool) {
            self.state.lock().unwrap().online = online;
        }

        fn calls(&self) -> Vec<String> {
            self.state.lock().unwrap().calls.clone()
        }
    }

    #[async_trait]
    impl Fetch for StubNetwork {
        async fn fetch(&self, request: &ShellRequest) -> Result<FetchResponse, Error> {
            let identity = path::normalize(&request.path).map_err(|e| Error::InvalidPath(e.to_string()))?;
            let mut state = self.state.lock().unwrap();
            state.calls.push(identity.clone());

            if !state.online {
                return Err(Error::Network("offline".to_string()));
            }

            match state.responses.get(&identity) {
                Some((status, body)) => Ok(FetchResponse {
                    path: identity,
                    status: StatusCode::from_u16(*status).unwrap(),
                    content_type: Some("text/plain".to_string()),
                    headers: vec![("x-served-by".to_string(), "stub".to_string())],
                    body: Bytes::from(body.clone()),
                    fetch_ms: 1,
                }),
                None => Err(Error::Network(format!("unreachable: {}", request.path))),
            }
        }
    }

    fn shell_manifest() -> AssetManifest {
        AssetManifest::new(["/", "/index.html", "/style.css"])
    }

    fn serve_shell(network: &StubNetwork) {
        network.respond("/", 200, "root");
        network.respond("/index.html", 200, "<html>shell</html>");
        network.respond("/style.css", 200, "body{}");
    }

    async fn activated_worker(
        store: StoreDb, network: Arc<StubNetwork>, version: &str,
    ) -> ShellWorker<Arc<StubNetwork>> {
        let mut worker = ShellWorker::with_version(store, network, shell_manifest(), version);
        worker.install().await.unwrap();
        worker.activate().await.unwrap();
        worker
    }

    #[tokio::test]
    async fn test_install_populates_all_assets() {
        let store = StoreDb::open_in_memory().await.unwrap();
        let network = StubNetwork::new();
        serve_shell(&network);

        let mut worker = ShellWorker::with_version(store, Arc::clone(&network), shell_manifest(), "taskshell-v3");
        assert!(!worker.is_installed().await.unwrap());

        worker.install().await.unwrap();

        assert_eq!(worker.phase(), Phase::Installed);
        assert!(worker.is_installed().await.unwrap());
        assert_eq!(worker.store().count_tag("taskshell-v3").await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_install_all_or_nothing_on_transport_failure() {
        let store = StoreDb::open_in_memory().await.unwrap();
        let network = StubNetwork::new();
        network.respond("/", 200, "root");
        network.respond("/index.html", 200, "<html>shell</html>");
        // "/style.css" unregistered: transport failure mid-install

        let mut worker = ShellWorker::with_version(store, Arc::clone(&network), shell_manifest(), "taskshell-v3");
        let err = worker.install().await.unwrap_err();
        assert!(matches!(err, Error::Network(_)));

        assert_eq!(worker.phase(), Phase::New);
        assert_eq!(worker.store().count_tag("taskshell-v3").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_install_aborts_on_error_status() {
        let store = StoreDb::open_in_memory().await.unwrap();
        let network = StubNetwork::new();
        serve_shell(&network);
        network.respond("/style.css", 404, "not here");

        let mut worker = ShellWorker::with_version(store, Arc::clone(&network), shell_manifest(), "taskshell-v3");
        let err = worker.install().await.unwrap_err();
        assert!(matches!(err, Error::HttpStatus { status: 404, .. }));
        assert_eq!(worker.store().count_tag("taskshell-v3").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_activate_sweeps_stale_tags() {
        let store = StoreDb::open_in_memory().await.unwrap();
        let network = StubNetwork::new();
        serve_shell(&network);

        activated_worker(store.clone(), Arc::clone(&network), "taskshell-v2").await;
        assert_eq!(store.count_tag("taskshell-v2").await.unwrap(), 3);

        activated_worker(store.clone(), Arc::clone(&network), "taskshell-v3").await;

        let tags = store.list_tags().await.unwrap();
        assert_eq!(tags, vec!["taskshell-v3".to_string()]);
        assert_eq!(store.count_tag("taskshell-v2").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_activate_before_install_errors() {
        let store = StoreDb::open_in_memory().await.unwrap();
        let network = StubNetwork::new();

        let mut worker = ShellWorker::with_version(store, network, shell_manifest(), "taskshell-v3");
        let err = worker.activate().await.unwrap_err();
        assert!(matches!(err, Error::Lifecycle(_)));
    }

    #[tokio::test]
    async fn test_manifest_asset_served_offline() {
        let store = StoreDb::open_in_memory().await.unwrap();
        let network = StubNetwork::new();
        serve_shell(&network);

        let worker = activated_worker(store, Arc::clone(&network), "taskshell-v3").await;
        network.set_online(false);

        let response = worker.handle(&ShellRequest::get("/style.css")).await.unwrap();
        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(response.body, Bytes::from_static(b"body{}"));
        assert_eq!(response.fetch_ms, 0);
    }

    #[tokio::test]
    async fn test_api_bypass_always_network_never_cached() {
        let store = StoreDb::open_in_memory().await.unwrap();
        let network = StubNetwork::new();
        serve_shell(&network);
        network.respond("/api/gemini", 200, "{\"text\": \"fresh\"}");

        let worker = activated_worker(store, Arc::clone(&network), "taskshell-v3").await;

        // Even a manually planted store entry must be ignored.
        let planted = CachedResponse::new("taskshell-v3", "/api/gemini", 200, None, None, b"stale".to_vec());
        worker.store().put_response(&planted).await.unwrap();

        let before = network.calls().iter().filter(|p| *p == "/api/gemini").count();
        let response = worker.handle(&ShellRequest::get("/api/gemini")).await.unwrap();
        assert_eq!(response.body, Bytes::from_static(b"{\"text\": \"fresh\"}"));

        worker.handle(&ShellRequest::get("/api/gemini")).await.unwrap();
        let after = network.calls().iter().filter(|p| *p == "/api/gemini").count();
        assert_eq!(after - before, 2);

        // The bypass also never re-populates the store.
        let stored = worker.store().get_response("taskshell-v3", "/api/gemini").await.unwrap().unwrap();
        assert_eq!(stored.body, b"stale".to_vec());
    }

    #[tokio::test]
    async fn test_api_errors_propagate_without_fallback() {
        let store = StoreDb::open_in_memory().await.unwrap();
        let network = StubNetwork::new();
        serve_shell(&network);

        let worker = activated_worker(store, Arc::clone(&network), "taskshell-v3").await;
        network.set_online(false);

        let err = worker.handle(&ShellRequest::get("/api/gemini")).await.unwrap_err();
        assert!(matches!(err, Error::Network(_)));
    }

    #[tokio::test]
    async fn test_navigation_prefers_network() {
        let store = StoreDb::open_in_memory().await.unwrap();
        let network = StubNetwork::new();
        serve_shell(&network);
        network.respond("/about", 200, "about page");

        let worker = activated_worker(store, Arc::clone(&network), "taskshell-v3").await;

        let response = worker.handle(&ShellRequest::navigate("/about")).await.unwrap();
        assert_eq!(response.body, Bytes::from_static(b"about page"));
    }

    #[tokio::test]
    async fn test_navigation_falls_back_to_shell_offline() {
        let store = StoreDb::open_in_memory().await.unwrap();
        let network = StubNetwork::new();
        serve_shell(&network);

        let worker = activated_worker(store, Arc::clone(&network), "taskshell-v3").await;
        network.set_online(false);

        let response = worker.handle(&ShellRequest::navigate("/about")).await.unwrap();
        assert_eq!(response.body, Bytes::from_static(b"<html>shell</html>"));
        assert_eq!(response.path, "/index.html");
    }

    #[tokio::test]
    async fn test_opportunistic_store_then_offline_hit() {
        let store = StoreDb::open_in_memory().await.unwrap();
        let network = StubNetwork::new();
        serve_shell(&network);
        network.respond("/data.json", 200, "{\"n\": 1}");

        let worker = activated_worker(store, Arc::clone(&network), "taskshell-v3").await;

        let first = worker.handle(&ShellRequest::get("/data.json")).await.unwrap();
        assert_eq!(first.fetch_ms, 1);

        network.set_online(false);
        let second = worker.handle(&ShellRequest::get("/data.json")).await.unwrap();
        assert_eq!(second.body, Bytes::from_static(b"{\"n\": 1}"));
        assert_eq!(second.fetch_ms, 0);
    }

    #[tokio::test]
    async fn test_error_statuses_are_captured_responses() {
        let store = StoreDb::open_in_memory().await.unwrap();
        let network = StubNetwork::new();
        serve_shell(&network);
        network.respond("/missing.js", 404, "nope");

        let worker = activated_worker(store, Arc::clone(&network), "taskshell-v3").await;

        let first = worker.handle(&ShellRequest::get("/missing.js")).await.unwrap();
        assert_eq!(first.status, StatusCode::NOT_FOUND);

        network.set_online(false);
        let second = worker.handle(&ShellRequest::get("/missing.js")).await.unwrap();
        assert_eq!(second.status, StatusCode::NOT_FOUND);
        assert_eq!(second.body, Bytes::from_static(b"nope"));
    }

    #[tokio::test]
    async fn test_manifest_fallback_fetch_is_not_restored() {
        let store = StoreDb::open_in_memory().await.unwrap();
        let network = StubNetwork::new();
        serve_shell(&network);
        network.respond("/style.css?v=9", 200, "body{}");

        let worker = activated_worker(store, Arc::clone(&network), "taskshell-v3").await;

        // Query string makes a distinct cache identity, so this is a miss
        // on a manifest path: network fallback, no re-store.
        worker.handle(&ShellRequest::get("/style.css?v=9")).await.unwrap();
        assert!(
            worker
                .store()
                .get_response("taskshell-v3", "/style.css?v=9")
                .await
                .unwrap()
                .is_none()
        );

        network.set_online(false);
        let err = worker.handle(&ShellRequest::get("/style.css?v=9")).await.unwrap_err();
        assert!(matches!(err, Error::Network(_)));
    }

    #[tokio::test]
    async fn test_uncontrolled_passthrough_before_activation() {
        let store = StoreDb::open_in_memory().await.unwrap();
        let network = StubNetwork::new();
        serve_shell(&network);

        let worker = ShellWorker::with_version(store, Arc::clone(&network), shell_manifest(), "taskshell-v3");
        let response = worker.handle(&ShellRequest::get("/style.css")).await.unwrap();
        assert_eq!(response.fetch_ms, 1);
        assert_eq!(network.calls(), vec!["/style.css".to_string()]);
    }

    #[tokio::test]
    async fn test_populated_generation_activates_offline() {
        let store = StoreDb::open_in_memory().await.unwrap();
        let network = StubNetwork::new();
        serve_shell(&network);

        // First run mirrors the shell; a later run starts offline.
        activated_worker(store.clone(), Arc::clone(&network), "taskshell-v3").await;
        network.set_online(false);

        let mut worker = ShellWorker::with_version(store, Arc::clone(&network), shell_manifest(), "taskshell-v3");
        worker.install().await.unwrap();
        worker.activate().await.unwrap();

        let response = worker.handle(&ShellRequest::get("/index.html")).await.unwrap();
        assert_eq!(response.body, Bytes::from_static(b"<html>shell</html>"));
    }

    #[tokio::test]
    async fn test_install_idempotent_after_success() {
        let store = StoreDb::open_in_memory().await.unwrap();
        let network = StubNetwork::new();
        serve_shell(&network);

        let mut worker = ShellWorker::with_version(store, Arc::clone(&network), shell_manifest(), "taskshell-v3");
        worker.install().await.unwrap();
        let calls_after_first = network.calls().len();

        worker.install().await.unwrap();
        assert_eq!(network.calls().len(), calls_after_first);
    }
}
