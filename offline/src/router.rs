//! Request Router
//!
//! Composition root of the offline layer. Every intercepted fetch flows
//! through [`Router::decide`] (classification, plus decode and validation for
//! share navigations) and then [`Router::handle_fetch`] carries the decision
//! out against the cache, the network or an open window.
//!
//! Degradable failures are absorbed here: a relay that cannot be delivered or
//! a navigation that cannot reach the network ends up on the app shell.
//! Link errors are not; they halt the request with a [`RouteError`].

use std::fmt;
use std::sync::Arc;

use log::{debug, info, warn};
use spin::RwLock;

use crate::cache::{cache_key, CacheError, CacheLifecycle, CacheStorage, InstallReport};
use crate::classifier::{classify, Classification};
use crate::clients::{find_peeble_clients, relay, ClientHost, ClientWindowRef};
use crate::config::OfflineConfig;
use crate::control::ControlMessage;
use crate::fetch::{Network, NetworkError, Request, Response, ResponseSource};
use crate::host::Clock;
use crate::lifecycle::{LifecycleError, WorkerLifecycle, WorkerState};
use crate::link::{decode, DecodeError, LinkParams, ValidationError};

// ── Types ───────────────────────────────────────────────────

/// What to do with one intercepted request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoutingDecision {
    /// Answer from cache; carries the fragment-free cache key.
    ServeCachedAsset(String),
    /// Fetch from the network and keep a copy.
    FetchAndCache(Request),
    /// Hand the link to an already-open window.
    RelayToExistingClient(ClientWindowRef, LinkParams),
    /// Answer with the app-shell document.
    ServeAppShell,
}

/// Routing failure
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteError {
    /// The share link could not be decoded.
    Decode(DecodeError),
    /// The share link decoded but broke the link rules.
    Invalid(Vec<ValidationError>),
    /// A sub-resource could not be fetched.
    Network(NetworkError),
    /// Cache lifecycle failure.
    Cache(CacheError),
    /// Worker lifecycle failure.
    Lifecycle(LifecycleError),
}

impl RouteError {
    /// User-visible response for this error.
    pub fn to_response(&self) -> Response {
        let status = match self {
            RouteError::Decode(_) | RouteError::Invalid(_) => 400,
            RouteError::Network(_) => 504,
            RouteError::Cache(_) | RouteError::Lifecycle(_) => 500,
        };
        let mut response = Response::new(status)
            .with_header("Content-Type", "text/plain; charset=utf-8")
            .with_source(ResponseSource::Worker);
        response.body = self.to_string().into_bytes();
        response
    }
}

impl fmt::Display for RouteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RouteError::Decode(e) => write!(f, "invalid link: {}", e),
            RouteError::Invalid(errors) => {
                write!(f, "invalid link:")?;
                for (i, e) in errors.iter().enumerate() {
                    let sep = if i == 0 { " " } else { "; " };
                    write!(f, "{}{}", sep, e)?;
                }
                Ok(())
            }
            RouteError::Network(e) => write!(f, "{}", e),
            RouteError::Cache(e) => write!(f, "{}", e),
            RouteError::Lifecycle(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for RouteError {}

impl From<DecodeError> for RouteError {
    fn from(e: DecodeError) -> Self {
        RouteError::Decode(e)
    }
}

impl From<NetworkError> for RouteError {
    fn from(e: NetworkError) -> Self {
        RouteError::Network(e)
    }
}

impl From<CacheError> for RouteError {
    fn from(e: CacheError) -> Self {
        RouteError::Cache(e)
    }
}

impl From<LifecycleError> for RouteError {
    fn from(e: LifecycleError) -> Self {
        RouteError::Lifecycle(e)
    }
}

// ── Router ──────────────────────────────────────────────────

/// The offline worker: cache lifecycle, worker lifecycle and request
/// routing over the host bindings it is given.
pub struct Router {
    cache: CacheLifecycle,
    worker: RwLock<WorkerLifecycle>,
    network: Arc<dyn Network>,
    clients: Arc<dyn ClientHost>,
    clock: Arc<dyn Clock>,
}

impl Router {
    /// Create a router over empty cache storage.
    pub fn new(
        config: OfflineConfig,
        network: Arc<dyn Network>,
        clients: Arc<dyn ClientHost>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self::with_storage(config, CacheStorage::new(), network, clients, clock)
    }

    /// Create a router over cache storage left behind by earlier builds.
    pub fn with_storage(
        config: OfflineConfig,
        storage: CacheStorage,
        network: Arc<dyn Network>,
        clients: Arc<dyn ClientHost>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            cache: CacheLifecycle::with_storage(config, storage),
            worker: RwLock::new(WorkerLifecycle::new()),
            network,
            clients,
            clock,
        }
    }

    /// The cache lifecycle manager.
    pub fn cache(&self) -> &CacheLifecycle {
        &self.cache
    }

    /// Current worker state.
    pub fn worker_state(&self) -> WorkerState {
        self.worker.read().state()
    }

    fn config(&self) -> &OfflineConfig {
        self.cache.config()
    }

    // ── Lifecycle ───────────────────────────────────────────

    /// Install: populate this build's cache generation.
    pub fn install(&self) -> Result<InstallReport, RouteError> {
        self.worker.write().transition_state(WorkerState::Installing)?;
        let report = self.cache.install(self.network.as_ref(), self.clock.now_millis());
        self.worker.write().transition_state(WorkerState::Installed)?;
        Ok(report)
    }

    /// Activate: prune stale caches and take control of open windows.
    ///
    /// Returns the names of the caches deleted.
    pub fn activate(&self) -> Result<Vec<String>, RouteError> {
        self.worker.write().transition_state(WorkerState::Activating)?;

        let deleted = match self.cache.activate() {
            Ok(deleted) => deleted,
            Err(e) => {
                warn!("[Peeble SW] activation failed: {}", e);
                self.worker.write().transition_state(WorkerState::Redundant)?;
                return Err(e.into());
            }
        };

        let claimed = self.clients.claim();
        self.worker.write().transition_state(WorkerState::Activated)?;
        info!(
            "[Peeble SW] {} activated, {} stale cache(s) removed, {} client(s) claimed",
            self.cache.current_generation(),
            deleted.len(),
            claimed
        );
        Ok(deleted)
    }

    /// Activate a waiting worker now. A no-op once activated.
    pub fn skip_waiting(&self) -> Result<Vec<String>, RouteError> {
        let (waiting, active, from) = {
            let worker = self.worker.read();
            (worker.is_waiting(), worker.is_active(), worker.state())
        };
        if active {
            return Ok(Vec::new());
        }
        if !waiting {
            return Err(LifecycleError::InvalidTransition {
                from,
                to: WorkerState::Activating,
            }
            .into());
        }
        self.activate()
    }

    // ── Fetch ───────────────────────────────────────────────

    /// Decide how to answer `request`. Mutates nothing.
    pub fn decide(&self, request: &Request) -> Result<RoutingDecision, RouteError> {
        let classification = classify(request, &self.cache, self.network.is_online());
        debug!(
            "[Peeble SW] {} {} -> {:?}",
            request.method.as_str(),
            cache_key(&request.url),
            classification
        );

        Ok(match classification {
            Classification::ShareNavigation => {
                let params = decode(&request.url)?;
                params.validate().map_err(RouteError::Invalid)?;
                let config = self.config();
                match find_peeble_clients(
                    self.clients.as_ref(),
                    &config.origin,
                    &config.app_shell_path,
                )
                    .into_iter()
                    .next()
                {
                    Some(client) => RoutingDecision::RelayToExistingClient(client, params),
                    None => RoutingDecision::ServeAppShell,
                }
            }
            Classification::CachedAsset => {
                RoutingDecision::ServeCachedAsset(cache_key(&request.url).to_string())
            }
            Classification::Network => RoutingDecision::FetchAndCache(request.clone()),
            Classification::AppShell => RoutingDecision::ServeAppShell,
        })
    }

    /// Answer an intercepted request.
    pub fn handle_fetch(&self, request: &Request) -> Result<Response, RouteError> {
        match self.decide(request)? {
            RoutingDecision::ServeCachedAsset(_) => match self.cache.lookup(request) {
                Some(response) => Ok(response),
                // Evicted between decision and lookup.
                None => self.fetch_and_cache(request),
            },
            RoutingDecision::FetchAndCache(request) => self.fetch_and_cache(&request),
            RoutingDecision::RelayToExistingClient(client, params) => {
                match relay(
                    self.clients.as_ref(),
                    &client,
                    &params,
                    &request.url,
                    self.clock.now_millis(),
                ) {
                    Ok(()) => Ok(Response::no_content()),
                    Err(e) => {
                        warn!("[Peeble SW] relay failed, opening a new window: {}", e);
                        Ok(self.app_shell_response())
                    }
                }
            }
            RoutingDecision::ServeAppShell => Ok(self.app_shell_response()),
        }
    }

    /// Like [`handle_fetch`](Self::handle_fetch), with errors turned into
    /// their user-visible responses.
    pub fn respond(&self, request: &Request) -> Response {
        self.handle_fetch(request).unwrap_or_else(|e| {
            warn!("[Peeble SW] {} {}: {}", request.method.as_str(), cache_key(&request.url), e);
            e.to_response()
        })
    }

    fn fetch_and_cache(&self, request: &Request) -> Result<Response, RouteError> {
        match self.network.fetch(request) {
            Ok(response) => {
                self.cache.fill(request, &response, self.clock.now_millis());
                Ok(response)
            }
            Err(e) if request.is_navigation() => {
                debug!("[Peeble SW] navigation fetch failed ({}), serving app shell", e);
                Ok(self.app_shell_response())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// App shell: cache, then network, then a synthetic 503.
    fn app_shell_response(&self) -> Response {
        if let Some(response) = self.cache.app_shell() {
            return response;
        }

        if let Ok(url) = self.config().app_shell_url() {
            let request = Request::new(url.as_str());
            match self.network.fetch(&request) {
                Ok(response) if response.status == 200 => {
                    self.cache.fill(&request, &response, self.clock.now_millis());
                    return response;
                }
                Ok(response) => debug!("[Peeble SW] app shell fetch: HTTP {}", response.status),
                Err(e) => debug!("[Peeble SW] app shell fetch: {}", e),
            }
        }

        let mut response = Response::new(503)
            .with_header("Content-Type", "text/plain; charset=utf-8")
            .with_source(ResponseSource::Worker);
        response.body = b"Offline".to_vec();
        response
    }

    // ── Control ─────────────────────────────────────────────

    /// Handle a message from the application.
    pub fn handle_control(&self, message: ControlMessage) -> Result<(), RouteError> {
        debug!("[Peeble SW] control message {}", message.kind());
        match message {
            ControlMessage::SkipWaiting => self.skip_waiting().map(|_| ()),
            ControlMessage::GetVersion { reply } => {
                if reply.send(self.cache.current_version().to_string()).is_err() {
                    debug!("[Peeble SW] GET_VERSION reply channel closed");
                }
                Ok(())
            }
            ControlMessage::CacheUrls { urls } => {
                for url in &urls {
                    self.cache_url(url);
                }
                Ok(())
            }
            ControlMessage::Prewarm { url, response } => {
                match self.config().resolve(&url) {
                    Ok(absolute) => {
                        self.cache
                            .prewarm(absolute.as_str(), &response, self.clock.now_millis());
                    }
                    Err(e) => warn!("[Peeble SW] cannot prewarm {}: {}", url, e),
                }
                Ok(())
            }
        }
    }

    fn cache_url(&self, url: &str) {
        let absolute = match self.config().resolve(url) {
            Ok(absolute) => absolute,
            Err(e) => {
                warn!("[Peeble SW] cannot cache {}: {}", url, e);
                return;
            }
        };
        let request = Request::new(absolute.as_str());
        match self.network.fetch(&request) {
            Ok(response) => {
                if !self.cache.fill(&request, &response, self.clock.now_millis()) {
                    warn!("[Peeble SW] not caching {}: HTTP {}", url, response.status);
                }
            }
            Err(e) => warn!("[Peeble SW] cannot cache {}: {}", url, e),
        }
    }
}

impl fmt::Debug for Router {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Router")
            .field("cache", &self.cache)
            .field("worker", &self.worker_state())
            .finish()
    }
}
