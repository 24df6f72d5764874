//! Scenario harness
//!
//! A [`Scenario`] is one browser profile: a network, a set of open windows,
//! a clock, and the worker currently installed for the origin. Upgrading
//! replaces the worker but keeps the cache storage, as a browser does.

use std::sync::Arc;

use peeble_offline::cache::CacheStorage;
use peeble_offline::clients::ClientWindowRef;
use peeble_offline::config::OfflineConfig;
use peeble_offline::fetch::{Request, Response};
use peeble_offline::host::{FixedClock, MemoryClients, MemoryNetwork};
use peeble_offline::router::{RouteError, Router};

use crate::fixtures;

/// Start time of every scenario, ms since the epoch.
pub const START_MILLIS: u64 = 1_700_000_000_000;

pub struct Scenario {
    pub network: Arc<MemoryNetwork>,
    pub clients: Arc<MemoryClients>,
    pub clock: Arc<FixedClock>,
    pub router: Router,
}

impl Scenario {
    /// A fresh profile with the shipped configuration.
    pub fn new() -> Self {
        Self::with_config(OfflineConfig::default())
    }

    /// A fresh profile; the network serves every manifest asset.
    pub fn with_config(config: OfflineConfig) -> Self {
        let network = Arc::new(MemoryNetwork::new());
        serve_assets(&network, &config);
        let clients = Arc::new(MemoryClients::new());
        let clock = Arc::new(FixedClock::new(START_MILLIS));
        let router = Router::new(config, network.clone(), clients.clone(), clock.clone());
        Self {
            network,
            clients,
            clock,
            router,
        }
    }

    /// Install and activate the current worker, panicking on lifecycle errors.
    pub fn activated(self) -> Self {
        if let Err(e) = self.install_and_activate() {
            panic!("worker failed to start: {}", e);
        }
        self
    }

    /// Install then activate; returns the caches activation deleted.
    pub fn install_and_activate(&self) -> Result<Vec<String>, RouteError> {
        self.router.install()?;
        self.router.activate()
    }

    /// Deploy a new build: the network now serves its assets and a new
    /// worker starts over the storage the old one left behind.
    pub fn upgrade(self, config: OfflineConfig) -> Self {
        serve_assets(&self.network, &config);
        let storage: CacheStorage = self.router.cache().storage_snapshot();
        let router = Router::with_storage(
            config,
            storage,
            self.network.clone(),
            self.clients.clone(),
            self.clock.clone(),
        );
        Self { router, ..self }
    }

    /// Restart the same build: a fresh worker over the storage it left.
    pub fn restart(self) -> Self {
        let config = self.router.cache().config().clone();
        let storage = self.router.cache().storage_snapshot();
        let router = Router::with_storage(
            config,
            storage,
            self.network.clone(),
            self.clients.clone(),
            self.clock.clone(),
        );
        Self { router, ..self }
    }

    pub fn go_offline(&self) {
        self.network.set_online(false);
    }

    pub fn go_online(&self) {
        self.network.set_online(true);
    }

    /// Advance the clock.
    pub fn advance(&self, millis: u64) {
        use peeble_offline::host::Clock;
        self.clock.set(self.clock.now_millis() + millis);
    }

    /// Open a window on `url`.
    pub fn open_window(&self, id: &str, url: &str) {
        self.clients.add(ClientWindowRef::window(id, url));
    }

    /// Close a window.
    pub fn close_window(&self, id: &str) {
        self.clients.remove(id);
    }

    /// Replay a top-level navigation, with errors mapped to responses.
    pub fn navigate(&self, url: &str) -> Response {
        self.router.respond(&Request::navigate(url))
    }

    /// Replay a sub-resource fetch.
    pub fn fetch(&self, url: &str) -> Result<Response, RouteError> {
        self.router.handle_fetch(&Request::new(url))
    }
}

impl Default for Scenario {
    fn default() -> Self {
        Self::new()
    }
}

fn serve_assets(network: &MemoryNetwork, config: &OfflineConfig) {
    for path in &config.static_assets {
        network.serve(
            &fixtures::url(path),
            fixtures::asset_response(&config.cache_version, path),
        );
    }
}
