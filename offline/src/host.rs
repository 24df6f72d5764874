//! Host Bindings
//!
//! The clock trait plus in-memory implementations of every host binding.
//! The in-memory hosts back the test suites and the command-line tooling;
//! a browser embedding provides its own.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use spin::{Mutex, RwLock};

use crate::clients::{ClientHost, ClientWindowRef, MatchAllOptions, RelayError};
use crate::fetch::{Network, NetworkError, Request, Response};
use crate::nfc::{NfcAdapter, NfcError, ScanErrorCallback, TagUrlCallback};

/// Wall clock.
pub trait Clock: Send + Sync {
    /// Milliseconds since the Unix epoch.
    fn now_millis(&self) -> u64;
}

/// The system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0)
    }
}

/// A settable clock.
#[derive(Debug, Default)]
pub struct FixedClock(AtomicU64);

impl FixedClock {
    pub fn new(now: u64) -> Self {
        Self(AtomicU64::new(now))
    }

    pub fn set(&self, now: u64) {
        self.0.store(now, Ordering::SeqCst);
    }
}

impl Clock for FixedClock {
    fn now_millis(&self) -> u64 {
        self.0.load(Ordering::SeqCst)
    }
}

// ── Network ─────────────────────────────────────────────────

/// Canned network: URL → response, plus URLs that fail at transport level.
#[derive(Debug)]
pub struct MemoryNetwork {
    online: AtomicBool,
    routes: RwLock<BTreeMap<String, Response>>,
    failing: RwLock<Vec<String>>,
    log: RwLock<Vec<String>>,
}

impl MemoryNetwork {
    /// An online network that serves nothing yet.
    pub fn new() -> Self {
        Self {
            online: AtomicBool::new(true),
            routes: RwLock::new(BTreeMap::new()),
            failing: RwLock::new(Vec::new()),
            log: RwLock::new(Vec::new()),
        }
    }

    /// Answer `url` with `response`.
    pub fn serve(&self, url: &str, response: Response) {
        self.failing.write().retain(|u| u != url);
        self.routes.write().insert(url.to_string(), response);
    }

    /// Make fetches of `url` fail at transport level.
    pub fn fail(&self, url: &str) {
        self.failing.write().push(url.to_string());
    }

    /// Toggle connectivity.
    pub fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::SeqCst);
    }

    /// URLs fetched so far, in order.
    pub fn requests(&self) -> Vec<String> {
        self.log.read().clone()
    }
}

impl Default for MemoryNetwork {
    fn default() -> Self {
        Self::new()
    }
}

impl Network for MemoryNetwork {
    fn is_online(&self) -> bool {
        self.online.load(Ordering::SeqCst)
    }

    fn fetch(&self, request: &Request) -> Result<Response, NetworkError> {
        self.log.write().push(request.url.clone());
        if !self.is_online() {
            return Err(NetworkError::Offline);
        }
        let url = crate::cache::cache_key(&request.url);
        if self.failing.read().iter().any(|u| u == url) {
            return Err(NetworkError::Failed(format!("connection reset: {}", url)));
        }
        Ok(self
            .routes
            .read()
            .get(url)
            .cloned()
            .unwrap_or_else(|| Response::new(404)))
    }
}

// ── Clients ─────────────────────────────────────────────────

/// In-memory clients API.
#[derive(Debug, Default)]
pub struct MemoryClients {
    /// All clients
    clients: RwLock<Vec<ClientWindowRef>>,
    /// Focus calls, in order
    focused: RwLock<Vec<String>>,
    /// Posted messages by client id
    inbox: RwLock<BTreeMap<String, Vec<serde_json::Value>>>,
}

impl MemoryClients {
    /// Create new clients API
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a client
    pub fn add(&self, client: ClientWindowRef) {
        self.clients.write().push(client);
    }

    /// Remove a client
    pub fn remove(&self, id: &str) -> bool {
        let mut clients = self.clients.write();
        let len_before = clients.len();
        clients.retain(|c| c.id != id);
        clients.len() != len_before
    }

    /// Get a client by ID
    pub fn get(&self, id: &str) -> Option<ClientWindowRef> {
        self.clients.read().iter().find(|c| c.id == id).cloned()
    }

    /// Ids passed to `focus`, in order.
    pub fn focused(&self) -> Vec<String> {
        self.focused.read().clone()
    }

    /// Messages posted to a client.
    pub fn messages_for(&self, id: &str) -> Vec<serde_json::Value> {
        self.inbox.read().get(id).cloned().unwrap_or_default()
    }
}

impl ClientHost for MemoryClients {
    fn match_all(&self, options: &MatchAllOptions) -> Vec<ClientWindowRef> {
        self.clients
            .read()
            .iter()
            .filter(|client| client.client_type == options.client_type)
            .filter(|client| options.include_uncontrolled || client.controlled)
            .cloned()
            .collect()
    }

    fn focus(&self, client_id: &str) -> Result<(), RelayError> {
        if self.get(client_id).is_none() {
            return Err(RelayError::ClientGone(client_id.to_string()));
        }
        self.focused.write().push(client_id.to_string());
        Ok(())
    }

    fn post_message(&self, client_id: &str, message: &serde_json::Value) -> Result<(), RelayError> {
        if self.get(client_id).is_none() {
            return Err(RelayError::ClientGone(client_id.to_string()));
        }
        self.inbox
            .write()
            .entry(client_id.to_string())
            .or_default()
            .push(message.clone());
        Ok(())
    }

    fn claim(&self) -> usize {
        let mut clients = self.clients.write();
        for client in clients.iter_mut() {
            client.controlled = true;
        }
        clients.len()
    }
}

// ── NFC ─────────────────────────────────────────────────────

/// NFC adapter driven by hand: `tap` plays a tag read.
pub struct MemoryNfc {
    supported: bool,
    listeners: Mutex<Option<(TagUrlCallback, ScanErrorCallback)>>,
    written: RwLock<Vec<String>>,
}

impl MemoryNfc {
    pub fn new() -> Self {
        Self {
            supported: true,
            listeners: Mutex::new(None),
            written: RwLock::new(Vec::new()),
        }
    }

    /// An adapter on a device without NFC.
    pub fn unsupported() -> Self {
        Self {
            supported: false,
            ..Self::new()
        }
    }

    /// Deliver a tag read. Returns whether anyone was scanning.
    pub fn tap(&self, url: &str) -> bool {
        match &*self.listeners.lock() {
            Some((on_tag_url, _)) => {
                on_tag_url(url.to_string());
                true
            }
            None => false,
        }
    }

    /// Deliver a read failure.
    pub fn tap_error(&self, error: NfcError) -> bool {
        match &*self.listeners.lock() {
            Some((_, on_error)) => {
                on_error(error);
                true
            }
            None => false,
        }
    }

    /// URLs written so far.
    pub fn written(&self) -> Vec<String> {
        self.written.read().clone()
    }
}

impl Default for MemoryNfc {
    fn default() -> Self {
        Self::new()
    }
}

impl NfcAdapter for MemoryNfc {
    fn scan(&self, on_tag_url: TagUrlCallback, on_error: ScanErrorCallback) -> bool {
        if !self.supported {
            return false;
        }
        *self.listeners.lock() = Some((on_tag_url, on_error));
        true
    }

    fn write(&self, url: &str) -> Result<(), NfcError> {
        if !self.supported {
            return Err(NfcError::Unsupported);
        }
        self.written.write().push(url.to_string());
        Ok(())
    }
}
