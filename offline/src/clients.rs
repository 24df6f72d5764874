//! Client Window Resolver & Relay
//!
//! Finds application windows that are already open and hands decoded link
//! parameters to one of them instead of letting the navigation open a second
//! window. Windows can close at any moment, so everything here is resolved
//! per request and every failure is soft.

use std::fmt;

use log::{debug, info};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::link::LinkParams;

// ── Types ───────────────────────────────────────────────────

/// Client type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClientType {
    /// Window client
    #[default]
    Window,
    /// Dedicated or shared worker client
    Worker,
}

/// Handle to an open application context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientWindowRef {
    /// Host-assigned client id; focus and messaging go through it.
    pub id: String,
    /// Current URL of the context.
    pub url: String,
    /// Client type
    pub client_type: ClientType,
    /// Whether this worker controls it
    pub controlled: bool,
}

impl ClientWindowRef {
    /// A top-level window client.
    pub fn window(id: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            url: url.into(),
            client_type: ClientType::Window,
            controlled: true,
        }
    }
}

/// Options for matchAll
#[derive(Debug, Clone, Default)]
pub struct MatchAllOptions {
    /// Include uncontrolled clients
    pub include_uncontrolled: bool,
    /// Client type filter
    pub client_type: ClientType,
}

/// Message delivered to an open window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelayMessage {
    /// One fixed literal per link class.
    #[serde(rename = "type")]
    pub message_type: String,
    pub params: LinkParams,
    /// The navigation URL that was intercepted.
    pub url: String,
    /// Delivery time, ms since the epoch.
    pub timestamp: u64,
}

impl RelayMessage {
    /// Build the message for `params`.
    pub fn new(params: LinkParams, url: impl Into<String>, timestamp: u64) -> Self {
        Self {
            message_type: params.class().message_type().to_string(),
            params,
            url: url.into(),
            timestamp,
        }
    }
}

/// Relay failure. Always soft: the caller opens a fresh window instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelayError {
    /// The window closed between enumeration and focus/post.
    ClientGone(String),
    /// The message could not be delivered.
    Delivery(String),
}

impl fmt::Display for RelayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RelayError::ClientGone(id) => write!(f, "client {} is gone", id),
            RelayError::Delivery(reason) => write!(f, "relay delivery failed: {}", reason),
        }
    }
}

impl std::error::Error for RelayError {}

/// Clients API implemented by the host.
pub trait ClientHost: Send + Sync {
    /// Enumerate open contexts, in the host's order.
    fn match_all(&self, options: &MatchAllOptions) -> Vec<ClientWindowRef>;

    /// Focus a context.
    fn focus(&self, client_id: &str) -> Result<(), RelayError>;

    /// Queue a message for a context. Returns once queued, not once handled.
    fn post_message(&self, client_id: &str, message: &serde_json::Value) -> Result<(), RelayError>;

    /// Take control of every open context in scope; returns how many.
    fn claim(&self) -> usize;
}

// ── Resolution ──────────────────────────────────────────────

/// Open windows showing the app shell on `origin`, in host order.
///
/// `shell_path` is the app-shell document path. Uncontrolled windows count
/// too: a window opened before this worker activated is still the app.
pub fn find_peeble_clients(
    host: &dyn ClientHost,
    origin: &str,
    shell_path: &str,
) -> Vec<ClientWindowRef> {
    let options = MatchAllOptions {
        include_uncontrolled: true,
        client_type: ClientType::Window,
    };
    let Ok(origin) = Url::parse(origin) else {
        return Vec::new();
    };

    let clients: Vec<_> = host
        .match_all(&options)
        .into_iter()
        .filter(|client| client.client_type == ClientType::Window)
        .filter(|client| is_app_shell_url(&client.url, &origin, shell_path))
        .collect();
    debug!(
        "[Peeble Relay] {} open app window(s) on {}",
        clients.len(),
        origin.origin().ascii_serialization()
    );
    clients
}

/// Whether `url` is the app shell: same origin, exactly the shell path.
///
/// Query and fragment are ignored. A `<dir>/index.html` shell is also open
/// when the window shows `<dir>/`, and the other way round.
pub fn is_app_shell_url(url: &str, origin: &Url, shell_path: &str) -> bool {
    let Ok(url) = Url::parse(url) else {
        return false;
    };
    url.origin() == origin.origin() && directory_form(url.path()) == directory_form(shell_path)
}

/// `/dir/index.html` → `/dir/`; any other path unchanged.
fn directory_form(path: &str) -> &str {
    match path.strip_suffix("index.html") {
        Some(dir) if dir.ends_with('/') => dir,
        _ => path,
    }
}

// ── Relay ───────────────────────────────────────────────────

/// Focus `client` and post the decoded parameters to it.
///
/// Fire-and-forget: returns as soon as the host has queued the message.
pub fn relay(
    host: &dyn ClientHost,
    client: &ClientWindowRef,
    params: &LinkParams,
    url: &str,
    now: u64,
) -> Result<(), RelayError> {
    host.focus(&client.id)?;

    let message = RelayMessage::new(params.clone(), url, now);
    let payload =
        serde_json::to_value(&message).map_err(|e| RelayError::Delivery(e.to_string()))?;
    host.post_message(&client.id, &payload)?;

    info!(
        "[Peeble Relay] {} link {} relayed to client {}",
        params.class(),
        params.message_id(),
        client.id
    );
    Ok(())
}
