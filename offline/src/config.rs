//! Offline layer configuration.
//!
//! Everything here is baked in at build time in the shipped worker; hosts
//! and tools may override it, e.g. from a TOML file.

use serde::{Deserialize, Serialize};
use url::Url;

/// Cache version string of the current build.
pub const CACHE_VERSION: &str = "v3";

/// Prefix shared by every static generation name.
pub const CACHE_PREFIX: &str = "peeble";

/// Name of the dynamic network-fill cache. Predates versioned generations
/// and survives every activation.
pub const DYNAMIC_CACHE_NAME: &str = "peeble-dynamic";

/// Static asset manifest of the shipped app.
pub const STATIC_ASSETS: &[&str] = &[
    "/",
    "/index.html",
    "/manifest.json",
    "/css/app.css",
    "/js/app.js",
    "/js/link-protocol.js",
    "/js/nfc.js",
    "/js/recorder.js",
    "/icons/icon-192.png",
    "/icons/icon-512.png",
];

/// Configuration for the offline layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OfflineConfig {
    /// Origin the app is served from, e.g. `https://peeble.app`.
    pub origin: String,
    /// Path the app lives under; link URLs are built on `origin + app_path`.
    pub app_path: String,
    /// Path of the app-shell document.
    pub app_shell_path: String,
    /// Version tag of this build.
    pub cache_version: String,
    /// Prefix for generation names.
    pub cache_prefix: String,
    /// Dynamic cache name (the legacy default identifier).
    pub dynamic_cache_name: String,
    /// Ordered root-relative asset paths.
    pub static_assets: Vec<String>,
}

impl Default for OfflineConfig {
    fn default() -> Self {
        Self {
            origin: String::from("https://peeble.app"),
            app_path: String::from("/"),
            app_shell_path: String::from("/index.html"),
            cache_version: String::from(CACHE_VERSION),
            cache_prefix: String::from(CACHE_PREFIX),
            dynamic_cache_name: String::from(DYNAMIC_CACHE_NAME),
            static_assets: STATIC_ASSETS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl OfflineConfig {
    /// Name of the static generation for this build, e.g. `peeble-v3`.
    pub fn generation_name(&self) -> String {
        format!("{}-{}", self.cache_prefix, self.cache_version)
    }

    /// Base URL link parameters are encoded onto.
    pub fn base_url(&self) -> Result<Url, url::ParseError> {
        Url::parse(&self.origin)?.join(&self.app_path)
    }

    /// Absolute URL of a root-relative path on the app origin.
    pub fn resolve(&self, path: &str) -> Result<Url, url::ParseError> {
        Url::parse(&self.origin)?.join(path)
    }

    /// Absolute URL of the app shell.
    pub fn app_shell_url(&self) -> Result<Url, url::ParseError> {
        self.resolve(&self.app_shell_path)
    }
}
