//! Cache Storage
//!
//! Named caches of URL → response, the model of the browser's `caches`
//! object. Keys never include the URL fragment.

use std::collections::BTreeMap;

use crate::fetch::{Response, ResponseSource};

/// A single cached response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedResponse {
    /// The request URL this response is keyed on.
    pub url: String,
    /// HTTP status code.
    pub status: u16,
    /// Response headers (name → value).
    pub headers: BTreeMap<String, String>,
    /// Response body bytes.
    pub body: Vec<u8>,
    /// Timestamp (ms) when this entry was cached.
    pub cached_at: u64,
    /// Size in bytes (body + headers).
    pub size: usize,
}

impl CachedResponse {
    /// Snapshot a response for storage.
    pub fn from_response(url: &str, response: &Response, cached_at: u64) -> Self {
        let header_bytes: usize = response
            .headers
            .iter()
            .map(|(k, v)| k.len() + v.len())
            .sum();
        Self {
            url: cache_key(url).to_string(),
            status: response.status,
            headers: response.headers.clone(),
            body: response.body.clone(),
            cached_at,
            size: response.body.len() + header_bytes,
        }
    }

    /// Rebuild a response, tagged with where it was found.
    pub fn to_response(&self, source: ResponseSource) -> Response {
        let mut response = Response::new(self.status);
        response.headers = self.headers.clone();
        response.body = self.body.clone();
        response.source = source;
        response
    }
}

/// A named cache with running size accounting.
#[derive(Debug, Clone, Default)]
pub struct Cache {
    entries: BTreeMap<String, CachedResponse>,
    bytes: usize,
}

impl Cache {
    /// Store a response, replacing any entry under the same key.
    pub fn put(&mut self, entry: CachedResponse) {
        self.bytes += entry.size;
        if let Some(replaced) = self.entries.insert(entry.url.clone(), entry) {
            self.bytes -= replaced.size;
        }
    }

    /// Look up a cached response by URL; the fragment is ignored.
    pub fn match_url(&self, url: &str) -> Option<&CachedResponse> {
        self.entries.get(cache_key(url))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Bytes held, bodies plus headers.
    pub fn size(&self) -> usize {
        self.bytes
    }

    /// When the newest entry was written, ms since the epoch.
    pub fn last_cached_at(&self) -> Option<u64> {
        self.entries.values().map(|e| e.cached_at).max()
    }
}

/// All named caches of the origin.
#[derive(Debug, Clone, Default)]
pub struct CacheStorage {
    /// cache_name → Cache.
    caches: BTreeMap<String, Cache>,
}

impl CacheStorage {
    /// Create an empty storage.
    pub fn new() -> Self {
        Self::default()
    }

    /// Open (or create) a named cache.
    pub fn open(&mut self, cache_name: &str) -> &mut Cache {
        self.caches
            .entry(String::from(cache_name))
            .or_default()
    }

    /// Get a named cache without creating it.
    pub fn get(&self, cache_name: &str) -> Option<&Cache> {
        self.caches.get(cache_name)
    }

    /// Check if a named cache exists.
    pub fn has(&self, cache_name: &str) -> bool {
        self.caches.contains_key(cache_name)
    }

    /// Delete a named cache.
    pub fn delete(&mut self, cache_name: &str) -> bool {
        self.caches.remove(cache_name).is_some()
    }

    /// List all cache names.
    pub fn keys(&self) -> Vec<String> {
        self.caches.keys().cloned().collect()
    }

    /// Look up a URL in one named cache.
    pub fn match_in(&self, cache_name: &str, url: &str) -> Option<&CachedResponse> {
        self.caches.get(cache_name).and_then(|c| c.match_url(url))
    }

    /// Total size across all caches.
    pub fn total_size(&self) -> usize {
        self.caches.values().map(|c| c.size()).sum()
    }
}

/// Cache key for a URL: the URL without its fragment.
pub fn cache_key(url: &str) -> &str {
    match url.split_once('#') {
        Some((key, _)) => key,
        None => url,
    }
}
