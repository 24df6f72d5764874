//! Request Classifier
//!
//! Decides what kind of request an intercepted fetch is. The decision is a
//! pure function of the request, a read-only cache view and the online flag;
//! nothing is fetched or stored here.
//!
//! Order of checks:
//!
//! 1. document navigation carrying a share link → [`Classification::ShareNavigation`]
//! 2. cache hit → [`Classification::CachedAsset`]
//! 3. online → [`Classification::Network`]
//! 4. offline navigation → [`Classification::AppShell`]
//! 5. offline sub-resource miss → [`Classification::Network`]; the fetch
//!    fails and the caller reports it.

use crate::cache::AssetCache;
use crate::fetch::Request;
use crate::link::looks_like_share_link;

/// Kind of an intercepted request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// Navigation to a share link; may be relayed into an open window.
    ShareNavigation,
    /// Served from cache.
    CachedAsset,
    /// Goes to the network.
    Network,
    /// Offline navigation answered with the app shell.
    AppShell,
}

/// Classify `request`.
pub fn classify(request: &Request, cache: &dyn AssetCache, online: bool) -> Classification {
    let navigation = request.is_navigation();

    // Share detection runs before the cache lookup: the app shell URL is
    // itself cached, and a cache hit must not swallow the link.
    if navigation && looks_like_share_link(&request.url) {
        return Classification::ShareNavigation;
    }

    if cache.has(request) {
        return Classification::CachedAsset;
    }

    if online || !navigation {
        Classification::Network
    } else {
        Classification::AppShell
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::cache_key;

    /// Cache view holding a fixed set of fragment-free URLs.
    struct Cached(Vec<&'static str>);

    impl AssetCache for Cached {
        fn has(&self, request: &Request) -> bool {
            self.0.contains(&cache_key(&request.url))
        }
    }

    const SHARE: &str = "https://peeble.app/#messageId=PBL-1&ipfsHash=bafy";

    #[test]
    fn share_navigation_beats_cache_hit() {
        let cache = Cached(vec!["https://peeble.app/"]);
        let request = Request::navigate(SHARE);
        assert_eq!(classify(&request, &cache, true), Classification::ShareNavigation);
        assert_eq!(classify(&request, &cache, false), Classification::ShareNavigation);
    }

    #[test]
    fn share_link_sub_resource_is_not_a_share_navigation() {
        let cache = Cached(vec![]);
        let request = Request::new(SHARE);
        assert_eq!(classify(&request, &cache, true), Classification::Network);
    }

    #[test]
    fn creation_link_navigation_is_a_plain_navigation() {
        let cache = Cached(vec!["https://peeble.app/"]);
        let request =
            Request::navigate("https://peeble.app/#serial=04A1B2C3D4&messageId=PBL-1&timestamp=1");
        assert_eq!(classify(&request, &cache, false), Classification::CachedAsset);
    }

    #[test]
    fn cached_asset() {
        let cache = Cached(vec!["https://peeble.app/js/app.js"]);
        let request = Request::new("https://peeble.app/js/app.js");
        assert_eq!(classify(&request, &cache, false), Classification::CachedAsset);
    }

    #[test]
    fn miss_online_goes_to_network() {
        let cache = Cached(vec![]);
        assert_eq!(
            classify(&Request::navigate("https://peeble.app/"), &cache, true),
            Classification::Network
        );
        assert_eq!(
            classify(&Request::new("https://peeble.app/api"), &cache, true),
            Classification::Network
        );
    }

    #[test]
    fn offline_navigation_miss_gets_app_shell() {
        let cache = Cached(vec![]);
        let request = Request::navigate("https://peeble.app/settings");
        assert_eq!(classify(&request, &cache, false), Classification::AppShell);
    }

    #[test]
    fn offline_sub_resource_miss_goes_to_network() {
        let cache = Cached(vec![]);
        let request = Request::new("https://peeble.app/audio/42.webm");
        assert_eq!(classify(&request, &cache, false), Classification::Network);
    }
}
