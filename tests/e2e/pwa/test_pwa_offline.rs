//! E2E Test: PWA Offline Capability
//!
//! Tests that the static generation and the dynamic cache keep the app
//! usable without a network:
//! 1. Install and activate the worker
//! 2. Disconnect the network
//! 3. Verify assets, the app shell and previously fetched data are served
//! 4. Verify what cannot be served fails the way the app expects

#[cfg(test)]
mod tests {
    use peeble_e2e_tests::assertions::{assert_body, assert_source, assert_status};
    use peeble_e2e_tests::fixtures::{self, asset_body};
    use peeble_e2e_tests::Scenario;
    use peeble_offline::fetch::{NetworkError, Response, ResponseSource};
    use peeble_offline::router::RouteError;

    #[test]
    fn test_manifest_fully_cached_on_install() {
        let scenario = Scenario::new();
        let report = scenario.router.install().unwrap();
        assert!(report.coverage.is_complete());
        assert_eq!(report.coverage.expected, 10);
    }

    #[test]
    fn test_static_assets_served_offline() {
        let scenario = Scenario::new().activated();
        scenario.go_offline();

        for path in ["/css/app.css", "/js/app.js", "/js/link-protocol.js", "/icons/icon-192.png"] {
            let response = scenario.fetch(&fixtures::url(path)).unwrap();
            assert_status(&response, 200).unwrap();
            assert_body(&response, &asset_body("v3", path)).unwrap();
            assert_source(&response, ResponseSource::StaticCache).unwrap();
        }
    }

    #[test]
    fn test_cold_offline_navigation_gets_app_shell() {
        let scenario = Scenario::new().activated();
        scenario.go_offline();

        let response = scenario.navigate(&fixtures::url("/inbox"));
        assert_status(&response, 200).unwrap();
        assert_body(&response, &asset_body("v3", "/index.html")).unwrap();
    }

    #[test]
    fn test_offline_share_link_without_window_gets_app_shell() {
        let scenario = Scenario::new().activated();
        scenario.go_offline();

        let response = scenario.navigate(&fixtures::share_link("PBL-42", "bafyshare"));
        assert_status(&response, 200).unwrap();
        assert_body(&response, &asset_body("v3", "/index.html")).unwrap();
    }

    #[test]
    fn test_fetched_data_available_offline() {
        let scenario = Scenario::new().activated();
        let url = fixtures::url("/api/messages/PBL-42");
        scenario
            .network
            .serve(&url, Response::ok_with_body(b"{\"id\":\"PBL-42\"}".to_vec()));

        let online = scenario.fetch(&url).unwrap();
        assert_source(&online, ResponseSource::Network).unwrap();

        scenario.go_offline();
        let offline = scenario.fetch(&url).unwrap();
        assert_body(&offline, b"{\"id\":\"PBL-42\"}").unwrap();
        assert_source(&offline, ResponseSource::DynamicCache).unwrap();
    }

    #[test]
    fn test_failed_responses_not_cached() {
        let scenario = Scenario::new().activated();
        let url = fixtures::url("/api/missing");

        let response = scenario.fetch(&url).unwrap();
        assert_status(&response, 404).unwrap();
        assert_eq!(scenario.router.cache().dynamic_len(), 0);
    }

    #[test]
    fn test_offline_uncached_resource_fails() {
        let scenario = Scenario::new().activated();
        scenario.go_offline();

        let result = scenario.fetch(&fixtures::url("/audio/never-fetched.webm"));
        assert_eq!(result, Err(RouteError::Network(NetworkError::Offline)));
    }

    #[test]
    fn test_partial_install_still_serves_what_it_has() {
        let scenario = Scenario::new();
        scenario.network.fail(&fixtures::url("/icons/icon-512.png"));
        let report = scenario.router.install().unwrap();
        assert_eq!(report.coverage.missing, vec!["/icons/icon-512.png".to_string()]);
        scenario.router.activate().unwrap();

        scenario.go_offline();
        assert!(scenario.fetch(&fixtures::url("/js/app.js")).is_ok());
        assert!(scenario.fetch(&fixtures::url("/icons/icon-512.png")).is_err());
    }

    #[test]
    fn test_offline_before_install_is_503() {
        let scenario = Scenario::new();
        scenario.go_offline();
        let response = scenario.navigate(&fixtures::url("/"));
        assert_status(&response, 503).unwrap();
    }
}
