//! E2E Test: PWA Lifecycle
//!
//! Tests install → activate → upgrade across builds:
//! 1. First install creates the build's generation
//! 2. A new build installs beside it and keeps serving the old one until
//!    it activates
//! 3. Activation removes every stale cache but the dynamic one
//! 4. A restarted worker serves its generation without a network
//! 5. Control messages drive skip-waiting and version queries

#[cfg(test)]
mod tests {
    use std::sync::mpsc;

    use peeble_e2e_tests::assertions::{assert_body, assert_source};
    use peeble_e2e_tests::fixtures::{self, asset_body, config_at};
    use peeble_e2e_tests::Scenario;
    use peeble_offline::cache::GenerationState;
    use peeble_offline::control::ControlMessage;
    use peeble_offline::fetch::{Response, ResponseSource};
    use peeble_offline::lifecycle::WorkerState;

    #[test]
    fn test_first_install_and_activate() {
        let scenario = Scenario::new();
        assert_eq!(scenario.router.worker_state(), WorkerState::Parsed);

        scenario.router.install().unwrap();
        assert_eq!(scenario.router.worker_state(), WorkerState::Installed);
        assert_eq!(
            scenario.router.cache().generation_state("peeble-v3"),
            Some(GenerationState::Populated)
        );

        let deleted = scenario.router.activate().unwrap();
        assert!(deleted.is_empty());
        assert_eq!(scenario.router.worker_state(), WorkerState::Activated);
        assert_eq!(scenario.router.cache().list_generations(), vec!["peeble-v3"]);
    }

    #[test]
    fn test_upgrade_prunes_old_generation() {
        let scenario = Scenario::with_config(config_at("v2")).activated();
        let url = fixtures::url("/api/feed");
        scenario.network.serve(&url, Response::ok_with_body(b"feed".to_vec()));
        scenario.fetch(&url).unwrap();

        let scenario = scenario.upgrade(config_at("v3"));
        scenario.router.install().unwrap();
        assert_eq!(
            scenario.router.cache().list_generations(),
            vec!["peeble-v2", "peeble-v3"]
        );

        let deleted = scenario.router.activate().unwrap();
        assert_eq!(deleted, vec!["peeble-v2"]);
        assert_eq!(scenario.router.cache().list_generations(), vec!["peeble-v3"]);
        assert_eq!(
            scenario.router.cache().generation_state("peeble-v2"),
            Some(GenerationState::Deleted)
        );

        // The dynamic cache survives the upgrade.
        scenario.go_offline();
        let feed = scenario.fetch(&url).unwrap();
        assert_body(&feed, b"feed").unwrap();
        assert_source(&feed, ResponseSource::DynamicCache).unwrap();
    }

    #[test]
    fn test_old_generation_serves_until_new_one_activates() {
        let scenario = Scenario::with_config(config_at("v2")).activated();
        let scenario = scenario.upgrade(config_at("v3"));
        scenario.router.install().unwrap();
        assert_eq!(
            scenario.router.cache().generation_state("peeble-v2"),
            Some(GenerationState::Superseded)
        );

        scenario.go_offline();
        let before = scenario.fetch(&fixtures::url("/js/app.js")).unwrap();
        assert_body(&before, &asset_body("v2", "/js/app.js")).unwrap();

        scenario.router.activate().unwrap();
        let after = scenario.fetch(&fixtures::url("/js/app.js")).unwrap();
        assert_body(&after, &asset_body("v3", "/js/app.js")).unwrap();
    }

    #[test]
    fn test_restarted_worker_serves_offline() {
        let scenario = Scenario::new().activated().restart();
        scenario.go_offline();

        let response = scenario.fetch(&fixtures::url("/js/app.js")).unwrap();
        assert_body(&response, &asset_body("v3", "/js/app.js")).unwrap();
        assert_source(&response, ResponseSource::StaticCache).unwrap();

        let deleted = scenario.install_and_activate().unwrap();
        assert!(deleted.is_empty());
        let report = scenario.router.cache().coverage().unwrap();
        assert!(report.is_complete());
        let shell = scenario.navigate(&fixtures::url("/inbox"));
        assert_body(&shell, &asset_body("v3", "/index.html")).unwrap();
    }

    #[test]
    fn test_upgrade_serves_new_assets_after_activation() {
        let scenario = Scenario::with_config(config_at("v2")).activated();
        let scenario = scenario.upgrade(config_at("v3")).activated();
        scenario.go_offline();

        let response = scenario.fetch(&fixtures::url("/js/app.js")).unwrap();
        assert_body(&response, &asset_body("v3", "/js/app.js")).unwrap();
    }

    #[test]
    fn test_foreign_caches_are_removed() {
        let mut storage = peeble_offline::cache::CacheStorage::new();
        storage.open("workbox-precache");
        storage.open("peeble-v1");
        storage.open("peeble-dynamic");

        let scenario = Scenario::new();
        let router = peeble_offline::router::Router::with_storage(
            config_at("v3"),
            storage,
            scenario.network.clone(),
            scenario.clients.clone(),
            scenario.clock.clone(),
        );
        router.install().unwrap();
        let deleted = router.activate().unwrap();
        assert_eq!(deleted, vec!["peeble-v1", "workbox-precache"]);
        assert_eq!(router.cache().list_generations(), vec!["peeble-v3"]);
    }

    #[test]
    fn test_skip_waiting_message_activates_waiting_worker() {
        let scenario = Scenario::new();
        scenario.router.install().unwrap();

        let message =
            ControlMessage::from_json(&serde_json::json!({ "type": "SKIP_WAITING" }), None)
                .unwrap();
        scenario.router.handle_control(message).unwrap();
        assert_eq!(scenario.router.worker_state(), WorkerState::Activated);
    }

    #[test]
    fn test_get_version_message() {
        let scenario = Scenario::with_config(config_at("v9")).activated();
        let (tx, rx) = mpsc::channel();
        let message =
            ControlMessage::from_json(&serde_json::json!({ "type": "GET_VERSION" }), Some(tx))
                .unwrap();
        scenario.router.handle_control(message).unwrap();
        assert_eq!(rx.recv().unwrap(), "v9");
    }

    #[test]
    fn test_activation_claims_open_windows() {
        let scenario = Scenario::new();
        scenario.open_window("w1", &fixtures::url("/"));
        scenario.router.install().unwrap();
        scenario.router.activate().unwrap();
        assert_eq!(scenario.router.worker_state(), WorkerState::Activated);
        assert!(scenario.clients.get("w1").is_some_and(|w| w.controlled));
    }
}
