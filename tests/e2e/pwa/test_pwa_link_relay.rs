//! E2E Test: Share Link Relay
//!
//! Tests that opening a share link while the app is already open hands the
//! link to that window instead of opening a second one:
//! 1. Open an app window
//! 2. Navigate to a share link
//! 3. Verify the navigation yields only 204 and the window got the link
//! 4. Verify unsafe links never reach a window

#[cfg(test)]
mod tests {
    use peeble_e2e_tests::assertions::{
        assert_body, assert_nothing_relayed, assert_relayed, assert_status,
    };
    use peeble_e2e_tests::fixtures::{self, asset_body};
    use peeble_e2e_tests::harness::START_MILLIS;
    use peeble_e2e_tests::Scenario;
    use peeble_offline::clients::RelayMessage;
    use peeble_offline::link::LinkParams;

    #[test]
    fn test_share_link_relayed_to_open_window() {
        let scenario = Scenario::new().activated();
        scenario.open_window("w1", &fixtures::url("/"));
        scenario.advance(250);

        let link = fixtures::share_link("PBL-42", "bafyshare");
        let response = scenario.navigate(&link);

        assert_status(&response, 204).unwrap();
        assert!(response.body.is_empty());
        assert_relayed(&scenario.clients, "w1", 1, "PEEBLE_SHARE_LINK").unwrap();
        assert_eq!(scenario.clients.focused(), vec!["w1".to_string()]);

        let message: RelayMessage =
            serde_json::from_value(scenario.clients.messages_for("w1")[0].clone()).unwrap();
        assert_eq!(message.params, LinkParams::share("PBL-42", "bafyshare"));
        assert_eq!(message.url, link);
        assert_eq!(message.timestamp, START_MILLIS + 250);
    }

    #[test]
    fn test_relay_works_offline() {
        let scenario = Scenario::new().activated();
        scenario.open_window("w1", &fixtures::url("/index.html"));
        scenario.go_offline();

        let response = scenario.navigate(&fixtures::share_link("PBL-1", "bafy1"));
        assert_status(&response, 204).unwrap();
        assert_relayed(&scenario.clients, "w1", 1, "PEEBLE_SHARE_LINK").unwrap();
    }

    #[test]
    fn test_first_matching_window_wins() {
        let scenario = Scenario::new().activated();
        scenario.open_window("settings", &fixtures::url("/settings"));
        scenario.open_window("other-site", "https://elsewhere.example/");
        scenario.open_window("app-a", &fixtures::url("/"));
        scenario.open_window("app-b", &fixtures::url("/"));

        scenario.navigate(&fixtures::share_link("PBL-5", "bafy5"));
        assert_relayed(&scenario.clients, "app-a", 1, "PEEBLE_SHARE_LINK").unwrap();
        assert_nothing_relayed(&scenario.clients, &["settings", "other-site", "app-b"]).unwrap();
    }

    #[test]
    fn test_no_window_opens_app_shell_once() {
        let scenario = Scenario::new().activated();
        scenario.open_window("settings", &fixtures::url("/settings"));

        let response = scenario.navigate(&fixtures::share_link("PBL-5", "bafy5"));
        assert_status(&response, 200).unwrap();
        assert_body(&response, &asset_body("v3", "/index.html")).unwrap();
        assert_nothing_relayed(&scenario.clients, &["settings"]).unwrap();
    }

    #[test]
    fn test_closed_window_falls_back_to_app_shell() {
        let scenario = Scenario::new().activated();
        scenario.open_window("w1", &fixtures::url("/"));
        scenario.close_window("w1");

        let response = scenario.navigate(&fixtures::share_link("PBL-5", "bafy5"));
        assert_status(&response, 200).unwrap();
    }

    #[test]
    fn test_contaminated_link_rejected_not_relayed() {
        let scenario = Scenario::new().activated();
        scenario.open_window("w1", &fixtures::url("/"));

        let response = scenario.navigate(&fixtures::contaminated_link());
        assert_status(&response, 400).unwrap();
        assert_nothing_relayed(&scenario.clients, &["w1"]).unwrap();
        assert!(scenario.clients.focused().is_empty());
    }

    #[test]
    fn test_invalid_share_link_rejected() {
        let scenario = Scenario::new().activated();
        scenario.open_window("w1", &fixtures::url("/"));

        let response = scenario.navigate(&fixtures::url("/#messageId=NOPE&ipfsHash=bafy"));
        assert_status(&response, 400).unwrap();
        assert!(String::from_utf8_lossy(&response.body).contains("messageId"));
        assert_nothing_relayed(&scenario.clients, &["w1"]).unwrap();
    }

    #[test]
    fn test_creation_link_is_not_relayed() {
        let scenario = Scenario::new().activated();
        scenario.open_window("w1", &fixtures::url("/"));

        let response =
            scenario.navigate(&fixtures::creation_link("04A1B2C3D4", "PBL-9", 1_700_000_000));
        assert_status(&response, 200).unwrap();
        assert_body(&response, &asset_body("v3", "/")).unwrap();
        assert_nothing_relayed(&scenario.clients, &["w1"]).unwrap();
    }
}
