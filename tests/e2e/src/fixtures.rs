//! Test fixtures and data factories
//!
//! Provides reusable asset bodies, configurations and link URLs.

use peeble_offline::config::OfflineConfig;
use peeble_offline::fetch::Response;
use peeble_offline::link::{encode_str, LinkParams};

/// Origin every scenario runs on.
pub const ORIGIN: &str = "https://peeble.app";

/// Body served for an asset path by the fixture network.
///
/// Bodies embed the build version so tests can tell generations apart.
pub fn asset_body(version: &str, path: &str) -> Vec<u8> {
    format!("{} {}", version, path).into_bytes()
}

/// 200 response for an asset path.
pub fn asset_response(version: &str, path: &str) -> Response {
    let content_type = match path.rsplit('.').next() {
        Some("css") => "text/css",
        Some("js") => "application/javascript",
        Some("json") => "application/manifest+json",
        Some("png") => "image/png",
        _ => "text/html",
    };
    Response::ok_with_body(asset_body(version, path)).with_header("Content-Type", content_type)
}

/// The shipped configuration at another cache version.
pub fn config_at(version: &str) -> OfflineConfig {
    OfflineConfig {
        cache_version: version.to_string(),
        ..OfflineConfig::default()
    }
}

/// Absolute URL of a path on [`ORIGIN`].
pub fn url(path: &str) -> String {
    format!("{}{}", ORIGIN, path)
}

/// A valid share link on the app root.
pub fn share_link(message_id: &str, hash: &str) -> String {
    encode_str(&LinkParams::share(message_id, hash), &url("/")).unwrap_or_default()
}

/// A valid creation link on the app root.
pub fn creation_link(serial: &str, message_id: &str, timestamp: i64) -> String {
    encode_str(&LinkParams::creation(serial, message_id, timestamp), &url("/"))
        .unwrap_or_default()
}

/// A link carrying both a serial and a content hash.
pub fn contaminated_link() -> String {
    url("/#serial=04A1B2C3D4&messageId=PBL-7&timestamp=1700000000&ipfsHash=bafyevil")
}
