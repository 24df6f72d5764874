//! Peeble Offline - offline delivery layer for the Peeble web app
//!
//! Sits between the app and the network as its service worker:
//! - versioned static-asset caching with pruning on upgrade (`cache`)
//! - request classification and routing (`classifier`, `router`)
//! - the creation/share link protocol written to NFC tags (`link`, `nfc`)
//! - relay of share links into an already-open app window (`clients`)
//!
//! The browser environment is reached only through the host traits
//! [`Network`], [`ClientHost`], [`Clock`] and [`NfcAdapter`]. In-memory
//! implementations live in [`host`].

pub mod cache;
pub mod classifier;
pub mod clients;
pub mod config;
pub mod control;
pub mod fetch;
pub mod host;
pub mod lifecycle;
pub mod link;
pub mod nfc;
pub mod router;

pub use cache::{CacheLifecycle, CacheStorage, InstallReport, ManifestCoverage};
pub use classifier::{classify, Classification};
pub use clients::{ClientHost, ClientWindowRef, RelayMessage};
pub use config::OfflineConfig;
pub use control::ControlMessage;
pub use fetch::{Network, NetworkError, Request, Response};
pub use host::{Clock, SystemClock};
pub use link::{decode, encode, DecodeError, LinkFields, LinkParams, ValidationError};
pub use nfc::{NfcAdapter, NfcError, TagProgrammer, TagScanner};
pub use router::{RouteError, Router, RoutingDecision};
