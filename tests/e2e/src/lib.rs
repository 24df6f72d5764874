//! Peeble End-to-End Testing Framework
//!
//! Drives the offline layer the way a browser would: a worker is installed
//! and activated against an in-memory network, windows come and go, and
//! navigations and fetches are replayed against the router.
//!
//! - [`harness`]: the [`Scenario`] driver
//! - [`fixtures`]: asset bodies and link URLs
//! - [`assertions`]: response and relay checks

pub mod assertions;
pub mod fixtures;
pub mod harness;

pub use harness::Scenario;
