//! peeble-link: host-side tooling for the Peeble link protocol.
//!
//! Used when programming tags and when debugging share links: encodes and
//! decodes link URLs, validates raw fields, and checks tag capacity.

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod output;
