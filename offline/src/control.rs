//! Control Channel
//!
//! Messages the application posts into the worker. The wire form is a JSON
//! object tagged by `type`:
//!
//! ```json
//! { "type": "SKIP_WAITING" }
//! { "type": "GET_VERSION" }
//! { "type": "CACHE_URLS", "urls": ["/audio/1.webm"] }
//! ```
//!
//! `GET_VERSION` is answered on the reply channel the host hands over with
//! the message (the message port, in a browser).

use std::fmt;
use std::sync::mpsc::Sender;

use serde::Deserialize;

use crate::fetch::Response;

/// A control message.
#[derive(Debug)]
pub enum ControlMessage {
    /// Activate a waiting worker now.
    SkipWaiting,
    /// Report the cache version on `reply`.
    GetVersion { reply: Sender<String> },
    /// Fetch these URLs and keep them in the dynamic cache.
    CacheUrls { urls: Vec<String> },
    /// Store a response the application already holds.
    Prewarm { url: String, response: Response },
}

/// Wire form
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
enum WireMessage {
    SkipWaiting,
    GetVersion,
    CacheUrls {
        #[serde(default)]
        urls: Vec<String>,
    },
}

/// Control message parse error
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlError {
    /// Not a known control message.
    Malformed(String),
    /// `GET_VERSION` arrived without a reply channel.
    MissingReplyChannel,
}

impl fmt::Display for ControlError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ControlError::Malformed(reason) => write!(f, "malformed control message: {}", reason),
            ControlError::MissingReplyChannel => write!(f, "GET_VERSION needs a reply channel"),
        }
    }
}

impl std::error::Error for ControlError {}

impl ControlMessage {
    /// Parse the wire form. `reply` is only consumed by `GET_VERSION`.
    pub fn from_json(
        value: &serde_json::Value,
        reply: Option<Sender<String>>,
    ) -> Result<Self, ControlError> {
        let wire = WireMessage::deserialize(value)
            .map_err(|e| ControlError::Malformed(e.to_string()))?;
        Ok(match wire {
            WireMessage::SkipWaiting => ControlMessage::SkipWaiting,
            WireMessage::GetVersion => ControlMessage::GetVersion {
                reply: reply.ok_or(ControlError::MissingReplyChannel)?,
            },
            WireMessage::CacheUrls { urls } => ControlMessage::CacheUrls { urls },
        })
    }

    /// Wire name of the message type.
    pub fn kind(&self) -> &'static str {
        match self {
            ControlMessage::SkipWaiting => "SKIP_WAITING",
            ControlMessage::GetVersion { .. } => "GET_VERSION",
            ControlMessage::CacheUrls { .. } => "CACHE_URLS",
            ControlMessage::Prewarm { .. } => "PREWARM",
        }
    }
}
