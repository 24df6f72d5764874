//! Link Protocol
//!
//! The two deep-link classes the app understands, carried as
//! form-encoded key/value pairs in the URL fragment:
//!
//! - creation links, written to NFC tags: `#serial=..&messageId=..&timestamp=..`
//! - share links, sent digitally: `#messageId=..&ipfsHash=..`
//!
//! A creation tag's physical serial must never be learnable from a shared
//! link, so any URL mixing `serial` with `ipfsHash` is rejected outright.

mod capacity;
mod codec;
mod validate;

pub use capacity::*;
pub use codec::*;
pub use validate::*;

use std::fmt;

use serde::{Deserialize, Serialize};

// ── Wire keys ───────────────────────────────────────────────

/// Physical tag serial (creation links only).
pub const KEY_SERIAL: &str = "serial";
/// Message identifier (both classes).
pub const KEY_MESSAGE_ID: &str = "messageId";
/// Programming timestamp, epoch seconds (creation links only).
pub const KEY_TIMESTAMP: &str = "timestamp";
/// Content hash of the shared payload (share links only).
pub const KEY_IPFS_HASH: &str = "ipfsHash";

/// Every message id starts with this literal.
pub const MESSAGE_ID_PREFIX: &str = "PBL-";

/// Minimum tag serial length.
pub const MIN_SERIAL_LEN: usize = 8;

// ── Types ───────────────────────────────────────────────────

/// Which of the two link variants a URL represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkClass {
    Creation,
    Share,
}

impl LinkClass {
    /// Message-type tag used when relaying this class to an open window.
    pub fn message_type(&self) -> &'static str {
        match self {
            LinkClass::Creation => "PEEBLE_CREATION_LINK",
            LinkClass::Share => "PEEBLE_SHARE_LINK",
        }
    }
}

impl fmt::Display for LinkClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LinkClass::Creation => write!(f, "creation"),
            LinkClass::Share => write!(f, "share"),
        }
    }
}

/// Parameters of a link programmed onto a physical tag.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreationLink {
    pub serial: String,
    pub message_id: String,
    pub timestamp: i64,
}

/// Parameters of a digitally shared, content-addressed message.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ShareLink {
    #[serde(rename = "messageId")]
    pub message_id: String,
    #[serde(rename = "ipfsHash")]
    pub content_hash: String,
}

/// Decoded link parameters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "class", rename_all = "lowercase")]
pub enum LinkParams {
    Creation(CreationLink),
    Share(ShareLink),
}

impl LinkParams {
    /// Build creation-link parameters.
    pub fn creation(serial: impl Into<String>, message_id: impl Into<String>, timestamp: i64) -> Self {
        LinkParams::Creation(CreationLink {
            serial: serial.into(),
            message_id: message_id.into(),
            timestamp,
        })
    }

    /// Build share-link parameters.
    pub fn share(message_id: impl Into<String>, content_hash: impl Into<String>) -> Self {
        LinkParams::Share(ShareLink {
            message_id: message_id.into(),
            content_hash: content_hash.into(),
        })
    }

    /// Link class of these parameters.
    pub fn class(&self) -> LinkClass {
        match self {
            LinkParams::Creation(_) => LinkClass::Creation,
            LinkParams::Share(_) => LinkClass::Share,
        }
    }

    /// Message id, common to both classes.
    pub fn message_id(&self) -> &str {
        match self {
            LinkParams::Creation(c) => &c.message_id,
            LinkParams::Share(s) => &s.message_id,
        }
    }

    /// Run every validation rule against these parameters.
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        validate(&LinkFields::from(self))
    }
}

/// Raw, string-typed view of the fragment parameters.
///
/// Validation runs on this view so that a timestamp that is not an integer
/// can be reported together with every other problem.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkFields {
    pub serial: Option<String>,
    pub message_id: Option<String>,
    pub timestamp: Option<String>,
    pub ipfs_hash: Option<String>,
}

impl LinkFields {
    /// Creation-link field set.
    pub fn creation(serial: &str, message_id: &str, timestamp: &str) -> Self {
        Self {
            serial: Some(serial.to_string()),
            message_id: Some(message_id.to_string()),
            timestamp: Some(timestamp.to_string()),
            ipfs_hash: None,
        }
    }

    /// Share-link field set.
    pub fn share(message_id: &str, ipfs_hash: &str) -> Self {
        Self {
            serial: None,
            message_id: Some(message_id.to_string()),
            timestamp: None,
            ipfs_hash: Some(ipfs_hash.to_string()),
        }
    }

    /// Link class implied by the fields present, if any.
    ///
    /// `ipfsHash` wins, so a contaminated set is judged by share-link rules
    /// and its `serial` reported as forbidden.
    pub fn class(&self) -> Option<LinkClass> {
        if self.ipfs_hash.is_some() {
            Some(LinkClass::Share)
        } else if self.serial.is_some() || self.timestamp.is_some() {
            Some(LinkClass::Creation)
        } else {
            None
        }
    }
}

impl From<&LinkParams> for LinkFields {
    fn from(params: &LinkParams) -> Self {
        match params {
            LinkParams::Creation(c) => Self {
                serial: Some(c.serial.clone()),
                message_id: Some(c.message_id.clone()),
                timestamp: Some(c.timestamp.to_string()),
                ipfs_hash: None,
            },
            LinkParams::Share(s) => Self {
                serial: None,
                message_id: Some(s.message_id.clone()),
                timestamp: None,
                ipfs_hash: Some(s.content_hash.clone()),
            },
        }
    }
}

// ── Errors ──────────────────────────────────────────────────

/// Failure to decode a link URL. Always user-visible; never repaired.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// The URL itself does not parse.
    InvalidUrl(String),
    /// Required fields absent, unexpected keys, or an unparseable value.
    MalformedParams(String),
    /// `serial` and `ipfsHash` appear together.
    CrossContaminated,
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeError::InvalidUrl(reason) => write!(f, "invalid link URL: {}", reason),
            DecodeError::MalformedParams(reason) => write!(f, "malformed link parameters: {}", reason),
            DecodeError::CrossContaminated => {
                write!(f, "link mixes creation and share parameters (serial with ipfsHash)")
            }
        }
    }
}

impl std::error::Error for DecodeError {}
