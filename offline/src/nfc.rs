//! NFC Adapter Contract
//!
//! The hardware side lives with the host; this module owns what is written
//! to a tag and how a read is turned into link parameters.

use std::fmt;
use std::sync::mpsc::{self, Receiver};
use std::sync::Arc;

use log::{info, warn};
use url::Url;

use crate::link::{decode, encode, DecodeError, LinkParams, TagTier, ValidationError};

/// Called with the URL record of every tag read.
pub type TagUrlCallback = Box<dyn Fn(String) + Send>;

/// Called when a read fails at the adapter level.
pub type ScanErrorCallback = Box<dyn Fn(NfcError) + Send>;

/// NFC failure
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NfcError {
    /// No NFC hardware or no platform support.
    Unsupported,
    /// The user refused NFC access.
    PermissionDenied,
    /// The parameters break the link rules.
    Invalid(Vec<ValidationError>),
    /// The link URL could not be built.
    Encode(DecodeError),
    /// The URL does not fit the tag.
    TooLarge {
        tier: &'static str,
        length: usize,
        budget: usize,
    },
    /// The adapter reported a read failure.
    Read(String),
    /// The adapter reported a write failure.
    Write(String),
}

impl fmt::Display for NfcError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NfcError::Unsupported => write!(f, "NFC is not supported"),
            NfcError::PermissionDenied => write!(f, "NFC permission denied"),
            NfcError::Invalid(errors) => write!(f, "invalid link parameters ({} problems)", errors.len()),
            NfcError::Encode(e) => write!(f, "{}", e),
            NfcError::TooLarge {
                tier,
                length,
                budget,
            } => write!(f, "link is {} bytes, {} holds {}", length, tier, budget),
            NfcError::Read(reason) => write!(f, "tag read failed: {}", reason),
            NfcError::Write(reason) => write!(f, "tag write failed: {}", reason),
        }
    }
}

impl std::error::Error for NfcError {}

/// NFC hardware binding implemented by the host.
pub trait NfcAdapter: Send + Sync {
    /// Start listening for tags. Returns `false` when scanning is
    /// unavailable; neither callback is ever invoked in that case.
    fn scan(&self, on_tag_url: TagUrlCallback, on_error: ScanErrorCallback) -> bool;

    /// Write a single URL record to the tag in range.
    fn write(&self, url: &str) -> Result<(), NfcError>;
}

// ── Programming ─────────────────────────────────────────────

/// Writes creation links onto tags.
pub struct TagProgrammer {
    adapter: Arc<dyn NfcAdapter>,
    base_url: Url,
}

impl TagProgrammer {
    pub fn new(adapter: Arc<dyn NfcAdapter>, base_url: Url) -> Self {
        Self { adapter, base_url }
    }

    /// Validate, encode and write `params`; returns the URL written.
    ///
    /// Nothing reaches the adapter unless the URL fits `tier`.
    pub fn program(&self, params: &LinkParams, tier: &TagTier) -> Result<String, NfcError> {
        params.validate().map_err(NfcError::Invalid)?;

        let url: String = encode(params, &self.base_url).into();
        if !tier.fits(&url) {
            return Err(NfcError::TooLarge {
                tier: tier.name,
                length: url.len(),
                budget: tier.url_budget,
            });
        }

        self.adapter.write(&url)?;
        info!(
            "[Peeble NFC] wrote {} link {} ({} of {} bytes on {})",
            params.class(),
            params.message_id(),
            url.len(),
            tier.url_budget,
            tier.name
        );
        Ok(url)
    }
}

// ── Scanning ────────────────────────────────────────────────

/// One tag read, decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanEvent {
    /// The tag holds a valid link.
    Link { url: String, params: LinkParams },
    /// The tag holds something that is not a usable link.
    Rejected { url: String, error: DecodeError },
    /// The adapter reported a failure.
    Error(NfcError),
}

/// Turns adapter callbacks into a stream of decoded reads.
pub struct TagScanner;

impl TagScanner {
    /// Start scanning. `None` when the adapter cannot scan.
    ///
    /// Each read is decoded exactly once and sent on the returned channel.
    /// Dropping the receiver stops delivery but not the adapter.
    pub fn start(adapter: &dyn NfcAdapter) -> Option<Receiver<ScanEvent>> {
        let (tx, rx) = mpsc::channel();
        let error_tx = tx.clone();

        let on_tag_url: TagUrlCallback = Box::new(move |url| {
            let event = match decode(&url) {
                Ok(params) => ScanEvent::Link { url, params },
                Err(error) => {
                    warn!("[Peeble NFC] unusable tag: {}", error);
                    ScanEvent::Rejected { url, error }
                }
            };
            let _ = tx.send(event);
        });
        let on_error: ScanErrorCallback = Box::new(move |error| {
            warn!("[Peeble NFC] {}", error);
            let _ = error_tx.send(ScanEvent::Error(error));
        });

        if adapter.scan(on_tag_url, on_error) {
            info!("[Peeble NFC] scanning");
            Some(rx)
        } else {
            None
        }
    }
}
