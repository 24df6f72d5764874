use std::path::PathBuf;
use std::process::ExitCode;

use peeble_offline::link::DecodeError;

/// All errors produced by peeble-link.
///
/// Variants are split into two categories:
/// - **Infrastructure errors** (exit code 2): bad config, bad base URL, I/O failures
/// - **Operational errors** (exit code 1): the link itself is unusable
#[derive(thiserror::Error, Debug)]
pub enum PeebleLinkError {
    // ── Infrastructure errors (exit code 2) ──────────────────────────

    #[error("Config file not found: {path}")]
    ConfigNotFound { path: PathBuf },

    #[error("Config parse error: {0}")]
    ConfigParseError(String),

    #[error("Invalid base URL {url}: {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // ── Operational errors (exit code 1) ─────────────────────────────

    #[error("{0}")]
    Decode(#[from] DecodeError),

    #[error("Validation failed: {count} problem(s): {details}")]
    ValidationFailed { count: usize, details: String },

    #[error("Link is {length} bytes, {tier} holds {budget}")]
    TooLarge {
        tier: String,
        length: usize,
        budget: usize,
    },

    #[error("Unknown tag tier: {name}")]
    UnknownTier { name: String },
}

impl PeebleLinkError {
    /// Map each error variant to its process exit code.
    ///
    /// - `2`: infrastructure error (bad config, I/O)
    /// - `1`: operational failure (the link does not decode, validate or fit)
    pub fn exit_code(&self) -> ExitCode {
        ExitCode::from(self.exit_code_num())
    }

    /// Raw numeric form of [`exit_code`](Self::exit_code).
    pub fn exit_code_num(&self) -> u8 {
        match self {
            // Infrastructure errors → 2
            Self::ConfigNotFound { .. }
            | Self::ConfigParseError(_)
            | Self::InvalidBaseUrl { .. }
            | Self::Io(_)
            | Self::Json(_) => 2,

            // Operational errors → 1
            Self::Decode(_)
            | Self::ValidationFailed { .. }
            | Self::TooLarge { .. }
            | Self::UnknownTier { .. } => 1,
        }
    }
}
