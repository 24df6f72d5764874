use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::output::OutputFormat;

/// Encode, decode, validate and size Peeble tag and share links.
#[derive(Parser, Debug)]
#[command(name = "peeble-link", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Output format for all subcommands.
    #[arg(long, value_enum, default_value = "human", global = true)]
    pub output: OutputFormat,

    /// TOML file overriding the built-in offline configuration.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Build a link URL from its parameters.
    Encode(EncodeArgs),

    /// Decode the parameters carried by a link URL.
    Decode(UrlArg),

    /// Check raw link fields and list every problem.
    Validate(ValidateArgs),

    /// Show which tag tiers a URL fits on.
    Capacity(UrlArg),

    /// Show the cache generation and asset manifest of the configuration.
    Manifest,
}

// ── Shared argument structs ──────────────────────────────────────────

/// Argument struct for subcommands that only need a URL.
#[derive(clap::Args, Debug)]
pub struct UrlArg {
    /// Link URL.
    pub url: String,
}

// ── encode ───────────────────────────────────────────────────────────

#[derive(clap::Args, Debug)]
pub struct EncodeArgs {
    #[command(subcommand)]
    pub link: EncodeLink,

    /// Base URL (origin + path); defaults to the configured app URL.
    #[arg(long)]
    pub base: Option<String>,

    /// Fail unless the link fits this tag tier (e.g. `ntag213`).
    #[arg(long)]
    pub tier: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum EncodeLink {
    /// Creation link, written to a tag when it is programmed.
    Creation {
        /// Tag serial number.
        #[arg(long)]
        serial: String,
        /// Message id (`PBL-` prefix).
        #[arg(long)]
        message_id: String,
        /// Creation time, epoch seconds.
        #[arg(long, allow_hyphen_values = true)]
        timestamp: i64,
    },
    /// Share link, referencing content by hash.
    Share {
        /// Message id (`PBL-` prefix).
        #[arg(long)]
        message_id: String,
        /// Content hash.
        #[arg(long)]
        ipfs_hash: String,
    },
}

// ── validate ─────────────────────────────────────────────────────────

#[derive(clap::Args, Debug)]
pub struct ValidateArgs {
    #[arg(long)]
    pub serial: Option<String>,
    #[arg(long)]
    pub message_id: Option<String>,
    /// Kept as text so a non-integer value is reported, not rejected by the parser.
    #[arg(long, allow_hyphen_values = true)]
    pub timestamp: Option<String>,
    #[arg(long)]
    pub ipfs_hash: Option<String>,
}
