//! Subcommand handlers.
//!
//! Each handler returns a serialisable report; `main` picks the output
//! format and the exit code.

use std::collections::BTreeMap;

use serde::Serialize;

use peeble_offline::link::{
    self, classify_capacity, smallest_fitting_tier, tier_by_name, LinkClass, LinkFields,
    LinkParams, ValidationError, TAG_TIERS,
};
use peeble_offline::OfflineConfig;

use crate::cli::{EncodeArgs, EncodeLink, ValidateArgs};
use crate::error::PeebleLinkError;

// ── Reports ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct EncodeReport {
    pub url: String,
    pub class: LinkClass,
    pub length: usize,
    pub capacity: BTreeMap<&'static str, bool>,
    pub smallest_tier: Option<&'static str>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct DecodeReport {
    pub class: LinkClass,
    pub params: LinkParams,
    pub valid: bool,
    pub problems: Vec<Problem>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Problem {
    pub field: Option<&'static str>,
    pub message: String,
}

impl From<&ValidationError> for Problem {
    fn from(error: &ValidationError) -> Self {
        Self {
            field: error.field(),
            message: error.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ValidateReport {
    pub class: Option<LinkClass>,
    pub valid: bool,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct TierFit {
    pub name: &'static str,
    pub budget: usize,
    pub fits: bool,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct CapacityReport {
    pub url: String,
    pub length: usize,
    pub tiers: Vec<TierFit>,
    pub smallest_tier: Option<&'static str>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ManifestReport {
    pub generation: String,
    pub dynamic_cache: String,
    pub app_shell: String,
    pub assets: Vec<String>,
}

// ── Handlers ─────────────────────────────────────────────────────────

/// `encode`: validate, build the URL, and size it.
pub fn encode(config: &OfflineConfig, args: &EncodeArgs) -> Result<EncodeReport, PeebleLinkError> {
    let params = match &args.link {
        EncodeLink::Creation {
            serial,
            message_id,
            timestamp,
        } => LinkParams::creation(serial.as_str(), message_id.as_str(), *timestamp),
        EncodeLink::Share {
            message_id,
            ipfs_hash,
        } => LinkParams::share(message_id.as_str(), ipfs_hash.as_str()),
    };
    params.validate().map_err(|errors| validation_failed(&errors))?;

    let base = match &args.base {
        Some(base) => base.clone(),
        None => config
            .base_url()
            .map_err(|e| PeebleLinkError::InvalidBaseUrl {
                url: config.origin.clone(),
                reason: e.to_string(),
            })?
            .into(),
    };
    let url = link::encode_str(&params, &base).map_err(|e| PeebleLinkError::InvalidBaseUrl {
        url: base.clone(),
        reason: e.to_string(),
    })?;

    if let Some(name) = &args.tier {
        let tier = tier_by_name(name).ok_or_else(|| PeebleLinkError::UnknownTier {
            name: name.clone(),
        })?;
        if !tier.fits(&url) {
            return Err(PeebleLinkError::TooLarge {
                tier: tier.name.to_string(),
                length: url.len(),
                budget: tier.url_budget,
            });
        }
    }

    log::info!("encoded {} link {}", params.class(), params.message_id());
    Ok(EncodeReport {
        class: params.class(),
        length: url.len(),
        capacity: classify_capacity(&url),
        smallest_tier: smallest_fitting_tier(&url).map(|t| t.name),
        url,
    })
}

/// `decode`: decode a URL and report whether the result passes validation.
pub fn decode(url: &str) -> Result<DecodeReport, PeebleLinkError> {
    let params = link::decode(url)?;
    let problems: Vec<Problem> = match params.validate() {
        Ok(()) => Vec::new(),
        Err(errors) => errors.iter().map(Problem::from).collect(),
    };
    Ok(DecodeReport {
        class: params.class(),
        valid: problems.is_empty(),
        params,
        problems,
    })
}

/// `validate`: check raw fields; every problem is reported at once.
pub fn validate(args: &ValidateArgs) -> Result<ValidateReport, PeebleLinkError> {
    let fields = LinkFields {
        serial: args.serial.clone(),
        message_id: args.message_id.clone(),
        timestamp: args.timestamp.clone(),
        ipfs_hash: args.ipfs_hash.clone(),
    };
    link::validate(&fields).map_err(|errors| validation_failed(&errors))?;
    Ok(ValidateReport {
        class: fields.class(),
        valid: true,
    })
}

/// `capacity`: fit of a URL against every tag tier.
pub fn capacity(url: &str) -> CapacityReport {
    CapacityReport {
        url: url.to_string(),
        length: url.len(),
        tiers: TAG_TIERS
            .iter()
            .map(|tier| TierFit {
                name: tier.name,
                budget: tier.url_budget,
                fits: tier.fits(url),
            })
            .collect(),
        smallest_tier: smallest_fitting_tier(url).map(|t| t.name),
    }
}

/// `manifest`: the cache generation and the absolute asset URLs it holds.
pub fn manifest(config: &OfflineConfig) -> Result<ManifestReport, PeebleLinkError> {
    let invalid = |e: url::ParseError| PeebleLinkError::InvalidBaseUrl {
        url: config.origin.clone(),
        reason: e.to_string(),
    };
    let assets = config
        .static_assets
        .iter()
        .map(|path| config.resolve(path).map(String::from).map_err(invalid))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(ManifestReport {
        generation: config.generation_name(),
        dynamic_cache: config.dynamic_cache_name.clone(),
        app_shell: config.app_shell_url().map_err(invalid)?.into(),
        assets,
    })
}

fn validation_failed(errors: &[ValidationError]) -> PeebleLinkError {
    let details = errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ");
    PeebleLinkError::ValidationFailed {
        count: errors.len(),
        details,
    }
}
