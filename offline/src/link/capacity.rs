//! Physical tag capacity tiers.
//!
//! Budgets are in URL bytes: the tag's user memory minus the NDEF TLV and
//! URI record framing. Records whose payload exceeds 255 bytes need the long
//! record form and a three-byte TLV length, hence the larger overhead on the
//! bigger tags.

use std::collections::BTreeMap;

/// Framing bytes for a short NDEF URI record: TLV tag + length, record
/// header, type length, payload length, type `U`, URI identifier code.
const SHORT_RECORD_OVERHEAD: usize = 7;

/// Framing bytes for a long record: four-byte payload length and
/// three-byte TLV length.
const LONG_RECORD_OVERHEAD: usize = 12;

/// An NFC tag capacity tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TagTier {
    /// Tier name as shown to users.
    pub name: &'static str,
    /// User memory in bytes.
    pub user_memory: usize,
    /// Longest URL, in bytes, that fits.
    pub url_budget: usize,
}

impl TagTier {
    /// Whether `url` fits on this tier.
    pub fn fits(&self, url: &str) -> bool {
        url.len() <= self.url_budget
    }
}

/// NTAG213, 144 bytes of user memory.
pub const NTAG213: TagTier = TagTier {
    name: "ntag213",
    user_memory: 144,
    url_budget: 144 - SHORT_RECORD_OVERHEAD,
};

/// NTAG215, 504 bytes of user memory.
pub const NTAG215: TagTier = TagTier {
    name: "ntag215",
    user_memory: 504,
    url_budget: 504 - LONG_RECORD_OVERHEAD,
};

/// NTAG216, 888 bytes of user memory.
pub const NTAG216: TagTier = TagTier {
    name: "ntag216",
    user_memory: 888,
    url_budget: 888 - LONG_RECORD_OVERHEAD,
};

/// All tiers, smallest first.
pub const TAG_TIERS: [TagTier; 3] = [NTAG213, NTAG215, NTAG216];

/// Fit of `url` against every tier, keyed by tier name.
pub fn classify_capacity(url: &str) -> BTreeMap<&'static str, bool> {
    TAG_TIERS.iter().map(|tier| (tier.name, tier.fits(url))).collect()
}

/// The smallest tier `url` fits on.
pub fn smallest_fitting_tier(url: &str) -> Option<&'static TagTier> {
    TAG_TIERS.iter().find(|tier| tier.fits(url))
}

/// Look a tier up by name (case-insensitive).
pub fn tier_by_name(name: &str) -> Option<&'static TagTier> {
    TAG_TIERS.iter().find(|tier| tier.name.eq_ignore_ascii_case(name))
}
