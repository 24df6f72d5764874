//! Fragment encoding and decoding of link parameters.

use url::form_urlencoded;
use url::Url;

use super::{
    CreationLink, DecodeError, LinkFields, LinkParams, ShareLink, KEY_IPFS_HASH, KEY_MESSAGE_ID,
    KEY_SERIAL, KEY_TIMESTAMP,
};

/// Decode the link parameters carried in `url`'s fragment.
pub fn decode(url: &str) -> Result<LinkParams, DecodeError> {
    let parsed = Url::parse(url).map_err(|e| DecodeError::InvalidUrl(e.to_string()))?;
    let fragment = parsed
        .fragment()
        .ok_or_else(|| DecodeError::MalformedParams(String::from("no fragment")))?;
    let pairs = fragment_pairs(fragment);

    // Contamination is judged before anything else about the fields.
    let has = |key: &str| pairs.iter().any(|(k, _)| k == key);
    if has(KEY_SERIAL) && has(KEY_IPFS_HASH) {
        return Err(DecodeError::CrossContaminated);
    }

    let fields = collect_fields(&pairs)?;
    into_params(fields)
}

/// Encode `params` as the fragment of `base`, replacing any fragment it had.
pub fn encode(params: &LinkParams, base: &Url) -> Url {
    let mut serializer = form_urlencoded::Serializer::new(String::new());
    match params {
        LinkParams::Creation(c) => {
            serializer
                .append_pair(KEY_SERIAL, &c.serial)
                .append_pair(KEY_MESSAGE_ID, &c.message_id)
                .append_pair(KEY_TIMESTAMP, &c.timestamp.to_string());
        }
        LinkParams::Share(s) => {
            serializer
                .append_pair(KEY_MESSAGE_ID, &s.message_id)
                .append_pair(KEY_IPFS_HASH, &s.content_hash);
        }
    }

    let mut url = base.clone();
    url.set_fragment(Some(&serializer.finish()));
    url
}

/// String-in, string-out form of [`encode`].
pub fn encode_str(params: &LinkParams, base: &str) -> Result<String, DecodeError> {
    let base = Url::parse(base).map_err(|e| DecodeError::InvalidUrl(e.to_string()))?;
    Ok(encode(params, &base).into())
}

/// Cheap share-link pre-check used before a full decode.
///
/// Anything carrying a content hash counts, including contaminated URLs,
/// so that they reach [`decode`] and get rejected.
pub fn looks_like_share_link(url: &str) -> bool {
    fragment_has(url, KEY_IPFS_HASH)
}

/// Cheap creation-link pre-check; never true when a content hash is present.
pub fn looks_like_creation_link(url: &str) -> bool {
    fragment_has(url, KEY_SERIAL) && !fragment_has(url, KEY_IPFS_HASH)
}

// ── Helpers ─────────────────────────────────────────────────

fn fragment_pairs(fragment: &str) -> Vec<(String, String)> {
    form_urlencoded::parse(fragment.as_bytes())
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect()
}

fn fragment_has(url: &str, key: &str) -> bool {
    match url.split_once('#') {
        Some((_, fragment)) => form_urlencoded::parse(fragment.as_bytes()).any(|(k, _)| k == key),
        None => false,
    }
}

/// Sort pairs into fields; repeated and unknown keys are malformed.
fn collect_fields(pairs: &[(String, String)]) -> Result<LinkFields, DecodeError> {
    let mut fields = LinkFields::default();
    for (key, value) in pairs {
        let slot = match key.as_str() {
            KEY_SERIAL => &mut fields.serial,
            KEY_MESSAGE_ID => &mut fields.message_id,
            KEY_TIMESTAMP => &mut fields.timestamp,
            KEY_IPFS_HASH => &mut fields.ipfs_hash,
            other => {
                return Err(DecodeError::MalformedParams(format!("unknown key '{}'", other)));
            }
        };
        if slot.is_some() {
            return Err(DecodeError::MalformedParams(format!("repeated key '{}'", key)));
        }
        *slot = Some(value.clone());
    }
    Ok(fields)
}

fn required(value: Option<String>, key: &str) -> Result<String, DecodeError> {
    match value {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(DecodeError::MalformedParams(format!("missing '{}'", key))),
    }
}

fn into_params(fields: LinkFields) -> Result<LinkParams, DecodeError> {
    if fields.serial.is_some() {
        let serial = required(fields.serial, KEY_SERIAL)?;
        let message_id = required(fields.message_id, KEY_MESSAGE_ID)?;
        let raw_timestamp = required(fields.timestamp, KEY_TIMESTAMP)?;
        let timestamp = raw_timestamp.parse::<i64>().map_err(|_| {
            DecodeError::MalformedParams(format!("timestamp '{}' is not an integer", raw_timestamp))
        })?;
        return Ok(LinkParams::Creation(CreationLink {
            serial,
            message_id,
            timestamp,
        }));
    }

    if fields.ipfs_hash.is_some() {
        if fields.timestamp.is_some() {
            return Err(DecodeError::MalformedParams(String::from(
                "'timestamp' is not a share-link parameter",
            )));
        }
        let message_id = required(fields.message_id, KEY_MESSAGE_ID)?;
        let content_hash = required(fields.ipfs_hash, KEY_IPFS_HASH)?;
        return Ok(LinkParams::Share(ShareLink {
            message_id,
            content_hash,
        }));
    }

    Err(DecodeError::MalformedParams(String::from(
        "neither 'serial' nor 'ipfsHash' present",
    )))
}
