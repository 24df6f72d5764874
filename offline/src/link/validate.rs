//! Field-level validation.
//!
//! Every rule is checked and every violation reported, so a form can show
//! all problems at once.

use std::fmt;

use super::{
    LinkClass, LinkFields, KEY_IPFS_HASH, KEY_MESSAGE_ID, KEY_SERIAL, KEY_TIMESTAMP,
    MESSAGE_ID_PREFIX, MIN_SERIAL_LEN,
};

/// A single violated rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Neither `serial` nor `ipfsHash` present; the link class is unknown.
    UnknownClass,
    /// A field required by the link class is absent.
    MissingField(&'static str),
    /// A field that must never appear in this link class is present.
    ForbiddenField(&'static str),
    /// Serial shorter than [`MIN_SERIAL_LEN`].
    SerialTooShort { length: usize },
    /// Message id lacks the [`MESSAGE_ID_PREFIX`].
    MessageIdPrefix,
    /// Timestamp does not parse as an integer.
    TimestampNotInteger,
    /// Content hash is empty.
    EmptyContentHash,
}

impl ValidationError {
    /// Wire name of the field the error concerns, if any.
    pub fn field(&self) -> Option<&'static str> {
        match self {
            ValidationError::UnknownClass => None,
            ValidationError::MissingField(key) | ValidationError::ForbiddenField(key) => Some(*key),
            ValidationError::SerialTooShort { .. } => Some(KEY_SERIAL),
            ValidationError::MessageIdPrefix => Some(KEY_MESSAGE_ID),
            ValidationError::TimestampNotInteger => Some(KEY_TIMESTAMP),
            ValidationError::EmptyContentHash => Some(KEY_IPFS_HASH),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::UnknownClass => write!(f, "link has neither a serial nor a content hash"),
            ValidationError::MissingField(key) => write!(f, "'{}' is required", key),
            ValidationError::ForbiddenField(key) => write!(f, "'{}' is not allowed in this link", key),
            ValidationError::SerialTooShort { length } => write!(
                f,
                "serial must be at least {} characters (got {})",
                MIN_SERIAL_LEN, length
            ),
            ValidationError::MessageIdPrefix => {
                write!(f, "messageId must start with '{}'", MESSAGE_ID_PREFIX)
            }
            ValidationError::TimestampNotInteger => write!(f, "timestamp must be an integer"),
            ValidationError::EmptyContentHash => write!(f, "ipfsHash must not be empty"),
        }
    }
}

impl std::error::Error for ValidationError {}

/// Check every rule that applies to the fields' link class.
pub fn validate(fields: &LinkFields) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    match fields.class() {
        None => errors.push(ValidationError::UnknownClass),
        Some(LinkClass::Creation) => {
            match &fields.serial {
                None => errors.push(ValidationError::MissingField(KEY_SERIAL)),
                Some(serial) => {
                    let length = serial.chars().count();
                    if length < MIN_SERIAL_LEN {
                        errors.push(ValidationError::SerialTooShort { length });
                    }
                }
            }
            check_message_id(fields, &mut errors);
            match &fields.timestamp {
                None => errors.push(ValidationError::MissingField(KEY_TIMESTAMP)),
                Some(raw) if raw.parse::<i64>().is_err() => {
                    errors.push(ValidationError::TimestampNotInteger)
                }
                Some(_) => {}
            }
        }
        Some(LinkClass::Share) => {
            if fields.serial.is_some() {
                errors.push(ValidationError::ForbiddenField(KEY_SERIAL));
            }
            if fields.timestamp.is_some() {
                errors.push(ValidationError::ForbiddenField(KEY_TIMESTAMP));
            }
            check_message_id(fields, &mut errors);
            if fields.ipfs_hash.as_deref().map_or(true, str::is_empty) {
                errors.push(ValidationError::EmptyContentHash);
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_message_id(fields: &LinkFields, errors: &mut Vec<ValidationError>) {
    match &fields.message_id {
        None => errors.push(ValidationError::MissingField(KEY_MESSAGE_ID)),
        Some(id) if !id.starts_with(MESSAGE_ID_PREFIX) => {
            errors.push(ValidationError::MessageIdPrefix)
        }
        Some(_) => {}
    }
}
