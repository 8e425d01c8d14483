// ABOUTME: DNS name label validation for public container endpoints.
// ABOUTME: Ensures labels follow RFC 1123 label requirements.

use std::fmt;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DnsLabelError {
    #[error("DNS label cannot be empty")]
    Empty,

    #[error("DNS label exceeds maximum length of 63 characters")]
    TooLong,

    #[error("DNS label cannot start with a hyphen")]
    StartsWithHyphen,

    #[error("DNS label cannot end with a hyphen")]
    EndsWithHyphen,

    #[error("DNS label must be lowercase")]
    NotLowercase,

    #[error("invalid character in DNS label: '{0}'")]
    InvalidChar(char),
}

/// The label Azure prepends to its regional DNS zone for a public
/// container instance. Validated locally; global uniqueness is the
/// provider's to enforce.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DnsLabel(String);

impl DnsLabel {
    pub fn new(value: &str) -> Result<Self, DnsLabelError> {
        if value.is_empty() {
            return Err(DnsLabelError::Empty);
        }

        if value.len() > 63 {
            return Err(DnsLabelError::TooLong);
        }

        if value.starts_with('-') {
            return Err(DnsLabelError::StartsWithHyphen);
        }

        if value.ends_with('-') {
            return Err(DnsLabelError::EndsWithHyphen);
        }

        for c in value.chars() {
            if c.is_ascii_uppercase() {
                return Err(DnsLabelError::NotLowercase);
            }
            if !c.is_ascii_lowercase() && !c.is_ascii_digit() && c != '-' {
                return Err(DnsLabelError::InvalidChar(c));
            }
        }

        Ok(Self(value.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DnsLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
