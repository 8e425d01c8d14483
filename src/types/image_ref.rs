// ABOUTME: Container image reference parsing and registry composition.
// ABOUTME: Handles formats like app, app:tag, registry.example/app:tag.

use std::fmt;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ParseImageRefError {
    #[error("image reference cannot be empty")]
    Empty,

    #[error("invalid character in image reference: {0}")]
    InvalidChar(char),
}

/// A container image reference: optional registry address, name, tag.
///
/// The local reference from configuration has no registry; the reference
/// pushed to ACR is derived from it with [`ImageRef::in_registry`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRef {
    registry: Option<String>,
    name: String,
    tag: String,
}

impl ImageRef {
    pub fn parse(input: &str) -> Result<Self, ParseImageRefError> {
        let input = input.trim();
        if input.is_empty() {
            return Err(ParseImageRefError::Empty);
        }

        for c in input.chars() {
            if !c.is_ascii_alphanumeric() && c != '/' && c != ':' && c != '.' && c != '-' && c != '_'
            {
                return Err(ParseImageRefError::InvalidChar(c));
            }
        }

        // Split off the tag if present. A colon followed by a slash belongs
        // to a registry port, not a tag.
        let (without_tag, tag) = match input.rsplit_once(':') {
            Some((before, after)) if !after.contains('/') => (before, after.to_string()),
            _ => (input, "latest".to_string()),
        };

        let (registry, name) = Self::split_registry(without_tag);

        Ok(Self { registry, name, tag })
    }

    /// A registry is present if the first path component contains a dot or
    /// colon, or is "localhost".
    fn split_registry(input: &str) -> (Option<String>, String) {
        match input.split_once('/') {
            Some((first, rest))
                if first.contains('.') || first.contains(':') || first == "localhost" =>
            {
                (Some(first.to_string()), rest.to_string())
            }
            _ => (None, input.to_string()),
        }
    }

    /// Derive the reference for this image inside the given registry.
    ///
    /// The address is taken verbatim: no case folding, no trimming of
    /// trailing slashes. The result renders as exactly `{address}/{name}:{tag}`.
    pub fn in_registry(&self, address: &str) -> ImageRef {
        ImageRef {
            registry: Some(address.to_string()),
            name: self.name.clone(),
            tag: self.tag.clone(),
        }
    }

    pub fn registry(&self) -> Option<&str> {
        self.registry.as_deref()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }
}

impl fmt::Display for ImageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(ref registry) = self.registry {
            write!(f, "{}/", registry)?;
        }
        write!(f, "{}:{}", self.name, self.tag)
    }
}
