//! Validation of externally supplied identifiers
//!
//! Every value that ends up inside a remote command string must pass through
//! here first. `Domain` and `SiteId` can only be constructed by the
//! validators in this module, so an interpolation site that takes one of
//! these types cannot receive an unchecked string.

use std::fmt;

use serde::Serialize;

use crate::errors::OrchestratorError;

/// A validated, shell-safe domain name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Domain(String);

impl Domain {
    /// Get the domain as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A validated, shell-safe site identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct SiteId(String);

impl SiteId {
    /// Get the site id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SiteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Validate a raw domain name.
///
/// Accepts only `[A-Za-z0-9.-]`, length 3-100, no leading/trailing hyphen or
/// dot, no consecutive dots. Anything else is rejected before it can reach a
/// remote shell.
pub fn validate_domain(raw: &str) -> Result<Domain, OrchestratorError> {
    if raw.len() < 3 || raw.len() > 100 {
        return Err(OrchestratorError::ValidationError(format!(
            "Invalid domain format: must be between 3 and 100 characters, got {}",
            raw.len()
        )));
    }

    if !raw
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-')
    {
        return Err(OrchestratorError::ValidationError(
            "Invalid domain format: only alphanumeric characters, dots, and hyphens are allowed"
                .to_string(),
        ));
    }

    if raw.starts_with('-') || raw.ends_with('-') {
        return Err(OrchestratorError::ValidationError(
            "Invalid domain format: cannot start or end with a hyphen".to_string(),
        ));
    }

    if raw.starts_with('.') || raw.ends_with('.') {
        return Err(OrchestratorError::ValidationError(
            "Invalid domain format: cannot start or end with a dot".to_string(),
        ));
    }

    if raw.contains("..") {
        return Err(OrchestratorError::ValidationError(
            "Invalid domain format: cannot contain consecutive dots".to_string(),
        ));
    }

    Ok(Domain(raw.to_string()))
}

/// Validate a raw site identifier.
///
/// Site ids are opaque record-store keys: 1-64 characters of
/// `[A-Za-z0-9_-]`.
pub fn validate_site_id(raw: &str) -> Result<SiteId, OrchestratorError> {
    if raw.is_empty() || raw.len() > 64 {
        return Err(OrchestratorError::ValidationError(
            "Invalid site id: must be between 1 and 64 characters".to_string(),
        ));
    }

    if !raw
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(OrchestratorError::ValidationError(
            "Invalid site id: only alphanumeric characters, hyphens, and underscores are allowed"
                .to_string(),
        ));
    }

    Ok(SiteId(raw.to_string()))
}
