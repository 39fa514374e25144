//! Domain error model.

use thiserror::Error;

/// Domain-level error.
///
/// Keep this focused on deterministic parsing failures. Scope resolution
/// never produces one of these: an actor that cannot be scoped simply sees
/// fewer rows.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// An identifier was invalid (non-numeric, zero or negative).
    #[error("invalid identifier: {0}")]
    InvalidId(String),

    /// A resource name did not match any known resource type.
    #[error("unknown resource type: {0}")]
    UnknownResource(String),
}

impl DomainError {
    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }

    pub fn unknown_resource(name: impl Into<String>) -> Self {
        Self::UnknownResource(name.into())
    }
}
