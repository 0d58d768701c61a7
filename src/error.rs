//! Error types for Rolegate

use thiserror::Error;

use crate::service::Denial;

/// The main error type for Rolegate operations
#[derive(Debug, Error)]
pub enum RolegateError {
    /// The identity provider could not produce a principal
    #[error("identity provider failed: {0}")]
    Identity(String),

    /// The permission store could not answer
    #[error("permission store failed: {0}")]
    Store(String),

    #[error("invalid role: {0}")]
    InvalidRole(String),

    /// Malformed section, function or `Section.Function` text
    #[error("invalid identifier: {0}")]
    InvalidIdentifier(String),

    /// Raised only by the `require_*` guards
    #[error("access to {permission} denied: {reason}")]
    Forbidden { permission: String, reason: Denial },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Toml(#[from] toml::de::Error),
}

impl RolegateError {
    /// True for collaborator failures, as opposed to invalid input
    pub fn is_infrastructure(&self) -> bool {
        matches!(self, Self::Identity(_) | Self::Store(_))
    }
}

/// Result type alias for Rolegate operations
pub type Result<T> = std::result::Result<T, RolegateError>;

