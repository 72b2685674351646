//! Error types for credential objects.

use kerbcred_core::CoreError;
use thiserror::Error;

use crate::renewal::RenewalError;

/// Errors that can occur while building or using credentials.
#[derive(Debug, Error)]
pub enum CredError {
    /// The credential was destroyed.
    #[error("this {0} is no longer valid")]
    InvalidState(&'static str),

    /// Ticket renewal was refused or failed. The ticket is unchanged.
    #[error("refresh failed: {reason}")]
    RefreshFailed {
        reason: String,
        #[source]
        source: Option<RenewalError>,
    },

    /// Constructor argument rejected.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Password-based key derivation failed.
    #[error("key derivation failed: {0}")]
    KeyDerivation(String),

    /// Error from the core primitives.
    #[error(transparent)]
    Core(CoreError),
}

impl CredError {
    pub(crate) fn refresh_failed(reason: impl Into<String>) -> Self {
        CredError::RefreshFailed {
            reason: reason.into(),
            source: None,
        }
    }

    pub fn is_invalid_state(&self) -> bool {
        matches!(self, CredError::InvalidState(_))
    }
}

impl From<CoreError> for CredError {
    /// Destroyed-secret errors surface as this crate's `InvalidState` so
    /// callers match a single variant.
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::InvalidState(what) => CredError::InvalidState(what),
            other => CredError::Core(other),
        }
    }
}

/// Result type for credential operations.
pub type Result<T> = std::result::Result<T, CredError>;
