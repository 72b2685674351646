//! Error types for the kerbcred facade.

use kerbcred_core::CoreError;
use kerbcred_creds::CredError;
use kerbcred_keytab::KeytabError;
use kerbcred_perms::PermsError;
use thiserror::Error;

/// Errors surfaced by the facade.
#[derive(Debug, Error)]
pub enum KerbError {
    /// Principal, secret, or encryption type error.
    #[error("core error: {0}")]
    Core(#[from] CoreError),

    /// Permission parsing or authorization error.
    #[error("permission error: {0}")]
    Permission(#[from] PermsError),

    /// Credential error.
    #[error("credential error: {0}")]
    Credential(#[from] CredError),

    /// Keytab error.
    #[error("keytab error: {0}")]
    Keytab(#[from] KeytabError),

    /// Configuration could not be read or parsed.
    #[error("configuration error: {0}")]
    Config(String),

    /// The subject was frozen with `set_read_only`.
    #[error("subject is read-only")]
    ReadOnlySubject,

    /// Destroying one or more credentials failed.
    #[error("failed to destroy {failed} of {total} credentials")]
    DestroyFailed { failed: usize, total: usize },
}

impl KerbError {
    /// Whether the error reports use of a destroyed credential.
    pub fn is_invalid_state(&self) -> bool {
        matches!(
            self,
            KerbError::Core(CoreError::InvalidState(_)) | KerbError::Credential(CredError::InvalidState(_))
        )
    }

    /// Whether the error is an authorization denial.
    pub fn is_access_denied(&self) -> bool {
        matches!(
            self,
            KerbError::Permission(PermsError::AccessDenied(_)) | KerbError::Core(CoreError::RealmAccessDenied(_))
        )
    }
}

/// Result type for facade operations.
pub type Result<T> = std::result::Result<T, KerbError>;
