//! Error types for kerbcred core.

use thiserror::Error;

/// Errors raised by the core primitives.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The object was destroyed; its contents can no longer be read.
    #[error("this {0} is no longer valid")]
    InvalidState(&'static str),

    /// Wiping secret material did not complete. The object still reads
    /// as destroyed afterwards.
    #[error("destroy failed: {0}")]
    DestroyFailed(String),

    #[error("unsupported encryption type: {0}")]
    UnsupportedEncryptionType(i32),

    #[error("unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),

    #[error("invalid principal name {name:?}: {reason}")]
    InvalidPrincipal { name: String, reason: String },

    #[error("unknown principal name type: {0}")]
    UnknownNameType(i32),

    /// No realm in the name and no default realm configured.
    #[error("cannot locate default realm for {0:?}")]
    NoDefaultRealm(String),

    /// The realm-access check rejected use of a deduced realm.
    #[error("cannot read realm info: {0}")]
    RealmAccessDenied(String),
}

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
