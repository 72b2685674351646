//! Error types for keytab access.

use thiserror::Error;

/// Errors raised while taking a keytab snapshot.
///
/// [`KeyTab::keys`](crate::KeyTab::keys) absorbs these; they surface only
/// from the sources themselves.
#[derive(Debug, Error)]
pub enum KeytabError {
    /// Reading the keytab failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The keytab contents could not be decoded.
    #[error("malformed keytab: {0}")]
    Decode(String),

    /// Encoding a keytab export failed.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// The source cannot produce a snapshot right now.
    #[error("keytab unavailable: {0}")]
    Unavailable(String),
}

/// Result type for keytab operations.
pub type Result<T> = std::result::Result<T, KeytabError>;
