//! Error types for the permissions module.

use thiserror::Error;

/// Errors that can occur during permission operations.
#[derive(Debug, Error)]
pub enum PermsError {
    /// Action string is not a comma list of `initiate`/`accept`, or `-`.
    #[error("invalid permission actions: {0:?}")]
    MalformedAction(String),

    /// Delegation target is not of the form `"subordinate" "service"`.
    #[error("invalid delegation target {target:?}: {reason}")]
    MalformedTarget { target: String, reason: String },

    /// Permission name is empty.
    #[error("permission name cannot be empty")]
    EmptyName,

    /// Permission of the wrong kind given to a kind-specific collection.
    #[error("cannot add a {found} permission to a {expected} permission collection")]
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },

    /// Collection was frozen with `set_read_only`.
    #[error("attempt to add a permission to a read-only permission collection")]
    ReadOnly,

    /// The authorization policy does not grant the permission.
    #[error("access denied: {0}")]
    AccessDenied(String),

    /// Wire record version not understood.
    #[error("unsupported permission record version: {0}")]
    UnsupportedVersion(u8),

    /// Serialization error.
    #[error("serialization error: {0}")]
    SerializationError(String),
}

/// Result type for permission operations.
pub type Result<T> = std::result::Result<T, PermsError>;
