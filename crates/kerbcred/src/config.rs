//! Credential configuration.

use std::path::{Path, PathBuf};

use kerbcred_core::Realm;
use kerbcred_keytab::FileKeytabSource;
use serde::{Deserialize, Serialize};

use crate::error::{KerbError, Result};

/// Settings consumed when resolving principals and locating keytabs.
///
/// ```json
/// {
///   "default_realm": "EXAMPLE.COM",
///   "default_keytab": "/etc/krb5.keytab.cbor",
///   "check_realm_access": true
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CredentialConfig {
    /// Realm applied to principal names written without one.
    pub default_realm: Option<String>,
    /// Keytab used when none is named explicitly.
    pub default_keytab: Option<PathBuf>,
    /// Require `ServicePermission("@REALM", "-")` before a deduced default
    /// realm is revealed.
    pub check_realm_access: bool,
}

impl Default for CredentialConfig {
    fn default() -> Self {
        Self {
            default_realm: None,
            default_keytab: None,
            check_realm_access: true,
        }
    }
}

impl CredentialConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| KerbError::Config(e.to_string()))
    }

    /// Read a JSON configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|e| KerbError::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_json(&json)
    }

    /// The configured default realm, validated.
    pub fn default_realm(&self) -> Result<Option<Realm>> {
        self.default_realm
            .as_deref()
            .map(Realm::new)
            .transpose()
            .map_err(KerbError::from)
    }

    /// A CBOR file source for the default keytab, if one is configured.
    pub fn default_keytab_source(&self) -> Option<FileKeytabSource> {
        self.default_keytab.as_ref().map(FileKeytabSource::cbor)
    }
}
