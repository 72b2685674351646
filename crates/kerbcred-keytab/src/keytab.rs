//! Keytab handles.

use std::fmt;
use std::sync::Arc;

use kerbcred_core::KerberosPrincipal;
use kerbcred_creds::KerberosKey;

use crate::cache::KeyTabCache;
use crate::source::KeytabSource;

/// A keytab, optionally bound to a single principal.
///
/// A bound keytab only ever hands out keys for its own principal. An
/// unbound keytab serves any principal it has keys for.
pub struct KeyTab {
    principal: Option<KerberosPrincipal>,
    source: Arc<dyn KeytabSource>,
    cache: KeyTabCache,
}

impl KeyTab {
    pub fn bound(principal: KerberosPrincipal, source: Arc<dyn KeytabSource>) -> Self {
        Self {
            principal: Some(principal),
            source,
            cache: KeyTabCache::new(),
        }
    }

    pub fn unbound(source: Arc<dyn KeytabSource>) -> Self {
        Self {
            principal: None,
            source,
            cache: KeyTabCache::new(),
        }
    }

    pub fn is_bound(&self) -> bool {
        self.principal.is_some()
    }

    /// The principal this keytab is bound to.
    pub fn principal(&self) -> Option<&KerberosPrincipal> {
        self.principal.as_ref()
    }

    /// Keys for `principal` from the current keytab contents.
    ///
    /// Returns no keys when this keytab is bound to another principal.
    /// Snapshot failures fall back to the last keys read for `principal`.
    pub fn keys(&self, principal: &KerberosPrincipal) -> Vec<KerberosKey> {
        if let Some(bound) = &self.principal {
            if bound != principal {
                return Vec::new();
            }
        }
        self.cache.keys(self.source.as_ref(), principal)
    }

    /// Whether the keytab can be read right now and exists.
    pub fn exists(&self) -> bool {
        match self.source.snapshot() {
            Ok(view) => !view.is_missing(),
            Err(e) => {
                tracing::debug!(source = %self.source.describe(), error = %e, "keytab not readable");
                false
            }
        }
    }

    pub fn source_description(&self) -> String {
        self.source.describe()
    }
}

impl fmt::Debug for KeyTab {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyTab")
            .field("principal", &self.principal)
            .field("source", &self.source.describe())
            .finish()
    }
}

impl fmt::Display for KeyTab {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.principal {
            Some(p) => write!(f, "{} for {}", self.source.describe(), p),
            None => write!(f, "{} (unbound)", self.source.describe()),
        }
    }
}
