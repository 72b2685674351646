//! Keytab snapshot sources.
//!
//! A [`KeytabSource`] produces immutable [`KeytabView`]s. Each call to
//! `snapshot` reflects the keytab as it is at that moment, so keys added
//! or rotated after a [`KeyTab`](crate::KeyTab) was created are picked up
//! on the next lookup.

use std::fmt;
use std::sync::Arc;

use kerbcred_core::KerberosPrincipal;
use zeroize::Zeroizing;

use crate::error::Result;

/// One key entry as stored in a keytab.
#[derive(Clone)]
pub struct RawKeyEntry {
    /// Full principal name, `service/host@REALM`.
    pub principal: String,
    pub key_type: i32,
    /// Key version number; some keytab formats do not record one.
    pub kvno: Option<i32>,
    pub key: Zeroizing<Vec<u8>>,
}

impl RawKeyEntry {
    pub fn new(principal: impl Into<String>, key_type: i32, kvno: Option<i32>, key: &[u8]) -> Self {
        Self {
            principal: principal.into(),
            key_type,
            kvno,
            key: Zeroizing::new(key.to_vec()),
        }
    }
}

impl fmt::Debug for RawKeyEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RawKeyEntry")
            .field("principal", &self.principal)
            .field("key_type", &self.key_type)
            .field("kvno", &self.kvno)
            .field("key", &"<redacted>")
            .finish()
    }
}

/// An immutable, point-in-time view of a keytab.
pub trait KeytabView: Send + Sync {
    /// Every entry for `principal`, in keytab order.
    fn read_service_keys(&self, principal: &KerberosPrincipal) -> Vec<RawKeyEntry>;

    /// Whether the keytab did not exist when the view was taken.
    fn is_missing(&self) -> bool;
}

/// Produces keytab snapshots.
pub trait KeytabSource: Send + Sync {
    fn snapshot(&self) -> Result<Arc<dyn KeytabView>>;

    /// Human readable location, for logs and `Display`.
    fn describe(&self) -> String;
}

/// Plain list of entries; the view used by the bundled sources.
#[derive(Debug, Clone, Default)]
pub struct KeytabEntries {
    entries: Vec<RawKeyEntry>,
    missing: bool,
}

impl KeytabEntries {
    pub fn new(entries: Vec<RawKeyEntry>) -> Self {
        Self {
            entries,
            missing: false,
        }
    }

    /// The view of a keytab that does not exist.
    pub fn missing() -> Self {
        Self {
            entries: Vec::new(),
            missing: true,
        }
    }

    pub fn entries(&self) -> &[RawKeyEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl KeytabView for KeytabEntries {
    fn read_service_keys(&self, principal: &KerberosPrincipal) -> Vec<RawKeyEntry> {
        self.entries
            .iter()
            .filter(|e| e.principal == principal.name())
            .cloned()
            .collect()
    }

    fn is_missing(&self) -> bool {
        self.missing
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_view_filters_by_principal() {
        let view = KeytabEntries::new(vec![
            RawKeyEntry::new("HTTP/web@R", 18, Some(2), &[1; 32]),
            RawKeyEntry::new("host/web@R", 18, Some(2), &[2; 32]),
            RawKeyEntry::new("HTTP/web@R", 17, None, &[3; 16]),
        ]);
        let http = KerberosPrincipal::parse("HTTP/web@R").unwrap();

        let keys = view.read_service_keys(&http);
        assert_eq!(keys.len(), 2);
        assert!(keys.iter().all(|k| k.principal == "HTTP/web@R"));
        assert!(!view.is_missing());
        assert!(KeytabEntries::missing().is_missing());
    }

    #[test]
    fn test_debug_redacts_key() {
        let entry = RawKeyEntry::new("a@R", 18, Some(1), &[0xee; 4]);
        assert!(!format!("{:?}", entry).contains("238"));
    }
}
