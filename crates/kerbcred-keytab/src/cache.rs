//! Per-principal key cache with stale fallback.
//!
//! Every lookup takes a fresh snapshot. When the snapshot succeeds, its
//! entries for the principal replace the cached ones. When it fails, the
//! last successful result for that principal is served instead; a
//! principal that never had a successful lookup gets no keys.
//!
//! Lookups are numbered before they snapshot, and a result only replaces
//! a cached one taken by an earlier lookup. A slow reader that saw the
//! keytab before a rotation cannot overwrite what a faster reader saw
//! after it. Principals with no keys in the keytab are not remembered.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use kerbcred_core::{EncryptionType, KerberosPrincipal};
use kerbcred_creds::KerberosKey;
use parking_lot::RwLock;

use crate::source::{KeytabSource, RawKeyEntry};

#[derive(Debug)]
struct CachedEntries {
    generation: u64,
    entries: Vec<RawKeyEntry>,
}

/// Last-good key entries per principal.
#[derive(Debug, Default)]
pub struct KeyTabCache {
    last_good: RwLock<HashMap<KerberosPrincipal, CachedEntries>>,
    lookups: AtomicU64,
}

impl KeyTabCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keys for `principal` from a fresh snapshot of `source`, falling back
    /// to the last good result when the snapshot fails.
    ///
    /// Entries with unsupported key types are dropped. Keys are returned
    /// newest version first. Each call returns new key objects, so
    /// destroying them does not affect later lookups.
    pub fn keys(&self, source: &dyn KeytabSource, principal: &KerberosPrincipal) -> Vec<KerberosKey> {
        let generation = self.lookups.fetch_add(1, Ordering::SeqCst);
        match source.snapshot() {
            Ok(view) => {
                let mut entries: Vec<RawKeyEntry> = view
                    .read_service_keys(principal)
                    .into_iter()
                    .filter(|e| EncryptionType::from(e.key_type).is_supported())
                    .collect();
                entries.sort_by_key(|e| std::cmp::Reverse(e.kvno.unwrap_or(0)));

                let keys = to_keys(principal, &entries);
                tracing::debug!(
                    principal = %principal,
                    source = %source.describe(),
                    keys = keys.len(),
                    generation,
                    "keytab snapshot"
                );
                self.record(principal, generation, entries);
                keys
            }
            Err(e) => {
                let cached = self.last_good.read();
                let fallback = cached.get(principal);
                tracing::warn!(
                    principal = %principal,
                    source = %source.describe(),
                    error = %e,
                    cached = fallback.is_some(),
                    "keytab snapshot failed, serving last good keys"
                );
                fallback
                    .map(|c| to_keys(principal, &c.entries))
                    .unwrap_or_default()
            }
        }
    }

    /// Whether a lookup for `principal` has found keys since the cache
    /// was created or cleared.
    pub fn has_entry(&self, principal: &KerberosPrincipal) -> bool {
        self.last_good.read().contains_key(principal)
    }

    /// Forget every cached result.
    pub fn clear(&self) {
        self.last_good.write().clear();
    }

    fn record(&self, principal: &KerberosPrincipal, generation: u64, entries: Vec<RawKeyEntry>) {
        let mut cached = self.last_good.write();
        match cached.entry(principal.clone()) {
            Entry::Occupied(mut slot) => {
                if slot.get().generation < generation {
                    slot.insert(CachedEntries { generation, entries });
                } else {
                    tracing::debug!(
                        principal = %principal,
                        generation,
                        cached = slot.get().generation,
                        "keeping newer cached keys"
                    );
                }
            }
            // An empty result only matters when it replaces keys.
            Entry::Vacant(slot) => {
                if !entries.is_empty() {
                    slot.insert(CachedEntries { generation, entries });
                }
            }
        }
    }
}

fn to_keys(principal: &KerberosPrincipal, entries: &[RawKeyEntry]) -> Vec<KerberosKey> {
    entries
        .iter()
        .map(|e| KerberosKey::new(principal.clone(), &e.key, e.key_type, e.kvno.unwrap_or(0)))
        .collect()
}
