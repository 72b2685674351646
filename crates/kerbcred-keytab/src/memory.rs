//! In-memory keytab source.
//!
//! Primarily for tests. Snapshots are copies, so entries added after a
//! snapshot was taken do not show up in it. Failures can be injected to
//! exercise the stale-fallback path.

use std::sync::Arc;

use parking_lot::RwLock;

use crate::error::{KeytabError, Result};
use crate::source::{KeytabEntries, KeytabSource, KeytabView, RawKeyEntry};

/// Keytab held in memory.
#[derive(Debug, Default)]
pub struct MemoryKeytabSource {
    inner: RwLock<MemoryKeytabInner>,
}

#[derive(Debug, Default)]
struct MemoryKeytabInner {
    entries: Vec<RawKeyEntry>,
    missing: bool,
    failure: Option<String>,
}

impl MemoryKeytabSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entries(entries: Vec<RawKeyEntry>) -> Self {
        let source = Self::new();
        source.inner.write().entries = entries;
        source
    }

    pub fn add_entry(&self, entry: RawKeyEntry) {
        self.inner.write().entries.push(entry);
    }

    /// Remove every entry for `principal`. Returns how many were removed.
    pub fn remove_principal(&self, principal: &str) -> usize {
        let mut inner = self.inner.write();
        let before = inner.entries.len();
        inner.entries.retain(|e| e.principal != principal);
        before - inner.entries.len()
    }

    pub fn clear(&self) {
        self.inner.write().entries.clear();
    }

    /// Make snapshots report a missing keytab.
    pub fn set_missing(&self, missing: bool) {
        self.inner.write().missing = missing;
    }

    /// Make snapshots fail with `reason` until cleared with `None`.
    pub fn set_failure(&self, reason: Option<&str>) {
        self.inner.write().failure = reason.map(str::to_string);
    }
}

impl KeytabSource for MemoryKeytabSource {
    fn snapshot(&self) -> Result<Arc<dyn KeytabView>> {
        let inner = self.inner.read();
        if let Some(reason) = &inner.failure {
            return Err(KeytabError::Unavailable(reason.clone()));
        }
        let view = if inner.missing {
            KeytabEntries::missing()
        } else {
            KeytabEntries::new(inner.entries.clone())
        };
        Ok(Arc::new(view))
    }

    fn describe(&self) -> String {
        "memory keytab".to_string()
    }
}
