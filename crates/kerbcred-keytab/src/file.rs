//! File-backed keytab source.
//!
//! The file is decoded by a pluggable [`KeytabDecoder`]. The decoded view
//! is reused for as long as the file's modification time stays the same.
//! A missing file is not an error; it yields an empty view marked missing.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use crate::error::{KeytabError, Result};
use crate::source::{KeytabEntries, KeytabSource, KeytabView, RawKeyEntry};

/// Turns keytab file contents into entries.
pub trait KeytabDecoder: Send + Sync {
    fn decode(&self, bytes: &[u8]) -> Result<KeytabEntries>;
}

/// Keytab read from a file on disk.
pub struct FileKeytabSource {
    path: PathBuf,
    decoder: Arc<dyn KeytabDecoder>,
    cached: Mutex<Option<CachedView>>,
}

struct CachedView {
    modified: SystemTime,
    view: Arc<KeytabEntries>,
}

impl FileKeytabSource {
    pub fn new(path: impl Into<PathBuf>, decoder: Arc<dyn KeytabDecoder>) -> Self {
        Self {
            path: path.into(),
            decoder,
            cached: Mutex::new(None),
        }
    }

    /// A source reading the CBOR export layout.
    pub fn cbor(path: impl Into<PathBuf>) -> Self {
        Self::new(path, Arc::new(CborKeytabDecoder))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl KeytabSource for FileKeytabSource {
    fn snapshot(&self) -> Result<Arc<dyn KeytabView>> {
        let metadata = match fs::metadata(&self.path) {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                *self.cached.lock() = None;
                return Ok(Arc::new(KeytabEntries::missing()));
            }
            Err(e) => return Err(e.into()),
        };
        let modified = metadata.modified()?;

        let mut cached = self.cached.lock();
        if let Some(c) = cached.as_ref() {
            if c.modified == modified {
                return Ok(c.view.clone());
            }
        }

        let bytes = Zeroizing::new(fs::read(&self.path)?);
        let view = Arc::new(self.decoder.decode(&bytes)?);
        tracing::debug!(path = %self.path.display(), entries = view.len(), "loaded keytab");
        *cached = Some(CachedView {
            modified,
            view: view.clone(),
        });
        Ok(view)
    }

    fn describe(&self) -> String {
        format!("FILE:{}", self.path.display())
    }
}

/// Version of the CBOR keytab layout.
pub const CBOR_KEYTAB_VERSION: u8 = 1;

#[derive(Serialize, Deserialize)]
struct CborKeytab {
    version: u8,
    entries: Vec<CborKeytabEntry>,
}

#[derive(Serialize, Deserialize)]
struct CborKeytabEntry {
    principal: String,
    key_type: i32,
    #[serde(default)]
    kvno: Option<i32>,
    key: Vec<u8>,
}

/// Decoder for the crate's CBOR keytab export layout.
#[derive(Debug, Clone, Copy, Default)]
pub struct CborKeytabDecoder;

impl CborKeytabDecoder {
    /// Encode entries in the layout [`decode`](KeytabDecoder::decode) reads.
    pub fn encode(entries: &[RawKeyEntry]) -> Result<Vec<u8>> {
        let file = CborKeytab {
            version: CBOR_KEYTAB_VERSION,
            entries: entries
                .iter()
                .map(|e| CborKeytabEntry {
                    principal: e.principal.clone(),
                    key_type: e.key_type,
                    kvno: e.kvno,
                    key: e.key.to_vec(),
                })
                .collect(),
        };
        let mut buf = Vec::new();
        ciborium::into_writer(&file, &mut buf)
            .map_err(|e| KeytabError::Serialization(e.to_string()))?;
        Ok(buf)
    }
}

impl KeytabDecoder for CborKeytabDecoder {
    fn decode(&self, bytes: &[u8]) -> Result<KeytabEntries> {
        let file: CborKeytab =
            ciborium::from_reader(bytes).map_err(|e| KeytabError::Decode(e.to_string()))?;
        if file.version != CBOR_KEYTAB_VERSION {
            return Err(KeytabError::Decode(format!(
                "unsupported keytab version {}",
                file.version
            )));
        }
        let entries = file
            .entries
            .into_iter()
            .map(|e| RawKeyEntry {
                principal: e.principal,
                key_type: e.key_type,
                kvno: e.kvno,
                key: Zeroizing::new(e.key),
            })
            .collect();
        Ok(KeytabEntries::new(entries))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use kerbcred_core::KerberosPrincipal;
    use tempfile::TempDir;

    struct CountingDecoder {
        calls: AtomicUsize,
    }

    impl KeytabDecoder for CountingDecoder {
        fn decode(&self, bytes: &[u8]) -> Result<KeytabEntries> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            CborKeytabDecoder.decode(bytes)
        }
    }

    fn write_keytab(path: &Path, entries: &[RawKeyEntry]) {
        fs::write(path, CborKeytabDecoder::encode(entries).unwrap()).unwrap();
    }

    #[test]
    fn test_missing_file_is_empty_view() {
        let dir = TempDir::new().unwrap();
        let source = FileKeytabSource::cbor(dir.path().join("krb5.keytab"));

        let view = source.snapshot().unwrap();
        assert!(view.is_missing());
        assert!(source.describe().starts_with("FILE:"));
    }

    #[test]
    fn test_reads_entries() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("krb5.keytab");
        write_keytab(
            &path,
            &[
                RawKeyEntry::new("HTTP/web@R", 18, Some(3), &[1; 32]),
                RawKeyEntry::new("HTTP/web@R", 17, None, &[2; 16]),
            ],
        );

        let view = FileKeytabSource::cbor(&path).snapshot().unwrap();
        let http = KerberosPrincipal::parse("HTTP/web@R").unwrap();
        let keys = view.read_service_keys(&http);

        assert!(!view.is_missing());
        assert_eq!(keys.len(), 2);
        assert_eq!(keys[1].kvno, None);
        assert_eq!(keys[0].key.as_slice(), &[1; 32]);
    }

    #[test]
    fn test_unchanged_file_not_decoded_again() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("krb5.keytab");
        write_keytab(&path, &[RawKeyEntry::new("a@R", 18, Some(1), &[1; 32])]);

        let decoder = Arc::new(CountingDecoder {
            calls: AtomicUsize::new(0),
        });
        let source = FileKeytabSource::new(&path, decoder.clone());

        source.snapshot().unwrap();
        source.snapshot().unwrap();
        assert_eq!(decoder.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_garbage_is_decode_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("krb5.keytab");
        fs::write(&path, b"\x05\x02not cbor at all").unwrap();

        assert!(matches!(
            FileKeytabSource::cbor(&path).snapshot(),
            Err(KeytabError::Decode(_))
        ));
    }

    #[test]
    fn test_unknown_layout_version_rejected() {
        let file = CborKeytab {
            version: 7,
            entries: Vec::new(),
        };
        let mut buf = Vec::new();
        ciborium::into_writer(&file, &mut buf).unwrap();

        assert!(matches!(
            CborKeytabDecoder.decode(&buf),
            Err(KeytabError::Decode(_))
        ));
    }
}
