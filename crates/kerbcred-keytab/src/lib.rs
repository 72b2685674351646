//! # kerbcred keytab
//!
//! Access to long-term service keys stored in keytabs.
//!
//! A [`KeyTab`] reads through a [`KeytabSource`], which produces a fresh
//! snapshot on every lookup. When a snapshot cannot be taken the last keys
//! successfully read for the principal are served instead, so a keytab
//! that is briefly unreadable (rotation in progress, NFS hiccup) does not
//! take the service down.
//!
//! ## Sources
//!
//! - [`MemoryKeytabSource`] - in memory, with failure injection for tests
//! - [`FileKeytabSource`] - a file on disk, decoded by a [`KeytabDecoder`]
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use kerbcred_core::KerberosPrincipal;
//! use kerbcred_keytab::{FileKeytabSource, KeyTab};
//!
//! let service = KerberosPrincipal::parse("HTTP/web.example.com@EXAMPLE.COM").unwrap();
//! let keytab = KeyTab::bound(service.clone(), Arc::new(FileKeytabSource::cbor("/etc/krb5.keytab.cbor")));
//! let keys = keytab.keys(&service);
//! ```

pub mod cache;
pub mod error;
pub mod file;
pub mod keytab;
pub mod memory;
pub mod source;

pub use cache::KeyTabCache;
pub use error::{KeytabError, Result};
pub use file::{CborKeytabDecoder, FileKeytabSource, KeytabDecoder};
pub use keytab::KeyTab;
pub use memory::MemoryKeytabSource;
pub use source::{KeytabEntries, KeytabSource, KeytabView, RawKeyEntry};
