//! Destroyable secret material.
//!
//! Key bytes live behind a lock so that any thread holding a shared
//! reference can wipe them. Once wiped, every accessor reports
//! [`CoreError::InvalidState`] instead of handing out stale or zeroed data.

use std::fmt;

use parking_lot::RwLock;
use zeroize::{Zeroize, Zeroizing};

use crate::error::{CoreError, Result};

/// Something holding secret material that can be irreversibly wiped.
///
/// `destroy` must be idempotent: calling it on an already destroyed
/// object succeeds and changes nothing.
pub trait Destroyable {
    /// Wipe the secret material.
    fn destroy(&self) -> Result<()>;

    /// Whether [`destroy`](Destroyable::destroy) has taken effect.
    fn is_destroyed(&self) -> bool;
}

/// Raw key bytes plus their Kerberos key type tag.
pub struct SecretBytes {
    key_type: i32,
    bytes: RwLock<Option<Zeroizing<Vec<u8>>>>,
}

impl SecretBytes {
    /// Copy `bytes` into a new secret.
    pub fn new(bytes: &[u8], key_type: i32) -> Self {
        Self::from_vec(bytes.to_vec(), key_type)
    }

    /// Take ownership of `bytes` without copying.
    pub fn from_vec(bytes: Vec<u8>, key_type: i32) -> Self {
        Self {
            key_type,
            bytes: RwLock::new(Some(Zeroizing::new(bytes))),
        }
    }

    /// The key type (encryption type number).
    pub fn key_type(&self) -> Result<i32> {
        if self.is_destroyed() {
            return Err(CoreError::InvalidState("key"));
        }
        Ok(self.key_type)
    }

    /// A fresh copy of the key bytes.
    pub fn encoded(&self) -> Result<Vec<u8>> {
        self.with_bytes(<[u8]>::to_vec)
    }

    /// Run `f` over the key bytes without copying them out.
    pub fn with_bytes<R>(&self, f: impl FnOnce(&[u8]) -> R) -> Result<R> {
        let guard = self.bytes.read();
        match guard.as_ref() {
            Some(bytes) => Ok(f(bytes.as_slice())),
            None => Err(CoreError::InvalidState("key")),
        }
    }

    /// An independent copy of this secret. Destroying either one leaves
    /// the other intact.
    pub fn duplicate(&self) -> Result<Self> {
        let bytes = self.encoded()?;
        Ok(Self::from_vec(bytes, self.key_type))
    }

    /// Length of the key in bytes.
    pub fn len(&self) -> Result<usize> {
        self.with_bytes(<[u8]>::len)
    }

    /// Whether the key has no bytes.
    pub fn is_empty(&self) -> Result<bool> {
        self.with_bytes(<[u8]>::is_empty)
    }
}

impl Destroyable for SecretBytes {
    fn destroy(&self) -> Result<()> {
        let mut guard = self.bytes.write();
        if let Some(mut bytes) = guard.take() {
            bytes.zeroize();
        }
        Ok(())
    }

    fn is_destroyed(&self) -> bool {
        self.bytes.read().is_none()
    }
}

impl PartialEq for SecretBytes {
    /// Destroyed secrets compare unequal to everything but themselves.
    fn eq(&self, other: &Self) -> bool {
        if std::ptr::eq(self, other) {
            return true;
        }
        if self.key_type != other.key_type {
            return false;
        }
        let mine = self.bytes.read();
        let theirs = other.bytes.read();
        match (mine.as_ref(), theirs.as_ref()) {
            (Some(a), Some(b)) => a.as_slice() == b.as_slice(),
            _ => false,
        }
    }
}

impl fmt::Debug for SecretBytes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let len = self.bytes.read().as_ref().map(|b| b.len());
        f.debug_struct("SecretBytes")
            .field("key_type", &self.key_type)
            .field("len", &len)
            .field("destroyed", &len.is_none())
            .finish()
    }
}
