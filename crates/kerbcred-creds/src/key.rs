//! Encryption keys and principal-bound Kerberos keys.

use std::fmt;

use kerbcred_core::{Destroyable, EncryptionType, KerberosPrincipal, SecretBytes};
use parking_lot::RwLock;
use zeroize::Zeroizing;

use crate::error::{CredError, Result};

/// Derives long-term key bytes from a password.
///
/// String-to-key functions are cipher specific and live outside this
/// crate; the password constructors only manage the resulting bytes.
pub trait KeyDeriver: Send + Sync {
    fn derive(
        &self,
        principal: &KerberosPrincipal,
        password: &str,
        etype: EncryptionType,
    ) -> Result<Zeroizing<Vec<u8>>>;
}

/// Every key is exported in raw form.
pub const KEY_FORMAT: &str = "RAW";

/// A secret key with its encryption type.
pub struct EncryptionKey {
    secret: SecretBytes,
}

impl EncryptionKey {
    /// Copy `bytes` into a new key.
    pub fn new(bytes: &[u8], key_type: i32) -> Self {
        Self {
            secret: SecretBytes::new(bytes, key_type),
        }
    }

    pub(crate) fn from_secret(secret: SecretBytes) -> Self {
        Self { secret }
    }

    /// Derive a key from a password. `algorithm` picks the encryption
    /// type by name; `None` selects AES256.
    pub fn from_password(
        principal: &KerberosPrincipal,
        password: &str,
        algorithm: Option<&str>,
        deriver: &dyn KeyDeriver,
    ) -> Result<Self> {
        let secret = derive_secret(principal, password, algorithm, deriver)?;
        Ok(Self { secret })
    }

    pub fn key_type(&self) -> Result<i32> {
        Ok(self.secret.key_type()?)
    }

    /// Standard algorithm name for the key type.
    pub fn algorithm(&self) -> Result<&'static str> {
        let etype = EncryptionType::from(self.key_type()?);
        Ok(etype.require_algorithm_name()?)
    }

    pub fn format(&self) -> &'static str {
        KEY_FORMAT
    }

    /// A fresh copy of the key bytes.
    pub fn encoded(&self) -> Result<Vec<u8>> {
        Ok(self.secret.encoded()?)
    }

    pub fn with_bytes<R>(&self, f: impl FnOnce(&[u8]) -> R) -> Result<R> {
        Ok(self.secret.with_bytes(f)?)
    }

    /// An independent copy of this key.
    pub fn duplicate(&self) -> Result<Self> {
        Ok(Self {
            secret: self.secret.duplicate()?,
        })
    }
}

impl Destroyable for EncryptionKey {
    fn destroy(&self) -> kerbcred_core::Result<()> {
        self.secret.destroy()
    }

    fn is_destroyed(&self) -> bool {
        self.secret.is_destroyed()
    }
}

impl PartialEq for EncryptionKey {
    fn eq(&self, other: &Self) -> bool {
        self.secret == other.secret
    }
}

impl fmt::Debug for EncryptionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.secret.key_type() {
            Ok(key_type) => write!(f, "EncryptionKey(etype={}, <redacted>)", EncryptionType::from(key_type)),
            Err(_) => f.write_str("EncryptionKey(<destroyed>)"),
        }
    }
}

/// A long-term key bound to a principal and a key version number.
pub struct KerberosKey {
    /// Cleared on destroy.
    principal: RwLock<Option<KerberosPrincipal>>,
    version: i32,
    secret: SecretBytes,
}

impl KerberosKey {
    pub fn new(principal: KerberosPrincipal, bytes: &[u8], key_type: i32, version: i32) -> Self {
        Self {
            principal: RwLock::new(Some(principal)),
            version,
            secret: SecretBytes::new(bytes, key_type),
        }
    }

    /// Derive a key from a password. The version number is 0.
    pub fn from_password(
        principal: KerberosPrincipal,
        password: &str,
        algorithm: Option<&str>,
        deriver: &dyn KeyDeriver,
    ) -> Result<Self> {
        let secret = derive_secret(&principal, password, algorithm, deriver)?;
        Ok(Self {
            principal: RwLock::new(Some(principal)),
            version: 0,
            secret,
        })
    }

    pub fn principal(&self) -> Result<KerberosPrincipal> {
        let principal = self.principal.read();
        if self.secret.is_destroyed() {
            return Err(CredError::InvalidState("key"));
        }
        principal.clone().ok_or(CredError::InvalidState("key"))
    }

    /// Key version number (KVNO).
    pub fn version_number(&self) -> Result<i32> {
        if self.is_destroyed() {
            return Err(CredError::InvalidState("key"));
        }
        Ok(self.version)
    }

    pub fn key_type(&self) -> Result<i32> {
        Ok(self.secret.key_type()?)
    }

    pub fn algorithm(&self) -> Result<&'static str> {
        let etype = EncryptionType::from(self.key_type()?);
        Ok(etype.require_algorithm_name()?)
    }

    pub fn format(&self) -> &'static str {
        KEY_FORMAT
    }

    pub fn encoded(&self) -> Result<Vec<u8>> {
        Ok(self.secret.encoded()?)
    }

    pub fn with_bytes<R>(&self, f: impl FnOnce(&[u8]) -> R) -> Result<R> {
        Ok(self.secret.with_bytes(f)?)
    }

    /// Copy the key material into a principal-less [`EncryptionKey`].
    pub fn to_encryption_key(&self) -> Result<EncryptionKey> {
        Ok(EncryptionKey::from_secret(self.secret.duplicate()?))
    }

    pub fn duplicate(&self) -> Result<Self> {
        Ok(Self {
            principal: RwLock::new(Some(self.principal()?)),
            version: self.version,
            secret: self.secret.duplicate()?,
        })
    }
}

impl Destroyable for KerberosKey {
    fn destroy(&self) -> kerbcred_core::Result<()> {
        // Wipe before dropping the principal: once `principal()` fails,
        // the key bytes are already gone.
        let mut principal = self.principal.write();
        let wiped = self.secret.destroy();
        *principal = None;
        wiped
    }

    fn is_destroyed(&self) -> bool {
        self.secret.is_destroyed()
    }
}

impl PartialEq for KerberosKey {
    fn eq(&self, other: &Self) -> bool {
        if std::ptr::eq(self, other) {
            return true;
        }
        if self.version != other.version {
            return false;
        }
        let mine = self.principal.read().clone();
        let theirs = other.principal.read().clone();
        match (mine, theirs) {
            (Some(a), Some(b)) => a == b && self.secret == other.secret,
            _ => false,
        }
    }
}

impl fmt::Debug for KerberosKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let principal = self.principal.read();
        match (principal.as_ref(), self.secret.key_type()) {
            (Some(p), Ok(key_type)) => write!(
                f,
                "KerberosKey({}, kvno={}, etype={}, <redacted>)",
                p,
                self.version,
                EncryptionType::from(key_type)
            ),
            _ => f.write_str("KerberosKey(<destroyed>)"),
        }
    }
}

fn derive_secret(
    principal: &KerberosPrincipal,
    password: &str,
    algorithm: Option<&str>,
    deriver: &dyn KeyDeriver,
) -> Result<SecretBytes> {
    let etype = EncryptionType::from_algorithm_name(algorithm)?;
    let mut derived = deriver.derive(principal, password, etype)?;
    tracing::debug!(principal = %principal, etype = %etype, "derived key from password");
    Ok(SecretBytes::from_vec(std::mem::take(&mut *derived), etype.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    struct EchoDeriver;

    impl KeyDeriver for EchoDeriver {
        fn derive(
            &self,
            principal: &KerberosPrincipal,
            password: &str,
            etype: EncryptionType,
        ) -> Result<Zeroizing<Vec<u8>>> {
            let mut out = format!("{}:{}", principal, password).into_bytes();
            out.push(etype.0 as u8);
            Ok(Zeroizing::new(out))
        }
    }

    struct FailingDeriver;

    impl KeyDeriver for FailingDeriver {
        fn derive(&self, _: &KerberosPrincipal, _: &str, _: EncryptionType) -> Result<Zeroizing<Vec<u8>>> {
            Err(CredError::KeyDerivation("no string-to-key for etype".to_string()))
        }
    }

    fn alice() -> KerberosPrincipal {
        KerberosPrincipal::parse("alice@EXAMPLE.COM").unwrap()
    }

    #[test]
    fn test_encryption_key_accessors() {
        let key = EncryptionKey::new(&[7; 16], 17);

        assert_eq!(key.key_type().unwrap(), 17);
        assert_eq!(key.algorithm().unwrap(), "AES128");
        assert_eq!(key.format(), "RAW");
        assert_eq!(key.encoded().unwrap(), vec![7; 16]);
    }

    #[test]
    fn test_unsupported_algorithm() {
        let key = EncryptionKey::new(&[1], 99);
        assert!(matches!(key.algorithm(), Err(CredError::Core(_))));
    }

    #[test]
    fn test_destroyed_key_fails_accessors() {
        let key = KerberosKey::new(alice(), &[1, 2, 3], 18, 4);
        key.destroy().unwrap();
        key.destroy().unwrap();

        assert!(key.is_destroyed());
        assert!(key.encoded().unwrap_err().is_invalid_state());
        assert!(key.principal().unwrap_err().is_invalid_state());
        assert!(key.version_number().unwrap_err().is_invalid_state());
        assert!(key.key_type().unwrap_err().is_invalid_state());
        assert_eq!(format!("{:?}", key), "KerberosKey(<destroyed>)");
    }

    #[test]
    fn test_principal_never_outlives_key_bytes() {
        for _ in 0..50 {
            let key = KerberosKey::new(alice(), &[5; 32], 18, 1);
            std::thread::scope(|scope| {
                scope.spawn(|| key.destroy().unwrap());
                scope.spawn(|| loop {
                    if key.principal().is_err() {
                        assert!(key.encoded().unwrap_err().is_invalid_state());
                        break;
                    }
                });
            });
        }
    }

    #[test]
    fn test_password_path_defaults_to_aes256() {
        let key = KerberosKey::from_password(alice(), "secret", None, &EchoDeriver).unwrap();

        assert_eq!(key.key_type().unwrap(), 18);
        assert_eq!(key.version_number().unwrap(), 0);
        assert_eq!(key.principal().unwrap(), alice());

        let des3 = EncryptionKey::from_password(&alice(), "secret", Some("desede"), &EchoDeriver).unwrap();
        assert_eq!(des3.key_type().unwrap(), 16);
    }

    #[test]
    fn test_password_path_errors() {
        assert!(matches!(
            KerberosKey::from_password(alice(), "pw", Some("Blowfish"), &EchoDeriver),
            Err(CredError::Core(_))
        ));
        assert!(matches!(
            KerberosKey::from_password(alice(), "pw", None, &FailingDeriver),
            Err(CredError::KeyDerivation(_))
        ));
    }

    #[test]
    fn test_equality() {
        let a = KerberosKey::new(alice(), &[1, 2, 3], 18, 1);
        let b = KerberosKey::new(alice(), &[1, 2, 3], 18, 1);
        let c = KerberosKey::new(alice(), &[1, 2, 3], 18, 2);

        assert_eq!(a, b);
        assert_ne!(a, c);

        b.destroy().unwrap();
        assert_ne!(a, b);
        assert_eq!(b, b);
    }

    #[test]
    fn test_to_encryption_key_is_independent() {
        let key = KerberosKey::new(alice(), &[5; 32], 18, 3);
        let plain = key.to_encryption_key().unwrap();
        key.destroy().unwrap();

        assert_eq!(plain.encoded().unwrap(), vec![5; 32]);
        assert_eq!(plain.key_type().unwrap(), 18);
    }

    #[test]
    fn test_debug_redacts_bytes() {
        let key = EncryptionKey::new(&[0xaa; 8], 18);
        let rendered = format!("{:?}", key);
        assert!(rendered.contains("<redacted>"));
        assert!(!rendered.contains("aa"));
    }
}
