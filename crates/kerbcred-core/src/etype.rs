//! Kerberos encryption types.
//!
//! - [RFC3961](https://tools.ietf.org/html/rfc3961) Encryption and Checksum Specifications for Kerberos 5
//! - [RFC8009](https://tools.ietf.org/html/rfc8009) AES Encryption with HMAC-SHA2 for Kerberos 5

use std::fmt;

use crate::error::{CoreError, Result};

/// Encryption type number, also used as the key type of a key.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EncryptionType(pub i32);

impl EncryptionType {
    pub const NULL: EncryptionType = EncryptionType(0);
    pub const DES_CBC_CRC: EncryptionType = EncryptionType(1);
    pub const DES_CBC_MD5: EncryptionType = EncryptionType(3);
    pub const DES3_CBC_SHA1_KD: EncryptionType = EncryptionType(16);
    pub const AES128_CTS_HMAC_SHA1_96: EncryptionType = EncryptionType(17);
    pub const AES256_CTS_HMAC_SHA1_96: EncryptionType = EncryptionType(18);
    pub const AES128_CTS_HMAC_SHA256_128: EncryptionType = EncryptionType(19);
    pub const AES256_CTS_HMAC_SHA384_192: EncryptionType = EncryptionType(20);
    pub const RC4_HMAC: EncryptionType = EncryptionType(23);

    /// Key type used when a password-derived key names no algorithm.
    pub const DEFAULT: EncryptionType = EncryptionType::AES256_CTS_HMAC_SHA1_96;

    /// Standard algorithm name reported by keys of this type.
    ///
    /// Returns `None` for types this crate does not know.
    pub fn algorithm_name(self) -> Option<&'static str> {
        match self.0 {
            0 => Some("NULL"),
            1 | 3 => Some("DES"),
            16 => Some("DESede"),
            23 => Some("ArcFourHmac"),
            17 | 19 => Some("AES128"),
            18 | 20 => Some("AES256"),
            _ => None,
        }
    }

    /// Like [`algorithm_name`](Self::algorithm_name) but failing on unknown types.
    pub fn require_algorithm_name(self) -> Result<&'static str> {
        self.algorithm_name()
            .ok_or(CoreError::UnsupportedEncryptionType(self.0))
    }

    /// Whether keys of this type can be handed to callers.
    ///
    /// The NULL type has a name but carries no usable key.
    pub fn is_supported(self) -> bool {
        self != Self::NULL && self.algorithm_name().is_some()
    }

    /// Map an algorithm name (case-insensitive) to the key type used when
    /// deriving a key from a password. `None` selects [`Self::DEFAULT`].
    pub fn from_algorithm_name(name: Option<&str>) -> Result<Self> {
        let Some(name) = name else {
            return Ok(Self::DEFAULT);
        };
        match name.to_ascii_lowercase().as_str() {
            "des" => Ok(Self::DES_CBC_MD5),
            "desede" => Ok(Self::DES3_CBC_SHA1_KD),
            "arcfourhmac" | "rc4" => Ok(Self::RC4_HMAC),
            "aes128" => Ok(Self::AES128_CTS_HMAC_SHA1_96),
            "aes256" => Ok(Self::AES256_CTS_HMAC_SHA1_96),
            _ => Err(CoreError::UnsupportedAlgorithm(name.to_string())),
        }
    }
}

impl From<i32> for EncryptionType {
    fn from(value: i32) -> Self {
        Self(value)
    }
}

impl fmt::Debug for EncryptionType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.0 {
            0 => f.write_str("null"),
            1 => f.write_str("des-cbc-crc"),
            3 => f.write_str("des-cbc-md5"),
            16 => f.write_str("des3-cbc-sha1-kd"),
            17 => f.write_str("aes128-cts-hmac-sha1-96"),
            18 => f.write_str("aes256-cts-hmac-sha1-96"),
            19 => f.write_str("aes128-cts-hmac-sha256-128"),
            20 => f.write_str("aes256-cts-hmac-sha384-192"),
            23 => f.write_str("rc4-hmac"),
            n => f.debug_tuple("EncryptionType").field(&n).finish(),
        }
    }
}

impl fmt::Display for EncryptionType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}
