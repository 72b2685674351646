//! Content-addressed ticket identifiers.

use std::fmt;

/// A 32-byte ticket identifier, computed as Blake3(ticket encoding).
///
/// Used to refer to another ticket (the evidence ticket behind a proxy)
/// without holding on to it.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct TicketId(pub [u8; 32]);

impl TicketId {
    /// Hash a ticket encoding.
    pub fn of_encoding(encoding: &[u8]) -> Self {
        Self(*blake3::hash(encoding).as_bytes())
    }

    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parse from hex string.
    pub fn from_hex(s: &str) -> Result<Self, hex::FromHexError> {
        let bytes = hex::decode(s)?;
        let arr: [u8; 32] = bytes
            .try_into()
            .map_err(|_| hex::FromHexError::InvalidStringLength)?;
        Ok(Self(arr))
    }
}

impl fmt::Debug for TicketId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TicketId({})", &self.to_hex()[..16])
    }
}

impl fmt::Display for TicketId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", &self.to_hex()[..16])
    }
}

impl AsRef<[u8]> for TicketId {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_encoding_same_id() {
        let a = TicketId::of_encoding(b"ticket");
        let b = TicketId::of_encoding(b"ticket");
        let c = TicketId::of_encoding(b"other");

        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_hex_parse() {
        let id = TicketId::from_bytes([0xab; 32]);
        assert_eq!(TicketId::from_hex(&id.to_hex()).unwrap(), id);
        assert_eq!(id.to_string(), "abababababababab");
        assert!(TicketId::from_hex("abcd").is_err());
    }
}
