//! Ticket client addresses.

use std::fmt;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use bytes::Bytes;

/// Address type for IPv4 (RFC 4120 section 7.5.3).
pub const ADDR_TYPE_INET: i32 = 2;
/// Address type for IPv6.
pub const ADDR_TYPE_INET6: i32 = 24;

/// A typed host address as carried in a ticket.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct HostAddress {
    addr_type: i32,
    address: Bytes,
}

impl HostAddress {
    pub fn new(addr_type: i32, address: impl Into<Bytes>) -> Self {
        Self {
            addr_type,
            address: address.into(),
        }
    }

    pub fn addr_type(&self) -> i32 {
        self.addr_type
    }

    pub fn address(&self) -> &[u8] {
        &self.address
    }

    /// The IP address, when this is an IPv4 or IPv6 entry of the right
    /// length.
    pub fn ip(&self) -> Option<IpAddr> {
        match self.addr_type {
            ADDR_TYPE_INET => {
                let octets: [u8; 4] = self.address.as_ref().try_into().ok()?;
                Some(IpAddr::V4(Ipv4Addr::from(octets)))
            }
            ADDR_TYPE_INET6 => {
                let octets: [u8; 16] = self.address.as_ref().try_into().ok()?;
                Some(IpAddr::V6(Ipv6Addr::from(octets)))
            }
            _ => None,
        }
    }
}

impl From<IpAddr> for HostAddress {
    fn from(ip: IpAddr) -> Self {
        match ip {
            IpAddr::V4(v4) => Self::new(ADDR_TYPE_INET, v4.octets().to_vec()),
            IpAddr::V6(v6) => Self::new(ADDR_TYPE_INET6, v6.octets().to_vec()),
        }
    }
}

impl fmt::Debug for HostAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.ip() {
            Some(ip) => write!(f, "HostAddress({})", ip),
            None => write!(
                f,
                "HostAddress(type={}, {})",
                self.addr_type,
                hex::encode(&self.address)
            ),
        }
    }
}

impl fmt::Display for HostAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ip_conversion() {
        let v4: IpAddr = "192.0.2.7".parse().unwrap();
        let addr = HostAddress::from(v4);
        assert_eq!(addr.addr_type(), ADDR_TYPE_INET);
        assert_eq!(addr.ip(), Some(v4));

        let v6: IpAddr = "2001:db8::1".parse().unwrap();
        assert_eq!(HostAddress::from(v6).ip(), Some(v6));
    }

    #[test]
    fn test_unknown_type_has_no_ip() {
        let addr = HostAddress::new(20, vec![1, 2, 3]);
        assert_eq!(addr.ip(), None);
        assert_eq!(format!("{:?}", addr), "HostAddress(type=20, 010203)");
    }
}
