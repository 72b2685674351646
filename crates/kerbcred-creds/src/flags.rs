//! Ticket flags (RFC 4120 section 5.3).

use std::fmt;

use crate::error::{CredError, Result};

/// Number of flag positions carried by a ticket.
pub const NUM_FLAGS: usize = 32;

pub const RESERVED: usize = 0;
pub const FORWARDABLE: usize = 1;
pub const FORWARDED: usize = 2;
pub const PROXIABLE: usize = 3;
pub const PROXY: usize = 4;
pub const MAY_POSTDATE: usize = 5;
pub const POSTDATED: usize = 6;
pub const INVALID: usize = 7;
pub const RENEWABLE: usize = 8;
pub const INITIAL: usize = 9;
pub const PRE_AUTHENT: usize = 10;
pub const HW_AUTHENT: usize = 11;

const NAMES: [(usize, &str); 11] = [
    (FORWARDABLE, "FORWARDABLE"),
    (FORWARDED, "FORWARDED"),
    (PROXIABLE, "PROXIABLE"),
    (PROXY, "PROXY"),
    (MAY_POSTDATE, "MAY_POSTDATE"),
    (POSTDATED, "POSTDATED"),
    (INVALID, "INVALID"),
    (RENEWABLE, "RENEWABLE"),
    (INITIAL, "INITIAL"),
    (PRE_AUTHENT, "PRE_AUTHENT"),
    (HW_AUTHENT, "HW_AUTHENT"),
];

/// Fixed 32-position flag vector. Position 0 is the most significant bit
/// of the wire encoding.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct TicketFlags([bool; NUM_FLAGS]);

impl TicketFlags {
    pub const fn empty() -> Self {
        Self([false; NUM_FLAGS])
    }

    /// Build from a flag slice, padding with `false` up to 32 entries.
    pub fn from_slice(flags: &[bool]) -> Result<Self> {
        if flags.len() > NUM_FLAGS {
            return Err(CredError::InvalidArgument(format!(
                "ticket carries {} flags, at most {} are defined",
                flags.len(),
                NUM_FLAGS
            )));
        }
        let mut out = [false; NUM_FLAGS];
        out[..flags.len()].copy_from_slice(flags);
        Ok(Self(out))
    }

    /// Decode the 32-bit wire form.
    pub fn from_u32(bits: u32) -> Self {
        let mut out = [false; NUM_FLAGS];
        for (i, flag) in out.iter_mut().enumerate() {
            *flag = bits & (1 << (NUM_FLAGS - 1 - i)) != 0;
        }
        Self(out)
    }

    pub fn to_u32(self) -> u32 {
        self.0
            .iter()
            .enumerate()
            .filter(|(_, set)| **set)
            .fold(0, |acc, (i, _)| acc | 1 << (NUM_FLAGS - 1 - i))
    }

    /// Set the flag at `index`. Indices past 31 are ignored.
    pub fn with(mut self, index: usize) -> Self {
        if let Some(flag) = self.0.get_mut(index) {
            *flag = true;
        }
        self
    }

    pub fn is_set(&self, index: usize) -> bool {
        self.0.get(index).copied().unwrap_or(false)
    }

    pub fn as_array(&self) -> [bool; NUM_FLAGS] {
        self.0
    }
}

impl fmt::Debug for TicketFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TicketFlags({:#010x})", self.to_u32())
    }
}

impl fmt::Display for TicketFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (index, name) in NAMES {
            if self.is_set(index) {
                if !first {
                    f.write_str(";")?;
                }
                f.write_str(name)?;
                first = false;
            }
        }
        Ok(())
    }
}
