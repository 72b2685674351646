//! Service permissions.
//!
//! A service permission names a Kerberos service principal and the role a
//! caller may play when establishing a security context with it:
//! `initiate` (act as a client) and/or `accept` (act as the service).
//!
//! The principal name is one of:
//!
//! - `*`, any principal
//! - `@REALM`, any principal in `REALM`
//! - a concrete name such as `host/server.example.com@REALM`

use std::fmt;
use std::ops::{BitOr, BitOrAssign};

use kerbcred_core::KerberosPrincipal;

use crate::error::{PermsError, Result};
use crate::permission::Permission;

/// Set of service actions.
///
/// [`ActionMask::NONE`] is special when it is the *requested* mask: it
/// asks "may the caller do anything at all with this principal", so the
/// action check is skipped and only the name has to match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ActionMask(u8);

impl ActionMask {
    pub const NONE: ActionMask = ActionMask(0);
    pub const INITIATE: ActionMask = ActionMask(1);
    pub const ACCEPT: ActionMask = ActionMask(2);
    pub const ALL: ActionMask = ActionMask(3);

    /// Build a mask from raw bits. Fails on bits outside `initiate|accept`.
    pub const fn from_bits(bits: u8) -> Option<Self> {
        if bits & !Self::ALL.0 != 0 {
            None
        } else {
            Some(Self(bits))
        }
    }

    pub const fn bits(self) -> u8 {
        self.0
    }

    pub const fn is_none(self) -> bool {
        self.0 == 0
    }

    /// Whether every action in `other` is also in `self`.
    pub const fn contains(self, other: ActionMask) -> bool {
        self.0 & other.0 == other.0
    }

    /// Parse an action string.
    ///
    /// Accepts a comma separated, case-insensitive list of `initiate` and
    /// `accept` with optional whitespace around each token, or the single
    /// string `-` for [`ActionMask::NONE`].
    pub fn parse(actions: &str) -> Result<Self> {
        if actions == "-" {
            return Ok(Self::NONE);
        }

        let mut mask = Self::NONE;
        for token in actions.split(',') {
            let token = token.trim_matches(is_action_whitespace);
            if token.eq_ignore_ascii_case("initiate") {
                mask |= Self::INITIATE;
            } else if token.eq_ignore_ascii_case("accept") {
                mask |= Self::ACCEPT;
            } else {
                return Err(PermsError::MalformedAction(actions.to_string()));
            }
        }
        Ok(mask)
    }
}

fn is_action_whitespace(c: char) -> bool {
    matches!(c, ' ' | '\r' | '\n' | '\t' | '\x0c')
}

impl BitOr for ActionMask {
    type Output = ActionMask;

    fn bitor(self, rhs: ActionMask) -> ActionMask {
        ActionMask(self.0 | rhs.0)
    }
}

impl BitOrAssign for ActionMask {
    fn bitor_assign(&mut self, rhs: ActionMask) {
        self.0 |= rhs.0;
    }
}

impl fmt::Display for ActionMask {
    /// Canonical action string: `initiate`, `accept`, `initiate,accept`,
    /// or `-` for none.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.contains(Self::INITIATE), self.contains(Self::ACCEPT)) {
            (true, true) => f.write_str("initiate,accept"),
            (true, false) => f.write_str("initiate"),
            (false, true) => f.write_str("accept"),
            (false, false) => f.write_str("-"),
        }
    }
}

/// Permission to initiate and/or accept security contexts for a service
/// principal.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ServicePermission {
    name: String,
    mask: ActionMask,
}

impl ServicePermission {
    /// Create a permission from a principal name and an action string.
    pub fn new(name: impl Into<String>, actions: &str) -> Result<Self> {
        let mask = ActionMask::parse(actions)?;
        Self::with_mask(name, mask)
    }

    /// Create a permission from an already parsed mask.
    pub fn with_mask(name: impl Into<String>, mask: ActionMask) -> Result<Self> {
        let name = name.into();
        if name.is_empty() {
            return Err(PermsError::EmptyName);
        }
        Ok(Self { name, mask })
    }

    /// Permission for a concrete principal.
    pub fn for_principal(principal: &KerberosPrincipal, mask: ActionMask) -> Self {
        Self {
            name: principal.name().to_string(),
            mask,
        }
    }

    /// The `@REALM`, `-` permission needed to learn a configured realm.
    pub fn realm_access(realm: &str) -> Self {
        Self {
            name: format!("@{}", realm),
            mask: ActionMask::NONE,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn mask(&self) -> ActionMask {
        self.mask
    }

    /// Canonical action string.
    pub fn actions(&self) -> String {
        self.mask.to_string()
    }

    /// Whether holding `self` grants `other`.
    ///
    /// Only service permissions can be implied.
    pub fn implies(&self, other: &Permission) -> bool {
        match other {
            Permission::Service(other) => self.implies_service(other),
            _ => false,
        }
    }

    /// Mask check followed by [`implies_ignore_mask`](Self::implies_ignore_mask).
    ///
    /// A requested mask of [`ActionMask::NONE`] skips the mask check.
    pub fn implies_service(&self, other: &ServicePermission) -> bool {
        (other.mask.is_none() || self.mask.contains(other.mask)) && self.implies_ignore_mask(other)
    }

    /// Name matching only.
    ///
    /// `*` matches everything. Otherwise the names must be equal, or one
    /// of them must be a realm (`@REALM`) that the other ends with.
    ///
    /// A lone `@R` with `accept` therefore implies `host/x@R` with
    /// `accept`. A [`ServicePermissionCollection`] holding the same entry
    /// does not: it consults realm entries only for requests whose mask
    /// is [`ActionMask::NONE`].
    ///
    /// [`ServicePermissionCollection`]: crate::ServicePermissionCollection
    pub fn implies_ignore_mask(&self, other: &ServicePermission) -> bool {
        self.name == "*"
            || self.name == other.name
            || (other.name.starts_with('@') && self.name.ends_with(&other.name))
            || (self.name.starts_with('@') && other.name.ends_with(&self.name))
    }
}

impl fmt::Display for ServicePermission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ServicePermission({:?}, {:?})", self.name, self.actions())
    }
}
