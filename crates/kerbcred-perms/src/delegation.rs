//! Delegation permissions.
//!
//! Grants the right to forward a subordinate service's ticket to a
//! target service. The target string quotes both principal names:
//!
//! ```text
//! "backup/db@EXAMPLE.COM" "krbtgt/EXAMPLE.COM@EXAMPLE.COM"
//! ```

use std::fmt;
use std::hash::{Hash, Hasher};

use kerbcred_core::KerberosPrincipal;

use crate::error::{PermsError, Result};
use crate::permission::Permission;

const QUOTE: &str = "\"";

/// Permission to delegate `subordinate` to `service`.
///
/// Implication is plain equality; there are no wildcards.
#[derive(Debug, Clone)]
pub struct DelegationPermission {
    target: String,
    subordinate: String,
    service: String,
}

impl DelegationPermission {
    /// Parse a `"subordinate" "service"` target string.
    pub fn new(target: impl Into<String>) -> Result<Self> {
        let target = target.into();
        let (subordinate, service) = parse_target(&target)?;
        Ok(Self {
            subordinate: subordinate.to_string(),
            service: service.to_string(),
            target,
        })
    }

    /// Build the permission for two principals.
    pub fn from_principals(
        subordinate: &KerberosPrincipal,
        service: &KerberosPrincipal,
    ) -> Result<Self> {
        Self::new(format!("\"{}\" \"{}\"", subordinate.name(), service.name()))
    }

    /// The target string this permission was built from.
    pub fn name(&self) -> &str {
        &self.target
    }

    pub fn subordinate(&self) -> &str {
        &self.subordinate
    }

    pub fn service(&self) -> &str {
        &self.service
    }

    /// Delegation permissions carry no actions.
    pub fn actions(&self) -> String {
        String::new()
    }

    pub fn implies(&self, other: &Permission) -> bool {
        match other {
            Permission::Delegation(other) => self == other,
            _ => false,
        }
    }
}

impl PartialEq for DelegationPermission {
    fn eq(&self, other: &Self) -> bool {
        self.subordinate == other.subordinate && self.service == other.service
    }
}

impl Eq for DelegationPermission {}

impl Hash for DelegationPermission {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.subordinate.hash(state);
        self.service.hash(state);
    }
}

impl fmt::Display for DelegationPermission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DelegationPermission({:?})", self.target)
    }
}

/// Split `target` on `"`, keeping each quote as its own token.
/// Empty runs between adjacent quotes produce no token.
fn tokenize(target: &str) -> Vec<&str> {
    let mut tokens = Vec::new();
    let mut start = 0;
    for (i, c) in target.char_indices() {
        if c == '"' {
            if start < i {
                tokens.push(&target[start..i]);
            }
            tokens.push(&target[i..i + 1]);
            start = i + 1;
        }
    }
    if start < target.len() {
        tokens.push(&target[start..]);
    }
    tokens
}

fn parse_target(target: &str) -> Result<(&str, &str)> {
    let malformed = |reason: &str| PermsError::MalformedTarget {
        target: target.to_string(),
        reason: reason.to_string(),
    };

    let Ok([open1, subordinate, close1, separator, open2, service, close2]) =
        <[&str; 7]>::try_from(tokenize(target))
    else {
        return Err(malformed("expected two quoted principal names"));
    };

    if [open1, close1, open2, close2].iter().any(|t| *t != QUOTE) {
        return Err(malformed("improperly quoted"));
    }
    if subordinate == QUOTE || service == QUOTE {
        return Err(malformed("principal name cannot be a quote"));
    }
    if !separator.chars().all(char::is_whitespace) {
        return Err(malformed("names must be separated by whitespace only"));
    }

    Ok((subordinate, service))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_target() {
        let p = DelegationPermission::new("\"a@R\" \"b@R\"").unwrap();

        assert_eq!(p.subordinate(), "a@R");
        assert_eq!(p.service(), "b@R");
        assert_eq!(p.name(), "\"a@R\" \"b@R\"");
        assert_eq!(p.actions(), "");
    }

    #[test]
    fn test_equal_when_built_from_same_string() {
        let a = DelegationPermission::new("\"a@R\" \"b@R\"").unwrap();
        let b = DelegationPermission::new("\"a@R\" \"b@R\"").unwrap();

        assert_eq!(a, b);
        assert!(a.implies(&b.into()));
    }

    #[test]
    fn test_separator_whitespace_does_not_matter_for_equality() {
        let a = DelegationPermission::new("\"a@R\" \"b@R\"").unwrap();
        let b = DelegationPermission::new("\"a@R\"\t  \"b@R\"").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_malformed_targets() {
        let bad = [
            "",
            "a@R b@R",
            "\"a@R\" \"b@R\" extra",
            "\"a@R\" \"b@R\"\"c\"",
            "\"a@R\"\"b@R\"",
            "\"a@R\" x \"b@R\"",
            "\"a@R\"",
            " \"a@R\" \"b@R\"",
            "\"\" \"b@R\"",
        ];
        for target in bad {
            assert!(
                matches!(
                    DelegationPermission::new(target),
                    Err(PermsError::MalformedTarget { .. })
                ),
                "{target:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_from_principals() {
        let sub = KerberosPrincipal::parse("backup/db@EXAMPLE.COM").unwrap();
        let svc = KerberosPrincipal::parse("krbtgt/EXAMPLE.COM@EXAMPLE.COM").unwrap();
        let p = DelegationPermission::from_principals(&sub, &svc).unwrap();

        assert_eq!(p.subordinate(), "backup/db@EXAMPLE.COM");
        assert_eq!(p.service(), "krbtgt/EXAMPLE.COM@EXAMPLE.COM");
    }

    #[test]
    fn test_not_implied_by_service_permission() {
        let d = DelegationPermission::new("\"a@R\" \"b@R\"").unwrap();
        let s = crate::ServicePermission::new("*", "initiate").unwrap();
        assert!(!d.implies(&s.into()));
    }
}
