//! Kerberos principal names.
//!
//! A principal is written `component[/component...]@REALM`. A backslash
//! escapes the next character, so `/` and `@` can appear inside a
//! component. Enterprise names (`user@example.com@REALM`) take the realm
//! from the last unescaped `@` instead of the first.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;
use std::sync::Arc;

use crate::error::{CoreError, Result};

/// Kerberos realm.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Realm(String);

impl Realm {
    /// Create a realm. Fails on an empty string.
    pub fn new(realm: impl Into<String>) -> Result<Self> {
        let realm = realm.into();
        if realm.is_empty() {
            return Err(CoreError::InvalidPrincipal {
                name: realm,
                reason: "empty realm".to_string(),
            });
        }
        Ok(Self(realm))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Realm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Principal name type (RFC 4120 section 6.2).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum NameType {
    Unknown = 0,
    Principal = 1,
    SrvInst = 2,
    SrvHst = 3,
    SrvXhst = 4,
    Uid = 5,
    Enterprise = 10,
}

impl TryFrom<i32> for NameType {
    type Error = CoreError;

    fn try_from(value: i32) -> Result<Self> {
        match value {
            0 => Ok(NameType::Unknown),
            1 => Ok(NameType::Principal),
            2 => Ok(NameType::SrvInst),
            3 => Ok(NameType::SrvHst),
            4 => Ok(NameType::SrvXhst),
            5 => Ok(NameType::Uid),
            10 => Ok(NameType::Enterprise),
            n => Err(CoreError::UnknownNameType(n)),
        }
    }
}

/// A realm-qualified Kerberos principal.
///
/// Equality and hashing use the full name only; the name type is
/// informational.
#[derive(Clone)]
pub struct KerberosPrincipal {
    name: String,
    components: Vec<String>,
    realm: Realm,
    name_type: NameType,
}

impl KerberosPrincipal {
    /// Parse a fully qualified name. The realm must be present.
    pub fn parse(name: &str) -> Result<Self> {
        PrincipalResolver::default().parse(name)
    }

    /// Full name, `components@REALM`, as written by the caller.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Unescaped name components, without the realm.
    pub fn components(&self) -> &[String] {
        &self.components
    }

    pub fn realm(&self) -> &Realm {
        &self.realm
    }

    pub fn name_type(&self) -> NameType {
        self.name_type
    }
}

impl PartialEq for KerberosPrincipal {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for KerberosPrincipal {}

impl Hash for KerberosPrincipal {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}

impl fmt::Debug for KerberosPrincipal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "KerberosPrincipal({})", self.name)
    }
}

impl fmt::Display for KerberosPrincipal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

impl FromStr for KerberosPrincipal {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

type RealmCheck = dyn Fn(&Realm) -> bool + Send + Sync;

/// Parses principal names, filling in a configured default realm.
///
/// When the realm comes from configuration rather than from the name
/// itself, the optional realm check decides whether the caller may learn
/// it. A rejected check fails the parse with
/// [`CoreError::RealmAccessDenied`].
#[derive(Clone, Default)]
pub struct PrincipalResolver {
    default_realm: Option<Realm>,
    realm_check: Option<Arc<RealmCheck>>,
}

impl PrincipalResolver {
    /// Create a resolver with an optional default realm.
    pub fn new(default_realm: Option<Realm>) -> Self {
        Self {
            default_realm,
            realm_check: None,
        }
    }

    /// Install the check consulted whenever the default realm is applied.
    pub fn with_realm_check<F>(mut self, check: F) -> Self
    where
        F: Fn(&Realm) -> bool + Send + Sync + 'static,
    {
        self.realm_check = Some(Arc::new(check));
        self
    }

    pub fn default_realm(&self) -> Option<&Realm> {
        self.default_realm.as_ref()
    }

    /// Parse a principal name of type [`NameType::Principal`].
    pub fn parse(&self, name: &str) -> Result<KerberosPrincipal> {
        self.parse_with_type(name, NameType::Principal)
    }

    /// Parse a principal name of the given type.
    pub fn parse_with_type(&self, name: &str, name_type: NameType) -> Result<KerberosPrincipal> {
        let parts = split_name(name, name_type)?;

        let (realm, full_name) = match parts.realm {
            Some(realm) => (Realm(realm), name.to_string()),
            None => {
                let realm = self
                    .default_realm
                    .clone()
                    .ok_or_else(|| CoreError::NoDefaultRealm(name.to_string()))?;
                if let Some(check) = &self.realm_check {
                    if !check(&realm) {
                        return Err(CoreError::RealmAccessDenied(realm.to_string()));
                    }
                }
                tracing::debug!(principal = name, realm = %realm, "applied default realm");
                let full_name = format!("{}@{}", name, realm);
                (realm, full_name)
            }
        };

        Ok(KerberosPrincipal {
            name: full_name,
            components: parts.components,
            realm,
            name_type,
        })
    }
}

impl fmt::Debug for PrincipalResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrincipalResolver")
            .field("default_realm", &self.default_realm)
            .field("realm_check", &self.realm_check.is_some())
            .finish()
    }
}

struct NameParts {
    components: Vec<String>,
    realm: Option<String>,
}

fn split_name(name: &str, name_type: NameType) -> Result<NameParts> {
    let invalid = |reason: &str| CoreError::InvalidPrincipal {
        name: name.to_string(),
        reason: reason.to_string(),
    };

    if name.is_empty() {
        return Err(invalid("empty name"));
    }

    // (char, escaped)
    let mut tokens = Vec::with_capacity(name.len());
    let mut chars = name.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            let next = chars.next().ok_or_else(|| invalid("trailing escape"))?;
            tokens.push((next, true));
        } else {
            tokens.push((c, false));
        }
    }

    let is_at = |t: &(char, bool)| *t == ('@', false);
    let separator = if name_type == NameType::Enterprise {
        tokens.iter().rposition(is_at)
    } else {
        tokens.iter().position(is_at)
    };

    let (name_part, realm_part) = match separator {
        Some(at) => (&tokens[..at], Some(&tokens[at + 1..])),
        None => (&tokens[..], None),
    };

    let mut components = Vec::new();
    let mut current = String::new();
    for &(c, escaped) in name_part {
        if c == '/' && !escaped {
            components.push(std::mem::take(&mut current));
        } else {
            current.push(c);
        }
    }
    components.push(current);
    if components.iter().any(String::is_empty) {
        return Err(invalid("empty name component"));
    }

    let realm = match realm_part {
        None => None,
        Some([]) => return Err(invalid("empty realm")),
        Some(realm) => {
            if realm.iter().any(|&(c, escaped)| !escaped && (c == '@' || c == '/')) {
                return Err(invalid("separator inside realm"));
            }
            Some(realm.iter().map(|&(c, _)| c).collect())
        }
    };

    Ok(NameParts { components, realm })
}
