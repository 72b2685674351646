//! The permission variant and the traits shared by permission holders.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::collection::{DelegationPermissionCollection, ServicePermissionCollection};
use crate::delegation::DelegationPermission;
use crate::error::{PermsError, Result};
use crate::service::ServicePermission;

/// A Kerberos permission.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Permission {
    Service(ServicePermission),
    Delegation(DelegationPermission),
}

/// Discriminator for [`Permission`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PermissionKind {
    Service,
    Delegation,
}

impl PermissionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            PermissionKind::Service => "service",
            PermissionKind::Delegation => "delegation",
        }
    }
}

impl Permission {
    pub fn kind(&self) -> PermissionKind {
        match self {
            Permission::Service(_) => PermissionKind::Service,
            Permission::Delegation(_) => PermissionKind::Delegation,
        }
    }

    /// Principal name (service) or target string (delegation).
    pub fn name(&self) -> &str {
        match self {
            Permission::Service(p) => p.name(),
            Permission::Delegation(p) => p.name(),
        }
    }

    /// Canonical action string; empty for delegation permissions.
    pub fn actions(&self) -> String {
        match self {
            Permission::Service(p) => p.actions(),
            Permission::Delegation(p) => p.actions(),
        }
    }

    /// Whether holding `self` grants `other`. Permissions of different
    /// kinds never imply each other.
    pub fn implies(&self, other: &Permission) -> bool {
        match self {
            Permission::Service(p) => p.implies(other),
            Permission::Delegation(p) => p.implies(other),
        }
    }

    /// An empty collection able to hold permissions of this kind.
    pub fn new_collection(&self) -> Box<dyn PermissionCollection> {
        match self {
            Permission::Service(_) => Box::new(ServicePermissionCollection::new()),
            Permission::Delegation(_) => Box::new(DelegationPermissionCollection::new()),
        }
    }
}

impl From<ServicePermission> for Permission {
    fn from(p: ServicePermission) -> Self {
        Permission::Service(p)
    }
}

impl From<DelegationPermission> for Permission {
    fn from(p: DelegationPermission) -> Self {
        Permission::Delegation(p)
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Permission::Service(p) => fmt::Display::fmt(p, f),
            Permission::Delegation(p) => fmt::Display::fmt(p, f),
        }
    }
}

/// A thread-safe, growable set of permissions.
///
/// Implementations may be shared across threads: `add` and `implies`
/// take `&self`. A collection frozen with `set_read_only` rejects further
/// additions with [`PermsError::ReadOnly`].
pub trait PermissionCollection: Send + Sync + fmt::Debug {
    /// Add a permission.
    fn add(&self, permission: Permission) -> Result<()>;

    /// Whether the permissions held grant `permission`.
    fn implies(&self, permission: &Permission) -> bool;

    /// A snapshot of the held permissions. Permissions added concurrently
    /// may or may not appear.
    fn elements(&self) -> Vec<Permission>;

    /// Freeze the collection.
    fn set_read_only(&self);

    fn is_read_only(&self) -> bool;
}

/// Decides whether the current caller holds a permission.
///
/// Injected wherever a constructor or operation must be gated, in place
/// of a process-global security manager.
pub trait AuthorizationPolicy: Send + Sync {
    /// `Ok(())` when `permission` is granted, [`PermsError::AccessDenied`]
    /// otherwise.
    fn check(&self, permission: &Permission) -> Result<()>;
}

impl<F> AuthorizationPolicy for F
where
    F: Fn(&Permission) -> bool + Send + Sync,
{
    fn check(&self, permission: &Permission) -> Result<()> {
        if self(permission) {
            Ok(())
        } else {
            Err(PermsError::AccessDenied(permission.to_string()))
        }
    }
}

/// Policy granting everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAll;

impl AuthorizationPolicy for AllowAll {
    fn check(&self, _permission: &Permission) -> Result<()> {
        Ok(())
    }
}
