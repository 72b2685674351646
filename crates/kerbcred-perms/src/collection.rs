//! Concurrent permission collections.
//!
//! Service permissions are indexed by principal name so that ordinary
//! checks touch at most two entries (`*` and the exact name). Adding a
//! permission for a name already present merges the action masks into a
//! single entry. Entries are always replaced wholesale, never mutated in
//! place, so concurrent readers see either the old or the new permission.

use std::sync::atomic::{AtomicBool, Ordering};

use dashmap::mapref::entry::Entry;
use dashmap::{DashMap, DashSet};

use crate::delegation::DelegationPermission;
use crate::error::{PermsError, Result};
use crate::permission::{AuthorizationPolicy, Permission, PermissionCollection, PermissionKind};
use crate::service::ServicePermission;

/// Service permissions keyed by principal name.
#[derive(Debug, Default)]
pub struct ServicePermissionCollection {
    perms: DashMap<String, ServicePermission>,
    read_only: AtomicBool,
}

impl ServicePermissionCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of distinct principal names held.
    pub fn len(&self) -> usize {
        self.perms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.perms.is_empty()
    }

    /// The merged permission stored for `name`, if any.
    pub fn get(&self, name: &str) -> Option<ServicePermission> {
        self.perms.get(name).map(|p| p.value().clone())
    }

    /// Add a service permission, merging with any entry of the same name.
    pub fn add_service(&self, permission: ServicePermission) -> Result<()> {
        if self.is_read_only() {
            return Err(PermsError::ReadOnly);
        }

        match self.perms.entry(permission.name().to_string()) {
            Entry::Vacant(entry) => {
                entry.insert(permission);
            }
            Entry::Occupied(mut entry) => {
                let old_mask = entry.get().mask();
                let new_mask = permission.mask();
                if old_mask != new_mask {
                    let effective = old_mask | new_mask;
                    if effective == new_mask {
                        entry.insert(permission);
                    } else if effective != old_mask {
                        let merged = ServicePermission::with_mask(entry.key().clone(), effective)?;
                        entry.insert(merged);
                    }
                }
            }
        }
        Ok(())
    }

    /// Whether the held permissions grant `requested`.
    pub fn implies_service(&self, requested: &ServicePermission) -> bool {
        let desired = requested.mask();

        // "Any action" requests cannot use the name index: a realm or
        // wildcard entry can match under a different key.
        if desired.is_none() {
            return self
                .perms
                .iter()
                .any(|entry| entry.value().implies_ignore_mask(requested));
        }

        let wildcard = self.perms.get("*").map(|p| p.mask());
        if wildcard.is_some_and(|mask| mask.contains(desired)) {
            return true;
        }

        let exact = self.perms.get(requested.name()).map(|p| p.mask());
        exact.is_some_and(|mask| mask.contains(desired))
    }
}

impl PermissionCollection for ServicePermissionCollection {
    fn add(&self, permission: Permission) -> Result<()> {
        match permission {
            Permission::Service(p) => self.add_service(p),
            other => Err(PermsError::TypeMismatch {
                expected: PermissionKind::Service.as_str(),
                found: other.kind().as_str(),
            }),
        }
    }

    fn implies(&self, permission: &Permission) -> bool {
        match permission {
            Permission::Service(p) => self.implies_service(p),
            _ => false,
        }
    }

    fn elements(&self) -> Vec<Permission> {
        self.perms
            .iter()
            .map(|entry| Permission::Service(entry.value().clone()))
            .collect()
    }

    fn set_read_only(&self) {
        self.read_only.store(true, Ordering::Release);
    }

    fn is_read_only(&self) -> bool {
        self.read_only.load(Ordering::Acquire)
    }
}

/// Delegation permissions, held as a set.
#[derive(Debug, Default)]
pub struct DelegationPermissionCollection {
    perms: DashSet<DelegationPermission>,
    read_only: AtomicBool,
}

impl DelegationPermissionCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.perms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.perms.is_empty()
    }
}

impl PermissionCollection for DelegationPermissionCollection {
    fn add(&self, permission: Permission) -> Result<()> {
        if self.is_read_only() {
            return Err(PermsError::ReadOnly);
        }
        match permission {
            Permission::Delegation(p) => {
                self.perms.insert(p);
                Ok(())
            }
            other => Err(PermsError::TypeMismatch {
                expected: PermissionKind::Delegation.as_str(),
                found: other.kind().as_str(),
            }),
        }
    }

    fn implies(&self, permission: &Permission) -> bool {
        match permission {
            Permission::Delegation(p) => self.perms.contains(p),
            _ => false,
        }
    }

    fn elements(&self) -> Vec<Permission> {
        self.perms
            .iter()
            .map(|p| Permission::Delegation(p.key().clone()))
            .collect()
    }

    fn set_read_only(&self) {
        self.read_only.store(true, Ordering::Release);
    }

    fn is_read_only(&self) -> bool {
        self.read_only.load(Ordering::Acquire)
    }
}

/// Heterogeneous permission holder routing each permission to the
/// collection for its kind.
#[derive(Debug, Default)]
pub struct PermissionSet {
    service: ServicePermissionCollection,
    delegation: DelegationPermissionCollection,
}

impl PermissionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a set from an iterator of permissions.
    pub fn from_permissions(permissions: impl IntoIterator<Item = Permission>) -> Result<Self> {
        let set = Self::new();
        for permission in permissions {
            set.add(permission)?;
        }
        Ok(set)
    }

    pub fn services(&self) -> &ServicePermissionCollection {
        &self.service
    }

    pub fn delegations(&self) -> &DelegationPermissionCollection {
        &self.delegation
    }
}

impl PermissionCollection for PermissionSet {
    fn add(&self, permission: Permission) -> Result<()> {
        match permission.kind() {
            PermissionKind::Service => self.service.add(permission),
            PermissionKind::Delegation => self.delegation.add(permission),
        }
    }

    fn implies(&self, permission: &Permission) -> bool {
        match permission.kind() {
            PermissionKind::Service => self.service.implies(permission),
            PermissionKind::Delegation => self.delegation.implies(permission),
        }
    }

    fn elements(&self) -> Vec<Permission> {
        let mut all = self.service.elements();
        all.extend(self.delegation.elements());
        all
    }

    fn set_read_only(&self) {
        self.service.set_read_only();
        self.delegation.set_read_only();
    }

    fn is_read_only(&self) -> bool {
        self.service.is_read_only() && self.delegation.is_read_only()
    }
}

impl AuthorizationPolicy for PermissionSet {
    fn check(&self, permission: &Permission) -> Result<()> {
        if self.implies(permission) {
            Ok(())
        } else {
            tracing::debug!(permission = %permission, "permission not granted");
            Err(PermsError::AccessDenied(permission.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn sp(name: &str, actions: &str) -> Permission {
        ServicePermission::new(name, actions).unwrap().into()
    }

    fn dp(target: &str) -> Permission {
        DelegationPermission::new(target).unwrap().into()
    }

    #[test]
    fn test_merge_on_add() {
        let c = ServicePermissionCollection::new();
        c.add(sp("svc", "initiate")).unwrap();
        c.add(sp("svc", "accept")).unwrap();

        assert_eq!(c.len(), 1);
        let stored = c.get("svc").unwrap();
        assert_eq!(stored.actions(), "initiate,accept");
        assert_eq!(c.elements().len(), 1);
    }

    #[test]
    fn test_add_subset_keeps_existing() {
        let c = ServicePermissionCollection::new();
        c.add(sp("svc", "initiate,accept")).unwrap();
        c.add(sp("svc", "accept")).unwrap();

        assert_eq!(c.get("svc").unwrap().actions(), "initiate,accept");
    }

    #[test]
    fn test_add_superset_replaces() {
        let c = ServicePermissionCollection::new();
        c.add(sp("svc", "-")).unwrap();
        c.add(sp("svc", "accept")).unwrap();

        assert_eq!(c.get("svc").unwrap().actions(), "accept");
    }

    #[test]
    fn test_implies_via_wildcard_and_exact() {
        let c = ServicePermissionCollection::new();
        c.add(sp("*", "accept")).unwrap();
        c.add(sp("host/x@R", "initiate")).unwrap();

        assert!(c.implies(&sp("host/y@R", "accept")));
        assert!(c.implies(&sp("host/x@R", "initiate")));
        assert!(!c.implies(&sp("host/y@R", "initiate")));
        // Neither entry alone covers both actions.
        assert!(!c.implies(&sp("host/x@R", "initiate,accept")));
    }

    #[test]
    fn test_none_mask_scans_names() {
        let c = ServicePermissionCollection::new();
        c.add(sp("host/x@R", "accept")).unwrap();

        assert!(c.implies(&sp("host/x@R", "-")));
        assert!(c.implies(&sp("@R", "-")));
        assert!(!c.implies(&sp("@S", "-")));
        assert!(!c.implies(&sp("host/y@R", "-")));
    }

    #[test]
    fn test_realm_entry_not_used_for_masked_requests() {
        let c = ServicePermissionCollection::new();
        c.add(sp("@R", "accept")).unwrap();

        assert!(!c.implies(&sp("host/x@R", "accept")));
        assert!(c.implies(&sp("host/x@R", "-")));
    }

    #[test]
    fn test_read_only_rejects_add() {
        let c = ServicePermissionCollection::new();
        c.add(sp("svc", "accept")).unwrap();
        c.set_read_only();

        assert!(c.is_read_only());
        assert!(matches!(c.add(sp("svc", "initiate")), Err(PermsError::ReadOnly)));
        assert_eq!(c.get("svc").unwrap().actions(), "accept");
    }

    #[test]
    fn test_type_mismatch() {
        let services = ServicePermissionCollection::new();
        let delegations = DelegationPermissionCollection::new();

        assert!(matches!(
            services.add(dp("\"a@R\" \"b@R\"")),
            Err(PermsError::TypeMismatch { expected: "service", found: "delegation" })
        ));
        assert!(matches!(
            delegations.add(sp("svc", "accept")),
            Err(PermsError::TypeMismatch { expected: "delegation", found: "service" })
        ));
    }

    #[test]
    fn test_delegation_collection() {
        let c = DelegationPermissionCollection::new();
        c.add(dp("\"a@R\" \"b@R\"")).unwrap();
        c.add(dp("\"a@R\"  \"b@R\"")).unwrap();

        assert_eq!(c.len(), 1);
        assert!(c.implies(&dp("\"a@R\" \"b@R\"")));
        assert!(!c.implies(&dp("\"b@R\" \"a@R\"")));

        c.set_read_only();
        assert!(matches!(c.add(dp("\"c@R\" \"d@R\"")), Err(PermsError::ReadOnly)));
    }

    #[test]
    fn test_permission_set_routes_by_kind() {
        let set = PermissionSet::from_permissions([
            sp("host/x@R", "initiate"),
            dp("\"a@R\" \"b@R\""),
        ])
        .unwrap();

        assert!(set.implies(&sp("host/x@R", "initiate")));
        assert!(set.implies(&dp("\"a@R\" \"b@R\"")));
        assert_eq!(set.elements().len(), 2);
        assert!(set.check(&sp("host/x@R", "accept")).is_err());
    }

    #[test]
    fn test_concurrent_adds_merge() {
        let c = Arc::new(ServicePermissionCollection::new());
        let handles: Vec<_> = (0..16)
            .map(|i| {
                let c = c.clone();
                std::thread::spawn(move || {
                    let actions = if i % 2 == 0 { "initiate" } else { "accept" };
                    c.add(sp("svc", actions)).unwrap();
                    c.implies(&sp("svc", "-"))
                })
            })
            .collect();

        for h in handles {
            assert!(h.join().unwrap());
        }
        assert_eq!(c.len(), 1);
        assert_eq!(c.get("svc").unwrap().actions(), "initiate,accept");
    }
}
