//! Versioned CBOR records for permissions and permission collections.
//!
//! Records carry an explicit version byte. Decoding rejects versions this
//! crate does not know. Older stores that predate versioning kept service
//! permissions as bare `{name, actions}` maps and service collections as a
//! plain list of those; the `legacy` adapters upgrade them.

use serde::{Deserialize, Serialize};

use crate::collection::{PermissionSet, ServicePermissionCollection};
use crate::delegation::DelegationPermission;
use crate::error::{PermsError, Result};
use crate::permission::{Permission, PermissionCollection, PermissionKind};
use crate::service::ServicePermission;

/// Current record version.
pub const RECORD_VERSION: u8 = 1;

/// A single permission on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionRecord {
    pub version: u8,
    pub kind: PermissionKind,
    /// Principal name or delegation target.
    pub name: String,
    /// Canonical action string; empty for delegation.
    pub actions: String,
}

impl PermissionRecord {
    pub fn from_permission(permission: &Permission) -> Self {
        Self {
            version: RECORD_VERSION,
            kind: permission.kind(),
            name: permission.name().to_string(),
            actions: permission.actions(),
        }
    }

    /// Rebuild the permission, re-running the same validation as the
    /// constructors.
    pub fn into_permission(self) -> Result<Permission> {
        check_version(self.version)?;
        match self.kind {
            PermissionKind::Service => Ok(ServicePermission::new(self.name, &self.actions)?.into()),
            PermissionKind::Delegation => Ok(DelegationPermission::new(self.name)?.into()),
        }
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        encode(self)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let record: Self = decode(bytes)?;
        check_version(record.version)?;
        Ok(record)
    }
}

/// A permission collection on the wire, including its read-only flag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionRecord {
    pub version: u8,
    pub read_only: bool,
    pub permissions: Vec<PermissionRecord>,
}

impl CollectionRecord {
    /// Snapshot a collection.
    pub fn from_collection(collection: &dyn PermissionCollection) -> Self {
        Self {
            version: RECORD_VERSION,
            read_only: collection.is_read_only(),
            permissions: collection
                .elements()
                .iter()
                .map(PermissionRecord::from_permission)
                .collect(),
        }
    }

    /// Add every recorded permission to `target`, then freeze it if the
    /// record was read-only.
    pub fn restore_into(self, target: &dyn PermissionCollection) -> Result<()> {
        check_version(self.version)?;
        for record in self.permissions {
            target.add(record.into_permission()?)?;
        }
        if self.read_only {
            target.set_read_only();
        }
        Ok(())
    }

    /// Restore into a fresh [`PermissionSet`].
    pub fn restore(self) -> Result<PermissionSet> {
        let set = PermissionSet::new();
        self.restore_into(&set)?;
        Ok(set)
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        encode(self)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let record: Self = decode(bytes)?;
        check_version(record.version)?;
        Ok(record)
    }
}

/// Unversioned service permission layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegacyServicePermission {
    pub name: String,
    pub actions: String,
}

impl LegacyServicePermission {
    pub fn upgrade(self) -> Result<PermissionRecord> {
        let permission = ServicePermission::new(self.name, &self.actions)?;
        Ok(PermissionRecord::from_permission(&permission.into()))
    }
}

/// Decode a legacy service permission.
pub fn service_permission_from_legacy_bytes(bytes: &[u8]) -> Result<ServicePermission> {
    let legacy: LegacyServicePermission = decode(bytes)?;
    ServicePermission::new(legacy.name, &legacy.actions)
}

/// Decode a legacy service collection (a bare list of entries). Entries
/// for the same name are merged as they are added.
pub fn service_collection_from_legacy_bytes(bytes: &[u8]) -> Result<ServicePermissionCollection> {
    let entries: Vec<LegacyServicePermission> = decode(bytes)?;
    let collection = ServicePermissionCollection::new();
    for entry in entries {
        collection.add_service(ServicePermission::new(entry.name, &entry.actions)?)?;
    }
    Ok(collection)
}

fn check_version(version: u8) -> Result<()> {
    if version == RECORD_VERSION {
        Ok(())
    } else {
        Err(PermsError::UnsupportedVersion(version))
    }
}

fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    ciborium::into_writer(value, &mut buf)
        .map_err(|e| PermsError::SerializationError(e.to_string()))?;
    Ok(buf)
}

fn decode<T: for<'de> Deserialize<'de>>(bytes: &[u8]) -> Result<T> {
    ciborium::from_reader(bytes).map_err(|e| PermsError::SerializationError(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collection_record_preserves_read_only() {
        let set = PermissionSet::new();
        set.add(ServicePermission::new("host/x@R", "accept").unwrap().into())
            .unwrap();
        set.add(DelegationPermission::new("\"a@R\" \"b@R\"").unwrap().into())
            .unwrap();
        set.set_read_only();

        let bytes = CollectionRecord::from_collection(&set).to_bytes().unwrap();
        let restored = CollectionRecord::from_bytes(&bytes).unwrap().restore().unwrap();

        assert!(restored.is_read_only());
        assert_eq!(restored.elements().len(), 2);
        assert!(restored.implies(&ServicePermission::new("host/x@R", "accept").unwrap().into()));
    }

    #[test]
    fn test_unknown_version_rejected() {
        let mut record = PermissionRecord::from_permission(
            &ServicePermission::new("svc", "initiate").unwrap().into(),
        );
        record.version = 9;
        let bytes = record.to_bytes().unwrap();

        assert!(matches!(
            PermissionRecord::from_bytes(&bytes),
            Err(PermsError::UnsupportedVersion(9))
        ));
    }

    #[test]
    fn test_decoding_revalidates() {
        let record = PermissionRecord {
            version: RECORD_VERSION,
            kind: PermissionKind::Service,
            name: "svc".to_string(),
            actions: "read".to_string(),
        };
        let bytes = record.to_bytes().unwrap();
        let decoded = PermissionRecord::from_bytes(&bytes).unwrap();

        assert!(matches!(
            decoded.into_permission(),
            Err(PermsError::MalformedAction(_))
        ));
    }

    #[test]
    fn test_legacy_collection_merges_entries() {
        let entries = vec![
            LegacyServicePermission {
                name: "svc".to_string(),
                actions: "initiate".to_string(),
            },
            LegacyServicePermission {
                name: "svc".to_string(),
                actions: "accept".to_string(),
            },
        ];
        let bytes = encode(&entries).unwrap();
        let collection = service_collection_from_legacy_bytes(&bytes).unwrap();

        assert_eq!(collection.len(), 1);
        assert_eq!(collection.get("svc").unwrap().actions(), "initiate,accept");
    }

    #[test]
    fn test_legacy_permission_upgrade() {
        let legacy = LegacyServicePermission {
            name: "@R".to_string(),
            actions: "ACCEPT".to_string(),
        };
        let bytes = encode(&legacy).unwrap();
        let permission = service_permission_from_legacy_bytes(&bytes).unwrap();
        assert_eq!(permission.actions(), "accept");

        let record = legacy.upgrade().unwrap();
        assert_eq!(record.version, RECORD_VERSION);
        assert_eq!(record.actions, "accept");
    }

    #[test]
    fn test_garbage_is_serialization_error() {
        assert!(matches!(
            CollectionRecord::from_bytes(&[0xff, 0x00, 0x13]),
            Err(PermsError::SerializationError(_))
        ));
    }
}
