//! # Kerberos Permissions
//!
//! Service and delegation permissions, and the collections that answer
//! "does this set of grants imply that request".
//!
//! ## Overview
//!
//! - **ServicePermission**: a principal name (`*`, `@REALM`, or a concrete
//!   name) plus an action mask of `initiate` and/or `accept`
//! - **DelegationPermission**: the right to forward a subordinate service's
//!   ticket to a target service
//! - **Collections**: thread-safe containers with `implies` checks; service
//!   grants for the same name are merged into one entry
//! - **AuthorizationPolicy**: the injected check used to gate sensitive
//!   operations, implemented by [`PermissionSet`] and by closures
//!
//! ## Usage
//!
//! ```rust
//! use kerbcred_perms::{PermissionCollection, PermissionSet, ServicePermission};
//!
//! let grants = PermissionSet::new();
//! grants.add(ServicePermission::new("@EXAMPLE.COM", "initiate").unwrap().into()).unwrap();
//! grants.add(ServicePermission::new("*", "accept").unwrap().into()).unwrap();
//!
//! let wanted = ServicePermission::new("HTTP/web.example.com@EXAMPLE.COM", "accept").unwrap();
//! assert!(grants.implies(&wanted.into()));
//! ```

pub mod collection;
pub mod delegation;
pub mod error;
pub mod permission;
pub mod service;
pub mod wire;

pub use collection::{DelegationPermissionCollection, PermissionSet, ServicePermissionCollection};
pub use delegation::DelegationPermission;
pub use error::{PermsError, Result};
pub use permission::{AllowAll, AuthorizationPolicy, Permission, PermissionCollection, PermissionKind};
pub use service::{ActionMask, ServicePermission};
pub use wire::{CollectionRecord, LegacyServicePermission, PermissionRecord};
