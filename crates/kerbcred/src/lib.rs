//! # kerbcred
//!
//! Kerberos credentials and the permissions that guard their use.
//!
//! ## Overview
//!
//! - **Credentials**: encryption keys, principal-bound long-term keys,
//!   tickets with atomic renewal, and KRB-CRED messages. All of them can
//!   be destroyed, after which their secrets are zeroed and their
//!   accessors fail.
//! - **Keytabs**: snapshot-based key lookup that keeps serving the last
//!   good keys while the keytab is unreadable.
//! - **Permissions**: service permissions (`initiate`/`accept` on a
//!   principal, a realm, or `*`) and delegation permissions, held in
//!   concurrent collections.
//! - **Authorization**: an [`Authorizer`] wrapping an injected
//!   [`AuthorizationPolicy`](perms::AuthorizationPolicy).
//!
//! ## Usage
//!
//! ```rust
//! use std::sync::Arc;
//! use kerbcred::{Authorizer, CredentialConfig};
//! use kerbcred::perms::{PermissionCollection, PermissionSet, ServicePermission};
//!
//! let grants = PermissionSet::new();
//! grants.add(ServicePermission::new("@EXAMPLE.COM", "initiate").unwrap().into()).unwrap();
//!
//! let config = CredentialConfig::from_json(r#"{"default_realm": "EXAMPLE.COM"}"#).unwrap();
//! let authorizer = Authorizer::new(Arc::new(grants));
//! let resolver = authorizer.resolver(&config).unwrap();
//!
//! let web = resolver.parse("HTTP/web.example.com").unwrap();
//! assert_eq!(web.name(), "HTTP/web.example.com@EXAMPLE.COM");
//! assert!(authorizer.check_accept(&web).is_err());
//! ```
//!
//! ## Re-exports
//!
//! - `kerbcred::core` - secrets, encryption types, principal names
//! - `kerbcred::perms` - permissions and collections
//! - `kerbcred::creds` - keys, tickets, KRB-CRED messages
//! - `kerbcred::keytab` - keytab sources and the key cache

pub mod authorizer;
pub mod config;
pub mod error;
pub mod subject;

// Re-export component crates
pub use kerbcred_core as core;
pub use kerbcred_creds as creds;
pub use kerbcred_keytab as keytab;
pub use kerbcred_perms as perms;

pub use authorizer::Authorizer;
pub use config::CredentialConfig;
pub use error::{KerbError, Result};
pub use subject::{Credential, Subject};

// Re-export commonly used types
pub use kerbcred_core::{Destroyable, EncryptionType, KerberosPrincipal, PrincipalResolver, Realm};
pub use kerbcred_creds::{EncryptionKey, KerberosCredMessage, KerberosKey, KerberosTicket, TicketId};
pub use kerbcred_keytab::KeyTab;
pub use kerbcred_perms::{DelegationPermission, Permission, ServicePermission};
