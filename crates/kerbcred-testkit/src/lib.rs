//! # kerbcred testkit
//!
//! Testing utilities for kerbcred.
//!
//! ## Overview
//!
//! - **Generators**: proptest strategies for principals, action masks, and
//!   permissions
//! - **Fixtures**: a ticket builder, scripted renewers, and keytab helpers
//!
//! ## Property Testing
//!
//! ```rust,ignore
//! use proptest::prelude::*;
//! use kerbcred_testkit::generators::service_permission;
//!
//! proptest! {
//!     #[test]
//!     fn implies_is_reflexive(p in service_permission()) {
//!         prop_assert!(p.implies_service(&p));
//!     }
//! }
//! ```
//!
//! ## Test Fixtures
//!
//! ```rust
//! use kerbcred_testkit::fixtures::{ScriptedRenewer, TicketBuilder};
//!
//! let ticket = TicketBuilder::new("alice@EXAMPLE.COM", "krbtgt/EXAMPLE.COM@EXAMPLE.COM")
//!     .renewable()
//!     .build();
//! let kdc = ScriptedRenewer::new();
//! ticket.refresh(&kdc).unwrap();
//! assert_eq!(kdc.calls(), 1);
//! ```

pub mod fixtures;
pub mod generators;

pub use fixtures::{random_key, service_keytab, FailingRenewer, ScriptedRenewer, TicketBuilder};
pub use generators::{permission, principal, service_permission, ServicePermissionParams};
