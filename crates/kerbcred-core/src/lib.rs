//! # kerbcred core
//!
//! Primitives shared by every kerbcred crate: destroyable secret
//! material, Kerberos encryption types, and principal names.
//!
//! This crate performs no I/O and implements no cryptography. Key bytes
//! are opaque; only their lifecycle is managed here.
//!
//! ## Key Types
//!
//! - [`Destroyable`] - Contract for objects whose secrets can be wiped
//! - [`SecretBytes`] - Key bytes plus key type, zeroed on destroy
//! - [`EncryptionType`] - Key type number with algorithm name mapping
//! - [`KerberosPrincipal`] - A realm-qualified principal name
//! - [`PrincipalResolver`] - Applies the default realm while parsing names

pub mod error;
pub mod etype;
pub mod principal;
pub mod secret;

pub use error::{CoreError, Result};
pub use etype::EncryptionType;
pub use principal::{KerberosPrincipal, NameType, PrincipalResolver, Realm};
pub use secret::{Destroyable, SecretBytes};
