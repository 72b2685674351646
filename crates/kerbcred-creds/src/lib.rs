//! # kerbcred credentials
//!
//! Credential objects a login module places in a subject: long-term
//! keys, tickets with their session keys, and forwarded KRB-CRED
//! messages. Every credential implements [`Destroyable`]; once destroyed,
//! accessors fail with [`CredError::InvalidState`].
//!
//! ## Ticket refresh
//!
//! [`KerberosTicket::refresh`] hands a [`RenewalRequest`] to an injected
//! [`TicketRenewer`] and swaps the renewed credential in atomically.
//! Concurrent readers observe either the old or the new ticket, never a
//! mix of the two.
//!
//! ```rust,no_run
//! use kerbcred_creds::{KerberosTicket, RenewalError, RenewalRequest, RenewedCredentials};
//!
//! fn renew(ticket: &KerberosTicket) -> kerbcred_creds::Result<()> {
//!     let kdc = |request: &RenewalRequest| -> Result<RenewedCredentials, RenewalError> {
//!         // TGS exchange with the KDC for `request.server`
//!         # unimplemented!()
//!     };
//!     ticket.refresh(&kdc)
//! }
//! ```
//!
//! [`Destroyable`]: kerbcred_core::Destroyable

pub mod address;
pub mod cred_message;
pub mod error;
pub mod flags;
pub mod id;
pub mod key;
pub mod renewal;
pub mod ticket;

pub use address::HostAddress;
pub use cred_message::KerberosCredMessage;
pub use error::{CredError, Result};
pub use flags::TicketFlags;
pub use id::TicketId;
pub use key::{EncryptionKey, KerberosKey, KeyDeriver, KEY_FORMAT};
pub use renewal::{RenewalError, RenewalRequest, RenewedCredentials, TicketRenewer};
pub use ticket::{KerberosTicket, TicketFields, TicketSnapshot};
