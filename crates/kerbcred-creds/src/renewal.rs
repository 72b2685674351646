//! Ticket renewal collaborator.
//!
//! Renewing a ticket means a TGS exchange with the KDC. That exchange is
//! outside this crate; a [`TicketRenewer`] performs it and hands back the
//! renewed credential fields.

use bytes::Bytes;
use chrono::{DateTime, Utc};
use kerbcred_core::KerberosPrincipal;
use thiserror::Error;
use zeroize::Zeroizing;

use crate::address::HostAddress;
use crate::flags::TicketFlags;
use crate::ticket::TicketFields;

/// Why a renewal exchange failed.
#[derive(Debug, Error)]
pub enum RenewalError {
    /// The KDC answered with an error.
    #[error("KDC error {code}: {message}")]
    Protocol { code: i32, message: String },

    /// The exchange could not be completed.
    #[error("I/O error during renewal: {0}")]
    Io(#[from] std::io::Error),
}

/// Everything a renewer needs to rebuild the credential it is renewing.
///
/// Carries a copy of the session key; the copy is zeroed when the request
/// is dropped.
#[derive(Debug)]
pub struct RenewalRequest {
    pub encoding: Bytes,
    pub client: KerberosPrincipal,
    pub server: KerberosPrincipal,
    pub client_alias: Option<KerberosPrincipal>,
    pub server_alias: Option<KerberosPrincipal>,
    pub session_key: Zeroizing<Vec<u8>>,
    pub session_key_type: i32,
    pub flags: TicketFlags,
    pub auth_time: DateTime<Utc>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub renew_till: Option<DateTime<Utc>>,
    pub client_addresses: Option<Vec<HostAddress>>,
}

/// Fields of a renewed credential, validated the same way as a newly
/// constructed ticket.
pub type RenewedCredentials = TicketFields;

/// Performs the renewal exchange.
///
/// Called without any ticket lock held other than the ticket's lifecycle
/// lock, so implementations may block on the network.
pub trait TicketRenewer: Send + Sync {
    fn renew(&self, request: &RenewalRequest) -> Result<RenewedCredentials, RenewalError>;
}

impl<F> TicketRenewer for F
where
    F: Fn(&RenewalRequest) -> Result<RenewedCredentials, RenewalError> + Send + Sync,
{
    fn renew(&self, request: &RenewalRequest) -> Result<RenewedCredentials, RenewalError> {
        self(request)
    }
}
