//! Kerberos tickets.
//!
//! A ticket is held as one generation of state behind a read-write lock.
//! Readers see a whole generation; `refresh` builds the next generation
//! off-lock and swaps it in with a single write. Refresh and destroy are
//! serialized by a separate lifecycle mutex so that a ticket can never be
//! renewed back to life after it was destroyed.

use std::fmt;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use kerbcred_core::{Destroyable, EncryptionType, KerberosPrincipal, SecretBytes};
use parking_lot::{Mutex, RwLock, RwLockReadGuard};
use zeroize::Zeroizing;

use crate::address::HostAddress;
use crate::error::{CredError, Result};
use crate::flags::{self, TicketFlags};
use crate::id::TicketId;
use crate::key::EncryptionKey;
use crate::renewal::{RenewalRequest, TicketRenewer};

/// Inputs for a ticket, as produced by a KDC exchange.
#[derive(Debug)]
pub struct TicketFields {
    /// ASN.1 encoding of the ticket. Must not be empty.
    pub encoding: Bytes,
    pub client: KerberosPrincipal,
    pub server: KerberosPrincipal,
    pub client_alias: Option<KerberosPrincipal>,
    pub server_alias: Option<KerberosPrincipal>,
    /// Session key bytes. Must not be empty.
    pub session_key: Zeroizing<Vec<u8>>,
    pub session_key_type: i32,
    pub flags: TicketFlags,
    pub auth_time: DateTime<Utc>,
    /// Defaults to `auth_time`.
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: DateTime<Utc>,
    /// Required when the RENEWABLE flag is set, ignored otherwise.
    pub renew_till: Option<DateTime<Utc>>,
    pub client_addresses: Option<Vec<HostAddress>>,
}

/// One generation of ticket state.
#[derive(PartialEq)]
struct TicketState {
    encoding: Bytes,
    client: KerberosPrincipal,
    server: KerberosPrincipal,
    client_alias: Option<KerberosPrincipal>,
    server_alias: Option<KerberosPrincipal>,
    session_key: EncryptionKey,
    flags: TicketFlags,
    auth_time: DateTime<Utc>,
    start_time: DateTime<Utc>,
    end_time: DateTime<Utc>,
    renew_till: Option<DateTime<Utc>>,
    client_addresses: Option<Vec<HostAddress>>,
}

impl TicketState {
    fn from_fields(mut fields: TicketFields) -> Result<Self> {
        if fields.encoding.is_empty() {
            return Err(CredError::InvalidArgument(
                "ticket encoding cannot be empty".to_string(),
            ));
        }
        if fields.session_key.is_empty() {
            return Err(CredError::InvalidArgument(
                "session key cannot be empty".to_string(),
            ));
        }

        // A renewable ticket may still lack a renew-till time; refresh
        // treats that as nothing to do.
        let renew_till = if fields.flags.is_set(flags::RENEWABLE) {
            fields.renew_till
        } else {
            None
        };

        let key_bytes = std::mem::take(&mut *fields.session_key);
        let session_key =
            EncryptionKey::from_secret(SecretBytes::from_vec(key_bytes, fields.session_key_type));

        Ok(Self {
            encoding: fields.encoding,
            client: fields.client,
            server: fields.server,
            client_alias: fields.client_alias,
            server_alias: fields.server_alias,
            session_key,
            flags: fields.flags,
            auth_time: fields.auth_time,
            start_time: fields.start_time.unwrap_or(fields.auth_time),
            end_time: fields.end_time,
            renew_till,
            client_addresses: fields.client_addresses,
        })
    }

    fn renewal_request(&self) -> Result<RenewalRequest> {
        Ok(RenewalRequest {
            encoding: self.encoding.clone(),
            client: self.client.clone(),
            server: self.server.clone(),
            client_alias: self.client_alias.clone(),
            server_alias: self.server_alias.clone(),
            session_key: Zeroizing::new(self.session_key.encoded()?),
            session_key_type: self.session_key.key_type()?,
            flags: self.flags,
            auth_time: self.auth_time,
            start_time: self.start_time,
            end_time: self.end_time,
            renew_till: self.renew_till,
            client_addresses: self.client_addresses.clone(),
        })
    }
}

/// A consistent copy of a ticket's non-secret fields, all taken from the
/// same generation.
#[derive(Debug, Clone, PartialEq)]
pub struct TicketSnapshot {
    pub id: TicketId,
    pub client: KerberosPrincipal,
    pub server: KerberosPrincipal,
    pub client_alias: Option<KerberosPrincipal>,
    pub server_alias: Option<KerberosPrincipal>,
    pub session_key_type: EncryptionType,
    pub flags: TicketFlags,
    pub auth_time: DateTime<Utc>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub renew_till: Option<DateTime<Utc>>,
    pub client_addresses: Option<Vec<HostAddress>>,
}

/// A service ticket or TGT with its session key.
pub struct KerberosTicket {
    /// Held for the whole of `refresh` and `destroy`.
    lifecycle: Mutex<()>,
    state: RwLock<Option<TicketState>>,
    proxy: Option<TicketId>,
}

impl KerberosTicket {
    pub fn new(fields: TicketFields) -> Result<Self> {
        Ok(Self {
            lifecycle: Mutex::new(()),
            state: RwLock::new(Some(TicketState::from_fields(fields)?)),
            proxy: None,
        })
    }

    /// Record the evidence ticket this proxy ticket was obtained with.
    pub fn with_proxy(mut self, evidence: TicketId) -> Self {
        self.proxy = Some(evidence);
        self
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Option<TicketState>>> {
        let guard = self.state.read();
        if guard.is_none() {
            return Err(CredError::InvalidState("ticket"));
        }
        Ok(guard)
    }

    fn with_state<R>(&self, f: impl FnOnce(&TicketState) -> R) -> Result<R> {
        let guard = self.read()?;
        guard
            .as_ref()
            .map(f)
            .ok_or(CredError::InvalidState("ticket"))
    }

    /// ASN.1 encoding of the ticket.
    pub fn encoded(&self) -> Result<Bytes> {
        self.with_state(|s| s.encoding.clone())
    }

    pub fn client(&self) -> Result<KerberosPrincipal> {
        self.with_state(|s| s.client.clone())
    }

    pub fn server(&self) -> Result<KerberosPrincipal> {
        self.with_state(|s| s.server.clone())
    }

    pub fn client_alias(&self) -> Result<Option<KerberosPrincipal>> {
        self.with_state(|s| s.client_alias.clone())
    }

    pub fn server_alias(&self) -> Result<Option<KerberosPrincipal>> {
        self.with_state(|s| s.server_alias.clone())
    }

    /// An independent copy of the session key.
    pub fn session_key(&self) -> Result<EncryptionKey> {
        self.with_state(|s| s.session_key.duplicate())?
    }

    pub fn session_key_type(&self) -> Result<i32> {
        self.with_state(|s| s.session_key.key_type())?
    }

    pub fn flags(&self) -> Result<TicketFlags> {
        self.with_state(|s| s.flags)
    }

    pub fn auth_time(&self) -> Result<DateTime<Utc>> {
        self.with_state(|s| s.auth_time)
    }

    pub fn start_time(&self) -> Result<DateTime<Utc>> {
        self.with_state(|s| s.start_time)
    }

    pub fn end_time(&self) -> Result<DateTime<Utc>> {
        self.with_state(|s| s.end_time)
    }

    pub fn renew_till(&self) -> Result<Option<DateTime<Utc>>> {
        self.with_state(|s| s.renew_till)
    }

    pub fn client_addresses(&self) -> Result<Option<Vec<HostAddress>>> {
        self.with_state(|s| s.client_addresses.clone())
    }

    /// The evidence ticket behind this proxy ticket, if any.
    pub fn proxy(&self) -> Option<TicketId> {
        self.proxy
    }

    /// Content address of the current encoding.
    pub fn content_id(&self) -> Result<TicketId> {
        self.with_state(|s| TicketId::of_encoding(&s.encoding))
    }

    /// Every non-secret field from one generation.
    pub fn snapshot(&self) -> Result<TicketSnapshot> {
        self.with_state(|s| -> Result<TicketSnapshot> {
            Ok(TicketSnapshot {
                id: TicketId::of_encoding(&s.encoding),
                client: s.client.clone(),
                server: s.server.clone(),
                client_alias: s.client_alias.clone(),
                server_alias: s.server_alias.clone(),
                session_key_type: EncryptionType::from(s.session_key.key_type()?),
                flags: s.flags,
                auth_time: s.auth_time,
                start_time: s.start_time,
                end_time: s.end_time,
                renew_till: s.renew_till,
                client_addresses: s.client_addresses.clone(),
            })
        })?
    }

    fn flag(&self, index: usize) -> bool {
        self.state
            .read()
            .as_ref()
            .is_some_and(|s| s.flags.is_set(index))
    }

    pub fn is_forwardable(&self) -> bool {
        self.flag(flags::FORWARDABLE)
    }

    pub fn is_forwarded(&self) -> bool {
        self.flag(flags::FORWARDED)
    }

    pub fn is_proxiable(&self) -> bool {
        self.flag(flags::PROXIABLE)
    }

    pub fn is_proxy(&self) -> bool {
        self.flag(flags::PROXY)
    }

    pub fn is_postdated(&self) -> bool {
        self.flag(flags::POSTDATED)
    }

    pub fn is_renewable(&self) -> bool {
        self.flag(flags::RENEWABLE)
    }

    pub fn is_initial(&self) -> bool {
        self.flag(flags::INITIAL)
    }

    /// Whether now lies within `[start_time, end_time]`. A destroyed
    /// ticket is never current.
    pub fn is_current(&self) -> bool {
        self.is_current_at(Utc::now())
    }

    pub fn is_current_at(&self, now: DateTime<Utc>) -> bool {
        self.state
            .read()
            .as_ref()
            .is_some_and(|s| s.start_time <= now && now <= s.end_time)
    }

    /// Renew the ticket through `renewer` and replace its contents with the
    /// renewed credential.
    ///
    /// A ticket without a renew-till time is left as is. On any failure the
    /// ticket is unchanged.
    pub fn refresh(&self, renewer: &dyn TicketRenewer) -> Result<()> {
        self.refresh_at(renewer, Utc::now())
    }

    /// [`refresh`](Self::refresh) with an explicit notion of "now".
    pub fn refresh_at(&self, renewer: &dyn TicketRenewer, now: DateTime<Utc>) -> Result<()> {
        let _lifecycle = self.lifecycle.lock();

        let request = {
            let guard = self.read()?;
            let state = guard.as_ref().ok_or(CredError::InvalidState("ticket"))?;

            if !state.flags.is_set(flags::RENEWABLE) {
                return Err(CredError::refresh_failed("this ticket is not renewable"));
            }
            let Some(renew_till) = state.renew_till else {
                return Ok(());
            };
            if now > renew_till {
                return Err(CredError::refresh_failed(
                    "this ticket is past its last renewal time",
                ));
            }
            state.renewal_request()?
        };

        let renewed = renewer.renew(&request).map_err(|e| {
            tracing::warn!(server = %request.server, error = %e, "ticket renewal failed");
            CredError::RefreshFailed {
                reason: "renewal exchange failed".to_string(),
                source: Some(e),
            }
        })?;

        let next = TicketState::from_fields(renewed).map_err(|e| {
            tracing::warn!(server = %request.server, error = %e, "renewed ticket rejected");
            CredError::refresh_failed(format!("renewed ticket is invalid: {e}"))
        })?;
        let end_time = next.end_time;

        let previous = self.state.write().replace(next);
        if let Some(previous) = previous {
            previous.session_key.destroy()?;
        }

        tracing::debug!(server = %request.server, end_time = %end_time, "ticket refreshed");
        Ok(())
    }
}

impl Destroyable for KerberosTicket {
    fn destroy(&self) -> kerbcred_core::Result<()> {
        let _lifecycle = self.lifecycle.lock();
        let previous = self.state.write().take();
        if let Some(state) = previous {
            state.session_key.destroy()?;
            tracing::debug!(server = %state.server, "ticket destroyed");
        }
        Ok(())
    }

    fn is_destroyed(&self) -> bool {
        self.state.read().is_none()
    }
}

impl PartialEq for KerberosTicket {
    /// Destroyed tickets compare unequal to everything but themselves.
    fn eq(&self, other: &Self) -> bool {
        if std::ptr::eq(self, other) {
            return true;
        }
        if self.proxy != other.proxy {
            return false;
        }
        // Lock in address order so two threads comparing the same pair in
        // opposite directions cannot deadlock behind a waiting writer.
        let (first, second) = if (self as *const Self) < (other as *const Self) {
            (self, other)
        } else {
            (other, self)
        };
        let a = first.state.read();
        let b = second.state.read();
        match (a.as_ref(), b.as_ref()) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Debug for KerberosTicket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.state.read().as_ref() {
            Some(s) => f
                .debug_struct("KerberosTicket")
                .field("client", &s.client)
                .field("server", &s.server)
                .field("flags", &s.flags)
                .field("end_time", &s.end_time)
                .field("session_key", &"<redacted>")
                .finish(),
            None => f.write_str("KerberosTicket(<destroyed>)"),
        }
    }
}

impl fmt::Display for KerberosTicket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let guard = self.state.read();
        let Some(s) = guard.as_ref() else {
            return f.write_str("Destroyed KerberosTicket");
        };
        writeln!(f, "Ticket ID: {}", TicketId::of_encoding(&s.encoding))?;
        writeln!(f, "Client Principal = {}", s.client)?;
        writeln!(f, "Server Principal = {}", s.server)?;
        match s.session_key.key_type() {
            Ok(key_type) => writeln!(f, "Session Key = <redacted> ({})", EncryptionType::from(key_type))?,
            Err(_) => writeln!(f, "Session Key = <destroyed>")?,
        }
        writeln!(f, "Flags = {}", s.flags)?;
        writeln!(f, "Auth Time = {}", s.auth_time)?;
        writeln!(f, "Start Time = {}", s.start_time)?;
        writeln!(f, "End Time = {}", s.end_time)?;
        match s.renew_till {
            Some(t) => writeln!(f, "Renew Till = {}", t)?,
            None => writeln!(f, "Renew Till = Null")?,
        }
        match &s.client_addresses {
            Some(addrs) => {
                let rendered: Vec<String> = addrs.iter().map(ToString::to_string).collect();
                write!(f, "Client Addresses = {}", rendered.join(", "))
            }
            None => write!(f, "Client Addresses = Null"),
        }
    }
}
