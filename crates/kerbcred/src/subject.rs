//! A subject's principals and private credentials.
//!
//! Login code adds the credentials it obtained; GSS-style consumers look
//! up tickets and keys here. Proxy tickets refer to their evidence ticket
//! by [`TicketId`], and the evidence is resolved against the same set.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use kerbcred_core::{Destroyable, KerberosPrincipal};
use kerbcred_creds::{KerberosCredMessage, KerberosKey, KerberosTicket, TicketId};
use kerbcred_keytab::KeyTab;
use parking_lot::RwLock;

use crate::error::{KerbError, Result};

/// A private credential held by a subject.
#[derive(Clone)]
pub enum Credential {
    Ticket(Arc<KerberosTicket>),
    Key(Arc<KerberosKey>),
    KeyTab(Arc<KeyTab>),
    CredMessage(Arc<KerberosCredMessage>),
    /// Any other secret a login module stores alongside Kerberos
    /// credentials. Only its lifecycle is managed here.
    Other(Arc<dyn Destroyable + Send + Sync>),
}

impl Credential {
    fn destroyable(&self) -> Option<&dyn Destroyable> {
        match self {
            Credential::Ticket(t) => Some(t.as_ref()),
            Credential::Key(k) => Some(k.as_ref()),
            Credential::CredMessage(m) => Some(m.as_ref()),
            Credential::Other(o) => Some(o.as_ref()),
            Credential::KeyTab(_) => None,
        }
    }

    fn is_destroyed(&self) -> bool {
        self.destroyable().is_some_and(|d| d.is_destroyed())
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Credential::Ticket(t) => f.debug_tuple("Ticket").field(t).finish(),
            Credential::Key(k) => f.debug_tuple("Key").field(k).finish(),
            Credential::KeyTab(k) => f.debug_tuple("KeyTab").field(k).finish(),
            Credential::CredMessage(m) => f.debug_tuple("CredMessage").field(m).finish(),
            Credential::Other(o) => f
                .debug_struct("Other")
                .field("destroyed", &o.is_destroyed())
                .finish(),
        }
    }
}

impl From<KerberosTicket> for Credential {
    fn from(t: KerberosTicket) -> Self {
        Credential::Ticket(Arc::new(t))
    }
}

impl From<KerberosKey> for Credential {
    fn from(k: KerberosKey) -> Self {
        Credential::Key(Arc::new(k))
    }
}

impl From<KeyTab> for Credential {
    fn from(k: KeyTab) -> Self {
        Credential::KeyTab(Arc::new(k))
    }
}

impl From<KerberosCredMessage> for Credential {
    fn from(m: KerberosCredMessage) -> Self {
        Credential::CredMessage(Arc::new(m))
    }
}

/// Principals and credentials of one authenticated entity.
#[derive(Default)]
pub struct Subject {
    principals: RwLock<Vec<KerberosPrincipal>>,
    credentials: RwLock<Vec<Credential>>,
    read_only: AtomicBool,
}

impl Subject {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_principal(&self, principal: KerberosPrincipal) -> Result<()> {
        self.ensure_writable()?;
        let mut principals = self.principals.write();
        if !principals.contains(&principal) {
            principals.push(principal);
        }
        Ok(())
    }

    pub fn principals(&self) -> Vec<KerberosPrincipal> {
        self.principals.read().clone()
    }

    pub fn add_credential(&self, credential: impl Into<Credential>) -> Result<()> {
        self.ensure_writable()?;
        self.credentials.write().push(credential.into());
        Ok(())
    }

    pub fn credentials(&self) -> Vec<Credential> {
        self.credentials.read().clone()
    }

    /// Tickets that have not been destroyed.
    pub fn tickets(&self) -> Vec<Arc<KerberosTicket>> {
        self.credentials
            .read()
            .iter()
            .filter_map(|c| match c {
                Credential::Ticket(t) if !t.is_destroyed() => Some(t.clone()),
                _ => None,
            })
            .collect()
    }

    /// A current ticket for `server`, preferring the one that expires last.
    pub fn ticket_for(&self, server: &KerberosPrincipal) -> Option<Arc<KerberosTicket>> {
        self.tickets()
            .into_iter()
            .filter(|t| t.is_current() && t.server().is_ok_and(|s| &s == server))
            .max_by_key(|t| t.end_time().ok())
    }

    /// The ticket whose encoding hashes to `id`.
    pub fn find_ticket(&self, id: &TicketId) -> Option<Arc<KerberosTicket>> {
        self.tickets()
            .into_iter()
            .find(|t| t.content_id().is_ok_and(|tid| &tid == id))
    }

    /// The evidence ticket behind a proxy ticket, if it is held here.
    pub fn evidence_for(&self, ticket: &KerberosTicket) -> Option<Arc<KerberosTicket>> {
        ticket.proxy().and_then(|id| self.find_ticket(&id))
    }

    /// Long-term keys for `principal`, from stored keys and keytabs.
    ///
    /// Stored keys are returned as copies. Keys destroyed while the lookup
    /// runs are skipped.
    pub fn keys_for(&self, principal: &KerberosPrincipal) -> Vec<KerberosKey> {
        let credentials = self.credentials.read().clone();
        let mut keys = Vec::new();
        for credential in credentials {
            match credential {
                Credential::Key(k) => {
                    if k.principal().is_ok_and(|p| &p == principal) {
                        if let Ok(copy) = k.duplicate() {
                            keys.push(copy);
                        }
                    }
                }
                Credential::KeyTab(kt) => keys.extend(kt.keys(principal)),
                _ => {}
            }
        }
        keys
    }

    /// Drop credentials that have been destroyed. Returns how many were
    /// removed.
    pub fn remove_destroyed(&self) -> Result<usize> {
        self.ensure_writable()?;
        let mut credentials = self.credentials.write();
        let before = credentials.len();
        credentials.retain(|c| !c.is_destroyed());
        Ok(before - credentials.len())
    }

    /// Destroy every destroyable credential, continuing past failures.
    pub fn destroy_all(&self) -> Result<()> {
        let credentials = self.credentials.read().clone();
        let mut total = 0;
        let mut failed = 0;
        for credential in &credentials {
            if let Some(d) = credential.destroyable() {
                total += 1;
                if let Err(e) = d.destroy() {
                    tracing::warn!(error = %e, "failed to destroy credential");
                    failed += 1;
                }
            }
        }
        tracing::debug!(total, failed, "destroyed subject credentials");
        if failed > 0 {
            return Err(KerbError::DestroyFailed { failed, total });
        }
        Ok(())
    }

    /// Reject further additions.
    pub fn set_read_only(&self) {
        self.read_only.store(true, Ordering::Release);
    }

    pub fn is_read_only(&self) -> bool {
        self.read_only.load(Ordering::Acquire)
    }

    fn ensure_writable(&self) -> Result<()> {
        if self.is_read_only() {
            return Err(KerbError::ReadOnlySubject);
        }
        Ok(())
    }
}

impl fmt::Debug for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subject")
            .field("principals", &*self.principals.read())
            .field("credentials", &self.credentials.read().len())
            .field("read_only", &self.is_read_only())
            .finish()
    }
}
