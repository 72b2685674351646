//! Test fixtures and helpers.
//!
//! Common setup code for credential tests: tickets with sensible defaults,
//! renewers that stand in for the KDC, and populated keytab sources.

use std::sync::atomic::{AtomicUsize, Ordering};

use bytes::Bytes;
use chrono::{DateTime, Duration, Utc};
use kerbcred_core::{EncryptionType, KerberosPrincipal};
use kerbcred_creds::{
    flags, HostAddress, KerberosTicket, RenewalError, RenewalRequest, RenewedCredentials,
    TicketFields, TicketFlags, TicketRenewer,
};
use kerbcred_keytab::{MemoryKeytabSource, RawKeyEntry};
use parking_lot::Mutex;
use rand::RngCore;
use zeroize::Zeroizing;

/// Random key material of `len` bytes.
pub fn random_key(len: usize) -> Zeroizing<Vec<u8>> {
    let mut key = Zeroizing::new(vec![0u8; len]);
    rand::thread_rng().fill_bytes(&mut key[..]);
    key
}

/// Builds tickets for tests.
///
/// Defaults: a random AES256 session key, authenticated five minutes ago,
/// valid for ten hours, not renewable.
pub struct TicketBuilder {
    fields: TicketFields,
}

impl TicketBuilder {
    pub fn new(client: &str, server: &str) -> Self {
        let now = Utc::now();
        let client = parse(client);
        let server = parse(server);
        Self {
            fields: TicketFields {
                encoding: Bytes::from(format!("ticket:{}:{}", client, server)),
                client,
                server,
                client_alias: None,
                server_alias: None,
                session_key: random_key(32),
                session_key_type: EncryptionType::AES256_CTS_HMAC_SHA1_96.0,
                flags: TicketFlags::empty(),
                auth_time: now - Duration::minutes(5),
                start_time: None,
                end_time: now + Duration::hours(10),
                renew_till: None,
                client_addresses: None,
            },
        }
    }

    pub fn encoding(mut self, encoding: &[u8]) -> Self {
        self.fields.encoding = Bytes::copy_from_slice(encoding);
        self
    }

    pub fn session_key(mut self, key: &[u8], key_type: i32) -> Self {
        self.fields.session_key = Zeroizing::new(key.to_vec());
        self.fields.session_key_type = key_type;
        self
    }

    pub fn flag(mut self, index: usize) -> Self {
        self.fields.flags = self.fields.flags.with(index);
        self
    }

    /// Sets the RENEWABLE flag and allows renewal for seven days.
    pub fn renewable(mut self) -> Self {
        self.fields.flags = self.fields.flags.with(flags::RENEWABLE);
        self.fields.renew_till = Some(Utc::now() + Duration::days(7));
        self
    }

    pub fn renew_till(mut self, renew_till: DateTime<Utc>) -> Self {
        self.fields.renew_till = Some(renew_till);
        self
    }

    pub fn start_time(mut self, start_time: DateTime<Utc>) -> Self {
        self.fields.start_time = Some(start_time);
        self
    }

    pub fn end_time(mut self, end_time: DateTime<Utc>) -> Self {
        self.fields.end_time = end_time;
        self
    }

    /// Ends the ticket's validity before now.
    pub fn expired(mut self) -> Self {
        let now = Utc::now();
        self.fields.auth_time = now - Duration::hours(11);
        self.fields.end_time = now - Duration::hours(1);
        self
    }

    pub fn addresses(mut self, addresses: Vec<HostAddress>) -> Self {
        self.fields.client_addresses = Some(addresses);
        self
    }

    pub fn fields(self) -> TicketFields {
        self.fields
    }

    pub fn build(self) -> KerberosTicket {
        KerberosTicket::new(self.fields).expect("builder produced invalid ticket fields")
    }
}

/// A renewer that always succeeds, issuing a fresh encoding and session
/// key for every call.
pub struct ScriptedRenewer {
    calls: AtomicUsize,
    lifetime: Duration,
    seen: Mutex<Vec<KerberosPrincipal>>,
}

impl ScriptedRenewer {
    pub fn new() -> Self {
        Self::with_lifetime(Duration::hours(10))
    }

    pub fn with_lifetime(lifetime: Duration) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            lifetime,
            seen: Mutex::new(Vec::new()),
        }
    }

    /// Number of renewal exchanges performed.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Servers named in the renewal requests, in call order.
    pub fn servers(&self) -> Vec<KerberosPrincipal> {
        self.seen.lock().clone()
    }
}

impl Default for ScriptedRenewer {
    fn default() -> Self {
        Self::new()
    }
}

impl TicketRenewer for ScriptedRenewer {
    fn renew(&self, request: &RenewalRequest) -> Result<RenewedCredentials, RenewalError> {
        let generation = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        self.seen.lock().push(request.server.clone());

        let mut encoding = request.encoding.to_vec();
        encoding.extend_from_slice(format!("#{generation}").as_bytes());
        let now = Utc::now();

        Ok(TicketFields {
            encoding: Bytes::from(encoding),
            client: request.client.clone(),
            server: request.server.clone(),
            client_alias: request.client_alias.clone(),
            server_alias: request.server_alias.clone(),
            session_key: random_key(request.session_key.len().max(16)),
            session_key_type: request.session_key_type,
            flags: request.flags,
            auth_time: request.auth_time,
            start_time: Some(now),
            end_time: now + self.lifetime,
            renew_till: request.renew_till,
            client_addresses: request.client_addresses.clone(),
        })
    }
}

/// A renewer whose KDC always answers with an error.
pub struct FailingRenewer {
    pub code: i32,
    pub message: String,
}

impl FailingRenewer {
    /// KDC_ERR_TGT_REVOKED.
    pub fn revoked() -> Self {
        Self {
            code: 20,
            message: "TGT has been revoked".to_string(),
        }
    }
}

impl TicketRenewer for FailingRenewer {
    fn renew(&self, _request: &RenewalRequest) -> Result<RenewedCredentials, RenewalError> {
        Err(RenewalError::Protocol {
            code: self.code,
            message: self.message.clone(),
        })
    }
}

/// A keytab source holding one AES256 key per version number for
/// `principal`.
pub fn service_keytab(principal: &str, kvnos: &[i32]) -> MemoryKeytabSource {
    let entries = kvnos
        .iter()
        .map(|&kvno| {
            RawKeyEntry::new(
                principal,
                EncryptionType::AES256_CTS_HMAC_SHA1_96.0,
                Some(kvno),
                &random_key(32),
            )
        })
        .collect();
    MemoryKeytabSource::with_entries(entries)
}

fn parse(name: &str) -> KerberosPrincipal {
    KerberosPrincipal::parse(name).expect("fixture principal must be fully qualified")
}

#[cfg(test)]
mod tests {
    use super::*;
    use kerbcred_core::Destroyable;
    use kerbcred_keytab::KeyTab;
    use std::sync::Arc;

    #[test]
    fn test_builder_defaults() {
        let ticket = TicketBuilder::new("alice@EXAMPLE.COM", "HTTP/web@EXAMPLE.COM").build();
        assert!(ticket.is_current());
        assert!(!ticket.is_renewable());
        assert_eq!(ticket.session_key().unwrap().algorithm().unwrap(), "AES256");
    }

    #[test]
    fn test_expired_ticket() {
        let ticket = TicketBuilder::new("alice@EXAMPLE.COM", "HTTP/web@EXAMPLE.COM")
            .expired()
            .build();
        assert!(!ticket.is_current());
    }

    #[test]
    fn test_scripted_renewer_changes_generation() {
        let ticket = TicketBuilder::new("alice@EXAMPLE.COM", "krbtgt/EXAMPLE.COM@EXAMPLE.COM")
            .renewable()
            .build();
        let kdc = ScriptedRenewer::new();
        let first = ticket.content_id().unwrap();

        ticket.refresh(&kdc).unwrap();
        ticket.refresh(&kdc).unwrap();

        assert_eq!(kdc.calls(), 2);
        assert_eq!(kdc.servers().len(), 2);
        assert_ne!(ticket.content_id().unwrap(), first);
        assert!(ticket.encoded().unwrap().ends_with(b"#1#2"));
    }

    #[test]
    fn test_failing_renewer_keeps_ticket() {
        let ticket = TicketBuilder::new("alice@EXAMPLE.COM", "krbtgt/EXAMPLE.COM@EXAMPLE.COM")
            .renewable()
            .build();
        let before = ticket.content_id().unwrap();

        assert!(ticket.refresh(&FailingRenewer::revoked()).is_err());
        assert_eq!(ticket.content_id().unwrap(), before);
        assert!(!ticket.is_destroyed());
    }

    #[test]
    fn test_service_keytab() {
        let principal = parse("HTTP/web@EXAMPLE.COM");
        let source = Arc::new(service_keytab("HTTP/web@EXAMPLE.COM", &[1, 3, 2]));
        let keytab = KeyTab::bound(principal.clone(), source);
        let versions: Vec<i32> = keytab
            .keys(&principal)
            .iter()
            .map(|k| k.version_number().unwrap())
            .collect();
        assert_eq!(versions, vec![3, 2, 1]);
    }
}
