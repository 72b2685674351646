//! End-to-end credential flows: keytab login, ticket renewal, and the
//! permission checks that gate credential use.

use std::sync::{Arc, Once};

use anyhow::Result;
use bytes::Bytes;
use chrono::{Duration, Utc};
use kerbcred::creds::{
    flags, RenewalError, RenewalRequest, RenewedCredentials, TicketFields, TicketFlags,
};
use kerbcred::keytab::{CborKeytabDecoder, FileKeytabSource, MemoryKeytabSource, RawKeyEntry};
use kerbcred::perms::{
    CollectionRecord, PermissionCollection, PermissionSet, ServicePermissionCollection,
};
use kerbcred::{
    Authorizer, CredentialConfig, Destroyable, KerberosPrincipal, KerberosTicket, KeyTab,
    Permission, ServicePermission, Subject,
};
use zeroize::Zeroizing;

static TRACING: Once = Once::new();

fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_test_writer()
            .with_max_level(tracing::Level::DEBUG)
            .try_init();
    });
}

fn principal(name: &str) -> KerberosPrincipal {
    KerberosPrincipal::parse(name).unwrap()
}

fn sp(name: &str, actions: &str) -> Permission {
    ServicePermission::new(name, actions).unwrap().into()
}

fn tgt() -> Result<KerberosTicket> {
    let now = Utc::now();
    Ok(KerberosTicket::new(TicketFields {
        encoding: Bytes::from_static(b"tgt-generation-1"),
        client: principal("alice@EXAMPLE.COM"),
        server: principal("krbtgt/EXAMPLE.COM@EXAMPLE.COM"),
        client_alias: None,
        server_alias: None,
        session_key: Zeroizing::new(vec![0x42; 32]),
        session_key_type: 18,
        flags: TicketFlags::empty()
            .with(flags::FORWARDABLE)
            .with(flags::RENEWABLE)
            .with(flags::INITIAL),
        auth_time: now,
        start_time: None,
        end_time: now + Duration::hours(10),
        renew_till: Some(now + Duration::days(7)),
        client_addresses: None,
    })?)
}

#[test]
fn test_keytab_login_survives_unreadable_keytab() -> Result<()> {
    init_tracing();

    let service = principal("HTTP/web.example.com@EXAMPLE.COM");
    let source = Arc::new(MemoryKeytabSource::new());
    let keytab = KeyTab::bound(service.clone(), source.clone());

    // Never read successfully: nothing to fall back to.
    source.set_failure(Some("keytab being rotated"));
    assert!(keytab.keys(&service).is_empty());

    source.set_failure(None);
    source.add_entry(RawKeyEntry::new(service.name(), 18, Some(7), &[7; 32]));
    assert_eq!(keytab.keys(&service).len(), 1);

    source.set_failure(Some("keytab being rotated"));
    let keys = keytab.keys(&service);
    assert_eq!(keys.len(), 1);
    assert_eq!(keys[0].version_number()?, 7);
    assert_eq!(keys[0].algorithm()?, "AES256");
    Ok(())
}

#[test]
fn test_file_keytab_from_config() -> Result<()> {
    init_tracing();

    let dir = tempfile::TempDir::new()?;
    let path = dir.path().join("web.keytab");
    let service = principal("HTTP/web.example.com@EXAMPLE.COM");

    let config = CredentialConfig {
        default_keytab: Some(path.clone()),
        ..Default::default()
    };
    let source = config.default_keytab_source().expect("keytab configured");
    let keytab = KeyTab::unbound(Arc::new(source));
    assert!(!keytab.exists());
    assert!(keytab.keys(&service).is_empty());

    std::fs::write(
        &path,
        CborKeytabDecoder::encode(&[RawKeyEntry::new(service.name(), 18, Some(1), &[1; 32])])?,
    )?;
    assert!(keytab.exists());
    assert_eq!(keytab.keys(&service)[0].version_number()?, 1);

    std::fs::write(
        &path,
        CborKeytabDecoder::encode(&[
            RawKeyEntry::new(service.name(), 18, Some(1), &[1; 32]),
            RawKeyEntry::new(service.name(), 18, Some(2), &[2; 32]),
        ])?,
    )?;
    let reread = KeyTab::unbound(Arc::new(FileKeytabSource::cbor(&path)));
    let versions: Vec<i32> = reread
        .keys(&service)
        .iter()
        .map(|k| k.version_number())
        .collect::<std::result::Result<_, _>>()?;
    assert_eq!(versions, vec![2, 1]);
    Ok(())
}

#[test]
fn test_refresh_through_subject() -> Result<()> {
    init_tracing();

    let subject = Subject::new();
    subject.add_principal(principal("alice@EXAMPLE.COM"))?;
    subject.add_credential(tgt()?)?;

    let tgs = principal("krbtgt/EXAMPLE.COM@EXAMPLE.COM");
    let ticket = subject.ticket_for(&tgs).expect("tgt present");
    let before = ticket.content_id()?;

    let kdc = |request: &RenewalRequest| -> std::result::Result<RenewedCredentials, RenewalError> {
        Ok(TicketFields {
            encoding: Bytes::from_static(b"tgt-generation-2"),
            client: request.client.clone(),
            server: request.server.clone(),
            client_alias: None,
            server_alias: None,
            session_key: Zeroizing::new(vec![0x43; 32]),
            session_key_type: request.session_key_type,
            flags: request.flags,
            auth_time: request.auth_time,
            start_time: Some(Utc::now()),
            end_time: Utc::now() + Duration::hours(10),
            renew_till: request.renew_till,
            client_addresses: None,
        })
    };
    ticket.refresh(&kdc)?;

    assert_ne!(ticket.content_id()?, before);
    assert_eq!(ticket.session_key()?.encoded()?, vec![0x43; 32]);
    assert!(subject.find_ticket(&before).is_none());
    assert!(subject.find_ticket(&ticket.content_id()?).is_some());

    subject.destroy_all()?;
    assert!(ticket.is_destroyed());
    let err = ticket.refresh(&kdc).unwrap_err();
    assert!(err.is_invalid_state());
    Ok(())
}

#[test]
fn test_authorization_gates_ticket_use() -> Result<()> {
    init_tracing();

    let grants = Arc::new(PermissionSet::from_permissions([
        sp("krbtgt/EXAMPLE.COM@EXAMPLE.COM", "initiate"),
        sp("@EXAMPLE.COM", "-"),
    ])?);
    let authorizer = Authorizer::new(grants.clone());
    let ticket = tgt()?;

    authorizer.check_ticket_use(&ticket)?;

    let config = CredentialConfig::from_json(r#"{"default_realm": "EXAMPLE.COM"}"#)?;
    let resolver = authorizer.resolver(&config)?;
    assert_eq!(resolver.parse("bob")?.name(), "bob@EXAMPLE.COM");

    let web = resolver.parse("HTTP/web.example.com")?;
    assert!(authorizer.check_accept(&web).unwrap_err().is_access_denied());

    grants.add(sp("HTTP/web.example.com@EXAMPLE.COM", "accept"))?;
    authorizer.check_accept(&web)?;

    ticket.destroy()?;
    assert!(authorizer.check_ticket_use(&ticket).unwrap_err().is_invalid_state());
    Ok(())
}

#[test]
fn test_collection_merge_and_persistence() -> Result<()> {
    let collection = ServicePermissionCollection::new();
    collection.add(sp("svc", "initiate"))?;
    collection.add(sp("svc", "accept"))?;

    let elements = collection.elements();
    assert_eq!(elements.len(), 1);
    assert_eq!(elements[0].actions(), "initiate,accept");

    collection.set_read_only();
    let bytes = CollectionRecord::from_collection(&collection).to_bytes()?;
    let restored = CollectionRecord::from_bytes(&bytes)?.restore()?;

    assert!(restored.is_read_only());
    assert!(restored.implies(&sp("svc", "initiate,accept")));
    assert!(restored.add(sp("other", "accept")).is_err());
    Ok(())
}

#[test]
fn test_implication_rules() {
    let cases = [
        ("*", "accept", "host/x@R", "accept", true),
        ("host/x@R", "initiate", "host/x@R", "accept", false),
        ("@R", "accept", "host/x@R", "accept", true),
        ("host/x@R", "accept", "@R", "accept", true),
        ("host/x@R", "initiate", "host/x@R", "-", true),
        ("@S", "accept", "host/x@R", "-", false),
    ];
    for (held, held_actions, wanted, wanted_actions, expected) in cases {
        assert_eq!(
            sp(held, held_actions).implies(&sp(wanted, wanted_actions)),
            expected,
            "{held} {held_actions} => {wanted} {wanted_actions}"
        );
    }
}
