//! Property tests across crate boundaries.

use std::sync::Arc;

use kerbcred::perms::{ActionMask, CollectionRecord, PermissionCollection, PermissionSet};
use kerbcred::{Authorizer, Destroyable, KerberosTicket, ServicePermission};
use kerbcred_testkit::generators::{permission, principal, ServicePermissionParams};
use kerbcred_testkit::{ScriptedRenewer, TicketBuilder};
use proptest::prelude::*;

proptest! {
    #[test]
    fn restored_collection_grants_the_same(perms in prop::collection::vec(permission(), 0..24)) {
        let set = PermissionSet::from_permissions(perms.clone()).unwrap();
        let bytes = CollectionRecord::from_collection(&set).to_bytes().unwrap();
        let restored = CollectionRecord::from_bytes(&bytes).unwrap().restore().unwrap();

        for p in &perms {
            prop_assert!(restored.implies(p));
        }
        prop_assert_eq!(restored.elements().len(), set.elements().len());
    }

    #[test]
    fn realm_grant_only_answers_any_action_requests(params: ServicePermissionParams) {
        let set = PermissionSet::new();
        set.add(params.realm_permission().into()).unwrap();
        let authorizer = Authorizer::new(Arc::new(set));

        // A collection consults realm entries only for "-" requests.
        let any = ServicePermission::with_mask(params.principal_name(), ActionMask::NONE).unwrap();
        prop_assert!(authorizer.check(&any.into()).is_ok());
        prop_assert!(authorizer.check(&params.principal_permission().into()).is_err());
    }

    #[test]
    fn destroyed_ticket_fails_every_accessor(client in principal(), server in principal()) {
        let ticket: KerberosTicket = TicketBuilder::new(client.name(), server.name())
            .renewable()
            .build();
        ticket.destroy().unwrap();

        prop_assert!(ticket.encoded().is_err());
        prop_assert!(ticket.client().is_err());
        prop_assert!(ticket.session_key().is_err());
        prop_assert!(ticket.snapshot().is_err());
        prop_assert!(!ticket.is_current());
        prop_assert!(ticket.refresh(&ScriptedRenewer::new()).is_err());
    }

    #[test]
    fn refresh_keeps_principals(client in principal(), server in principal()) {
        let ticket = TicketBuilder::new(client.name(), server.name())
            .renewable()
            .build();
        ticket.refresh(&ScriptedRenewer::new()).unwrap();

        let snapshot = ticket.snapshot().unwrap();
        prop_assert_eq!(snapshot.client, client);
        prop_assert_eq!(snapshot.server, server);
        prop_assert!(ticket.is_renewable());
    }
}
