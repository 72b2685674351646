//! Proptest generators for property-based testing.

use proptest::prelude::*;

use kerbcred_core::KerberosPrincipal;
use kerbcred_perms::{ActionMask, DelegationPermission, Permission, ServicePermission};

/// Generate a realm name.
pub fn realm() -> impl Strategy<Value = String> {
    "[A-Z]{2,8}(\\.[A-Z]{2,4})?".prop_map(String::from)
}

/// Generate a service or user component.
pub fn component() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9-]{0,11}".prop_map(String::from)
}

/// Generate a fully qualified principal: a user or a `service/host`.
pub fn principal() -> impl Strategy<Value = KerberosPrincipal> {
    (component(), prop::option::of(component()), realm()).prop_map(|(first, host, realm)| {
        let name = match host {
            Some(host) => format!("{first}/{host}.example.com@{realm}"),
            None => format!("{first}@{realm}"),
        };
        KerberosPrincipal::parse(&name).expect("generated principal is fully qualified")
    })
}

/// Generate an action mask, including the empty one.
pub fn action_mask() -> impl Strategy<Value = ActionMask> {
    prop_oneof![
        Just(ActionMask::NONE),
        Just(ActionMask::INITIATE),
        Just(ActionMask::ACCEPT),
        Just(ActionMask::ALL),
    ]
}

/// Generate a non-empty action mask.
pub fn granted_mask() -> impl Strategy<Value = ActionMask> {
    prop_oneof![
        Just(ActionMask::INITIATE),
        Just(ActionMask::ACCEPT),
        Just(ActionMask::ALL),
    ]
}

/// Generate a service permission name: `*`, `@REALM`, or a principal.
pub fn service_name() -> impl Strategy<Value = String> {
    prop_oneof![
        1 => Just("*".to_string()),
        2 => realm().prop_map(|r| format!("@{r}")),
        6 => principal().prop_map(|p| p.name().to_string()),
    ]
}

/// Generate a service permission with a non-empty mask.
pub fn service_permission() -> impl Strategy<Value = ServicePermission> {
    (service_name(), granted_mask()).prop_map(|(name, mask)| {
        ServicePermission::with_mask(name, mask).expect("generated name is non-empty")
    })
}

/// Generate a delegation permission between two principals.
pub fn delegation_permission() -> impl Strategy<Value = DelegationPermission> {
    (principal(), principal()).prop_map(|(subordinate, service)| {
        DelegationPermission::from_principals(&subordinate, &service)
            .expect("principal names contain no quotes")
    })
}

/// Generate either kind of permission.
pub fn permission() -> impl Strategy<Value = Permission> {
    prop_oneof![
        3 => service_permission().prop_map(Permission::from),
        1 => delegation_permission().prop_map(Permission::from),
    ]
}

/// Parameters for a service permission scoped to one realm.
///
/// The principal is always in `realm`, so the realm-wide permission built
/// from the same parameters covers it.
#[derive(Debug, Clone)]
pub struct ServicePermissionParams {
    pub realm: String,
    pub service: String,
    pub host: String,
    pub mask: ActionMask,
}

impl ServicePermissionParams {
    pub fn principal_name(&self) -> String {
        format!("{}/{}.example.com@{}", self.service, self.host, self.realm)
    }

    /// Permission on the concrete principal.
    pub fn principal_permission(&self) -> ServicePermission {
        ServicePermission::with_mask(self.principal_name(), self.mask)
            .expect("principal name is non-empty")
    }

    /// Permission on the whole realm.
    pub fn realm_permission(&self) -> ServicePermission {
        ServicePermission::with_mask(format!("@{}", self.realm), self.mask)
            .expect("realm name is non-empty")
    }
}

impl Arbitrary for ServicePermissionParams {
    type Parameters = ();
    type Strategy = BoxedStrategy<Self>;

    fn arbitrary_with(_: Self::Parameters) -> Self::Strategy {
        (realm(), component(), component(), granted_mask())
            .prop_map(|(realm, service, host, mask)| ServicePermissionParams {
                realm,
                service,
                host,
                mask,
            })
            .boxed()
    }
}
