//! Permission checks guarding credential use.
//!
//! Code about to use a credential asks the [`Authorizer`] first: initiating
//! a context with a service needs `initiate` on the service principal,
//! accepting as a service needs `accept` on it, forwarding a ticket needs a
//! delegation permission, and learning the configured default realm needs
//! `ServicePermission("@REALM", "-")`.

use std::fmt;
use std::sync::Arc;

use kerbcred_core::{KerberosPrincipal, PrincipalResolver, Realm};
use kerbcred_creds::KerberosTicket;
use kerbcred_perms::{
    ActionMask, AuthorizationPolicy, DelegationPermission, Permission, ServicePermission,
};

use crate::config::CredentialConfig;
use crate::error::Result;

/// Applies an [`AuthorizationPolicy`] to credential operations.
#[derive(Clone)]
pub struct Authorizer {
    policy: Arc<dyn AuthorizationPolicy>,
}

impl Authorizer {
    pub fn new(policy: Arc<dyn AuthorizationPolicy>) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &Arc<dyn AuthorizationPolicy> {
        &self.policy
    }

    /// Check an arbitrary permission.
    pub fn check(&self, permission: &Permission) -> Result<()> {
        Ok(self.policy.check(permission)?)
    }

    /// May the caller act as a client of `service`.
    pub fn check_initiate(&self, service: &KerberosPrincipal) -> Result<()> {
        self.check(&ServicePermission::for_principal(service, ActionMask::INITIATE).into())
    }

    /// May the caller act as `service`.
    pub fn check_accept(&self, service: &KerberosPrincipal) -> Result<()> {
        self.check(&ServicePermission::for_principal(service, ActionMask::ACCEPT).into())
    }

    /// May the caller forward `subordinate`'s ticket to `service`.
    pub fn check_delegation(
        &self,
        subordinate: &KerberosPrincipal,
        service: &KerberosPrincipal,
    ) -> Result<()> {
        let permission = DelegationPermission::from_principals(subordinate, service)?;
        self.check(&permission.into())
    }

    /// May the caller use `ticket` to contact its server.
    pub fn check_ticket_use(&self, ticket: &KerberosTicket) -> Result<()> {
        let server = ticket.server()?;
        self.check_initiate(&server)
    }

    /// May the caller learn that `realm` is the configured realm.
    pub fn can_read_realm(&self, realm: &Realm) -> bool {
        let permission: Permission = ServicePermission::realm_access(realm.as_str()).into();
        match self.policy.check(&permission) {
            Ok(()) => true,
            Err(e) => {
                tracing::debug!(realm = %realm, error = %e, "realm access denied");
                false
            }
        }
    }

    /// A principal resolver using the configured default realm, gated by
    /// this authorizer when `check_realm_access` is on.
    pub fn resolver(&self, config: &CredentialConfig) -> Result<PrincipalResolver> {
        let resolver = PrincipalResolver::new(config.default_realm()?);
        if !config.check_realm_access {
            return Ok(resolver);
        }
        let authorizer = self.clone();
        Ok(resolver.with_realm_check(move |realm| authorizer.can_read_realm(realm)))
    }
}

impl fmt::Debug for Authorizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Authorizer").finish_non_exhaustive()
    }
}
