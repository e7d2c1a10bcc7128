use crate::config::Config;
use crate::domain::ports::{
    IdentityVerifierBox, ParcelStoreBox, PaymentGatewayBox, PaymentStoreBox, RiderStoreBox,
    Stores, UserStoreBox,
};
use crate::domain::principal::{Access, Principal};
use crate::domain::user::{NewUser, Role, User};
use crate::error::{MarketplaceError, Result};
use tracing::{info, warn};

/// Where hosted checkout sends the customer back, and in which currency it charges.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutSettings {
    pub site_domain: String,
    pub currency: String,
}

impl From<&Config> for CheckoutSettings {
    fn from(config: &Config) -> Self {
        Self {
            site_domain: config.site_domain.clone(),
            currency: config.currency.clone(),
        }
    }
}

/// The marketplace application service.
///
/// `Marketplace` owns the store, gateway and identity adapters for the whole
/// process and exposes every marketplace operation as an async method. Each
/// operation runs independently; the only coordination between concurrent
/// calls is what the stores themselves enforce (unique keys).
pub struct Marketplace {
    pub(crate) users: UserStoreBox,
    pub(crate) riders: RiderStoreBox,
    pub(crate) parcels: ParcelStoreBox,
    pub(crate) payments: PaymentStoreBox,
    pub(crate) gateway: PaymentGatewayBox,
    pub(crate) verifier: IdentityVerifierBox,
    pub(crate) checkout: CheckoutSettings,
}

impl Marketplace {
    /// Creates a new `Marketplace`.
    ///
    /// # Arguments
    ///
    /// * `stores` - The four persistent collections.
    /// * `gateway` - The hosted checkout provider.
    /// * `verifier` - Turns bearer credentials into principals.
    /// * `checkout` - Redirect origin and currency for checkout sessions.
    pub fn new(
        stores: Stores,
        gateway: PaymentGatewayBox,
        verifier: IdentityVerifierBox,
        checkout: CheckoutSettings,
    ) -> Self {
        Self {
            users: stores.users,
            riders: stores.riders,
            parcels: stores.parcels,
            payments: stores.payments,
            gateway,
            verifier,
            checkout,
        }
    }

    /// Authorization gate: verifies the credential and enforces `access`.
    ///
    /// Fails with `Unauthenticated` when the credential is missing or invalid
    /// and with `Forbidden` when an admin-only operation is called by anyone
    /// whose stored role is not `admin`.
    pub async fn authorize(&self, credential: &str, access: Access) -> Result<Principal> {
        let principal = self.verifier.verify(credential).await?;
        if access == Access::Admin && !self.is_admin(&principal).await? {
            warn!(principal = %principal, "admin access denied");
            return Err(MarketplaceError::Forbidden(
                "admin role required".to_string(),
            ));
        }
        Ok(principal)
    }

    pub(crate) async fn is_admin(&self, principal: &Principal) -> Result<bool> {
        Ok(self
            .users
            .find_by_email(&principal.email)
            .await?
            .is_some_and(|user| user.role == Role::Admin))
    }

    /// Passes when the principal is `owner_email` or an admin.
    pub(crate) async fn ensure_owner_or_admin(
        &self,
        principal: &Principal,
        owner_email: &str,
    ) -> Result<()> {
        if principal.is(owner_email) || self.is_admin(principal).await? {
            Ok(())
        } else {
            warn!(principal = %principal, owner = owner_email, "access to foreign resource denied");
            Err(MarketplaceError::Forbidden(format!(
                "{} may not act on behalf of {}",
                principal, owner_email
            )))
        }
    }

    /// Ensures every listed account exists with the admin role.
    pub async fn bootstrap_admins(&self, emails: &[String]) -> Result<()> {
        for email in emails {
            match self.users.find_by_email(email).await? {
                Some(user) if user.role == Role::Admin => {}
                Some(mut user) => {
                    user.role = Role::Admin;
                    self.users.update(user).await?;
                    info!(email = %email, "promoted bootstrap admin");
                }
                None => {
                    let mut user = User::register(NewUser {
                        email: email.clone(),
                        display_name: email.clone(),
                        photo_url: None,
                    });
                    user.role = Role::Admin;
                    match self.users.insert(user).await {
                        Ok(()) | Err(MarketplaceError::Conflict(_)) => {}
                        Err(e) => return Err(e),
                    }
                    info!(email = %email, "created bootstrap admin");
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::sandbox_gateway::SandboxGateway;
    use crate::infrastructure::token::HmacTokenVerifier;
    use chrono::Duration;

    fn marketplace() -> (Marketplace, HmacTokenVerifier) {
        let verifier = HmacTokenVerifier::new("secret", Duration::hours(1));
        let marketplace = Marketplace::new(
            Stores::in_memory(),
            Box::new(SandboxGateway::new()),
            Box::new(verifier.clone()),
            CheckoutSettings {
                site_domain: "http://localhost".to_string(),
                currency: "usd".to_string(),
            },
        );
        (marketplace, verifier)
    }

    #[tokio::test]
    async fn test_authorize_requires_valid_credential() {
        let (marketplace, _) = marketplace();
        let result = marketplace.authorize("", Access::Authenticated).await;
        assert!(matches!(result, Err(MarketplaceError::Unauthenticated(_))));
    }

    #[tokio::test]
    async fn test_authorize_admin_checks_role_store() {
        let (marketplace, verifier) = marketplace();
        let token = verifier.issue("root@x.com");

        let result = marketplace.authorize(&token, Access::Admin).await;
        assert!(matches!(result, Err(MarketplaceError::Forbidden(_))));

        marketplace
            .bootstrap_admins(&["root@x.com".to_string()])
            .await
            .unwrap();
        let principal = marketplace.authorize(&token, Access::Admin).await.unwrap();
        assert_eq!(principal.email, "root@x.com");
    }

    #[tokio::test]
    async fn test_bootstrap_admins_is_idempotent() {
        let (marketplace, _) = marketplace();
        let admins = vec!["root@x.com".to_string()];
        marketplace.bootstrap_admins(&admins).await.unwrap();
        marketplace.bootstrap_admins(&admins).await.unwrap();

        let users = marketplace.users.get_all().await.unwrap();
        assert_eq!(users.len(), 1);
        assert_eq!(users[0].role, Role::Admin);
    }
}
