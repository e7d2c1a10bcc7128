use super::marketplace::Marketplace;
use crate::domain::principal::Access;
use crate::domain::user::{NewUser, Registration, Role, User};
use crate::error::{MarketplaceError, Result};
use tracing::info;
use uuid::Uuid;

impl Marketplace {
    /// Lists users, newest first, optionally filtered by a case-insensitive
    /// search over display name and email. Admin only.
    pub async fn list_users(&self, credential: &str, search: Option<&str>) -> Result<Vec<User>> {
        self.authorize(credential, Access::Admin).await?;

        let mut users = self.users.get_all().await?;
        if let Some(needle) = search.filter(|s| !s.is_empty()) {
            users.retain(|user| user.matches(needle));
        }
        users.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(users)
    }

    /// Role of the account registered under `email`, `user` when unknown.
    pub async fn role_for(&self, credential: &str, email: &str) -> Result<Role> {
        self.authorize(credential, Access::Authenticated).await?;
        Ok(self
            .users
            .find_by_email(email)
            .await?
            .map(|user| user.role)
            .unwrap_or_default())
    }

    /// Idempotent self-registration. A second registration for the same
    /// email reports `AlreadyExists` and writes nothing.
    pub async fn register_user(&self, new_user: NewUser) -> Result<Registration> {
        let email = new_user.email.trim();
        if email.is_empty() || !email.contains('@') {
            return Err(MarketplaceError::ValidationError(format!(
                "invalid email address: '{}'",
                new_user.email
            )));
        }
        let new_user = NewUser {
            email: email.to_string(),
            ..new_user
        };

        if self.users.find_by_email(&new_user.email).await?.is_some() {
            return Ok(already_exists());
        }

        let user = User::register(new_user);
        match self.users.insert(user.clone()).await {
            Ok(()) => {
                info!(user_id = %user.id, email = %user.email, "user registered");
                Ok(Registration::Created { user })
            }
            Err(MarketplaceError::Conflict(_)) => Ok(already_exists()),
            Err(e) => Err(e),
        }
    }

    /// Changes a user's role. Admin only.
    pub async fn set_role(&self, credential: &str, user_id: Uuid, role: Role) -> Result<User> {
        let admin = self.authorize(credential, Access::Admin).await?;

        let mut user = self
            .users
            .get(user_id)
            .await?
            .ok_or_else(|| MarketplaceError::not_found("user", user_id))?;
        user.role = role;
        if !self.users.update(user.clone()).await? {
            return Err(MarketplaceError::not_found("user", user_id));
        }
        info!(user_id = %user_id, role = %role, by = %admin, "role changed");
        Ok(user)
    }
}

fn already_exists() -> Registration {
    Registration::AlreadyExists {
        message: "User already exists".to_string(),
    }
}
