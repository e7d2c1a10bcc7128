use super::marketplace::Marketplace;
use crate::domain::principal::Access;
use crate::domain::rider::{
    Application, ApplicationStatus, RiderApplication, RiderApplicationForm, RiderQuery,
};
use crate::error::{MarketplaceError, Result};
use tracing::{error, info};
use uuid::Uuid;

impl Marketplace {
    /// Lists rider applications, optionally by status. Admin only.
    pub async fn list_riders(
        &self,
        credential: &str,
        status: Option<ApplicationStatus>,
    ) -> Result<Vec<RiderApplication>> {
        self.authorize(credential, Access::Admin).await?;
        let query = RiderQuery {
            status,
            ..Default::default()
        };
        self.query_riders(&query).await
    }

    /// Assignment candidates matching district, status and work status.
    pub async fn available_riders(
        &self,
        credential: &str,
        query: RiderQuery,
    ) -> Result<Vec<RiderApplication>> {
        self.authorize(credential, Access::Authenticated).await?;
        self.query_riders(&query).await
    }

    async fn query_riders(&self, query: &RiderQuery) -> Result<Vec<RiderApplication>> {
        let mut riders = self.riders.get_all().await?;
        riders.retain(|rider| query.matches(rider));
        riders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(riders)
    }

    /// Submits the caller's rider application. One application per email.
    pub async fn apply_as_rider(
        &self,
        credential: &str,
        form: RiderApplicationForm,
    ) -> Result<Application> {
        let principal = self.authorize(credential, Access::Authenticated).await?;
        if form.district.trim().is_empty() {
            return Err(MarketplaceError::ValidationError(
                "district is required".to_string(),
            ));
        }

        if self.riders.find_by_email(&principal.email).await?.is_some() {
            return Ok(already_applied());
        }

        let application = RiderApplication::submit(principal.email, form);
        match self.riders.insert(application.clone()).await {
            Ok(()) => {
                info!(rider_id = %application.id, email = %application.email, "rider application submitted");
                Ok(Application::Submitted { application })
            }
            Err(MarketplaceError::Conflict(_)) => Ok(already_applied()),
            Err(e) => Err(e),
        }
    }

    /// Moves an application to `status`. Admin only.
    ///
    /// Approval also promotes the applicant's user record to an available
    /// rider. The application write happens first; if the promotion cannot be
    /// applied the call fails with `Inconsistency` and calling it again
    /// completes the promotion.
    pub async fn update_rider_status(
        &self,
        credential: &str,
        rider_id: Uuid,
        status: ApplicationStatus,
    ) -> Result<RiderApplication> {
        let admin = self.authorize(credential, Access::Admin).await?;

        let mut application = self
            .riders
            .get(rider_id)
            .await?
            .ok_or_else(|| MarketplaceError::not_found("rider", rider_id))?;
        application.transition(status);
        if !self.riders.update(application.clone()).await? {
            return Err(MarketplaceError::not_found("rider", rider_id));
        }
        info!(rider_id = %rider_id, status = %status, by = %admin, "rider application updated");

        if status == ApplicationStatus::Approved {
            self.promote_to_rider(&application).await?;
        }
        Ok(application)
    }

    async fn promote_to_rider(&self, application: &RiderApplication) -> Result<()> {
        let inconsistency = |reason: String| {
            error!(
                rider_id = %application.id,
                email = %application.email,
                reason = %reason,
                "rider approved but user record not promoted"
            );
            MarketplaceError::Inconsistency(format!(
                "rider application {} is approved but user {} was not promoted: {}",
                application.id, application.email, reason
            ))
        };

        let mut user = match self.users.find_by_email(&application.email).await {
            Ok(Some(user)) => user,
            Ok(None) => return Err(inconsistency("no registered user".to_string())),
            Err(e) => return Err(inconsistency(e.to_string())),
        };
        user.promote_to_rider();
        match self.users.update(user).await {
            Ok(true) => {
                info!(email = %application.email, "user promoted to rider");
                Ok(())
            }
            Ok(false) => Err(inconsistency("user record disappeared".to_string())),
            Err(e) => Err(inconsistency(e.to_string())),
        }
    }
}

fn already_applied() -> Application {
    Application::AlreadyApplied {
        message: "Application already submitted".to_string(),
    }
}
