use super::marketplace::Marketplace;
use crate::domain::parcel::{NewParcel, Parcel, ParcelQuery, RiderAssignment};
use crate::domain::principal::{Access, Principal};
use crate::domain::rider::ApplicationStatus;
use crate::domain::user::WorkStatus;
use crate::error::{MarketplaceError, Result};
use tracing::{error, info};
use uuid::Uuid;

impl Marketplace {
    /// Lists parcels newest first.
    ///
    /// Admins see everything. Everyone else sees parcels they sent or that
    /// are assigned to them, and may only filter by their own sender email.
    pub async fn list_parcels(&self, credential: &str, query: ParcelQuery) -> Result<Vec<Parcel>> {
        let principal = self.authorize(credential, Access::Authenticated).await?;
        let is_admin = self.is_admin(&principal).await?;

        if let Some(sender) = &query.sender_email
            && !is_admin
            && !principal.is(sender)
        {
            return Err(MarketplaceError::Forbidden(format!(
                "{} may not list parcels of {}",
                principal, sender
            )));
        }

        let mut parcels = self.parcels.get_all().await?;
        parcels.retain(|parcel| query.matches(parcel) && (is_admin || can_view(&principal, parcel)));
        parcels.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(parcels)
    }

    /// A single parcel, visible to its sender, its rider and admins.
    pub async fn get_parcel(&self, credential: &str, parcel_id: Uuid) -> Result<Parcel> {
        let principal = self.authorize(credential, Access::Authenticated).await?;
        let parcel = self.find_parcel(parcel_id).await?;
        if !can_view(&principal, &parcel) && !self.is_admin(&principal).await? {
            return Err(MarketplaceError::Forbidden(format!(
                "{} may not view parcel {}",
                principal, parcel_id
            )));
        }
        Ok(parcel)
    }

    /// Creates a parcel awaiting payment. The sender must be the caller unless
    /// an admin files it on someone's behalf.
    pub async fn create_parcel(&self, credential: &str, new_parcel: NewParcel) -> Result<Parcel> {
        let principal = self.authorize(credential, Access::Authenticated).await?;
        if new_parcel.parcel_name.trim().is_empty() {
            return Err(MarketplaceError::ValidationError(
                "parcel name is required".to_string(),
            ));
        }
        self.ensure_owner_or_admin(&principal, &new_parcel.sender_email)
            .await?;

        let parcel = Parcel::create(new_parcel);
        self.parcels.insert(parcel.clone()).await?;
        info!(parcel_id = %parcel.id, sender = %parcel.sender_email, cost = %parcel.cost.value(), "parcel created");
        Ok(parcel)
    }

    /// Assigns an approved rider to a parcel and marks the rider on delivery.
    /// Admin only.
    ///
    /// Both records are loaded before anything is written. The parcel is
    /// written first; if the rider's work status cannot follow, the call
    /// fails with `Inconsistency`.
    pub async fn assign_rider(
        &self,
        credential: &str,
        parcel_id: Uuid,
        assignment: RiderAssignment,
    ) -> Result<Parcel> {
        let admin = self.authorize(credential, Access::Admin).await?;

        let mut parcel = self.find_parcel(parcel_id).await?;
        let mut rider = self
            .riders
            .get(assignment.rider_id)
            .await?
            .ok_or_else(|| MarketplaceError::not_found("rider", assignment.rider_id))?;
        if rider.status != ApplicationStatus::Approved {
            return Err(MarketplaceError::ValidationError(format!(
                "rider {} is {}, not approved",
                rider.id, rider.status
            )));
        }

        parcel.assign(assignment);
        if !self.parcels.update(parcel.clone()).await? {
            return Err(MarketplaceError::not_found("parcel", parcel_id));
        }
        info!(parcel_id = %parcel_id, rider_id = %rider.id, by = %admin, "rider assigned");

        rider.work_status = Some(WorkStatus::OnDelivery);
        let rider_id = rider.id;
        let outcome = match self.riders.update(rider).await {
            Ok(true) => Ok(()),
            Ok(false) => Err("rider record disappeared".to_string()),
            Err(e) => Err(e.to_string()),
        };
        if let Err(reason) = outcome {
            error!(parcel_id = %parcel_id, rider_id = %rider_id, reason = %reason, "parcel assigned but rider work status not updated");
            return Err(MarketplaceError::Inconsistency(format!(
                "parcel {} is assigned to rider {} but the rider was not marked on delivery: {}",
                parcel_id, rider_id, reason
            )));
        }
        Ok(parcel)
    }

    /// Removes a parcel. Returns whether anything was removed.
    pub async fn delete_parcel(&self, credential: &str, parcel_id: Uuid) -> Result<bool> {
        let principal = self.authorize(credential, Access::Authenticated).await?;
        let Some(parcel) = self.parcels.get(parcel_id).await? else {
            return Ok(false);
        };
        self.ensure_owner_or_admin(&principal, &parcel.sender_email)
            .await?;

        let removed = self.parcels.delete(parcel_id).await?;
        if removed {
            info!(parcel_id = %parcel_id, by = %principal, "parcel deleted");
        }
        Ok(removed)
    }

    pub(crate) async fn find_parcel(&self, parcel_id: Uuid) -> Result<Parcel> {
        self.parcels
            .get(parcel_id)
            .await?
            .ok_or_else(|| MarketplaceError::not_found("parcel", parcel_id))
    }
}

fn can_view(principal: &Principal, parcel: &Parcel) -> bool {
    principal.is(&parcel.sender_email)
        || parcel
            .rider_email
            .as_deref()
            .is_some_and(|rider| principal.is(rider))
}
