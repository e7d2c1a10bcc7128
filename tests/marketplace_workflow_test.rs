mod common;

use common::{ADMIN, Fixture, new_parcel};
use rust_decimal_macros::dec;
use zapshift::domain::parcel::{DeliveryStatus, ParcelQuery, RiderAssignment};
use zapshift::domain::payment::CheckoutVariant;
use zapshift::domain::rider::{Application, ApplicationStatus, RiderApplicationForm, RiderQuery};
use zapshift::domain::user::{NewUser, Registration, Role, WorkStatus};
use zapshift::error::MarketplaceError;

fn form(district: &str) -> RiderApplicationForm {
    RiderApplicationForm {
        name: "Rita".to_string(),
        district: district.to_string(),
        phone: None,
    }
}

#[tokio::test]
async fn test_duplicate_registration_reports_existing_user() {
    let fx = Fixture::new().await;
    let new_user = NewUser {
        email: "a@x.com".to_string(),
        display_name: "Ada".to_string(),
        photo_url: None,
    };

    let first = fx.marketplace.register_user(new_user.clone()).await.unwrap();
    assert!(matches!(first, Registration::Created { ref user } if user.role == Role::User));

    let second = fx.marketplace.register_user(new_user).await.unwrap();
    assert!(matches!(second, Registration::AlreadyExists { .. }));

    let users = fx.marketplace.list_users(&fx.admin(), Some("ada")).await.unwrap();
    assert_eq!(users.len(), 1);
}

#[tokio::test]
async fn test_role_lookup_defaults_to_user() {
    let fx = Fixture::new().await;
    let token = fx.user("a@x.com").await;

    assert_eq!(
        fx.marketplace.role_for(&token, ADMIN).await.unwrap(),
        Role::Admin
    );
    assert_eq!(
        fx.marketplace.role_for(&token, "nobody@x.com").await.unwrap(),
        Role::User
    );
}

#[tokio::test]
async fn test_set_role_is_admin_only() {
    let fx = Fixture::new().await;
    let token = fx.user("a@x.com").await;
    let users = fx.marketplace.list_users(&fx.admin(), Some("a@x.com")).await.unwrap();
    let user_id = users[0].id;

    let result = fx.marketplace.set_role(&token, user_id, Role::Admin).await;
    assert!(matches!(result, Err(MarketplaceError::Forbidden(_))));

    let user = fx
        .marketplace
        .set_role(&fx.admin(), user_id, Role::Admin)
        .await
        .unwrap();
    assert_eq!(user.role, Role::Admin);
}

#[tokio::test]
async fn test_rider_approval_promotes_user() {
    let fx = Fixture::new().await;
    let token = fx.user("r@x.com").await;

    let Application::Submitted { application } = fx
        .marketplace
        .apply_as_rider(&token, form("Dhaka"))
        .await
        .unwrap()
    else {
        panic!("expected a new application");
    };
    assert_eq!(application.email, "r@x.com");
    assert_eq!(application.status, ApplicationStatus::Pending);

    let again = fx.marketplace.apply_as_rider(&token, form("Dhaka")).await.unwrap();
    assert!(matches!(again, Application::AlreadyApplied { .. }));

    let approved = fx
        .marketplace
        .update_rider_status(&fx.admin(), application.id, ApplicationStatus::Approved)
        .await
        .unwrap();
    assert_eq!(approved.work_status, Some(WorkStatus::Available));
    assert_eq!(
        fx.marketplace.role_for(&token, "r@x.com").await.unwrap(),
        Role::Rider
    );

    let candidates = fx
        .marketplace
        .available_riders(
            &token,
            RiderQuery {
                district: Some("dhaka".to_string()),
                status: Some(ApplicationStatus::Approved),
                work_status: Some(WorkStatus::Available),
            },
        )
        .await
        .unwrap();
    assert_eq!(candidates.len(), 1);
}

#[tokio::test]
async fn test_rider_rejection_leaves_role_untouched() {
    let fx = Fixture::new().await;
    let token = fx.user("r@x.com").await;
    let Application::Submitted { application } = fx
        .marketplace
        .apply_as_rider(&token, form("Dhaka"))
        .await
        .unwrap()
    else {
        panic!("expected a new application");
    };

    fx.marketplace
        .update_rider_status(&fx.admin(), application.id, ApplicationStatus::Rejected)
        .await
        .unwrap();
    assert_eq!(
        fx.marketplace.role_for(&token, "r@x.com").await.unwrap(),
        Role::User
    );

    let rejected = fx
        .marketplace
        .list_riders(&fx.admin(), Some(ApplicationStatus::Rejected))
        .await
        .unwrap();
    assert_eq!(rejected.len(), 1);
}

#[tokio::test]
async fn test_approving_unregistered_applicant_is_inconsistent() {
    let fx = Fixture::new().await;
    let token = fx.token("ghost@x.com");
    let Application::Submitted { application } = fx
        .marketplace
        .apply_as_rider(&token, form("Dhaka"))
        .await
        .unwrap()
    else {
        panic!("expected a new application");
    };

    let result = fx
        .marketplace
        .update_rider_status(&fx.admin(), application.id, ApplicationStatus::Approved)
        .await;
    assert!(matches!(result, Err(MarketplaceError::Inconsistency(_))));
}

#[tokio::test]
async fn test_assign_rider_marks_rider_on_delivery() {
    let fx = Fixture::new().await;
    let rider_token = fx.user("r@x.com").await;
    let Application::Submitted { application } = fx
        .marketplace
        .apply_as_rider(&rider_token, form("Dhaka"))
        .await
        .unwrap()
    else {
        panic!("expected a new application");
    };
    let parcel = fx.parcel("a@x.com", dec!(20)).await;
    let assignment = RiderAssignment {
        rider_id: application.id,
        rider_name: "Rita".to_string(),
        rider_email: "r@x.com".to_string(),
    };

    let result = fx
        .marketplace
        .assign_rider(&fx.admin(), parcel.id, assignment.clone())
        .await;
    assert!(matches!(result, Err(MarketplaceError::ValidationError(_))));

    fx.marketplace
        .update_rider_status(&fx.admin(), application.id, ApplicationStatus::Approved)
        .await
        .unwrap();
    let assigned = fx
        .marketplace
        .assign_rider(&fx.admin(), parcel.id, assignment)
        .await
        .unwrap();
    assert_eq!(assigned.delivery_status, DeliveryStatus::RiderAssigned);
    assert_eq!(assigned.rider_email.as_deref(), Some("r@x.com"));

    let riders = fx
        .marketplace
        .list_riders(&fx.admin(), Some(ApplicationStatus::Approved))
        .await
        .unwrap();
    assert_eq!(riders[0].work_status, Some(WorkStatus::OnDelivery));

    let visible = fx
        .marketplace
        .get_parcel(&rider_token, parcel.id)
        .await
        .unwrap();
    assert_eq!(visible.id, parcel.id);
}

#[tokio::test]
async fn test_parcels_are_private_to_sender() {
    let fx = Fixture::new().await;
    let alice = fx.user("a@x.com").await;
    let bob = fx.user("b@x.com").await;
    let parcel = fx.parcel("a@x.com", dec!(20)).await;
    fx.parcel("b@x.com", dec!(5)).await;

    let result = fx
        .marketplace
        .create_parcel(&bob, new_parcel("a@x.com", dec!(1)))
        .await;
    assert!(matches!(result, Err(MarketplaceError::Forbidden(_))));

    let result = fx.marketplace.get_parcel(&bob, parcel.id).await;
    assert!(matches!(result, Err(MarketplaceError::Forbidden(_))));

    let mine = fx
        .marketplace
        .list_parcels(&alice, ParcelQuery::default())
        .await
        .unwrap();
    assert_eq!(mine.len(), 1);

    let all = fx
        .marketplace
        .list_parcels(&fx.admin(), ParcelQuery::default())
        .await
        .unwrap();
    assert_eq!(all.len(), 2);

    assert!(!fx.marketplace.delete_parcel(&bob, uuid::Uuid::new_v4()).await.unwrap());
    let result = fx.marketplace.delete_parcel(&bob, parcel.id).await;
    assert!(matches!(result, Err(MarketplaceError::Forbidden(_))));
    assert!(fx.marketplace.delete_parcel(&alice, parcel.id).await.unwrap());
}

#[tokio::test]
async fn test_checkout_uses_stored_parcel() {
    let fx = Fixture::new().await;
    let alice = fx.user("a@x.com").await;
    let bob = fx.user("b@x.com").await;
    let parcel = fx.parcel("a@x.com", dec!(19.99)).await;

    let result = fx
        .marketplace
        .create_checkout_session(&bob, parcel.id, CheckoutVariant::Basic)
        .await;
    assert!(matches!(result, Err(MarketplaceError::Forbidden(_))));

    let link = fx
        .marketplace
        .create_checkout_session(&alice, parcel.id, CheckoutVariant::Basic)
        .await
        .unwrap();
    assert!(link.session_id.starts_with("cs_test_"));
    assert!(link.url.is_some());

    let session_id = fx.paid_session(&parcel, "pi_paid").await;
    fx.marketplace
        .confirm_payment(&alice, &session_id)
        .await
        .unwrap();

    let result = fx
        .marketplace
        .create_checkout_session(&alice, parcel.id, CheckoutVariant::Tracked)
        .await;
    assert!(matches!(result, Err(MarketplaceError::ValidationError(_))));

    let payments = fx.marketplace.list_payments(&alice, None).await.unwrap();
    assert_eq!(payments.len(), 1);
    assert_eq!(payments[0].amount, 1999);

    let result = fx.marketplace.list_payments(&bob, Some("a@x.com")).await;
    assert!(matches!(result, Err(MarketplaceError::Forbidden(_))));
    assert!(fx.marketplace.list_payments(&bob, None).await.unwrap().is_empty());
}
