use crate::domain::parcel::{NewParcel, ParcelQuery};
use crate::domain::payment::{CheckoutVariant, SessionPaymentStatus};
use crate::domain::rider::{ApplicationStatus, RiderApplicationForm, RiderQuery};
use crate::domain::user::{NewUser, Role};
use serde::Deserialize;

/// One line of a command script.
///
/// ```json
/// {"op": "create_parcel", "token": "…", "label": "p1", "parcelName": "Books", "cost": 20, "senderEmail": "a@x.com"}
/// {"op": "create_checkout", "token": "…", "label": "s1", "parcel": "@p1"}
/// ```
///
/// `label` names the id produced by the command; later commands refer to it
/// as `@label` wherever an id is expected.
#[derive(Debug, Deserialize)]
pub struct ScriptCommand {
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(flatten)]
    pub action: Action,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum Action {
    RegisterUser(NewUser),
    UserRole {
        email: String,
    },
    ListUsers {
        #[serde(default)]
        search: Option<String>,
    },
    SetRole {
        user: String,
        role: Role,
    },
    ApplyRider(RiderApplicationForm),
    UpdateRiderStatus {
        rider: String,
        status: ApplicationStatus,
    },
    ListRiders {
        #[serde(default)]
        status: Option<ApplicationStatus>,
    },
    AvailableRiders(RiderQuery),
    CreateParcel(NewParcel),
    GetParcel {
        parcel: String,
    },
    ListParcels(ParcelQuery),
    AssignRider {
        parcel: String,
        rider: String,
        rider_name: String,
        rider_email: String,
    },
    DeleteParcel {
        parcel: String,
    },
    CreateCheckout {
        parcel: String,
        #[serde(default)]
        variant: CheckoutVariant,
    },
    /// Sandbox only: the provider finishes the hosted checkout.
    GatewayComplete {
        session: String,
        payment_intent: String,
        #[serde(default = "paid")]
        status: SessionPaymentStatus,
    },
    ConfirmPayment {
        session: String,
    },
    ListPayments {
        #[serde(default)]
        email: Option<String>,
    },
    ListAllPayments,
}

fn paid() -> SessionPaymentStatus {
    SessionPaymentStatus::Paid
}

impl Action {
    pub fn name(&self) -> &'static str {
        match self {
            Action::RegisterUser(..) => "register_user",
            Action::UserRole { .. } => "user_role",
            Action::ListUsers { .. } => "list_users",
            Action::SetRole { .. } => "set_role",
            Action::ApplyRider(..) => "apply_rider",
            Action::UpdateRiderStatus { .. } => "update_rider_status",
            Action::ListRiders { .. } => "list_riders",
            Action::AvailableRiders(..) => "available_riders",
            Action::CreateParcel(..) => "create_parcel",
            Action::GetParcel { .. } => "get_parcel",
            Action::ListParcels(..) => "list_parcels",
            Action::AssignRider { .. } => "assign_rider",
            Action::DeleteParcel { .. } => "delete_parcel",
            Action::CreateCheckout { .. } => "create_checkout",
            Action::GatewayComplete { .. } => "gateway_complete",
            Action::ConfirmPayment { .. } => "confirm_payment",
            Action::ListPayments { .. } => "list_payments",
            Action::ListAllPayments => "list_all_payments",
        }
    }
}
