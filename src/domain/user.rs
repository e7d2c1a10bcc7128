use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy, Default)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Rider,
    Admin,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Role::User => "user",
            Role::Rider => "rider",
            Role::Admin => "admin",
        })
    }
}

/// Availability of a rider for new assignments.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "kebab-case")]
pub enum WorkStatus {
    Available,
    OnDelivery,
}

/// A registered marketplace user, keyed by `id` and unique by `email`.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub display_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo_url: Option<String>,
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub work_status: Option<WorkStatus>,
    pub created_at: DateTime<Utc>,
}

/// Self-registration payload.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    pub email: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub photo_url: Option<String>,
}

impl User {
    /// Creates a user from a registration. New users always start with the `user` role.
    pub fn register(new_user: NewUser) -> Self {
        Self {
            id: Uuid::new_v4(),
            email: new_user.email,
            display_name: new_user.display_name,
            photo_url: new_user.photo_url,
            role: Role::User,
            work_status: None,
            created_at: Utc::now(),
        }
    }

    /// Promotes the user to an available rider.
    pub fn promote_to_rider(&mut self) {
        self.role = Role::Rider;
        self.work_status = Some(WorkStatus::Available);
    }

    /// Case-insensitive match of `needle` against display name or email.
    pub fn matches(&self, needle: &str) -> bool {
        let needle = needle.to_lowercase();
        self.display_name.to_lowercase().contains(&needle)
            || self.email.to_lowercase().contains(&needle)
    }
}

/// Outcome of a self-registration.
#[derive(Debug, Serialize, PartialEq, Clone)]
#[serde(tag = "outcome", rename_all = "kebab-case")]
pub enum Registration {
    Created { user: User },
    AlreadyExists { message: String },
}
