use super::user::WorkStatus;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy, Default)]
#[serde(rename_all = "lowercase")]
pub enum ApplicationStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

impl fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ApplicationStatus::Pending => "pending",
            ApplicationStatus::Approved => "approved",
            ApplicationStatus::Rejected => "rejected",
        })
    }
}

/// A courier application. Once approved it doubles as the rider's work record.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
#[serde(rename_all = "camelCase")]
pub struct RiderApplication {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub district: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    pub status: ApplicationStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub work_status: Option<WorkStatus>,
    pub created_at: DateTime<Utc>,
}

/// Fields a prospective rider submits. The email comes from the caller's identity.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
#[serde(rename_all = "camelCase")]
pub struct RiderApplicationForm {
    pub name: String,
    pub district: String,
    #[serde(default)]
    pub phone: Option<String>,
}

impl RiderApplication {
    pub fn submit(email: impl Into<String>, form: RiderApplicationForm) -> Self {
        Self {
            id: Uuid::new_v4(),
            email: email.into(),
            name: form.name,
            district: form.district,
            phone: form.phone,
            status: ApplicationStatus::Pending,
            work_status: None,
            created_at: Utc::now(),
        }
    }

    /// Moves the application to `status`. Approval also marks the rider available.
    pub fn transition(&mut self, status: ApplicationStatus) {
        self.status = status;
        if status == ApplicationStatus::Approved && self.work_status.is_none() {
            self.work_status = Some(WorkStatus::Available);
        }
    }
}

/// Filters for the assignment-candidate lookup. Absent fields match anything.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct RiderQuery {
    #[serde(default)]
    pub district: Option<String>,
    #[serde(default)]
    pub status: Option<ApplicationStatus>,
    #[serde(default)]
    pub work_status: Option<WorkStatus>,
}

impl RiderQuery {
    pub fn matches(&self, rider: &RiderApplication) -> bool {
        self.district
            .as_deref()
            .is_none_or(|district| rider.district.eq_ignore_ascii_case(district))
            && self.status.is_none_or(|status| rider.status == status)
            && self
                .work_status
                .is_none_or(|work| rider.work_status == Some(work))
    }
}

/// Outcome of a rider application submission.
#[derive(Debug, Serialize, PartialEq, Clone)]
#[serde(tag = "outcome", rename_all = "kebab-case")]
pub enum Application {
    Submitted { application: RiderApplication },
    AlreadyApplied { message: String },
}
