use super::command::{Action, ScriptCommand};
use crate::application::marketplace::Marketplace;
use crate::domain::parcel::RiderAssignment;
use crate::domain::rider::Application;
use crate::domain::user::Registration;
use crate::error::{MarketplaceError, Result};
use crate::infrastructure::sandbox_gateway::SandboxGateway;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::io::{BufRead, Write};
use tracing::{error, info};
use uuid::Uuid;

#[derive(Serialize)]
struct ErrorJson {
    r#type: &'static str,
    message: String,
}

impl From<&MarketplaceError> for ErrorJson {
    fn from(err: &MarketplaceError) -> Self {
        Self {
            r#type: err.kind(),
            message: err.to_string(),
        }
    }
}

/// One output line of a script run.
#[derive(Serialize)]
struct CommandOutput {
    line: usize,
    op: &'static str,
    ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<ErrorJson>,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub executed: usize,
    pub failed: usize,
    pub unreadable: usize,
}

/// Replays script commands through the marketplace, one at a time.
pub struct ScriptRunner<'a> {
    marketplace: &'a Marketplace,
    sandbox: Option<SandboxGateway>,
    labels: HashMap<String, String>,
}

impl<'a> ScriptRunner<'a> {
    /// `sandbox` must be a handle to the gateway the marketplace was built
    /// with; without it `gateway_complete` commands are refused.
    pub fn new(marketplace: &'a Marketplace, sandbox: Option<SandboxGateway>) -> Self {
        Self {
            marketplace,
            sandbox,
            labels: HashMap::new(),
        }
    }

    /// Reads commands line by line and writes one JSON result per command.
    ///
    /// Blank lines and lines starting with `#` are ignored. Lines that do not
    /// parse are logged and skipped; failing commands are reported in the
    /// output and do not stop the run.
    pub async fn run<R: BufRead, W: Write>(&mut self, source: R, mut sink: W) -> Result<RunSummary> {
        let mut summary = RunSummary::default();

        for (index, line) in source.lines().enumerate() {
            let line_no = index + 1;
            let line = line?;
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }

            let command: ScriptCommand = match serde_json::from_str(trimmed) {
                Ok(command) => command,
                Err(e) => {
                    error!(line = line_no, error = %e, "Error reading command");
                    summary.unreadable += 1;
                    continue;
                }
            };

            let op = command.action.name();
            let output = match self.execute(command).await {
                Ok(result) => CommandOutput {
                    line: line_no,
                    op,
                    ok: true,
                    result: Some(result),
                    error: None,
                },
                Err(e) => {
                    summary.failed += 1;
                    CommandOutput {
                        line: line_no,
                        op,
                        ok: false,
                        result: None,
                        error: Some(ErrorJson::from(&e)),
                    }
                }
            };
            summary.executed += 1;

            serde_json::to_writer(&mut sink, &output)?;
            writeln!(sink)?;
        }

        sink.flush()?;
        info!(
            executed = summary.executed,
            failed = summary.failed,
            unreadable = summary.unreadable,
            "script finished"
        );
        Ok(summary)
    }

    /// Executes a single command and returns its JSON result.
    pub async fn execute(&mut self, command: ScriptCommand) -> Result<Value> {
        let token = command.token.unwrap_or_default();
        let credential = token.as_str();
        let market = self.marketplace;

        let (value, produced_id) = match command.action {
            Action::RegisterUser(new_user) => {
                let registration = market.register_user(new_user).await?;
                let id = match &registration {
                    Registration::Created { user } => Some(user.id.to_string()),
                    Registration::AlreadyExists { .. } => None,
                };
                (serde_json::to_value(registration)?, id)
            }
            Action::UserRole { email } => {
                let role = market.role_for(credential, &email).await?;
                (serde_json::json!({ "role": role }), None)
            }
            Action::ListUsers { search } => (
                serde_json::to_value(market.list_users(credential, search.as_deref()).await?)?,
                None,
            ),
            Action::SetRole { user, role } => {
                let user_id = self.resolve_id(&user)?;
                (
                    serde_json::to_value(market.set_role(credential, user_id, role).await?)?,
                    None,
                )
            }
            Action::ApplyRider(form) => {
                let application = market.apply_as_rider(credential, form).await?;
                let id = match &application {
                    Application::Submitted { application } => Some(application.id.to_string()),
                    Application::AlreadyApplied { .. } => None,
                };
                (serde_json::to_value(application)?, id)
            }
            Action::UpdateRiderStatus { rider, status } => {
                let rider_id = self.resolve_id(&rider)?;
                (
                    serde_json::to_value(
                        market
                            .update_rider_status(credential, rider_id, status)
                            .await?,
                    )?,
                    None,
                )
            }
            Action::ListRiders { status } => (
                serde_json::to_value(market.list_riders(credential, status).await?)?,
                None,
            ),
            Action::AvailableRiders(query) => (
                serde_json::to_value(market.available_riders(credential, query).await?)?,
                None,
            ),
            Action::CreateParcel(new_parcel) => {
                let parcel = market.create_parcel(credential, new_parcel).await?;
                let id = parcel.id.to_string();
                (serde_json::to_value(parcel)?, Some(id))
            }
            Action::GetParcel { parcel } => {
                let parcel_id = self.resolve_id(&parcel)?;
                (
                    serde_json::to_value(market.get_parcel(credential, parcel_id).await?)?,
                    None,
                )
            }
            Action::ListParcels(query) => (
                serde_json::to_value(market.list_parcels(credential, query).await?)?,
                None,
            ),
            Action::AssignRider {
                parcel,
                rider,
                rider_name,
                rider_email,
            } => {
                let parcel_id = self.resolve_id(&parcel)?;
                let assignment = RiderAssignment {
                    rider_id: self.resolve_id(&rider)?,
                    rider_name,
                    rider_email,
                };
                (
                    serde_json::to_value(
                        market.assign_rider(credential, parcel_id, assignment).await?,
                    )?,
                    None,
                )
            }
            Action::DeleteParcel { parcel } => {
                let parcel_id = self.resolve_id(&parcel)?;
                let deleted = market.delete_parcel(credential, parcel_id).await?;
                (serde_json::json!({ "deleted": deleted }), None)
            }
            Action::CreateCheckout { parcel, variant } => {
                let parcel_id = self.resolve_id(&parcel)?;
                let link = market
                    .create_checkout_session(credential, parcel_id, variant)
                    .await?;
                let id = link.session_id.clone();
                (serde_json::to_value(link)?, Some(id))
            }
            Action::GatewayComplete {
                session,
                payment_intent,
                status,
            } => {
                let sandbox = self.sandbox.as_ref().ok_or_else(|| {
                    MarketplaceError::ValidationError(
                        "gateway_complete requires the sandbox gateway".to_string(),
                    )
                })?;
                let session_id = self.resolve(&session);
                let session = sandbox
                    .complete(&session_id, &payment_intent, status)
                    .await?;
                (serde_json::to_value(session)?, None)
            }
            Action::ConfirmPayment { session } => {
                let session_id = self.resolve(&session);
                (
                    serde_json::to_value(market.confirm_payment(credential, &session_id).await?)?,
                    None,
                )
            }
            Action::ListPayments { email } => (
                serde_json::to_value(market.list_payments(credential, email.as_deref()).await?)?,
                None,
            ),
            Action::ListAllPayments => (
                serde_json::to_value(market.list_all_payments(credential).await?)?,
                None,
            ),
        };

        if let (Some(label), Some(id)) = (command.label, produced_id) {
            self.labels.insert(label, id);
        }
        Ok(value)
    }

    /// Replaces an `@label` reference by the id it names.
    fn resolve(&self, reference: &str) -> String {
        reference
            .strip_prefix('@')
            .and_then(|label| self.labels.get(label))
            .cloned()
            .unwrap_or_else(|| reference.to_string())
    }

    fn resolve_id(&self, reference: &str) -> Result<Uuid> {
        if let Some(label) = reference.strip_prefix('@')
            && !self.labels.contains_key(label)
        {
            return Err(MarketplaceError::ValidationError(format!(
                "unknown label '{}'",
                label
            )));
        }
        let resolved = self.resolve(reference);
        Uuid::parse_str(&resolved)
            .map_err(|_| MarketplaceError::ValidationError(format!("invalid id '{}'", resolved)))
    }
}
