//! In-memory state for one agent filling in the transaction form.
//!
//! [`FormStore`] is the single owner of the form data, the current step,
//! the submitting flag and the errors being shown. All mutation goes
//! through its methods, which keep the invariants in one place:
//! - the step is always within `[1, TOTAL_STEPS]`
//! - no step past the first is reachable until a role is chosen
//! - the client list never drops below one entry

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, info};

use crate::models::{
    AgentRole, Client, ClientField, ClientType, FormSection, FormStep, TOTAL_STEPS,
    TransactionFormData, clamp_step,
};
use crate::submission::{SubmissionOutcome, SubmissionStatus};
use crate::validation::{FieldErrors, validate_all, validate_step};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FormStoreError {
    #[error("no client with id '{0}'")]
    UnknownClient(String),

    #[error("at least one client is required")]
    LastClient,

    #[error("invalid client type '{0}'")]
    InvalidClientType(String),

    #[error("invalid update for {section}: {reason}")]
    InvalidPatch {
        section: &'static str,
        reason: String,
    },

    #[error("a submission is already in progress")]
    AlreadySubmitting,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FormStore {
    form_data: TransactionFormData,
    current_step: u8,
    is_submitting: bool,
    errors: FieldErrors,
}

impl FormStore {
    pub fn new() -> Self {
        Self {
            form_data: TransactionFormData::new(),
            current_step: 1,
            is_submitting: false,
            errors: FieldErrors::new(),
        }
    }

    pub fn form_data(&self) -> &TransactionFormData {
        &self.form_data
    }

    pub fn current_step(&self) -> u8 {
        self.current_step
    }

    pub fn is_submitting(&self) -> bool {
        self.is_submitting
    }

    pub fn errors(&self) -> &FieldErrors {
        &self.errors
    }

    /// Choose the agent's role, apply role defaults and move to step 2.
    ///
    /// Default client types follow the role: sellers for listing agents,
    /// buyers for buyer's agents. Dual agents pick per client, so switching
    /// to dual clears any preset types.
    pub fn set_role(
        &mut self,
        role: AgentRole,
    ) {
        let previous = self.form_data.agent_data.role.replace(role);
        if previous != Some(role) {
            let default_type = default_client_type(role);
            for client in &mut self.form_data.clients {
                client.client_type = default_type;
            }
            info!(role = %role, "agent role selected");
        }
        self.current_step = 2;
        self.prune_errors();
    }

    /// Forget the role. Only step 1 is reachable until a new one is chosen.
    fn clear_role(&mut self) {
        if self.form_data.agent_data.role.take().is_some() {
            info!("agent role cleared");
        }
        self.current_step = 1;
    }

    /// Jump to `n`, clamped to the form. Without a role only step 1 is
    /// reachable.
    pub fn set_step(
        &mut self,
        n: i64,
    ) -> u8 {
        self.current_step = if self.form_data.agent_data.role.is_none() {
            1
        } else {
            clamp_step(n)
        };
        self.current_step
    }

    /// Validate the current step and advance when it passes.
    ///
    /// On failure the errors are kept for display and the step does not
    /// change.
    pub fn next_step(&mut self) -> Result<u8, FieldErrors> {
        let errors = validate_step(self.current_step, &self.form_data);
        if !errors.is_empty() {
            self.errors = errors.clone();
            return Err(errors);
        }
        self.errors.clear();
        Ok(self.set_step(i64::from(self.current_step) + 1))
    }

    pub fn prev_step(&mut self) -> u8 {
        self.set_step(i64::from(self.current_step) - 1)
    }

    pub fn is_last_step(&self) -> bool {
        self.current_step == TOTAL_STEPS
    }

    pub fn step(&self) -> Option<FormStep> {
        FormStep::from_number(self.current_step)
    }

    /// Shallow-merge a JSON object into one section. Keys not in `patch`
    /// keep their values; other sections are untouched. On error the
    /// section is left as it was.
    ///
    /// A `role` key in an agent patch goes through [`FormStore::set_role`];
    /// a null role sends the form back to step 1.
    pub fn update_section(
        &mut self,
        section: FormSection,
        patch: Value,
    ) -> Result<(), FormStoreError> {
        let Value::Object(mut patch) = patch else {
            return Err(FormStoreError::InvalidPatch {
                section: section.key(),
                reason: "expected a JSON object".to_string(),
            });
        };

        let data = &mut self.form_data;
        match section {
            FormSection::Agent => {
                let role = match patch.remove("role") {
                    None => None,
                    Some(value) => Some(
                        serde_json::from_value::<Option<AgentRole>>(value).map_err(|e| {
                            FormStoreError::InvalidPatch {
                                section: section.key(),
                                reason: e.to_string(),
                            }
                        })?,
                    ),
                };
                merge_section(&mut data.agent_data, patch, section)?;
                match role {
                    Some(Some(role)) => self.set_role(role),
                    Some(None) => self.clear_role(),
                    None => {}
                }
            }
            FormSection::Property => merge_section(&mut data.property_data, patch, section)?,
            FormSection::Commission => merge_section(&mut data.commission_data, patch, section)?,
            FormSection::PropertyDetails => {
                merge_section(&mut data.property_details_data, patch, section)?
            }
            FormSection::Warranty => merge_section(&mut data.warranty_data, patch, section)?,
            FormSection::TitleCompany => {
                merge_section(&mut data.title_company_data, patch, section)?
            }
            FormSection::Documents => merge_section(&mut data.documents_data, patch, section)?,
            FormSection::AdditionalInfo => {
                merge_section(&mut data.additional_info_data, patch, section)?
            }
            FormSection::Signature => {
                let mirrors_name = patch.contains_key("signature");
                merge_section(&mut data.signature_data, patch, section)?;
                if mirrors_name {
                    data.signature_data.agent_name = data.signature_data.signature.clone();
                }
            }
        }

        debug!(section = section.key(), "section updated");
        self.prune_errors();
        Ok(())
    }

    /// Record the typed signature; the agent name mirrors it.
    pub fn set_signature(
        &mut self,
        signature: &str,
    ) {
        self.form_data.signature_data.signature = signature.to_string();
        self.form_data.signature_data.agent_name = signature.to_string();
        self.prune_errors();
    }

    /// Append an empty client and return its id.
    pub fn add_client(&mut self) -> String {
        let mut client = Client::new();
        client.client_type = self.form_data.agent_data.role.and_then(default_client_type);
        let id = client.id.clone();
        self.form_data.clients.push(client);
        id
    }

    /// Remove a client. Refuses to remove the last remaining one.
    pub fn remove_client(
        &mut self,
        id: &str,
    ) -> Result<(), FormStoreError> {
        let index = self
            .form_data
            .clients
            .iter()
            .position(|c| c.id == id)
            .ok_or_else(|| FormStoreError::UnknownClient(id.to_string()))?;
        if self.form_data.clients.len() == 1 {
            return Err(FormStoreError::LastClient);
        }
        self.form_data.clients.remove(index);
        self.prune_errors();
        Ok(())
    }

    pub fn update_client(
        &mut self,
        id: &str,
        field: ClientField,
        value: &str,
    ) -> Result<(), FormStoreError> {
        let client = self
            .form_data
            .clients
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or_else(|| FormStoreError::UnknownClient(id.to_string()))?;

        match field {
            ClientField::Name => client.name = value.to_string(),
            ClientField::Email => client.email = value.to_string(),
            ClientField::Phone => client.phone = value.to_string(),
            ClientField::Address => client.address = value.to_string(),
            ClientField::MaritalStatus => client.marital_status = value.to_string(),
            ClientField::Type if value.trim().is_empty() => client.client_type = None,
            ClientField::Type => {
                client.client_type = Some(
                    ClientType::parse(value)
                        .ok_or_else(|| FormStoreError::InvalidClientType(value.to_string()))?,
                );
            }
        }
        self.prune_errors();
        Ok(())
    }

    /// Snapshot the form for submission and mark the store busy.
    pub fn begin_submission(&mut self) -> Result<TransactionFormData, FormStoreError> {
        if self.is_submitting {
            return Err(FormStoreError::AlreadySubmitting);
        }
        self.is_submitting = true;
        Ok(self.form_data.clone())
    }

    /// Apply a submission result: a stored transaction resets the form,
    /// an invalid one surfaces its field errors.
    pub fn finish_submission(
        &mut self,
        outcome: &SubmissionOutcome,
    ) {
        self.is_submitting = false;
        match outcome.status {
            SubmissionStatus::Complete | SubmissionStatus::Saved => self.reset(),
            SubmissionStatus::Invalid => {
                self.errors = outcome.errors.clone().unwrap_or_default();
            }
            SubmissionStatus::Failed => {}
        }
    }

    /// Back to a blank form on step 1.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Drop shown errors that the current data no longer triggers.
    fn prune_errors(&mut self) {
        if self.errors.is_empty() {
            return;
        }
        let current = validate_all(&self.form_data);
        self.errors.retain_present_in(&current);
    }
}

impl Default for FormStore {
    fn default() -> Self {
        Self::new()
    }
}

fn default_client_type(role: AgentRole) -> Option<ClientType> {
    match role {
        AgentRole::ListingAgent => Some(ClientType::Seller),
        AgentRole::BuyersAgent => Some(ClientType::Buyer),
        AgentRole::DualAgent => None,
    }
}

fn merge_section<T>(
    target: &mut T,
    patch: Map<String, Value>,
    section: FormSection,
) -> Result<(), FormStoreError>
where
    T: Serialize + DeserializeOwned,
{
    let invalid = |reason: String| FormStoreError::InvalidPatch {
        section: section.key(),
        reason,
    };

    let mut current = serde_json::to_value(&*target).map_err(|e| invalid(e.to_string()))?;
    let Value::Object(fields) = &mut current else {
        return Err(invalid("section is not an object".to_string()));
    };
    fields.extend(patch);

    *target = serde_json::from_value(current).map_err(|e| invalid(e.to_string()))?;
    Ok(())
}
