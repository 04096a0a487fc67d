//! Version assignment dialog as an explicit state machine.
//!
//! ```text
//!            assign_version(row)
//!   Idle ───────────────────────────▶ Assigning ◀──── set_version / set_description
//!    ▲                                  │    ▲                    │
//!    │ cancel                    submit │    │ edit               │
//!    │                                  ▼    │                    │
//!    ├──────── write ok ───────── Submitting │                    │
//!    │                                  │    │                    │
//!    │                    invalid input │    │                    │
//!    │                    or write fails▼    │                    │
//!    └──────── cancel ────────── AssigningWithError ──────────────┘
//! ```
//!
//! The dialog is open in every state except [`WorkflowState::Idle`]. The
//! selected schema lives inside the [`AssignmentForm`], so an open dialog
//! without a schema cannot be represented. The registry write is only ever
//! issued from [`VersionAssignmentWorkflow::submit`] with a validated form.

use crate::assignment::{AssignVersionRequest, AssignVersionResponse, SchemaRow};
use crate::version::{self, VersionValidation};
use crate::view_model::{AssignmentViewModel, FetchOutcome};

pub const MSG_DESCRIPTION_REQUIRED: &str = "Description is required";

/// Input of the assignment dialog for one schema variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssignmentForm {
    schema_id: String,
    current_version: Option<String>,
    version: String,
    description: String,
    validation: VersionValidation,
    /// Set once the version was edited or a submit was rejected. The
    /// validator message is hidden until then.
    touched: bool,
}

impl AssignmentForm {
    fn for_row(row: &SchemaRow) -> Self {
        let version = row.version.clone().unwrap_or_default();
        let validation = version::validate(&version);
        Self {
            schema_id: row.id.clone(),
            current_version: row.version.clone(),
            version,
            description: String::new(),
            validation,
            touched: false,
        }
    }

    pub fn schema_id(&self) -> &str {
        &self.schema_id
    }

    /// Version of the row when the dialog was opened.
    pub fn current_version(&self) -> Option<&str> {
        self.current_version.as_deref()
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// Validator verdict for the current version text.
    pub fn validation(&self) -> &VersionValidation {
        &self.validation
    }

    fn set_version(&mut self, version: String) {
        self.validation = version::validate(&version);
        self.version = version;
        self.touched = true;
    }

    fn is_complete(&self) -> bool {
        !self.version.is_empty() && !self.description.trim().is_empty() && self.validation.is_valid
    }

    fn to_request(&self) -> AssignVersionRequest {
        AssignVersionRequest {
            schema_id: self.schema_id.clone(),
            version: self.version.clone(),
            description: self.description.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum WorkflowState {
    /// No dialog, no selection.
    #[default]
    Idle,
    /// Dialog open, user editing.
    Assigning(AssignmentForm),
    /// Write in flight.
    Submitting(AssignmentForm),
    /// Dialog open with a submit error: rejected input or failed write. The
    /// form is preserved so the user can retry.
    AssigningWithError { form: AssignmentForm, error: String },
}

/// Result of [`VersionAssignmentWorkflow::submit`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// The registry accepted the version; the dialog closed and the listing
    /// was refetched.
    Assigned {
        response: AssignVersionResponse,
        refetch: FetchOutcome,
    },
    /// Local validation failed; nothing was sent.
    Rejected(String),
    /// The registry write failed; the dialog stays open.
    Failed(String),
    /// No dialog open.
    NotOpen,
}

/// Drives the assign/update version dialog.
#[derive(Debug, Default)]
pub struct VersionAssignmentWorkflow {
    state: WorkflowState,
}

impl VersionAssignmentWorkflow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &WorkflowState {
        &self.state
    }

    pub fn is_open(&self) -> bool {
        !matches!(self.state, WorkflowState::Idle)
    }

    pub fn is_submitting(&self) -> bool {
        matches!(self.state, WorkflowState::Submitting(_))
    }

    pub fn form(&self) -> Option<&AssignmentForm> {
        match &self.state {
            WorkflowState::Idle => None,
            WorkflowState::Assigning(form)
            | WorkflowState::Submitting(form)
            | WorkflowState::AssigningWithError { form, .. } => Some(form),
        }
    }

    fn form_mut(&mut self) -> Option<&mut AssignmentForm> {
        match &mut self.state {
            WorkflowState::Assigning(form) | WorkflowState::AssigningWithError { form, .. } => {
                Some(form)
            }
            WorkflowState::Idle | WorkflowState::Submitting(_) => None,
        }
    }

    /// Submit error currently shown, if any.
    pub fn error(&self) -> Option<&str> {
        match &self.state {
            WorkflowState::AssigningWithError { error, .. } => Some(error),
            _ => None,
        }
    }

    /// Message to render under the inputs: the submit error if there is
    /// one, otherwise the validator message once the version was edited
    /// and is invalid.
    pub fn inline_message(&self) -> Option<&str> {
        if let Some(error) = self.error() {
            return Some(error);
        }
        self.form()
            .filter(|form| form.touched)
            .map(AssignmentForm::validation)
            .filter(|v| !v.is_valid)
            .map(|v| v.message.as_str())
    }

    /// Open the dialog for `row`, seeding the version with the row's
    /// current version. Replaces any form in progress.
    pub fn assign_version(&mut self, row: &SchemaRow) {
        tracing::debug!(schema_id = %row.id, "opening version assignment");
        self.state = WorkflowState::Assigning(AssignmentForm::for_row(row));
    }

    /// Update the version text and re-run the validator. Ignored while idle
    /// or submitting.
    pub fn set_version(&mut self, version: impl Into<String>) {
        let version = version.into();
        if let Some(form) = self.form_mut() {
            form.set_version(version);
            self.clear_error();
        }
    }

    /// Update the change description. Ignored while idle or submitting.
    pub fn set_description(&mut self, description: impl Into<String>) {
        let description = description.into();
        if let Some(form) = self.form_mut() {
            form.description = description;
            self.clear_error();
        }
    }

    fn clear_error(&mut self) {
        self.state = match std::mem::take(&mut self.state) {
            WorkflowState::AssigningWithError { form, .. } => WorkflowState::Assigning(form),
            other => other,
        };
    }

    /// Whether the submit button is enabled. Mirrors the checks of
    /// [`submit`](Self::submit).
    pub fn can_submit(&self) -> bool {
        match &self.state {
            WorkflowState::Assigning(form) | WorkflowState::AssigningWithError { form, .. } => {
                form.is_complete()
            }
            WorkflowState::Idle | WorkflowState::Submitting(_) => false,
        }
    }

    /// Validate and send the form.
    ///
    /// On success the dialog closes and `view_model` is refetched. Invalid
    /// input never reaches the network. A failed write keeps the dialog open
    /// with the form intact.
    pub async fn submit(&mut self, view_model: &AssignmentViewModel) -> SubmitOutcome {
        let form = match std::mem::take(&mut self.state) {
            WorkflowState::Assigning(form) | WorkflowState::AssigningWithError { form, .. } => form,
            other => {
                self.state = other;
                return SubmitOutcome::NotOpen;
            }
        };

        let validation = version::validate(&form.version);
        if !validation.is_valid {
            let error = validation.message.clone();
            self.state = WorkflowState::AssigningWithError {
                form: AssignmentForm {
                    validation,
                    touched: true,
                    ..form
                },
                error: error.clone(),
            };
            return SubmitOutcome::Rejected(error);
        }
        if form.description.trim().is_empty() {
            let error = MSG_DESCRIPTION_REQUIRED.to_string();
            self.state = WorkflowState::AssigningWithError {
                form,
                error: error.clone(),
            };
            return SubmitOutcome::Rejected(error);
        }

        let request = form.to_request();
        self.state = WorkflowState::Submitting(form);
        let mut in_flight = InFlight(&mut self.state);

        tracing::info!(
            schema_key = %view_model.schema_key(),
            schema_id = %request.schema_id,
            version = %request.version,
            "submitting schema version"
        );

        let result = view_model
            .client()
            .assign_version(view_model.schema_key(), &request)
            .await;

        let Some(form) = in_flight.take_form() else {
            return SubmitOutcome::NotOpen;
        };
        drop(in_flight);

        match result {
            Ok(response) => {
                let refetch = view_model.refresh().await;
                SubmitOutcome::Assigned { response, refetch }
            }
            Err(err) => {
                tracing::warn!(
                    schema_id = %request.schema_id,
                    error = %err,
                    "schema version assignment failed"
                );
                let error = err.to_string();
                self.state = WorkflowState::AssigningWithError {
                    form,
                    error: error.clone(),
                };
                SubmitOutcome::Failed(error)
            }
        }
    }

    /// Close the dialog and discard the form, whatever the state. Never
    /// touches the network.
    pub fn cancel(&mut self) {
        self.state = WorkflowState::Idle;
    }

    pub fn dialog_title(&self) -> Option<&'static str> {
        self.form().map(|form| {
            if form.current_version.is_some() {
                "Update Schema Version"
            } else {
                "Assign Schema Version"
            }
        })
    }

    pub fn dialog_description(&self) -> Option<String> {
        self.form().map(|form| {
            if form.current_version.is_some() {
                format!("Update the version for schema {}", form.schema_id)
            } else {
                format!("Assign a semantic version to schema {}", form.schema_id)
            }
        })
    }
}

/// A write in flight. If the `submit` future is dropped before the write
/// resolves, the form goes back to `Assigning` so the dialog stays usable.
struct InFlight<'a>(&'a mut WorkflowState);

impl InFlight<'_> {
    fn take_form(&mut self) -> Option<AssignmentForm> {
        match std::mem::take(self.0) {
            WorkflowState::Submitting(form) => Some(form),
            other => {
                *self.0 = other;
                None
            }
        }
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if let Some(form) = self.take_form() {
            *self.0 = WorkflowState::Assigning(form);
        }
    }
}
