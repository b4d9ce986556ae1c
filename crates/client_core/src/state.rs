//! Session state container and reducer for the prediction form.
//!
//! The UI (or CLI) never mutates form/catalog/status directly; it applies
//! `SessionAction`s, which keeps the submission state machine testable
//! without a rendering surface or a live backend.

use shared::{
    domain::{FormField, FormInput, SoilTypeCatalog},
    protocol::PredictionResult,
};
use tracing::warn;

/// Monotonically increasing id allocated per submission attempt. Completion
/// actions carry it so responses that lost the race are discarded instead
/// of clobbering a newer submission's state.
pub type SubmissionId = u64;

/// The single source of truth for what the view currently displays.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum UiStatus {
    #[default]
    Idle,
    Loading,
    Success(PredictionResult),
    Error(String),
}

impl UiStatus {
    pub fn is_loading(&self) -> bool {
        matches!(self, UiStatus::Loading)
    }

    pub fn result(&self) -> Option<&PredictionResult> {
        match self {
            UiStatus::Success(result) => Some(result),
            _ => None,
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            UiStatus::Error(message) => Some(message),
            _ => None,
        }
    }
}

/// Closed set of state transitions.
///
/// `SubmitFailed` with `submission: None` records a validation rejection:
/// the submission never started, so there is no Loading flag to clear and
/// no id to race against.
#[derive(Debug, Clone)]
pub enum SessionAction {
    SetField {
        field: FormField,
        value: String,
    },
    CatalogLoaded {
        soil_types: Vec<String>,
    },
    CatalogFailed {
        message: String,
    },
    SubmitStarted {
        submission: SubmissionId,
    },
    SubmitSucceeded {
        submission: SubmissionId,
        result: PredictionResult,
    },
    SubmitFailed {
        submission: Option<SubmissionId>,
        message: String,
    },
}

#[derive(Debug, Clone, Default)]
pub struct SessionState {
    form: FormInput,
    catalog: SoilTypeCatalog,
    status: UiStatus,
    next_submission: SubmissionId,
    active_submission: Option<SubmissionId>,
}

impl SessionState {
    pub fn form(&self) -> &FormInput {
        &self.form
    }

    pub fn catalog(&self) -> &SoilTypeCatalog {
        &self.catalog
    }

    pub fn status(&self) -> &UiStatus {
        &self.status
    }

    pub fn active_submission(&self) -> Option<SubmissionId> {
        self.active_submission
    }

    /// Submission is available only once the catalog has loaded and no
    /// submission is in flight.
    pub fn can_submit(&self) -> bool {
        !self.catalog.is_empty() && !self.status.is_loading()
    }

    pub fn allocate_submission(&mut self) -> SubmissionId {
        self.next_submission += 1;
        self.next_submission
    }

    pub fn apply(&mut self, action: SessionAction) {
        match action {
            SessionAction::SetField { field, value } => {
                self.form.set(field, value);
            }
            SessionAction::CatalogLoaded { soil_types } => {
                self.catalog = SoilTypeCatalog::new(soil_types);
                if self.form.soil_type.is_empty() {
                    if let Some(default) = self.catalog.default_selection() {
                        self.form.soil_type = default.to_string();
                    }
                }
            }
            SessionAction::CatalogFailed { message } => {
                self.status = UiStatus::Error(message);
            }
            SessionAction::SubmitStarted { submission } => {
                if self.status.is_loading() {
                    warn!(submission, "submit started while another submission is loading; ignoring");
                    return;
                }
                self.active_submission = Some(submission);
                self.status = UiStatus::Loading;
            }
            SessionAction::SubmitSucceeded { submission, result } => {
                if self.active_submission != Some(submission) {
                    warn!(submission, "discarding stale submission success");
                    return;
                }
                self.active_submission = None;
                self.status = UiStatus::Success(result);
            }
            SessionAction::SubmitFailed {
                submission: Some(submission),
                message,
            } => {
                if self.active_submission != Some(submission) {
                    warn!(submission, "discarding stale submission failure");
                    return;
                }
                self.active_submission = None;
                self.status = UiStatus::Error(message);
            }
            SessionAction::SubmitFailed {
                submission: None,
                message,
            } => {
                // Validation rejection. Never entered Loading, so a live
                // submission (if any) keeps its slot.
                if self.status.is_loading() {
                    warn!("validation rejection while a submission is loading; ignoring");
                    return;
                }
                self.status = UiStatus::Error(message);
            }
        }
    }
}
