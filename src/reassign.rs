//! Moving a student between coaches.
//!
//! The operator stages a [`CoachSelection`] against the active roster; nothing
//! reaches the backend until the surrounding modal is confirmed. Confirming
//! commits at most one assign or unassign call and then asks the list view to
//! refresh.

use anyhow::Context;
use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::api::{ApiResult, SharedGateway};
use crate::modal::{ActionModal, ModalActions, ModalConfig, ModalOutcome, Refresh};
use crate::models::{AssignmentRequest, Coach, CoachId, StudentId};

/// Label of the sentinel option that removes the student's coach.
pub const UNASSIGNED_LABEL: &str = "Unassigned";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CoachSelection {
    /// The operator has not picked anything since the last commit or cancel.
    #[default]
    Untouched,
    Unassign,
    AssignTo(CoachId),
}

/// Where the roster comes from: a response the caller already holds, or a fresh fetch.
pub enum RosterSource {
    Prefetched(ApiResult<Vec<Coach>>),
    Live,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ReassignError {
    #[error("coach {0} is not in the active roster")]
    UnknownCoach(CoachId),

    #[error("no coaches are available to choose from")]
    ControlDisabled,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectOption {
    pub value: CoachSelection,
    pub label: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReassignOutcome {
    NoChange,
    AlreadyUnassigned,
    Unassigned(AssignmentRequest),
    Assigned(AssignmentRequest),
}

pub struct ReassignWorkflow {
    student_id: StudentId,
    roster: Vec<Coach>,
    roster_warning: Option<String>,
    selection: CoachSelection,
    last_outcome: Option<ReassignOutcome>,
    api: SharedGateway,
    refresh: Box<dyn Refresh>,
}

impl ReassignWorkflow {
    pub async fn load(
        api: SharedGateway,
        student_id: StudentId,
        source: RosterSource,
        refresh: impl Refresh + 'static,
    ) -> Self {
        let fetched = match source {
            RosterSource::Prefetched(response) => response,
            RosterSource::Live => api.get_active_coaches().await,
        };
        let (roster, roster_warning) = match fetched {
            Ok(coaches) => (coaches, None),
            Err(err) => {
                warn!(%student_id, error = %err, "could not load coach roster");
                (Vec::new(), Some(format!("Coaches could not be loaded: {err}")))
            }
        };
        debug!(%student_id, coaches = roster.len(), "coach roster loaded");

        Self {
            student_id,
            roster,
            roster_warning,
            selection: CoachSelection::Untouched,
            last_outcome: None,
            api,
            refresh: Box::new(refresh),
        }
    }

    pub fn student_id(&self) -> StudentId {
        self.student_id
    }

    pub fn roster(&self) -> &[Coach] {
        &self.roster
    }

    /// The select control is disabled while there is nobody to choose.
    pub fn is_disabled(&self) -> bool {
        self.roster.is_empty()
    }

    pub fn warning(&self) -> Option<&str> {
        self.roster_warning.as_deref()
    }

    pub fn selection(&self) -> CoachSelection {
        self.selection
    }

    pub fn last_outcome(&self) -> Option<ReassignOutcome> {
        self.last_outcome
    }

    pub fn options(&self) -> Vec<SelectOption> {
        if self.is_disabled() {
            return Vec::new();
        }
        let mut options: Vec<SelectOption> = self
            .roster
            .iter()
            .map(|coach| SelectOption {
                value: CoachSelection::AssignTo(coach.id),
                label: coach.display_name().to_string(),
            })
            .collect();
        options.push(SelectOption {
            value: CoachSelection::Unassign,
            label: UNASSIGNED_LABEL.to_string(),
        });
        options
    }

    pub fn select_coach(&mut self, coach_id: CoachId) -> Result<(), ReassignError> {
        if self.is_disabled() {
            return Err(ReassignError::ControlDisabled);
        }
        if !self.roster.iter().any(|coach| coach.id == coach_id) {
            return Err(ReassignError::UnknownCoach(coach_id));
        }
        self.selection = CoachSelection::AssignTo(coach_id);
        Ok(())
    }

    pub fn select_unassigned(&mut self) -> Result<(), ReassignError> {
        if self.is_disabled() {
            return Err(ReassignError::ControlDisabled);
        }
        self.selection = CoachSelection::Unassign;
        Ok(())
    }

    pub fn clear_selection(&mut self) {
        self.selection = CoachSelection::Untouched;
    }

    /// Commits the staged selection, then refreshes. Errors skip the refresh.
    pub async fn commit(&mut self) -> ApiResult<ReassignOutcome> {
        let selection = std::mem::take(&mut self.selection);
        let student_id = self.student_id;

        let outcome = match selection {
            CoachSelection::Untouched => ReassignOutcome::NoChange,
            CoachSelection::Unassign => {
                let student = self.api.get_student(student_id).await?;
                match student.coach_id {
                    Some(coach_id) => {
                        let request = AssignmentRequest {
                            coach_id,
                            student_id,
                        };
                        self.api.unassign_student(request).await?;
                        info!(%student_id, %coach_id, "student unassigned");
                        ReassignOutcome::Unassigned(request)
                    }
                    None => ReassignOutcome::AlreadyUnassigned,
                }
            }
            CoachSelection::AssignTo(coach_id) => {
                let request = AssignmentRequest {
                    coach_id,
                    student_id,
                };
                self.api.assign_student(request).await?;
                info!(%student_id, %coach_id, "student assigned");
                ReassignOutcome::Assigned(request)
            }
        };

        self.last_outcome = Some(outcome);
        self.refresh.refresh();
        Ok(outcome)
    }
}

#[async_trait]
impl ModalActions for ReassignWorkflow {
    async fn on_confirm(&mut self) -> anyhow::Result<()> {
        self.commit()
            .await
            .with_context(|| format!("reassigning student {}", self.student_id))?;
        Ok(())
    }

    async fn on_cancel(&mut self) -> anyhow::Result<()> {
        self.clear_selection();
        Ok(())
    }

    async fn on_dismiss(&mut self) -> anyhow::Result<()> {
        self.clear_selection();
        Ok(())
    }
}

/// The "Change Coach" modal around a reassignment workflow.
pub struct ReassignDialog {
    modal: ActionModal,
    workflow: ReassignWorkflow,
}

impl ReassignDialog {
    pub fn new(workflow: ReassignWorkflow) -> Self {
        Self {
            modal: ActionModal::new(ModalConfig::new("Change Coach", "Save")),
            workflow,
        }
    }

    pub fn modal(&self) -> &ActionModal {
        &self.modal
    }

    pub fn workflow(&self) -> &ReassignWorkflow {
        &self.workflow
    }

    pub fn workflow_mut(&mut self) -> &mut ReassignWorkflow {
        &mut self.workflow
    }

    pub fn open(&mut self) -> ModalOutcome {
        self.modal.open()
    }

    pub async fn confirm(&mut self) -> ModalOutcome {
        self.modal.confirm(&mut self.workflow).await
    }

    pub async fn cancel(&mut self) -> ModalOutcome {
        self.modal.cancel(&mut self.workflow).await
    }

    pub async fn dismiss(&mut self) -> ModalOutcome {
        self.modal.dismiss(&mut self.workflow).await
    }
}
