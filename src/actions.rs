use async_trait::async_trait;
use tracing::info;

use crate::api::{ApiResult, SharedGateway};
use crate::modal::{ActionModal, ModalActions, ModalConfig, ModalOutcome, Refresh};
use crate::models::{ArchiveCoachRequest, CoachId, StateChangeRequest, StudentId, StudentState};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmKind {
    ArchiveCoach(CoachId),
    StudentState {
        student_id: StudentId,
        state: StudentState,
    },
}

impl ConfirmKind {
    pub fn modal_config(&self) -> ModalConfig {
        match self {
            ConfirmKind::ArchiveCoach(_) => ModalConfig::new("Archive Coach", "Archive")
                .with_message("Are you sure you want to archive this coach?"),
            ConfirmKind::StudentState { state, .. } => match state {
                StudentState::Inactive => ModalConfig::new("Archive Student", "Archive")
                    .with_message("Are you sure you want to archive this student?"),
                StudentState::Active => ModalConfig::new("Accept Student", "Accept")
                    .with_message("Are you sure you want to accept this student?"),
                StudentState::Rejected => ModalConfig::new("Reject Student", "Reject")
                    .with_message("Are you sure you want to reject this student?"),
                StudentState::Applied => ModalConfig::new("Reopen Application", "Reopen")
                    .with_message("Move this student back to applied?")
                    .with_cancel_label("Keep"),
            },
        }
    }
}

/// Sends the one request a confirmation modal stands for.
pub struct ConfirmAction {
    kind: ConfirmKind,
    api: SharedGateway,
    on_done: Option<Box<dyn Refresh>>,
}

impl ConfirmAction {
    pub fn new(kind: ConfirmKind, api: SharedGateway) -> Self {
        Self {
            kind,
            api,
            on_done: None,
        }
    }

    pub async fn execute(&self) -> ApiResult<()> {
        match self.kind {
            ConfirmKind::ArchiveCoach(coach_id) => {
                self.api
                    .archive_coach(ArchiveCoachRequest { coach_id })
                    .await?;
                info!(%coach_id, "coach archived");
            }
            ConfirmKind::StudentState { student_id, state } => {
                self.api
                    .set_student_state(StateChangeRequest { student_id, state })
                    .await?;
                info!(%student_id, %state, "student state changed");
            }
        }
        Ok(())
    }
}

#[async_trait]
impl ModalActions for ConfirmAction {
    async fn on_confirm(&mut self) -> anyhow::Result<()> {
        self.execute().await?;
        if let Some(refresh) = self.on_done.as_mut() {
            refresh.refresh();
        }
        Ok(())
    }
}

pub struct ConfirmDialog {
    modal: ActionModal,
    action: ConfirmAction,
}

impl ConfirmDialog {
    pub fn new(kind: ConfirmKind, api: SharedGateway) -> Self {
        Self {
            modal: ActionModal::new(kind.modal_config()),
            action: ConfirmAction::new(kind, api),
        }
    }

    pub fn archive_coach(api: SharedGateway, coach_id: CoachId) -> Self {
        Self::new(ConfirmKind::ArchiveCoach(coach_id), api)
    }

    pub fn archive_student(api: SharedGateway, student_id: StudentId) -> Self {
        Self::set_student_state(api, student_id, StudentState::Inactive)
    }

    pub fn accept_student(api: SharedGateway, student_id: StudentId) -> Self {
        Self::set_student_state(api, student_id, StudentState::Active)
    }

    pub fn set_student_state(
        api: SharedGateway,
        student_id: StudentId,
        state: StudentState,
    ) -> Self {
        Self::new(ConfirmKind::StudentState { student_id, state }, api)
    }

    pub fn on_done(mut self, refresh: impl Refresh + 'static) -> Self {
        self.action.on_done = Some(Box::new(refresh));
        self
    }

    pub fn modal(&self) -> &ActionModal {
        &self.modal
    }

    pub fn open(&mut self) -> ModalOutcome {
        self.modal.open()
    }

    pub async fn confirm(&mut self) -> ModalOutcome {
        self.modal.confirm(&mut self.action).await
    }

    pub async fn cancel(&mut self) -> ModalOutcome {
        self.modal.cancel(&mut self.action).await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use uuid::Uuid;

    use super::*;
    use crate::modal::ModalState;
    use crate::testing::{count, refresh_counter, Call, RecordingGateway};

    #[tokio::test]
    async fn archive_student_sets_inactive() {
        let gateway = Arc::new(RecordingGateway::new());
        let student_id = Uuid::new_v4();
        let (refreshes, refresh) = refresh_counter();
        let mut dialog =
            ConfirmDialog::archive_student(gateway.clone(), student_id).on_done(refresh);

        assert_eq!(dialog.modal().config().heading, "Archive Student");
        dialog.open();
        assert!(dialog.confirm().await.into_result().is_ok());

        assert_eq!(
            gateway.calls(),
            vec![Call::SetState(StateChangeRequest {
                student_id,
                state: StudentState::Inactive,
            })]
        );
        assert_eq!(count(&refreshes), 1);
    }

    #[tokio::test]
    async fn archive_coach_posts_coach_id() {
        let gateway = Arc::new(RecordingGateway::new());
        let coach_id = Uuid::new_v4();
        let mut dialog = ConfirmDialog::archive_coach(gateway.clone(), coach_id);

        dialog.open();
        assert!(dialog.confirm().await.into_result().is_ok());

        assert_eq!(
            gateway.calls(),
            vec![Call::ArchiveCoach(ArchiveCoachRequest { coach_id })]
        );
    }

    #[tokio::test]
    async fn cancelled_confirmation_sends_nothing() {
        let gateway = Arc::new(RecordingGateway::new());
        let mut dialog = ConfirmDialog::accept_student(gateway.clone(), Uuid::new_v4());

        dialog.open();
        assert!(dialog.cancel().await.is_closed());

        assert!(gateway.calls().is_empty());
        assert_eq!(dialog.modal().state(), ModalState::Closed);
    }

    #[tokio::test]
    async fn failed_state_change_closes_without_refresh() {
        let gateway = Arc::new(RecordingGateway::new().failing_mutations());
        let (refreshes, refresh) = refresh_counter();
        let mut dialog = ConfirmDialog::set_student_state(
            gateway.clone(),
            Uuid::new_v4(),
            StudentState::Rejected,
        )
        .on_done(refresh);

        dialog.open();
        assert!(dialog.confirm().await.into_result().is_err());

        assert_eq!(dialog.modal().state(), ModalState::Closed);
        assert_eq!(count(&refreshes), 0);
    }
}
