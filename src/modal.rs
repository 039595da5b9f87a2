use async_trait::async_trait;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ModalState {
    #[default]
    Closed,
    Open,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModalIntent {
    Open,
    Confirm,
    Cancel,
    Dismiss,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoredReason {
    NotOpen,
    AlreadyOpen,
    ConfirmDisabled,
}

#[derive(Debug)]
pub enum ModalOutcome {
    Opened,
    Ignored(IgnoredReason),
    /// The modal closed; `result` is whatever the intent's callback returned.
    Closed {
        intent: ModalIntent,
        result: anyhow::Result<()>,
    },
}

impl ModalOutcome {
    pub fn is_closed(&self) -> bool {
        matches!(self, ModalOutcome::Closed { .. })
    }

    /// Surfaces a callback failure to the caller's error handler.
    pub fn into_result(self) -> anyhow::Result<()> {
        match self {
            ModalOutcome::Closed { intent, result } => {
                debug!(?intent, failed = result.is_err(), "modal closed");
                result
            }
            ModalOutcome::Ignored(reason) => {
                debug!(?reason, "modal intent ignored");
                Ok(())
            }
            ModalOutcome::Opened => Ok(()),
        }
    }
}

/// Callbacks bound to a modal's actions. Every callback is optional.
#[async_trait]
pub trait ModalActions: Send {
    async fn on_confirm(&mut self) -> anyhow::Result<()> {
        Ok(())
    }

    async fn on_cancel(&mut self) -> anyhow::Result<()> {
        Ok(())
    }

    async fn on_dismiss(&mut self) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Asks the surrounding list view to re-fetch its rows.
pub trait Refresh: Send + Sync {
    fn refresh(&mut self);
}

impl<F: FnMut() + Send + Sync> Refresh for F {
    fn refresh(&mut self) {
        self()
    }
}

/// A modal with nothing bound to its buttons.
pub struct NoActions;

impl ModalActions for NoActions {}

#[derive(Debug, Clone)]
pub struct ModalConfig {
    pub heading: String,
    pub message: Option<String>,
    pub confirm_label: String,
    pub cancel_label: String,
    pub confirm_disabled: bool,
}

impl ModalConfig {
    pub fn new(heading: &str, confirm_label: &str) -> Self {
        Self {
            heading: heading.to_string(),
            message: None,
            confirm_label: confirm_label.to_string(),
            cancel_label: "Cancel".to_string(),
            confirm_disabled: false,
        }
    }

    pub fn with_message(mut self, message: &str) -> Self {
        self.message = Some(message.to_string());
        self
    }

    pub fn with_cancel_label(mut self, label: &str) -> Self {
        self.cancel_label = label.to_string();
        self
    }
}

/// Next state for `intent`, or why the intent does nothing.
pub fn transition(
    state: ModalState,
    intent: ModalIntent,
    confirm_disabled: bool,
) -> Result<ModalState, IgnoredReason> {
    match (state, intent) {
        (ModalState::Closed, ModalIntent::Open) => Ok(ModalState::Open),
        (ModalState::Open, ModalIntent::Open) => Err(IgnoredReason::AlreadyOpen),
        (ModalState::Open, ModalIntent::Confirm) if confirm_disabled => {
            Err(IgnoredReason::ConfirmDisabled)
        }
        (ModalState::Open, ModalIntent::Confirm | ModalIntent::Cancel | ModalIntent::Dismiss) => {
            Ok(ModalState::Closed)
        }
        (ModalState::Closed, _) => Err(IgnoredReason::NotOpen),
    }
}

#[derive(Debug, Clone)]
pub struct ActionModal {
    config: ModalConfig,
    state: ModalState,
}

impl ActionModal {
    pub fn new(config: ModalConfig) -> Self {
        Self {
            config,
            state: ModalState::Closed,
        }
    }

    pub fn state(&self) -> ModalState {
        self.state
    }

    pub fn config(&self) -> &ModalConfig {
        &self.config
    }

    pub fn set_confirm_disabled(&mut self, disabled: bool) {
        self.config.confirm_disabled = disabled;
    }

    pub fn open(&mut self) -> ModalOutcome {
        match transition(self.state, ModalIntent::Open, self.config.confirm_disabled) {
            Ok(next) => {
                debug!(heading = %self.config.heading, "modal opened");
                self.state = next;
                ModalOutcome::Opened
            }
            Err(reason) => ModalOutcome::Ignored(reason),
        }
    }

    pub async fn confirm<A: ModalActions + ?Sized>(&mut self, actions: &mut A) -> ModalOutcome {
        self.handle(ModalIntent::Confirm, actions).await
    }

    pub async fn cancel<A: ModalActions + ?Sized>(&mut self, actions: &mut A) -> ModalOutcome {
        self.handle(ModalIntent::Cancel, actions).await
    }

    pub async fn dismiss<A: ModalActions + ?Sized>(&mut self, actions: &mut A) -> ModalOutcome {
        self.handle(ModalIntent::Dismiss, actions).await
    }

    /// Runs the intent's callback, then closes regardless of what it returned.
    pub async fn handle<A: ModalActions + ?Sized>(
        &mut self,
        intent: ModalIntent,
        actions: &mut A,
    ) -> ModalOutcome {
        if intent == ModalIntent::Open {
            return self.open();
        }

        let next = match transition(self.state, intent, self.config.confirm_disabled) {
            Ok(next) => next,
            Err(reason) => return ModalOutcome::Ignored(reason),
        };

        let result = match intent {
            ModalIntent::Confirm => actions.on_confirm().await,
            ModalIntent::Cancel => actions.on_cancel().await,
            ModalIntent::Dismiss | ModalIntent::Open => actions.on_dismiss().await,
        };
        self.state = next;

        if let Err(err) = &result {
            warn!(heading = %self.config.heading, ?intent, error = %err, "modal callback failed");
        }
        ModalOutcome::Closed { intent, result }
    }
}

/// Read-only overlay: it can only be opened and dismissed.
#[derive(Debug, Clone)]
pub struct ViewModal {
    pub heading: String,
    pub width: u32,
    state: ModalState,
}

impl ViewModal {
    pub const DEFAULT_WIDTH: u32 = 475;

    pub fn new(heading: &str) -> Self {
        Self {
            heading: heading.to_string(),
            width: Self::DEFAULT_WIDTH,
            state: ModalState::Closed,
        }
    }

    pub fn with_width(mut self, width: u32) -> Self {
        self.width = width;
        self
    }

    pub fn open(&mut self) -> ModalOutcome {
        match transition(self.state, ModalIntent::Open, false) {
            Ok(next) => {
                self.state = next;
                ModalOutcome::Opened
            }
            Err(reason) => ModalOutcome::Ignored(reason),
        }
    }

    pub async fn dismiss<A: ModalActions + ?Sized>(&mut self, actions: &mut A) -> ModalOutcome {
        match transition(self.state, ModalIntent::Dismiss, false) {
            Ok(next) => {
                let result = actions.on_dismiss().await;
                self.state = next;
                ModalOutcome::Closed {
                    intent: ModalIntent::Dismiss,
                    result,
                }
            }
            Err(reason) => ModalOutcome::Ignored(reason),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    #[derive(Default)]
    struct Recorder {
        confirmed: usize,
        cancelled: usize,
        dismissed: usize,
        fail_confirm: bool,
    }

    #[async_trait]
    impl ModalActions for Recorder {
        async fn on_confirm(&mut self) -> anyhow::Result<()> {
            self.confirmed += 1;
            if self.fail_confirm {
                return Err(anyhow!("assign request failed"));
            }
            Ok(())
        }

        async fn on_cancel(&mut self) -> anyhow::Result<()> {
            self.cancelled += 1;
            Ok(())
        }

        async fn on_dismiss(&mut self) -> anyhow::Result<()> {
            self.dismissed += 1;
            Ok(())
        }
    }

    fn archive_modal() -> ActionModal {
        ActionModal::new(
            ModalConfig::new("Archive Coach", "Archive")
                .with_message("Are you sure you want to archive this coach?"),
        )
    }

    #[test]
    fn starts_closed_and_opens_once() {
        let mut modal = archive_modal();
        assert_eq!(modal.state(), ModalState::Closed);
        assert!(matches!(modal.open(), ModalOutcome::Opened));
        assert!(matches!(
            modal.open(),
            ModalOutcome::Ignored(IgnoredReason::AlreadyOpen)
        ));
        assert_eq!(modal.state(), ModalState::Open);
    }

    #[tokio::test]
    async fn each_intent_runs_its_callback_then_closes() {
        let mut recorder = Recorder::default();
        let mut modal = archive_modal();

        modal.open();
        assert!(modal.confirm(&mut recorder).await.is_closed());
        modal.open();
        assert!(modal.cancel(&mut recorder).await.is_closed());
        modal.open();
        assert!(modal.dismiss(&mut recorder).await.is_closed());

        assert_eq!(
            (recorder.confirmed, recorder.cancelled, recorder.dismissed),
            (1, 1, 1)
        );
        assert_eq!(modal.state(), ModalState::Closed);
    }

    #[tokio::test]
    async fn disabled_confirm_is_inert() {
        let mut recorder = Recorder::default();
        let mut modal = archive_modal();
        modal.set_confirm_disabled(true);
        modal.open();

        let outcome = modal.confirm(&mut recorder).await;

        assert!(matches!(
            outcome,
            ModalOutcome::Ignored(IgnoredReason::ConfirmDisabled)
        ));
        assert_eq!(recorder.confirmed, 0);
        assert_eq!(modal.state(), ModalState::Open);
    }

    #[tokio::test]
    async fn disabled_confirm_still_allows_cancel() {
        let mut recorder = Recorder::default();
        let mut modal = archive_modal();
        modal.set_confirm_disabled(true);
        modal.open();

        assert!(modal.cancel(&mut recorder).await.is_closed());
        assert_eq!(recorder.cancelled, 1);
    }

    #[tokio::test]
    async fn failing_confirm_still_closes() {
        let mut recorder = Recorder {
            fail_confirm: true,
            ..Recorder::default()
        };
        let mut modal = archive_modal();
        modal.open();

        let outcome = modal.confirm(&mut recorder).await;

        assert_eq!(modal.state(), ModalState::Closed);
        let err = outcome.into_result().unwrap_err();
        assert_eq!(err.to_string(), "assign request failed");
    }

    #[tokio::test]
    async fn intents_on_closed_modal_are_ignored() {
        let mut recorder = Recorder::default();
        let mut modal = archive_modal();

        assert!(matches!(
            modal.confirm(&mut recorder).await,
            ModalOutcome::Ignored(IgnoredReason::NotOpen)
        ));
        assert!(matches!(
            modal.dismiss(&mut NoActions).await,
            ModalOutcome::Ignored(IgnoredReason::NotOpen)
        ));
        assert_eq!(recorder.confirmed, 0);
    }

    #[test]
    fn transition_table() {
        assert_eq!(
            transition(ModalState::Closed, ModalIntent::Open, false),
            Ok(ModalState::Open)
        );
        assert_eq!(
            transition(ModalState::Open, ModalIntent::Cancel, true),
            Ok(ModalState::Closed)
        );
        assert_eq!(
            transition(ModalState::Open, ModalIntent::Confirm, true),
            Err(IgnoredReason::ConfirmDisabled)
        );
        assert_eq!(
            transition(ModalState::Closed, ModalIntent::Dismiss, false),
            Err(IgnoredReason::NotOpen)
        );
    }

    #[tokio::test]
    async fn view_modal_only_dismisses() {
        let mut recorder = Recorder::default();
        let mut view = ViewModal::new("Student Details");
        assert_eq!(view.width, ViewModal::DEFAULT_WIDTH);

        view.open();
        assert!(view.dismiss(&mut recorder).await.is_closed());
        assert_eq!(recorder.dismissed, 1);
        assert!(matches!(
            view.dismiss(&mut recorder).await,
            ModalOutcome::Ignored(IgnoredReason::NotOpen)
        ));
    }
}
