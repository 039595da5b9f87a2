use std::sync::OnceLock;

use anyhow::Context;
use async_trait::async_trait;
use chrono::NaiveDate;
use tracing::{info, warn};
use uuid::Uuid;

use crate::api::{ApiGateway, ApiResult, SharedGateway};
use crate::modal::{ActionModal, ModalActions, ModalConfig, ModalOutcome, Refresh};
use crate::models::{
    career_cluster_label, Credentials, NewCareer, NewCoach, NewStudent, SessionToken, StudentId,
};
use crate::validation::{password_rules, Field, Rule, Validator, Violations};

/// A form that creates one backend entity.
#[async_trait]
pub trait EntityForm: Send {
    fn violations(&self) -> Violations;

    /// Back to the initial empty values.
    fn reset(&mut self);

    async fn create(&self, api: &dyn ApiGateway) -> ApiResult<()>;

    fn is_valid(&self) -> bool {
        self.violations().is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddCoachForm {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub password: String,
    pub confirm_password: String,
}

fn coach_first_name(form: &AddCoachForm) -> &str {
    &form.first_name
}

fn coach_last_name(form: &AddCoachForm) -> &str {
    &form.last_name
}

fn coach_email(form: &AddCoachForm) -> &str {
    &form.email
}

fn coach_phone(form: &AddCoachForm) -> &str {
    &form.phone
}

fn coach_password(form: &AddCoachForm) -> &str {
    &form.password
}

fn coach_confirm_password(form: &AddCoachForm) -> &str {
    &form.confirm_password
}

fn coach_validator() -> &'static Validator<AddCoachForm> {
    static VALIDATOR: OnceLock<Validator<AddCoachForm>> = OnceLock::new();
    VALIDATOR.get_or_init(|| {
        let password = password_rules()
            .into_iter()
            .fold(Field::new("password", "Password", coach_password), Field::rule);
        Validator::new()
            .field(Field::new("firstName", "First name", coach_first_name).required())
            .field(Field::new("lastName", "Last name", coach_last_name).required())
            .field(
                Field::new("email", "Email", coach_email)
                    .required()
                    .rule(Rule::Email),
            )
            .field(Field::new("phone", "Phone", coach_phone))
            .field(password)
            .field(
                Field::new("confirmPassword", "Confirm password", coach_confirm_password)
                    .required()
                    .rule(Rule::EqualTo {
                        label: "Password",
                        other: coach_password,
                    }),
            )
    })
}

impl AddCoachForm {
    pub fn to_new_coach(&self) -> NewCoach {
        NewCoach {
            coach_first_name: self.first_name.trim().to_string(),
            coach_last_name: self.last_name.trim().to_string(),
            coach_email: self.email.trim().to_string(),
            coach_phone: self.phone.trim().to_string(),
            password: self.password.clone(),
            confirm_password: self.confirm_password.clone(),
        }
    }
}

#[async_trait]
impl EntityForm for AddCoachForm {
    fn violations(&self) -> Violations {
        coach_validator().validate(self)
    }

    fn reset(&mut self) {
        *self = Self::default();
    }

    async fn create(&self, api: &dyn ApiGateway) -> ApiResult<()> {
        api.create_coach(&self.to_new_coach()).await
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddStudentForm {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub cell_phone: String,
    /// `YYYY-MM-DD`, may be left empty.
    pub date_of_birth: String,
}

fn student_first_name(form: &AddStudentForm) -> &str {
    &form.first_name
}

fn student_last_name(form: &AddStudentForm) -> &str {
    &form.last_name
}

fn student_email(form: &AddStudentForm) -> &str {
    &form.email
}

fn student_validator() -> &'static Validator<AddStudentForm> {
    static VALIDATOR: OnceLock<Validator<AddStudentForm>> = OnceLock::new();
    VALIDATOR.get_or_init(|| {
        Validator::new()
            .field(Field::new("firstName", "First name", student_first_name).required())
            .field(Field::new("lastName", "Last name", student_last_name).required())
            .field(
                Field::new("email", "Email", student_email)
                    .required()
                    .rule(Rule::Email),
            )
    })
}

impl AddStudentForm {
    fn parsed_date_of_birth(&self) -> Result<Option<NaiveDate>, chrono::ParseError> {
        let raw = self.date_of_birth.trim();
        if raw.is_empty() {
            return Ok(None);
        }
        NaiveDate::parse_from_str(raw, "%Y-%m-%d").map(Some)
    }

    pub fn to_new_student(&self) -> NewStudent {
        NewStudent {
            first_name: self.first_name.trim().to_string(),
            last_name: self.last_name.trim().to_string(),
            email: self.email.trim().to_string(),
            cell_phone: self.cell_phone.trim().to_string(),
            date_of_birth: self.parsed_date_of_birth().ok().flatten(),
        }
    }
}

#[async_trait]
impl EntityForm for AddStudentForm {
    fn violations(&self) -> Violations {
        let mut violations = student_validator().validate(self);
        if self.parsed_date_of_birth().is_err() {
            violations.add(
                "dateOfBirth",
                "Date of birth must be a date (YYYY-MM-DD)".to_string(),
            );
        }
        violations
    }

    fn reset(&mut self) {
        *self = Self::default();
    }

    async fn create(&self, api: &dyn ApiGateway) -> ApiResult<()> {
        api.create_student(&self.to_new_student()).await
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddCareerForm {
    pub student_id: StudentId,
    pub college_bound: bool,
    /// 1..=16, zero while nothing is selected.
    pub career_cluster: u8,
    pub specific_career: String,
    pub technical_college_bound: bool,
}

impl AddCareerForm {
    pub fn new(student_id: StudentId) -> Self {
        Self {
            student_id,
            college_bound: false,
            career_cluster: 0,
            specific_career: String::new(),
            technical_college_bound: false,
        }
    }

    pub fn to_new_career(&self) -> NewCareer {
        NewCareer {
            id: Uuid::new_v4(),
            student_id: self.student_id,
            college_bound: self.college_bound,
            career_cluster: self.career_cluster,
            specific_career: self.specific_career.trim().to_string(),
            technical_college_bound: self.technical_college_bound,
        }
    }
}

#[async_trait]
impl EntityForm for AddCareerForm {
    fn violations(&self) -> Violations {
        let mut violations = Violations::default();
        if career_cluster_label(self.career_cluster).is_none() {
            violations.add("careerCluster", "Career cluster is required".to_string());
        }
        violations
    }

    fn reset(&mut self) {
        *self = Self::new(self.student_id);
    }

    async fn create(&self, api: &dyn ApiGateway) -> ApiResult<()> {
        api.add_career(&self.to_new_career()).await
    }
}

/// Binds a form's submit and reset to a modal's confirm, cancel and dismiss.
pub struct FormActions<F> {
    pub form: F,
    api: SharedGateway,
    on_saved: Option<Box<dyn Refresh>>,
}

#[async_trait]
impl<F: EntityForm> ModalActions for FormActions<F> {
    async fn on_confirm(&mut self) -> anyhow::Result<()> {
        let result = self.form.create(self.api.as_ref()).await;
        self.form.reset();
        result.context("create request failed")?;
        if let Some(refresh) = self.on_saved.as_mut() {
            refresh.refresh();
        }
        Ok(())
    }

    async fn on_cancel(&mut self) -> anyhow::Result<()> {
        self.form.reset();
        Ok(())
    }

    async fn on_dismiss(&mut self) -> anyhow::Result<()> {
        self.form.reset();
        Ok(())
    }
}

/// A form rendered inside an action modal.
pub struct FormDialog<F> {
    modal: ActionModal,
    actions: FormActions<F>,
}

impl<F: EntityForm> FormDialog<F> {
    pub fn new(config: ModalConfig, form: F, api: SharedGateway) -> Self {
        Self {
            modal: ActionModal::new(config),
            actions: FormActions {
                form,
                api,
                on_saved: None,
            },
        }
    }

    pub fn on_saved(mut self, refresh: impl Refresh + 'static) -> Self {
        self.actions.on_saved = Some(Box::new(refresh));
        self
    }

    pub fn modal(&self) -> &ActionModal {
        &self.modal
    }

    pub fn form(&self) -> &F {
        &self.actions.form
    }

    pub fn form_mut(&mut self) -> &mut F {
        &mut self.actions.form
    }

    pub fn messages(&self) -> Vec<String> {
        self.actions.form.violations().messages()
    }

    pub fn confirm_disabled(&self) -> bool {
        !self.actions.form.is_valid()
    }

    pub fn open(&mut self) -> ModalOutcome {
        self.modal.open()
    }

    pub async fn submit(&mut self) -> ModalOutcome {
        let disabled = self.confirm_disabled();
        self.modal.set_confirm_disabled(disabled);
        let outcome = self.modal.confirm(&mut self.actions).await;
        if outcome.is_closed() {
            info!(heading = %self.modal.config().heading, "form submitted");
        }
        outcome
    }

    pub async fn cancel(&mut self) -> ModalOutcome {
        self.modal.cancel(&mut self.actions).await
    }

    pub async fn dismiss(&mut self) -> ModalOutcome {
        self.modal.dismiss(&mut self.actions).await
    }
}

pub fn add_coach_dialog(api: SharedGateway) -> FormDialog<AddCoachForm> {
    FormDialog::new(
        ModalConfig::new("Add a Coach", "Create")
            .with_message("Fill out the fields below to add a coach."),
        AddCoachForm::default(),
        api,
    )
}

pub fn add_student_dialog(api: SharedGateway) -> FormDialog<AddStudentForm> {
    FormDialog::new(
        ModalConfig::new("Add Student", "Add"),
        AddStudentForm::default(),
        api,
    )
}

pub fn add_career_dialog(api: SharedGateway, student_id: StudentId) -> FormDialog<AddCareerForm> {
    FormDialog::new(
        ModalConfig::new("Add Goal", "Submit"),
        AddCareerForm::new(student_id),
        api,
    )
}

#[derive(Debug, Clone, Default)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
    pub error_message: Option<String>,
}

impl LoginForm {
    pub fn submit_disabled(&self) -> bool {
        self.username.is_empty() || self.password.is_empty()
    }

    /// Signs in, keeping the failure text on the form for display.
    pub async fn sign_in(&mut self, api: &dyn ApiGateway) -> Option<SessionToken> {
        if self.submit_disabled() {
            return None;
        }
        let credentials = Credentials {
            username: self.username.clone(),
            password: self.password.clone(),
        };
        match api.sign_in(&credentials).await {
            Ok(token) => {
                self.error_message = None;
                Some(token)
            }
            Err(err) => {
                warn!(username = %self.username, error = %err, "sign in failed");
                let message = err.user_message();
                self.error_message = Some(if message.trim().is_empty() {
                    "An error occurred.".to_string()
                } else {
                    message
                });
                None
            }
        }
    }
}
