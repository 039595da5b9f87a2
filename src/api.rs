//! REST gateway for the mentoring program backend.
//!
//! Workflows talk to the backend only through [`ApiGateway`], so they can be
//! exercised against an in-memory fake. [`HttpGateway`] is the `reqwest`
//! implementation used by the binary.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::models::{
    ArchiveCoachRequest, AssignmentRequest, Coach, CoachId, Credentials, Interview, InterviewId,
    NewCareer, NewCoach, NewStudent, SessionToken, StateChangeRequest, Student, StudentId,
    StudentState,
};

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("backend returned {status}: {message}")]
    Status { status: u16, message: String },

    #[error("unexpected response body: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("invalid base url `{0}`")]
    InvalidUrl(String),
}

impl ApiError {
    /// Message suitable for showing next to a form, preferring the backend's own text.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Status { message, .. } if !message.is_empty() => message.clone(),
            other => other.to_string(),
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

pub type SharedGateway = Arc<dyn ApiGateway>;

#[async_trait]
pub trait ApiGateway: Send + Sync {
    async fn get_active_coaches(&self) -> ApiResult<Vec<Coach>>;
    async fn create_coach(&self, coach: &NewCoach) -> ApiResult<()>;
    async fn archive_coach(&self, request: ArchiveCoachRequest) -> ApiResult<()>;

    async fn get_students(&self, state: StudentState) -> ApiResult<Vec<Student>>;
    async fn get_students_by_coach(&self, coach_id: CoachId) -> ApiResult<Vec<Student>>;
    async fn get_student(&self, student_id: StudentId) -> ApiResult<Student>;
    async fn create_student(&self, student: &NewStudent) -> ApiResult<()>;
    async fn edit_student(&self, student: &Student) -> ApiResult<()>;
    async fn assign_student(&self, request: AssignmentRequest) -> ApiResult<()>;
    async fn unassign_student(&self, request: AssignmentRequest) -> ApiResult<()>;
    async fn set_student_state(&self, request: StateChangeRequest) -> ApiResult<()>;

    async fn add_career(&self, career: &NewCareer) -> ApiResult<()>;
    async fn get_interview(&self, interview_id: InterviewId) -> ApiResult<Interview>;
    async fn sign_in(&self, credentials: &Credentials) -> ApiResult<SessionToken>;
}

pub fn students_by_state_path(state: StudentState) -> &'static str {
    match state {
        StudentState::Active => "/Students/GetActiveStudents",
        StudentState::Inactive => "/Students/GetInactiveStudents",
        StudentState::Applied => "/Students/GetAppliedStudents",
        StudentState::Rejected => "/Students/GetRejectedStudents",
    }
}

#[derive(Debug, Clone)]
pub struct HttpGateway {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl HttpGateway {
    pub fn new(base_url: &str, token: Option<String>, timeout: Duration) -> ApiResult<Self> {
        let base_url = normalize_base_url(base_url)?;
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url,
            token,
        })
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        debug!(%method, %url, "calling backend");
        let builder = self.client.request(method, url);
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> ApiResult<T> {
        let response = check_status(self.request(Method::GET, path).send().await?).await?;
        let body: Value = response.json().await?;
        decode_body(body)
    }

    async fn send<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: &B,
    ) -> ApiResult<()> {
        check_status(self.request(method, path).json(body).send().await?).await?;
        Ok(())
    }
}

#[async_trait]
impl ApiGateway for HttpGateway {
    async fn get_active_coaches(&self) -> ApiResult<Vec<Coach>> {
        self.get_json("/Coaches/GetActiveCoaches").await
    }

    async fn create_coach(&self, coach: &NewCoach) -> ApiResult<()> {
        self.send(Method::POST, "/Coaches", coach).await
    }

    async fn archive_coach(&self, request: ArchiveCoachRequest) -> ApiResult<()> {
        self.send(Method::POST, "/Coaches/archive-coach", &request).await
    }

    async fn get_students(&self, state: StudentState) -> ApiResult<Vec<Student>> {
        self.get_json(students_by_state_path(state)).await
    }

    async fn get_students_by_coach(&self, coach_id: CoachId) -> ApiResult<Vec<Student>> {
        self.get_json(&format!("/Students/GetStudentsByCoachId/{coach_id}"))
            .await
    }

    async fn get_student(&self, student_id: StudentId) -> ApiResult<Student> {
        self.get_json(&format!("/Students/{student_id}")).await
    }

    async fn create_student(&self, student: &NewStudent) -> ApiResult<()> {
        self.send(Method::POST, "/Students", student).await
    }

    async fn edit_student(&self, student: &Student) -> ApiResult<()> {
        self.send(Method::PUT, "/Students", student).await
    }

    async fn assign_student(&self, request: AssignmentRequest) -> ApiResult<()> {
        self.send(Method::POST, "/Students/assign-student", &request)
            .await
    }

    async fn unassign_student(&self, request: AssignmentRequest) -> ApiResult<()> {
        self.send(Method::POST, "/Students/unassign-student", &request)
            .await
    }

    async fn set_student_state(&self, request: StateChangeRequest) -> ApiResult<()> {
        self.send(Method::POST, "/Students/SetStudentState", &request)
            .await
    }

    async fn add_career(&self, career: &NewCareer) -> ApiResult<()> {
        self.send(Method::POST, "/Careers", career).await
    }

    async fn get_interview(&self, interview_id: InterviewId) -> ApiResult<Interview> {
        self.get_json(&format!("/Interviews/{interview_id}")).await
    }

    async fn sign_in(&self, credentials: &Credentials) -> ApiResult<SessionToken> {
        let response = self
            .request(Method::POST, "/Authentication/login")
            .json(credentials)
            .send()
            .await?;
        let body: Value = check_status(response).await?.json().await?;
        decode_body(body)
    }
}

fn normalize_base_url(base_url: &str) -> ApiResult<String> {
    let trimmed = base_url.trim().trim_end_matches('/');
    if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
        return Err(ApiError::InvalidUrl(base_url.to_string()));
    }
    Ok(trimmed.to_string())
}

async fn check_status(response: Response) -> ApiResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let text = response.text().await.unwrap_or_default();
    Err(ApiError::Status {
        status: status.as_u16(),
        message: error_message(&text),
    })
}

/// The backend's `message` field, or the body itself when it is plain text.
/// Empty for JSON bodies without a message.
fn error_message(body: &str) -> String {
    match serde_json::from_str::<Value>(body) {
        Ok(value) => value
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        Err(_) => body.trim().to_string(),
    }
}

/// Accepts both bare payloads and `{"data": ...}` envelopes.
fn decode_body<T: DeserializeOwned>(body: Value) -> ApiResult<T> {
    if let Some(data) = body.get("data") {
        if let Ok(value) = T::deserialize(data) {
            return Ok(value);
        }
    }
    Ok(serde_json::from_value(body)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use uuid::Uuid;

    #[test]
    fn base_url_is_trimmed_and_checked() {
        assert_eq!(
            normalize_base_url("https://mentor.example.org/api/").unwrap(),
            "https://mentor.example.org/api"
        );
        assert!(matches!(
            normalize_base_url("mentor.example.org"),
            Err(ApiError::InvalidUrl(_))
        ));
    }

    #[test]
    fn decodes_enveloped_and_bare_payloads() {
        let id = Uuid::new_v4();
        let coach = json!({ "id": id, "coachFirstName": "Jules" });

        let wrapped: Vec<Coach> = decode_body(json!({ "data": [coach.clone()] })).unwrap();
        let bare: Vec<Coach> = decode_body(json!([coach])).unwrap();

        assert_eq!(wrapped, bare);
        assert_eq!(wrapped[0].display_name(), "Jules");
    }

    #[test]
    fn error_message_prefers_backend_message_field() {
        assert_eq!(
            error_message(r#"{"message":"Invalid credentials"}"#),
            "Invalid credentials"
        );
        assert_eq!(error_message("  gateway timeout \n"), "gateway timeout");
    }

    #[test]
    fn json_body_without_message_falls_back_to_status_text() {
        let message = error_message(r#"{"errors":{"Email":["taken"]}}"#);
        assert_eq!(message, "");

        let err = ApiError::Status {
            status: 400,
            message,
        };
        assert_eq!(err.user_message(), "backend returned 400: ");
    }

    #[test]
    fn user_message_falls_back_to_error_text() {
        let status = ApiError::Status {
            status: 401,
            message: "Invalid credentials".to_string(),
        };
        assert_eq!(status.user_message(), "Invalid credentials");

        let empty = ApiError::Status {
            status: 500,
            message: String::new(),
        };
        assert_eq!(empty.user_message(), "backend returned 500: ");
    }

    #[test]
    fn state_paths_match_backend_routes() {
        assert_eq!(
            students_by_state_path(StudentState::Applied),
            "/Students/GetAppliedStudents"
        );
    }
}
