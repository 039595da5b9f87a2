use std::sync::Mutex;

use async_trait::async_trait;

use crate::api::{ApiError, ApiGateway, ApiResult};
use crate::models::{
    ArchiveCoachRequest, AssignmentRequest, Coach, CoachId, Credentials, Interview, InterviewId,
    NewCareer, NewCoach, NewStudent, SessionToken, StateChangeRequest, Student, StudentId,
    StudentState,
};

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    GetActiveCoaches,
    CreateCoach(NewCoach),
    ArchiveCoach(ArchiveCoachRequest),
    GetStudents(StudentState),
    GetStudentsByCoach(CoachId),
    GetStudent(StudentId),
    CreateStudent(NewStudent),
    EditStudent(Student),
    Assign(AssignmentRequest),
    Unassign(AssignmentRequest),
    SetState(StateChangeRequest),
    AddCareer(NewCareer),
    GetInterview(InterviewId),
    SignIn(String),
}

#[derive(Default)]
pub struct RecordingGateway {
    pub coaches: Vec<Coach>,
    pub students: Vec<Student>,
    pub interviews: Vec<Interview>,
    pub fail_coaches: bool,
    pub fail_mutations: bool,
    calls: Mutex<Vec<Call>>,
}

impl RecordingGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_coaches(mut self, coaches: Vec<Coach>) -> Self {
        self.coaches = coaches;
        self
    }

    pub fn with_students(mut self, students: Vec<Student>) -> Self {
        self.students = students;
        self
    }

    pub fn with_interviews(mut self, interviews: Vec<Interview>) -> Self {
        self.interviews = interviews;
        self
    }

    pub fn failing_coaches(mut self) -> Self {
        self.fail_coaches = true;
        self
    }

    pub fn failing_mutations(mut self) -> Self {
        self.fail_mutations = true;
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    /// Assign and unassign calls only.
    pub fn assignment_calls(&self) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|call| matches!(call, Call::Assign(_) | Call::Unassign(_)))
            .collect()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    fn mutation(&self, call: Call) -> ApiResult<()> {
        self.record(call);
        if self.fail_mutations {
            return Err(server_error());
        }
        Ok(())
    }
}

fn server_error() -> ApiError {
    ApiError::Status {
        status: 500,
        message: "Internal Server Error".to_string(),
    }
}

#[async_trait]
impl ApiGateway for RecordingGateway {
    async fn get_active_coaches(&self) -> ApiResult<Vec<Coach>> {
        self.record(Call::GetActiveCoaches);
        if self.fail_coaches {
            return Err(server_error());
        }
        Ok(self.coaches.iter().filter(|c| c.active).cloned().collect())
    }

    async fn create_coach(&self, coach: &NewCoach) -> ApiResult<()> {
        self.mutation(Call::CreateCoach(coach.clone()))
    }

    async fn archive_coach(&self, request: ArchiveCoachRequest) -> ApiResult<()> {
        self.mutation(Call::ArchiveCoach(request))
    }

    async fn get_students(&self, state: StudentState) -> ApiResult<Vec<Student>> {
        self.record(Call::GetStudents(state));
        Ok(self
            .students
            .iter()
            .filter(|s| s.state == Some(state))
            .cloned()
            .collect())
    }

    async fn get_students_by_coach(&self, coach_id: CoachId) -> ApiResult<Vec<Student>> {
        self.record(Call::GetStudentsByCoach(coach_id));
        Ok(self
            .students
            .iter()
            .filter(|s| s.coach_id == Some(coach_id))
            .cloned()
            .collect())
    }

    async fn get_student(&self, student_id: StudentId) -> ApiResult<Student> {
        self.record(Call::GetStudent(student_id));
        self.students
            .iter()
            .find(|s| s.id == student_id)
            .cloned()
            .ok_or(ApiError::Status {
                status: 404,
                message: "Student not found".to_string(),
            })
    }

    async fn create_student(&self, student: &NewStudent) -> ApiResult<()> {
        self.mutation(Call::CreateStudent(student.clone()))
    }

    async fn edit_student(&self, student: &Student) -> ApiResult<()> {
        self.mutation(Call::EditStudent(student.clone()))
    }

    async fn assign_student(&self, request: AssignmentRequest) -> ApiResult<()> {
        self.mutation(Call::Assign(request))
    }

    async fn unassign_student(&self, request: AssignmentRequest) -> ApiResult<()> {
        self.mutation(Call::Unassign(request))
    }

    async fn set_student_state(&self, request: StateChangeRequest) -> ApiResult<()> {
        self.mutation(Call::SetState(request))
    }

    async fn add_career(&self, career: &NewCareer) -> ApiResult<()> {
        self.mutation(Call::AddCareer(career.clone()))
    }

    async fn get_interview(&self, interview_id: InterviewId) -> ApiResult<Interview> {
        self.record(Call::GetInterview(interview_id));
        self.interviews
            .iter()
            .find(|interview| interview.id == interview_id)
            .cloned()
            .ok_or(ApiError::Status {
                status: 404,
                message: "Interview not found".to_string(),
            })
    }

    async fn sign_in(&self, credentials: &Credentials) -> ApiResult<SessionToken> {
        self.record(Call::SignIn(credentials.username.clone()));
        if credentials.password == "correct horse" {
            Ok(SessionToken {
                token: "session-token".to_string(),
            })
        } else {
            Err(ApiError::Status {
                status: 401,
                message: "Invalid credentials".to_string(),
            })
        }
    }
}

pub fn coach(first_name: &str) -> Coach {
    Coach {
        id: uuid::Uuid::new_v4(),
        coach_first_name: first_name.to_string(),
        coach_last_name: "Coach".to_string(),
        coach_email: format!("{}@mentors.example.org", first_name.to_lowercase()),
        coach_phone: String::new(),
        active: true,
    }
}

pub fn student(first_name: &str, state: StudentState, coach_id: Option<CoachId>) -> Student {
    Student {
        id: uuid::Uuid::new_v4(),
        first_name: first_name.to_string(),
        last_name: "Student".to_string(),
        email: format!("{}@students.example.org", first_name.to_lowercase()),
        cell_phone: String::new(),
        date_of_birth: None,
        state: Some(state),
        coach_id,
    }
}

pub type RefreshCounter = std::sync::Arc<std::sync::atomic::AtomicUsize>;

pub fn refresh_counter() -> (RefreshCounter, impl FnMut() + Send + Sync + 'static) {
    let counter = RefreshCounter::default();
    let handle = counter.clone();
    (counter, move || {
        handle.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
    })
}

pub fn count(counter: &RefreshCounter) -> usize {
    counter.load(std::sync::atomic::Ordering::SeqCst)
}
