use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type CoachId = Uuid;
pub type StudentId = Uuid;
pub type InterviewId = Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Coach {
    pub id: CoachId,
    #[serde(default)]
    pub coach_first_name: String,
    #[serde(default)]
    pub coach_last_name: String,
    #[serde(default)]
    pub coach_email: String,
    #[serde(default)]
    pub coach_phone: String,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

impl Coach {
    /// Label shown in the coach select control.
    pub fn display_name(&self) -> &str {
        &self.coach_first_name
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.coach_first_name, self.coach_last_name)
            .trim()
            .to_string()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StudentState {
    Active,
    Inactive,
    Applied,
    Rejected,
}

impl StudentState {
    pub const ALL: [StudentState; 4] = [
        StudentState::Active,
        StudentState::Inactive,
        StudentState::Applied,
        StudentState::Rejected,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            StudentState::Active => "active",
            StudentState::Inactive => "inactive",
            StudentState::Applied => "applied",
            StudentState::Rejected => "rejected",
        }
    }
}

impl fmt::Display for StudentState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StudentState {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "active" => Ok(StudentState::Active),
            "inactive" => Ok(StudentState::Inactive),
            "applied" => Ok(StudentState::Applied),
            "rejected" => Ok(StudentState::Rejected),
            other => Err(format!("unknown student state `{other}`")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Student {
    pub id: StudentId,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub cell_phone: String,
    #[serde(default)]
    pub date_of_birth: Option<NaiveDate>,
    #[serde(default)]
    pub state: Option<StudentState>,
    #[serde(default)]
    pub coach_id: Option<CoachId>,
}

impl Student {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }
}

/// Body of both the assign and unassign calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentRequest {
    pub coach_id: CoachId,
    pub student_id: StudentId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StateChangeRequest {
    pub student_id: StudentId,
    pub state: StudentState,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArchiveCoachRequest {
    pub coach_id: CoachId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCoach {
    pub coach_first_name: String,
    pub coach_last_name: String,
    pub coach_email: String,
    pub coach_phone: String,
    pub password: String,
    pub confirm_password: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewStudent {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub cell_phone: String,
    pub date_of_birth: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCareer {
    pub id: Uuid,
    pub student_id: StudentId,
    pub college_bound: bool,
    pub career_cluster: u8,
    pub specific_career: String,
    pub technical_college_bound: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SessionToken {
    pub token: String,
}

#[derive(Debug, Clone)]
pub struct StateSummary {
    pub state: StudentState,
    pub count: usize,
}

#[derive(Debug, Clone)]
pub struct CoachLoad {
    pub coach_name: String,
    pub coach_email: String,
    pub student_count: usize,
}

/// Where a question sits in one interview.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionPlacement {
    #[serde(default)]
    pub interview_id: Option<InterviewId>,
    pub question_order: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub id: Uuid,
    #[serde(default)]
    pub question_string: String,
    #[serde(default)]
    pub question_in_interviews: Vec<QuestionPlacement>,
}

impl Question {
    pub fn order(&self) -> Option<i32> {
        self.question_in_interviews
            .first()
            .map(|placement| placement.question_order)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Interview {
    pub id: InterviewId,
    #[serde(default)]
    pub questions: Vec<Question>,
}

pub const CAREER_CLUSTERS: [&str; 16] = [
    "Agriculture, Food & Natural Resources",
    "Architecture & Construction",
    "Arts, A/V Technology & Communications",
    "Business Management & Administration",
    "Education & Training",
    "Finance",
    "Government & Public Administration",
    "Health Science",
    "Hospitality & Tourism",
    "Human Services",
    "Information Technology",
    "Law, Public Safety, Corrections & Security",
    "Manufacturing",
    "Marketing",
    "Science, Technology, Engineering & Mathematics",
    "Transportation, Distribution & Logistics",
];

/// Numbered label for a career cluster, `None` outside 1..=16.
pub fn career_cluster_label(cluster: u8) -> Option<String> {
    let index = usize::from(cluster).checked_sub(1)?;
    CAREER_CLUSTERS
        .get(index)
        .map(|name| format!("{cluster:02}-{name}"))
}
