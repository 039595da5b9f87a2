use tracing::debug;

use crate::api::{ApiGateway, ApiResult};
use crate::models::{InterviewId, Question};

/// The interview's questions in asking order. Questions not yet placed go last.
pub async fn load_questions(
    api: &dyn ApiGateway,
    interview_id: InterviewId,
) -> ApiResult<Vec<Question>> {
    let mut questions = api.get_interview(interview_id).await?.questions;
    questions.sort_by_key(|question| (question.order().is_none(), question.order()));
    debug!(%interview_id, questions = questions.len(), "interview questions loaded");
    Ok(questions)
}
