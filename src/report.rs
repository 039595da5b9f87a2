use std::collections::HashMap;
use std::fmt::Write;

use chrono::NaiveDate;

use crate::api::{ApiGateway, ApiResult};
use crate::models::{Coach, CoachLoad, StateSummary, Student, StudentState};

/// Active coaches and every student, each tagged with the list it came from.
pub async fn load_roster(api: &dyn ApiGateway) -> ApiResult<(Vec<Coach>, Vec<Student>)> {
    let coaches = api.get_active_coaches().await?;
    let mut students = Vec::new();
    for state in StudentState::ALL {
        for mut student in api.get_students(state).await? {
            student.state.get_or_insert(state);
            students.push(student);
        }
    }
    Ok((coaches, students))
}

pub fn summarize_by_state(students: &[Student]) -> Vec<StateSummary> {
    StudentState::ALL
        .iter()
        .map(|state| StateSummary {
            state: *state,
            count: students
                .iter()
                .filter(|student| student.state == Some(*state))
                .count(),
        })
        .collect()
}

pub fn coach_loads(coaches: &[Coach], students: &[Student]) -> Vec<CoachLoad> {
    let mut counts: HashMap<_, usize> = HashMap::new();
    for student in students {
        if student.state != Some(StudentState::Active) {
            continue;
        }
        if let Some(coach_id) = student.coach_id {
            *counts.entry(coach_id).or_insert(0) += 1;
        }
    }

    let mut loads: Vec<CoachLoad> = coaches
        .iter()
        .map(|coach| CoachLoad {
            coach_name: coach.full_name(),
            coach_email: coach.coach_email.clone(),
            student_count: counts.get(&coach.id).copied().unwrap_or(0),
        })
        .collect();
    loads.sort_by(|a, b| {
        b.student_count
            .cmp(&a.student_count)
            .then_with(|| a.coach_name.cmp(&b.coach_name))
    });
    loads
}

pub fn build_report(generated_on: NaiveDate, coaches: &[Coach], students: &[Student]) -> String {
    let summaries = summarize_by_state(students);
    let loads = coach_loads(coaches, students);

    let mut output = String::new();

    let _ = writeln!(output, "# Mentoring Roster Report");
    let _ = writeln!(
        output,
        "Generated on {} for {} coaches and {} students",
        generated_on,
        coaches.len(),
        students.len()
    );
    let _ = writeln!(output);
    let _ = writeln!(output, "## Students by State");

    for summary in summaries.iter() {
        let _ = writeln!(output, "- {}: {}", summary.state, summary.count);
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Coach Caseloads");

    if loads.is_empty() {
        let _ = writeln!(output, "No active coaches.");
    } else {
        for load in loads.iter() {
            let _ = writeln!(
                output,
                "- {} ({}): {} active students",
                load.coach_name, load.coach_email, load.student_count
            );
        }
    }

    let mut unassigned: Vec<&Student> = students
        .iter()
        .filter(|student| {
            student.state == Some(StudentState::Active) && student.coach_id.is_none()
        })
        .collect();
    unassigned.sort_by_key(|student| student.full_name());
    let _ = writeln!(output);
    let _ = writeln!(output, "## Active Students Without a Coach");

    if unassigned.is_empty() {
        let _ = writeln!(output, "Every active student has a coach.");
    } else {
        for student in unassigned {
            let _ = writeln!(output, "- {} ({})", student.full_name(), student.email);
        }
    }

    output
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::testing::{coach, student, RecordingGateway};

    #[test]
    fn caseloads_count_only_active_students() {
        let avery = coach("Avery");
        let jules = coach("Jules");
        let students = vec![
            student("Kiara", StudentState::Active, Some(jules.id)),
            student("Mina", StudentState::Active, Some(jules.id)),
            student("Omar", StudentState::Inactive, Some(avery.id)),
        ];

        let loads = coach_loads(&[avery, jules], &students);

        assert_eq!(loads[0].coach_name, "Jules Coach");
        assert_eq!(loads[0].student_count, 2);
        assert_eq!(loads[1].student_count, 0);
    }

    #[test]
    fn report_lists_unassigned_active_students() {
        let avery = coach("Avery");
        let students = vec![
            student("Kiara", StudentState::Active, None),
            student("Omar", StudentState::Applied, None),
        ];
        let generated_on = NaiveDate::from_ymd_opt(2026, 2, 2).unwrap();

        let report = build_report(generated_on, &[avery], &students);

        assert!(report.contains("Generated on 2026-02-02 for 1 coaches and 2 students"));
        assert!(report.contains("- active: 1"));
        assert!(report.contains("- applied: 1"));
        assert!(report.contains("- Kiara Student (kiara@students.example.org)"));
        assert!(!report.contains("- Omar Student"));
    }

    #[tokio::test]
    async fn roster_loads_every_state_list() {
        let gateway = Arc::new(
            RecordingGateway::new()
                .with_coaches(vec![coach("Avery")])
                .with_students(vec![
                    student("Kiara", StudentState::Active, None),
                    student("Omar", StudentState::Rejected, None),
                ]),
        );

        let (coaches, students) = load_roster(gateway.as_ref()).await.unwrap();

        assert_eq!(coaches.len(), 1);
        assert_eq!(students.len(), 2);
        assert_eq!(gateway.calls().len(), 1 + StudentState::ALL.len());
    }
}
