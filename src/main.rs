use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context};
use chrono::Utc;
use clap::{ArgGroup, Parser, Subcommand};
use tracing::{debug, info};
use uuid::Uuid;

use crate::actions::ConfirmDialog;
use crate::api::{HttpGateway, SharedGateway};
use crate::config::Config;
use crate::forms::{
    add_career_dialog, add_coach_dialog, add_student_dialog, AddCoachForm, AddStudentForm,
    EntityForm, FormDialog, LoginForm,
};
use crate::modal::{ModalOutcome, ModalState, NoActions, ViewModal};
use crate::models::{career_cluster_label, Coach, Student, StudentState};
use crate::validation::Violations;
use crate::reassign::{
    CoachSelection, ReassignDialog, ReassignOutcome, ReassignWorkflow, RosterSource,
};

mod actions;
mod api;
mod config;
mod forms;
mod import;
mod interviews;
mod logging;
mod modal;
mod models;
mod reassign;
mod report;
mod validation;

#[cfg(test)]
mod testing;

#[derive(Parser)]
#[command(name = "mentor-admin")]
#[command(about = "Administer students and coaches of the mentoring program", long_about = None)]
struct Cli {
    /// Base URL of the mentoring program API (overrides MENTOR_API_URL)
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Enable debug logging
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in and print a session token for MENTOR_API_TOKEN
    Login {
        #[arg(long)]
        username: String,
        #[arg(long)]
        password: String,
    },
    /// List active coaches
    ListCoaches,
    /// Create a coach account
    AddCoach {
        #[arg(long)]
        first_name: String,
        #[arg(long)]
        last_name: String,
        #[arg(long)]
        email: String,
        #[arg(long, default_value = "")]
        phone: String,
        #[arg(long)]
        password: String,
        #[arg(long)]
        confirm_password: String,
        /// Validate and show what would be sent without sending it
        #[arg(long)]
        dry_run: bool,
    },
    /// Archive a coach
    ArchiveCoach {
        #[arg(long)]
        id: Uuid,
        #[arg(long)]
        dry_run: bool,
    },
    /// List students by lifecycle state or by coach
    #[command(group(
        ArgGroup::new("scope")
            .args(["state", "coach"])
            .multiple(false)
    ))]
    ListStudents {
        #[arg(long)]
        state: Option<StudentState>,
        #[arg(long)]
        coach: Option<Uuid>,
    },
    /// Show one student's record
    ShowStudent {
        #[arg(long)]
        id: Uuid,
    },
    /// Register a student
    AddStudent {
        #[arg(long)]
        first_name: String,
        #[arg(long)]
        last_name: String,
        #[arg(long)]
        email: String,
        #[arg(long, default_value = "")]
        cell_phone: String,
        /// YYYY-MM-DD
        #[arg(long, default_value = "")]
        date_of_birth: String,
        #[arg(long)]
        dry_run: bool,
    },
    /// Update a student's contact details
    EditContact {
        #[arg(long)]
        id: Uuid,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        cell_phone: Option<String>,
    },
    /// Move a student to active, inactive (archive), applied or rejected
    SetState {
        #[arg(long)]
        id: Uuid,
        #[arg(long)]
        state: StudentState,
        #[arg(long)]
        dry_run: bool,
    },
    /// Assign a student to a coach, or remove their coach
    #[command(group(
        ArgGroup::new("target")
            .args(["coach", "unassign"])
            .multiple(false)
    ))]
    Reassign {
        #[arg(long)]
        student: Uuid,
        #[arg(long)]
        coach: Option<Uuid>,
        #[arg(long)]
        unassign: bool,
        #[arg(long)]
        dry_run: bool,
    },
    /// Add a career goal for a student
    AddCareer {
        #[arg(long)]
        student: Uuid,
        /// Career cluster number, 1 to 16
        #[arg(long)]
        cluster: u8,
        #[arg(long, default_value = "")]
        specific_career: String,
        #[arg(long)]
        college_bound: bool,
        #[arg(long)]
        technical_college_bound: bool,
        #[arg(long)]
        dry_run: bool,
    },
    /// List an interview's questions in asking order
    ListQuestions {
        #[arg(long)]
        interview: Uuid,
    },
    /// Create students from a CSV file
    ImportStudents {
        #[arg(long)]
        csv: PathBuf,
    },
    /// Generate a markdown roster report
    Report {
        #[arg(long, default_value = "roster.md")]
        out: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = Config::load(cli.api_url.clone(), cli.verbose)?;
    logging::init_logging(&config.log_level)?;

    let gateway: SharedGateway = Arc::new(
        HttpGateway::new(&config.api_url, config.api_token.clone(), config.timeout)
            .context("failed to build API client")?,
    );
    debug!(api_url = %config.api_url, "api client ready");

    match cli.command {
        Commands::Login { username, password } => {
            let mut form = LoginForm {
                username,
                password,
                error_message: None,
            };
            if form.submit_disabled() {
                bail!("username and password are required");
            }
            match form.sign_in(gateway.as_ref()).await {
                Some(session) => println!("{}", session.token),
                None => bail!(
                    "{}",
                    form.error_message
                        .unwrap_or_else(|| "An error occurred.".to_string())
                ),
            }
        }
        Commands::ListCoaches => {
            let coaches = gateway.get_active_coaches().await?;
            if coaches.is_empty() {
                println!("No active coaches.");
                return Ok(());
            }
            for coach in coaches.iter() {
                println!("- {} {} ({})", coach.id, coach.full_name(), coach.coach_email);
            }
        }
        Commands::AddCoach {
            first_name,
            last_name,
            email,
            phone,
            password,
            confirm_password,
            dry_run,
        } => {
            let mut dialog = add_coach_dialog(gateway.clone())
                .on_saved(|| info!("coach list refresh requested"));
            dialog.open();
            *dialog.form_mut() = AddCoachForm {
                first_name,
                last_name,
                email,
                phone,
                password,
                confirm_password,
            };
            run_form(&mut dialog, dry_run).await?;
            if !dry_run {
                println!("Coach created.");
            }
        }
        Commands::ArchiveCoach { id, dry_run } => {
            let mut dialog = ConfirmDialog::archive_coach(gateway.clone(), id);
            dialog.open();
            if dry_run {
                dialog.cancel().await.into_result()?;
                println!("Dry run: coach {id} left active.");
            } else {
                dialog.confirm().await.into_result()?;
                println!("Coach {id} archived.");
            }
        }
        Commands::ListStudents { state, coach } => {
            let students = match (state, coach) {
                (_, Some(coach_id)) => gateway.get_students_by_coach(coach_id).await?,
                (state, None) => {
                    gateway
                        .get_students(state.unwrap_or(StudentState::Active))
                        .await?
                }
            };
            let coaches = gateway.get_active_coaches().await.unwrap_or_default();
            if students.is_empty() {
                println!("No students found.");
                return Ok(());
            }
            for student in students.iter() {
                println!(
                    "- {} {} ({}) coach: {}",
                    student.id,
                    student.full_name(),
                    student.email,
                    coach_label(&coaches, student)
                );
            }
        }
        Commands::ShowStudent { id } => {
            let student = gateway.get_student(id).await?;
            let roster = gateway.get_active_coaches().await;
            let workflow = ReassignWorkflow::load(
                gateway.clone(),
                id,
                RosterSource::Prefetched(roster),
                || {},
            )
            .await;

            let mut view = ViewModal::new("Student Details").with_width(600);
            view.open();
            debug!(heading = %view.heading, width = view.width, "showing student");
            print_student(&student, workflow.roster());
            if let Some(warning) = workflow.warning() {
                eprintln!("warning: {warning}");
            }
            println!();
            print_coach_options(&ReassignDialog::new(workflow));
            view.dismiss(&mut NoActions).await.into_result()?;
        }
        Commands::AddStudent {
            first_name,
            last_name,
            email,
            cell_phone,
            date_of_birth,
            dry_run,
        } => {
            let mut dialog = add_student_dialog(gateway.clone())
                .on_saved(|| info!("student list refresh requested"));
            dialog.open();
            *dialog.form_mut() = AddStudentForm {
                first_name,
                last_name,
                email,
                cell_phone,
                date_of_birth,
            };
            run_form(&mut dialog, dry_run).await?;
            if !dry_run {
                println!("Student created.");
            }
        }
        Commands::EditContact {
            id,
            email,
            cell_phone,
        } => {
            let mut student = gateway.get_student(id).await?;
            if let Some(email) = email {
                student.email = email;
            }
            if let Some(cell_phone) = cell_phone {
                student.cell_phone = cell_phone;
            }
            let check = AddStudentForm {
                first_name: student.first_name.clone(),
                last_name: student.last_name.clone(),
                email: student.email.clone(),
                cell_phone: student.cell_phone.clone(),
                date_of_birth: String::new(),
            };
            let violations = check.violations();
            if !violations.is_empty() {
                print_violations(&violations);
                bail!("student {id} was not updated");
            }
            gateway.edit_student(&student).await?;
            println!("Student {id} updated.");
        }
        Commands::SetState { id, state, dry_run } => {
            let mut dialog = match state {
                StudentState::Inactive => ConfirmDialog::archive_student(gateway.clone(), id),
                StudentState::Active => ConfirmDialog::accept_student(gateway.clone(), id),
                state => ConfirmDialog::set_student_state(gateway.clone(), id, state),
            }
            .on_done(|| debug!("student table refresh requested"));
            dialog.open();
            if let Some(message) = dialog.modal().config().message.as_deref() {
                info!(heading = %dialog.modal().config().heading, "{message}");
            }
            if dry_run {
                let config = dialog.modal().config().clone();
                dialog.cancel().await.into_result()?;
                println!(
                    "Dry run: chose \"{}\" over \"{}\", student {id} unchanged.",
                    config.cancel_label, config.confirm_label
                );
            } else {
                dialog.confirm().await.into_result()?;
                println!("Student {id} is now {state}.");
            }
        }
        Commands::Reassign {
            student,
            coach,
            unassign,
            dry_run,
        } => {
            let workflow = ReassignWorkflow::load(
                gateway.clone(),
                student,
                RosterSource::Live,
                || debug!("student table refresh requested"),
            )
            .await;
            if let Some(warning) = workflow.warning() {
                eprintln!("warning: {warning}");
            }
            let mut dialog = ReassignDialog::new(workflow);
            dialog.open();

            if let Some(coach_id) = coach {
                dialog.workflow_mut().select_coach(coach_id)?;
            } else if unassign {
                dialog.workflow_mut().select_unassigned()?;
            } else {
                print_coach_options(&dialog);
                dialog.dismiss().await.into_result()?;
                return Ok(());
            }

            if dry_run {
                println!(
                    "Dry run: would apply {:?} to student {}.",
                    dialog.workflow().selection(),
                    dialog.workflow().student_id()
                );
                dialog.cancel().await.into_result()?;
                return Ok(());
            }

            dialog.confirm().await.into_result()?;
            match dialog.workflow().last_outcome() {
                Some(ReassignOutcome::Assigned(request)) => {
                    println!("Student {student} assigned to coach {}.", request.coach_id)
                }
                Some(ReassignOutcome::Unassigned(request)) => {
                    println!("Student {student} removed from coach {}.", request.coach_id)
                }
                Some(ReassignOutcome::AlreadyUnassigned) => {
                    println!("Student {student} has no coach; nothing to do.")
                }
                Some(ReassignOutcome::NoChange) | None => println!("No change requested."),
            }
        }
        Commands::AddCareer {
            student,
            cluster,
            specific_career,
            college_bound,
            technical_college_bound,
            dry_run,
        } => {
            let mut dialog = add_career_dialog(gateway.clone(), student);
            dialog.open();
            {
                let form = dialog.form_mut();
                form.career_cluster = cluster;
                form.specific_career = specific_career;
                form.college_bound = college_bound;
                form.technical_college_bound = technical_college_bound;
            }
            let label = career_cluster_label(dialog.form().career_cluster).unwrap_or_default();
            run_form(&mut dialog, dry_run).await?;
            if !dry_run {
                println!("Career goal added: {label}.");
            }
        }
        Commands::ListQuestions { interview } => {
            let questions = interviews::load_questions(gateway.as_ref(), interview).await?;
            if questions.is_empty() {
                println!("Interview {interview} has no questions.");
                return Ok(());
            }
            for question in questions.iter() {
                let order = question
                    .order()
                    .map(|order| order.to_string())
                    .unwrap_or_else(|| "-".to_string());
                println!("{order}. {}", question.question_string);
            }
        }
        Commands::ImportStudents { csv } => {
            let summary = import::import_students(gateway.as_ref(), &csv).await?;
            println!(
                "Created {} students from {}.",
                summary.created,
                csv.display()
            );
            for skipped in summary.skipped.iter() {
                println!("- row {} skipped: {}", skipped.row, skipped.reasons.join("; "));
            }
        }
        Commands::Report { out } => {
            let (coaches, students) = report::load_roster(gateway.as_ref()).await?;
            let report = report::build_report(Utc::now().date_naive(), &coaches, &students);
            std::fs::write(&out, report)
                .with_context(|| format!("failed to write {}", out.display()))?;
            println!("Report written to {}.", out.display());
        }
    }

    Ok(())
}

/// Submits a filled-in form dialog, or cancels it on a dry run.
async fn run_form<F: EntityForm>(
    dialog: &mut FormDialog<F>,
    dry_run: bool,
) -> anyhow::Result<()> {
    let heading = dialog.modal().config().heading.clone();
    let messages = dialog.messages();
    if dry_run {
        let violations = dialog.form().violations();
        if violations.is_empty() {
            println!("Dry run: {heading} form is valid, nothing sent.");
        } else {
            println!("Dry run: {heading} form has errors:");
            print_violations(&violations);
        }
        dialog.cancel().await.into_result()?;
        return Ok(());
    }

    match dialog.submit().await {
        ModalOutcome::Ignored(reason) => {
            if dialog.modal().state() == ModalState::Open {
                dialog.dismiss().await.into_result()?;
            }
            bail!("{heading} was not submitted ({reason:?}): {}", messages.join("; "))
        }
        outcome => outcome.into_result(),
    }
}

fn print_violations(violations: &Violations) {
    for field in violations.fields() {
        for message in violations.for_field(field) {
            eprintln!("- {field}: {message}");
        }
    }
}

fn print_coach_options(dialog: &ReassignDialog) {
    println!("{}:", dialog.modal().config().heading);
    let options = dialog.workflow().options();
    if options.is_empty() {
        println!("  No coaches available.");
    }
    for option in options.iter() {
        match option.value {
            CoachSelection::AssignTo(coach_id) => {
                println!("- {} (--coach {coach_id})", option.label)
            }
            _ => println!("- {} (--unassign)", option.label),
        }
    }
}

fn coach_label(coaches: &[Coach], student: &Student) -> String {
    match student.coach_id {
        None => reassign::UNASSIGNED_LABEL.to_string(),
        Some(coach_id) => coaches
            .iter()
            .find(|coach| coach.id == coach_id)
            .map(Coach::full_name)
            .unwrap_or_else(|| coach_id.to_string()),
    }
}

fn print_student(student: &Student, coaches: &[Coach]) {
    println!("{}", student.full_name());
    println!("  id: {}", student.id);
    println!("  email: {}", student.email);
    if !student.cell_phone.is_empty() {
        println!("  cell phone: {}", student.cell_phone);
    }
    if let Some(date_of_birth) = student.date_of_birth {
        println!("  date of birth: {date_of_birth}");
    }
    if let Some(state) = student.state {
        println!("  state: {state}");
    }
    println!("  coach: {}", coach_label(coaches, student));
}
