use axum::{debug_handler, extract::State, http::StatusCode};
use serde::Deserialize;
use serde_json::{Value, json};
use sqlx::SqlitePool;
use time::{Date, Time, macros::format_description};
use tracing::{info, warn};

use crate::{
    AppError, AppResult, AppState,
    auth::CurrentUser,
    extract::{Json, Path, opt_int_or_string},
    roles::{Faculty, Role},
    users::User,
};

use super::{NewReport, Report, ReportError, ReportId, ReportStatus, repo};

const AUTHORS: [Role; 4] = [Role::Lecturer, Role::Prl, Role::Pl, Role::Fmg];
const READERS: [Role; 4] = [Role::Student, Role::Prl, Role::Pl, Role::Fmg];

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct ReportBody {
    faculty: String,
    class_name: String,
    week_of_reporting: String,
    date_of_lecture: String,
    course_name: String,
    course_code: String,
    #[serde(deserialize_with = "opt_int_or_string")]
    students_present: Option<i64>,
    #[serde(deserialize_with = "opt_int_or_string")]
    total_students: Option<i64>,
    venue: String,
    scheduled_time: String,
    topic_taught: String,
    learning_outcomes: String,
    recommendations: String,
}

fn required(value: &str, message: &'static str) -> Result<String, ReportError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ReportError::Validation(message));
    }
    Ok(value.to_owned())
}

impl ReportBody {
    /// Checks every field and stamps the report with its author. The faculty
    /// defaults to the author's own when the body leaves it blank.
    fn validate(self, author: &User) -> Result<NewReport, ReportError> {
        let faculty = match self.faculty.trim() {
            "" => author.faculty,
            faculty => faculty.parse::<Faculty>()?,
        };

        let date_of_lecture = required(&self.date_of_lecture, "date_of_lecture is required")?;
        Date::parse(&date_of_lecture, format_description!("[year]-[month]-[day]"))
            .map_err(|_| ReportError::Validation("date_of_lecture must be YYYY-MM-DD"))?;

        let scheduled_time = required(&self.scheduled_time, "scheduled_time is required")?;
        let short = format_description!("[hour]:[minute]");
        let long = format_description!("[hour]:[minute]:[second]");
        if Time::parse(&scheduled_time, short).is_err() && Time::parse(&scheduled_time, long).is_err() {
            return Err(ReportError::Validation("scheduled_time must be HH:MM"));
        }

        let (Some(students_present), Some(total_students)) = (self.students_present, self.total_students)
        else {
            return Err(ReportError::Validation(
                "students_present and total_students are required",
            ));
        };
        if students_present < 0 || total_students < 0 {
            return Err(ReportError::Validation("student counts cannot be negative"));
        }
        if students_present > total_students {
            return Err(ReportError::Validation(
                "students_present cannot exceed total_students",
            ));
        }

        Ok(NewReport {
            faculty,
            class_name: required(&self.class_name, "class_name is required")?,
            week_of_reporting: required(&self.week_of_reporting, "week_of_reporting is required")?,
            date_of_lecture,
            course_name: required(&self.course_name, "course_name is required")?,
            course_code: required(&self.course_code, "course_code is required")?,
            lecturer_id: author.id,
            lecturer_name: author.name.clone(),
            students_present,
            total_students,
            venue: required(&self.venue, "venue is required")?,
            scheduled_time,
            topic_taught: required(&self.topic_taught, "topic_taught is required")?,
            learning_outcomes: required(&self.learning_outcomes, "learning_outcomes is required")?,
            recommendations: required(&self.recommendations, "recommendations is required")?,
        })
    }
}

#[debug_handler(state = AppState)]
pub(crate) async fn create(
    State(db_pool): State<SqlitePool>,
    caller: CurrentUser,
    Json(body): Json<ReportBody>,
) -> AppResult<(StatusCode, Json<Value>)> {
    caller.require_role(&AUTHORS)?;
    let report = repo::insert(&db_pool, &body.validate(&caller)?).await?;

    info!(report_id = report.id, lecturer_id = caller.id, faculty = %report.faculty, "report filed");
    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Report created successfully", "report": report })),
    ))
}

#[debug_handler(state = AppState)]
pub(crate) async fn my_reports(
    State(db_pool): State<SqlitePool>,
    caller: CurrentUser,
) -> AppResult<Json<Vec<Report>>> {
    caller.require_role(&AUTHORS)?;
    Ok(Json(repo::list_by_lecturer(&db_pool, caller.id).await?))
}

/// Students and PRLs see their own faculty's reports; PL and FMG see all.
#[debug_handler(state = AppState)]
pub(crate) async fn all_reports(
    State(db_pool): State<SqlitePool>,
    caller: CurrentUser,
) -> AppResult<Json<Vec<Report>>> {
    caller.require_role(&READERS)?;
    let faculty = matches!(caller.role, Role::Student | Role::Prl).then_some(caller.faculty);
    Ok(Json(repo::list(&db_pool, faculty).await?))
}

/// Loads the report and checks it belongs to the caller's faculty.
async fn report_in_faculty(db_pool: &SqlitePool, id: ReportId, caller: &User) -> AppResult<Report> {
    let Some(report) = repo::find(db_pool, id).await? else {
        return Err(ReportError::NotFound(id).into());
    };
    if report.faculty != caller.faculty {
        warn!(report_id = id, user_id = caller.id, "report outside the caller's faculty");
        return Err(ReportError::OutsideFaculty(report.faculty).into());
    }
    Ok(report)
}

/// The error for an update that matched no row in an acceptable status,
/// reporting the status the row holds now.
async fn transition_conflict(db_pool: &SqlitePool, id: ReportId, action: &'static str) -> AppError {
    match repo::find(db_pool, id).await {
        Ok(Some(report)) => ReportError::InvalidTransition {
            id,
            status: report.status,
            action,
        }
        .into(),
        Ok(None) => ReportError::NotFound(id).into(),
        Err(err) => err.into(),
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct ApproveBody {
    signature: String,
}

#[debug_handler(state = AppState)]
pub(crate) async fn approve(
    State(db_pool): State<SqlitePool>,
    caller: CurrentUser,
    Path(report_id): Path<ReportId>,
    Json(ApproveBody { signature }): Json<ApproveBody>,
) -> AppResult<Json<Value>> {
    caller.require_role(&[Role::Student])?;
    let signature = required(&signature, "signature is required")?;

    let report = report_in_faculty(&db_pool, report_id, &caller).await?;
    if report.status != ReportStatus::Submitted {
        return Err(ReportError::InvalidTransition {
            id: report_id,
            status: report.status,
            action: "approved",
        }
        .into());
    }

    let Some(report) = repo::approve(&db_pool, report_id, &signature, caller.id).await? else {
        return Err(transition_conflict(&db_pool, report_id, "approved").await);
    };

    info!(report_id, student_id = caller.id, "report approved");
    Ok(Json(json!({ "message": "Report approved successfully", "report": report })))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct FeedbackBody {
    feedback: String,
}

#[debug_handler(state = AppState)]
pub(crate) async fn feedback(
    State(db_pool): State<SqlitePool>,
    caller: CurrentUser,
    Path(report_id): Path<ReportId>,
    Json(FeedbackBody { feedback }): Json<FeedbackBody>,
) -> AppResult<Json<Value>> {
    caller.require_role(&[Role::Prl])?;
    let feedback = required(&feedback, "feedback is required")?;

    let report = report_in_faculty(&db_pool, report_id, &caller).await?;
    if report.status == ReportStatus::PrlApproved {
        return Err(ReportError::InvalidTransition {
            id: report_id,
            status: report.status,
            action: "reviewed",
        }
        .into());
    }

    let Some(report) = repo::add_feedback(&db_pool, report_id, &feedback, caller.id).await? else {
        return Err(transition_conflict(&db_pool, report_id, "reviewed").await);
    };

    info!(report_id, prl_id = caller.id, "report reviewed");
    Ok(Json(json!({ "message": "Feedback added successfully", "report": report })))
}
