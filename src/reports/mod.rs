//! Weekly lecture reports: filed by teaching staff, signed off by a student
//! representative of the faculty and reviewed by the faculty's PRL.

mod error;
mod handlers;
mod repo;

use std::{fmt, str::FromStr};

use axum::{
    Router,
    routing::{get, patch, post},
};
use serde::Serialize;
use thiserror::Error;
use time::OffsetDateTime;

use crate::{AppState, roles::Faculty, users::UserId};

pub use error::ReportError;
pub use repo::{add_feedback, approve, find, insert, list, list_by_lecturer};

pub type ReportId = i64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportStatus {
    Submitted,
    StudentApproved,
    PrlApproved,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unrecognised report status `{0}`")]
pub struct InvalidReportStatus(pub String);

impl ReportStatus {
    pub fn as_str(&self) -> &'static str {
        use ReportStatus::*;
        match self {
            Submitted => "submitted",
            StudentApproved => "student_approved",
            PrlApproved => "prl_approved",
        }
    }
}

impl FromStr for ReportStatus {
    type Err = InvalidReportStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        use ReportStatus::*;
        match s {
            "submitted" => Ok(Submitted),
            "student_approved" => Ok(StudentApproved),
            "prl_approved" => Ok(PrlApproved),
            _ => Err(InvalidReportStatus(s.to_owned())),
        }
    }
}

impl fmt::Display for ReportStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Report {
    pub id: ReportId,
    pub faculty: Faculty,
    pub class_name: String,
    pub week_of_reporting: String,
    /// `YYYY-MM-DD`.
    pub date_of_lecture: String,
    pub course_name: String,
    pub course_code: String,
    pub lecturer_id: UserId,
    pub lecturer_name: String,
    pub students_present: i64,
    pub total_students: i64,
    pub venue: String,
    /// `HH:MM` or `HH:MM:SS`.
    pub scheduled_time: String,
    pub topic_taught: String,
    pub learning_outcomes: String,
    pub recommendations: String,
    pub status: ReportStatus,
    pub student_signature: Option<String>,
    pub approved_by: Option<UserId>,
    pub prl_feedback: Option<String>,
    pub reviewed_by: Option<UserId>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// A validated report, ready to be stored as `submitted`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewReport {
    pub faculty: Faculty,
    pub class_name: String,
    pub week_of_reporting: String,
    pub date_of_lecture: String,
    pub course_name: String,
    pub course_code: String,
    pub lecturer_id: UserId,
    pub lecturer_name: String,
    pub students_present: i64,
    pub total_students: i64,
    pub venue: String,
    pub scheduled_time: String,
    pub topic_taught: String,
    pub learning_outcomes: String,
    pub recommendations: String,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(handlers::create))
        .route("/my-reports", get(handlers::my_reports))
        .route("/all", get(handlers::all_reports))
        .route("/{report_id}/approve", patch(handlers::approve))
        .route("/{report_id}/feedback", patch(handlers::feedback))
}
