//! The course and class catalogue, and which lecturer teaches what.

mod error;
mod handlers;
mod repo;

use axum::{
    Router,
    routing::{get, post},
};
use serde::Serialize;
use sqlx::FromRow;
use time::OffsetDateTime;

use crate::{AppState, roles::Faculty, users::UserId};

pub use error::CourseError;
pub use repo::{
    NewAssignment, assign_class, assign_course, find_class, find_course, list_classes,
    list_courses,
};

pub type CourseId = i64;
pub type ClassId = i64;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Course {
    pub id: CourseId,
    pub name: String,
    pub code: String,
    pub faculty: Faculty,
    pub assigned_lecturer_id: Option<UserId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Class {
    pub id: ClassId,
    pub name: String,
    pub faculty: Faculty,
    pub program_leader_id: Option<UserId>,
    pub assigned_lecturer_id: Option<UserId>,
}

/// A lecturer placed on a class, optionally for one course.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct ClassAssignment {
    pub id: i64,
    pub class_id: ClassId,
    pub lecturer_id: UserId,
    pub course_id: Option<CourseId>,
    pub assigned_by: UserId,
    #[serde(with = "time::serde::rfc3339")]
    pub assigned_at: OffsetDateTime,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::courses))
        .route("/classes", get(handlers::classes))
        .route("/assign-course", post(handlers::assign_course))
        .route("/assign-class", post(handlers::assign_class))
}
