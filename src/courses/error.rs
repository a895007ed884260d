use axum::http::StatusCode;
use thiserror::Error;

use crate::{AppError, users::UserId};

use super::{ClassId, CourseId};

#[derive(Debug, Error)]
pub enum CourseError {
    #[error("{0}")]
    Validation(&'static str),
    #[error("course {0} not found")]
    CourseNotFound(CourseId),
    #[error("class {0} not found")]
    ClassNotFound(ClassId),
    #[error("lecturer {0} not found")]
    LecturerNotFound(UserId),
    #[error("user {0} is not a lecturer")]
    NotALecturer(UserId),
    #[error("class {class_id} is already assigned to lecturer {lecturer_id}")]
    AlreadyAssigned {
        class_id: ClassId,
        lecturer_id: UserId,
    },
}

impl CourseError {
    pub fn status(&self) -> StatusCode {
        use CourseError::*;
        match self {
            Validation(_) | NotALecturer(_) => StatusCode::BAD_REQUEST,
            CourseNotFound(_) | ClassNotFound(_) | LecturerNotFound(_) => StatusCode::NOT_FOUND,
            AlreadyAssigned { .. } => StatusCode::CONFLICT,
        }
    }

    pub fn code(&self) -> &'static str {
        use CourseError::*;
        match self {
            Validation(_) => "validation_error",
            CourseNotFound(_) => "course_not_found",
            ClassNotFound(_) => "class_not_found",
            LecturerNotFound(_) => "lecturer_not_found",
            NotALecturer(_) => "not_a_lecturer",
            AlreadyAssigned { .. } => "already_assigned",
        }
    }
}

impl From<CourseError> for AppError {
    fn from(err: CourseError) -> Self {
        AppError::new(err.status(), err.code(), err)
    }
}
