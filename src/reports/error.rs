use axum::http::StatusCode;
use thiserror::Error;

use crate::{
    AppError,
    roles::{Faculty, InvalidFaculty},
};

use super::{ReportId, ReportStatus};

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("{0}")]
    Validation(&'static str),
    #[error(transparent)]
    InvalidFaculty(#[from] InvalidFaculty),
    #[error("report {0} not found")]
    NotFound(ReportId),
    #[error("report belongs to {0}, outside your faculty")]
    OutsideFaculty(Faculty),
    #[error("report {id} is {status} and cannot be {action}")]
    InvalidTransition {
        id: ReportId,
        status: ReportStatus,
        action: &'static str,
    },
}

impl ReportError {
    pub fn status(&self) -> StatusCode {
        use ReportError::*;
        match self {
            Validation(_) | InvalidFaculty(_) => StatusCode::BAD_REQUEST,
            NotFound(_) => StatusCode::NOT_FOUND,
            OutsideFaculty(_) => StatusCode::FORBIDDEN,
            InvalidTransition { .. } => StatusCode::CONFLICT,
        }
    }

    pub fn code(&self) -> &'static str {
        use ReportError::*;
        match self {
            Validation(_) => "validation_error",
            InvalidFaculty(_) => "invalid_faculty",
            NotFound(_) => "not_found",
            OutsideFaculty(_) => "outside_faculty",
            InvalidTransition { .. } => "invalid_transition",
        }
    }
}

impl From<ReportError> for AppError {
    fn from(err: ReportError) -> Self {
        AppError::new(err.status(), err.code(), err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(ReportError::Validation("venue is required"), StatusCode::BAD_REQUEST, "validation_error")]
    #[case(
        ReportError::InvalidFaculty(InvalidFaculty("FOO".to_owned())),
        StatusCode::BAD_REQUEST,
        "invalid_faculty"
    )]
    #[case(ReportError::NotFound(3), StatusCode::NOT_FOUND, "not_found")]
    #[case(ReportError::OutsideFaculty(Faculty::Fabe), StatusCode::FORBIDDEN, "outside_faculty")]
    #[case(
        ReportError::InvalidTransition { id: 1, status: ReportStatus::PrlApproved, action: "approved" },
        StatusCode::CONFLICT,
        "invalid_transition"
    )]
    fn maps_to_http(#[case] err: ReportError, #[case] status: StatusCode, #[case] code: &str) {
        let app_err = AppError::from(err);
        assert_eq!(app_err.status(), status);
        assert_eq!(app_err.code(), code);
    }
}
