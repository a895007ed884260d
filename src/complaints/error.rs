use std::time::Duration;

use axum::http::StatusCode;
use thiserror::Error;

use crate::{
    AppError,
    roles::{InvalidRole, Role},
    users::UserId,
};

use super::{
    model::{ComplaintId, ComplaintStatus},
    store::StoreError,
};

#[derive(Debug, Error)]
pub enum ComplaintError {
    #[error(transparent)]
    InvalidRole(#[from] InvalidRole),
    #[error("a {complainant} may not file a complaint against a {target}")]
    RoleMismatch { complainant: Role, target: Role },
    #[error("cannot file a complaint against yourself")]
    SelfComplaint,
    #[error("user {0} to complain against not found")]
    TargetNotFound(UserId),
    #[error("complaint {0} not found")]
    NotFound(ComplaintId),
    #[error("{0}")]
    Validation(&'static str),
    #[error("complaint {0} already has a response")]
    AlreadyResponded(ComplaintId),
    #[error("only the user a complaint was filed against may respond to it")]
    NotComplaintTarget,
    #[error("only the user who filed a complaint may resolve it")]
    NotComplainant,
    #[error("complaint {id} is {status} and cannot be resolved")]
    InvalidTransition {
        id: ComplaintId,
        status: ComplaintStatus,
    },
    #[error(transparent)]
    StorageUnavailable(StoreError),
    #[error("storage did not answer within {0:?}")]
    Timeout(Duration),
}

impl From<StoreError> for ComplaintError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::InvalidRole(role) => ComplaintError::InvalidRole(role),
            other => ComplaintError::StorageUnavailable(other),
        }
    }
}

impl ComplaintError {
    pub fn status(&self) -> StatusCode {
        use ComplaintError::*;
        match self {
            InvalidRole(_) | RoleMismatch { .. } | SelfComplaint | Validation(_) => {
                StatusCode::BAD_REQUEST
            }
            TargetNotFound(_) | NotFound(_) => StatusCode::NOT_FOUND,
            NotComplaintTarget | NotComplainant => StatusCode::FORBIDDEN,
            AlreadyResponded(_) | InvalidTransition { .. } => StatusCode::CONFLICT,
            StorageUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
        }
    }

    pub fn code(&self) -> &'static str {
        use ComplaintError::*;
        match self {
            InvalidRole(_) => "invalid_role",
            RoleMismatch { .. } => "role_mismatch",
            SelfComplaint => "self_complaint",
            TargetNotFound(_) => "target_not_found",
            NotFound(_) => "not_found",
            Validation(_) => "validation_error",
            AlreadyResponded(_) => "already_responded",
            NotComplaintTarget => "not_complaint_target",
            NotComplainant => "not_complainant",
            InvalidTransition { .. } => "invalid_transition",
            StorageUnavailable(_) => "storage_unavailable",
            Timeout(_) => "timeout",
        }
    }
}

impl From<ComplaintError> for AppError {
    fn from(err: ComplaintError) -> Self {
        AppError::new(err.status(), err.code(), err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(ComplaintError::SelfComplaint, StatusCode::BAD_REQUEST, "self_complaint")]
    #[case(
        ComplaintError::RoleMismatch { complainant: Role::Student, target: Role::Prl },
        StatusCode::BAD_REQUEST,
        "role_mismatch"
    )]
    #[case(ComplaintError::TargetNotFound(4), StatusCode::NOT_FOUND, "target_not_found")]
    #[case(ComplaintError::AlreadyResponded(1), StatusCode::CONFLICT, "already_responded")]
    #[case(
        ComplaintError::StorageUnavailable(StoreError::Unavailable("pool closed".to_owned())),
        StatusCode::SERVICE_UNAVAILABLE,
        "storage_unavailable"
    )]
    #[case(
        ComplaintError::Timeout(Duration::from_secs(10)),
        StatusCode::GATEWAY_TIMEOUT,
        "timeout"
    )]
    fn maps_to_http(#[case] err: ComplaintError, #[case] status: StatusCode, #[case] code: &str) {
        let app_err = AppError::from(err);
        assert_eq!(app_err.status(), status);
        assert_eq!(app_err.code(), code);
    }

    #[tokio::test]
    async fn storage_failure_does_not_leak_the_driver_message() {
        use axum::{body::to_bytes, response::IntoResponse};

        let err = ComplaintError::StorageUnavailable(StoreError::Unavailable(
            "error communicating with database: connection refused".to_owned(),
        ));
        let response = AppError::from(err).into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(!body.contains("connection refused"), "{body}");
        assert!(body.contains("storage_unavailable"), "{body}");
    }

    #[test]
    fn invalid_role_from_storage_stays_invalid_role() {
        let err = ComplaintError::from(StoreError::InvalidRole(InvalidRole("dean".to_owned())));
        assert!(matches!(err, ComplaintError::InvalidRole(_)));
    }
}
