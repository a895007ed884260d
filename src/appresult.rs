use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

pub type AppResult<T> = Result<T, AppError>;

/// Error envelope returned by every handler.
///
/// Renders as `{"error": <message>, "code": <code>}`. Server-side errors
/// (any 5xx) are logged and their message is replaced by the status reason,
/// so storage details never reach the client.
#[derive(Debug)]
pub struct AppError {
    status: StatusCode,
    code: &'static str,
    error: anyhow::Error,
}

impl AppError {
    pub fn new(status: StatusCode, code: &'static str, error: impl Into<anyhow::Error>) -> Self {
        Self {
            status,
            code,
            error: error.into(),
        }
    }

    pub fn internal(error: impl Into<anyhow::Error>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "internal_error", error)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::NOT_FOUND,
            "not_found",
            anyhow::Error::msg(message.into()),
        )
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn code(&self) -> &'static str {
        self.code
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!(code = self.code, error = ?self.error, "request failed");
        }

        let message = if self.status.is_server_error() {
            self.status
                .canonical_reason()
                .unwrap_or("Internal Server Error")
                .to_owned()
        } else {
            self.error.to_string()
        };

        (
            self.status,
            Json(json!({ "error": message, "code": self.code })),
        )
            .into_response()
    }
}

macro_rules! apperr_impl {
    ($E:ty) => {
        impl From<$E> for AppError {
            fn from(err: $E) -> Self {
                Self::internal(err)
            }
        }
    };
}

apperr_impl!(sqlx::Error);
apperr_impl!(tower_sessions::session::Error);
