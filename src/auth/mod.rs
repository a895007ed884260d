//! Registration, login and the caller identity every other module relies on.
//!
//! The session only ever holds the user id. [`CurrentUser`] reloads the user
//! row on each request, so role or faculty changes take effect immediately.

mod login;
mod logout;
pub mod password;
mod profile;
mod register;

use std::ops::Deref;

use axum::{
    Router,
    extract::{FromRef, FromRequestParts},
    http::{StatusCode, request::Parts},
    routing::{get, post},
};
use sqlx::SqlitePool;
use thiserror::Error;
use tower_sessions::Session;

use crate::{
    AppError, AppState,
    roles::{InvalidFaculty, InvalidRole, Role},
    session,
    users::{self, User},
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register::register))
        .route("/login", post(login::login))
        .route("/logout", post(logout::logout))
        .route("/profile", get(profile::profile))
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("authentication required")]
    Unauthenticated,
    #[error("a {0} may not perform this action")]
    Forbidden(Role),
    #[error("user already exists with this email")]
    EmailTaken,
    #[error("{0}")]
    Validation(&'static str),
    #[error(transparent)]
    InvalidRole(#[from] InvalidRole),
    #[error(transparent)]
    InvalidFaculty(#[from] InvalidFaculty),
    #[error("password hashing failed: {0}")]
    PasswordHash(String),
}

impl AuthError {
    pub fn status(&self) -> StatusCode {
        use AuthError::*;
        match self {
            InvalidCredentials | Unauthenticated => StatusCode::UNAUTHORIZED,
            Forbidden(_) => StatusCode::FORBIDDEN,
            EmailTaken => StatusCode::CONFLICT,
            Validation(_) | InvalidRole(_) | InvalidFaculty(_) => StatusCode::BAD_REQUEST,
            PasswordHash(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        use AuthError::*;
        match self {
            InvalidCredentials => "invalid_credentials",
            Unauthenticated => "unauthenticated",
            Forbidden(_) => "forbidden",
            EmailTaken => "email_taken",
            Validation(_) => "validation_error",
            InvalidRole(_) => "invalid_role",
            InvalidFaculty(_) => "invalid_faculty",
            PasswordHash(_) => "internal_error",
        }
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        AppError::new(err.status(), err.code(), err)
    }
}

/// The authenticated caller, loaded from the session.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

impl CurrentUser {
    pub fn require_role(&self, allowed: &[Role]) -> Result<(), AuthError> {
        if allowed.contains(&self.0.role) {
            Ok(())
        } else {
            Err(AuthError::Forbidden(self.0.role))
        }
    }
}

impl Deref for CurrentUser {
    type Target = User;

    fn deref(&self) -> &User {
        &self.0
    }
}

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
    SqlitePool: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let session = Session::from_request_parts(parts, state)
            .await
            .map_err(|(_, msg)| AppError::internal(anyhow::Error::msg(msg)))?;

        let Some(user_id) = session::user_id(&session).await? else {
            return Err(AuthError::Unauthenticated.into());
        };

        let db_pool = SqlitePool::from_ref(state);
        let Some(user) = users::find_by_id(&db_pool, user_id).await? else {
            // the account behind this session no longer exists
            session.flush().await?;
            return Err(AuthError::Unauthenticated.into());
        };

        Ok(CurrentUser(user))
    }
}
