mod handlers;
mod repo;

use axum::{
    Router,
    routing::{get, put},
};
use serde::Serialize;
use time::OffsetDateTime;

use crate::{
    AppState,
    roles::{Faculty, Role},
};

pub use repo::{
    NewUser, UserUpdate, find_by_id, find_credentials_by_email, insert, is_unique_violation,
    list_all, list_by_role, update,
};

pub type UserId = i64;

/// A registered user. Never carries the password hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub faculty: Faculty,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_users))
        .route("/role/{role}", get(handlers::users_by_role))
        .route("/{id}", put(handlers::update_user))
}
