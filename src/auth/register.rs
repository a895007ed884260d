use axum::{debug_handler, extract::State, http::StatusCode};
use serde::Deserialize;
use serde_json::{Value, json};
use sqlx::SqlitePool;
use tower_sessions::Session;
use tracing::{info, warn};

use crate::{
    AppResult, AppState,
    extract::Json,
    roles::{Faculty, Role},
    session,
    users::{self, NewUser},
};

use super::{AuthError, password};

#[derive(Debug, Deserialize)]
pub(crate) struct RegisterBody {
    #[serde(default)]
    name: String,
    #[serde(default)]
    email: String,
    #[serde(default)]
    password: String,
    role: Option<String>,
    #[serde(default)]
    faculty: String,
}

impl RegisterBody {
    /// Checks the body and returns the normalised name, email, role and faculty.
    fn validate(&self) -> Result<(String, String, Role, Faculty), AuthError> {
        let name = self.name.trim();
        let email = self.email.trim().to_lowercase();
        if name.is_empty() || email.is_empty() || self.password.is_empty() {
            return Err(AuthError::Validation("name, email and password are required"));
        }

        let role = match self.role.as_deref() {
            Some(role) => role.parse()?,
            None => Role::Student,
        };
        let faculty = self.faculty.parse()?;

        Ok((name.to_owned(), email, role, faculty))
    }
}

#[debug_handler(state = AppState)]
pub(crate) async fn register(
    State(db_pool): State<SqlitePool>,
    session: Session,
    Json(body): Json<RegisterBody>,
) -> AppResult<(StatusCode, Json<Value>)> {
    let (name, email, role, faculty) = body.validate()?;
    let password_hash = password::hash(body.password).await?;

    let new_user = NewUser {
        name,
        email,
        password_hash,
        role,
        faculty,
    };
    let user = match users::insert(&db_pool, &new_user).await {
        Ok(user) => user,
        Err(err) if users::is_unique_violation(&err) => {
            warn!(email = %new_user.email, "registration with existing email");
            return Err(AuthError::EmailTaken.into());
        }
        Err(err) => return Err(err.into()),
    };

    session::log_in(&session, user.id).await?;
    info!(user_id = user.id, role = %user.role, faculty = %user.faculty, "user registered");

    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "User registered successfully", "user": user })),
    ))
}
