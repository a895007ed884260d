use axum::{debug_handler, extract::State};
use serde::Deserialize;
use serde_json::{Value, json};
use sqlx::SqlitePool;
use tower_sessions::Session;
use tracing::{info, warn};

use crate::{AppResult, AppState, extract::Json, session, users};

use super::{AuthError, password};

#[derive(Debug, Deserialize)]
pub(crate) struct LoginBody {
    #[serde(default)]
    email: String,
    #[serde(default)]
    password: String,
}

#[debug_handler(state = AppState)]
pub(crate) async fn login(
    State(db_pool): State<SqlitePool>,
    session: Session,
    Json(LoginBody { email, password }): Json<LoginBody>,
) -> AppResult<Json<Value>> {
    let email = email.trim().to_lowercase();
    if email.is_empty() || password.is_empty() {
        return Err(AuthError::Validation("email and password are required").into());
    }

    let Some((user, stored_hash)) = users::find_credentials_by_email(&db_pool, &email).await? else {
        warn!(%email, "login for unknown email");
        return Err(AuthError::InvalidCredentials.into());
    };

    if !password::verify(password, stored_hash).await? {
        warn!(user_id = user.id, "login with wrong password");
        return Err(AuthError::InvalidCredentials.into());
    }

    session::log_in(&session, user.id).await?;
    info!(user_id = user.id, "user logged in");

    Ok(Json(json!({ "message": "Login successful", "user": user })))
}
