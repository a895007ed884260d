use axum::{debug_handler, extract::State};
use serde::Deserialize;
use sqlx::SqlitePool;
use tracing::info;

use crate::{
    AppError, AppResult, AppState,
    auth::{AuthError, CurrentUser},
    extract::{Json, Path},
    roles::{Faculty, Role},
};

use super::{User, UserId, UserUpdate};

#[debug_handler(state = AppState)]
pub(crate) async fn list_users(
    State(db_pool): State<SqlitePool>,
    caller: CurrentUser,
) -> AppResult<Json<Vec<User>>> {
    caller.require_role(&[Role::Pl, Role::Fmg])?;
    Ok(Json(super::list_all(&db_pool).await?))
}

#[debug_handler(state = AppState)]
pub(crate) async fn users_by_role(
    State(db_pool): State<SqlitePool>,
    _caller: CurrentUser,
    Path(role): Path<String>,
) -> AppResult<Json<Vec<User>>> {
    let role = role.parse::<Role>().map_err(AuthError::from)?;
    Ok(Json(super::list_by_role(&db_pool, role).await?))
}

#[derive(Debug, Deserialize)]
pub(crate) struct UpdateUserBody {
    name: Option<String>,
    role: Option<String>,
    faculty: Option<String>,
}

impl UpdateUserBody {
    fn into_update(self) -> Result<UserUpdate, AuthError> {
        let name = match self.name {
            Some(name) if name.trim().is_empty() => {
                return Err(AuthError::Validation("name must not be empty"));
            }
            name => name.map(|name| name.trim().to_owned()),
        };

        Ok(UserUpdate {
            name,
            role: self.role.as_deref().map(str::parse::<Role>).transpose()?,
            faculty: self.faculty.as_deref().map(str::parse::<Faculty>).transpose()?,
        })
    }
}

#[debug_handler(state = AppState)]
pub(crate) async fn update_user(
    State(db_pool): State<SqlitePool>,
    caller: CurrentUser,
    Path(id): Path<UserId>,
    Json(body): Json<UpdateUserBody>,
) -> AppResult<Json<User>> {
    caller.require_role(&[Role::Pl])?;
    let changes = body.into_update()?;

    let Some(user) = super::update(&db_pool, id, &changes).await? else {
        return Err(AppError::not_found(format!("user {id} not found")));
    };

    info!(user_id = user.id, updated_by = caller.id, "user updated");
    Ok(Json(user))
}
