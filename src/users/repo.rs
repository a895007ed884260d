use sqlx::{FromRow, SqlitePool};
use time::OffsetDateTime;

use crate::roles::{Faculty, InvalidFaculty, InvalidRole, Role};

use super::{User, UserId};

const USER_COLUMNS: &str = "id, name, email, role, faculty, created_at";

#[derive(FromRow)]
struct UserRow {
    id: i64,
    name: String,
    email: String,
    role: String,
    faculty: String,
    created_at: OffsetDateTime,
}

#[derive(FromRow)]
struct CredentialsRow {
    #[sqlx(flatten)]
    user: UserRow,
    password_hash: String,
}

impl TryFrom<UserRow> for User {
    type Error = sqlx::Error;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let role = row
            .role
            .parse::<Role>()
            .map_err(|err: InvalidRole| sqlx::Error::Decode(Box::new(err)))?;
        let faculty = row
            .faculty
            .parse::<Faculty>()
            .map_err(|err: InvalidFaculty| sqlx::Error::Decode(Box::new(err)))?;

        Ok(User {
            id: row.id,
            name: row.name,
            email: row.email,
            role,
            faculty,
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub faculty: Faculty,
}

/// Partial update; `None` fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct UserUpdate {
    pub name: Option<String>,
    pub role: Option<Role>,
    pub faculty: Option<Faculty>,
}

pub async fn find_by_id(db_pool: &SqlitePool, id: UserId) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, UserRow>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id=?"))
        .bind(id)
        .fetch_optional(db_pool)
        .await?
        .map(User::try_from)
        .transpose()
}

/// Looks a user up by email together with their stored password hash.
pub async fn find_credentials_by_email(
    db_pool: &SqlitePool,
    email: &str,
) -> Result<Option<(User, String)>, sqlx::Error> {
    let Some(row) = sqlx::query_as::<_, CredentialsRow>(&format!(
        "SELECT {USER_COLUMNS}, password_hash FROM users WHERE email=?"
    ))
    .bind(email)
    .fetch_optional(db_pool)
    .await?
    else {
        return Ok(None);
    };

    Ok(Some((User::try_from(row.user)?, row.password_hash)))
}

pub async fn insert(db_pool: &SqlitePool, new_user: &NewUser) -> Result<User, sqlx::Error> {
    sqlx::query_as::<_, UserRow>(&format!(
        "INSERT INTO users (name,email,password_hash,role,faculty,created_at) VALUES (?,?,?,?,?,?) RETURNING {USER_COLUMNS}"
    ))
    .bind(&new_user.name)
    .bind(&new_user.email)
    .bind(&new_user.password_hash)
    .bind(new_user.role.as_str())
    .bind(new_user.faculty.as_str())
    .bind(OffsetDateTime::now_utc())
    .fetch_one(db_pool)
    .await?
    .try_into()
}

pub async fn list_all(db_pool: &SqlitePool) -> Result<Vec<User>, sqlx::Error> {
    sqlx::query_as::<_, UserRow>(&format!("SELECT {USER_COLUMNS} FROM users ORDER BY name, id"))
        .fetch_all(db_pool)
        .await?
        .into_iter()
        .map(User::try_from)
        .collect()
}

pub async fn list_by_role(db_pool: &SqlitePool, role: Role) -> Result<Vec<User>, sqlx::Error> {
    sqlx::query_as::<_, UserRow>(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE role=? ORDER BY name, id"
    ))
    .bind(role.as_str())
    .fetch_all(db_pool)
    .await?
    .into_iter()
    .map(User::try_from)
    .collect()
}

/// Applies `changes` to user `id`, returning the updated user or `None` if
/// no such user exists. Complaints keep the name and role they were filed with.
pub async fn update(
    db_pool: &SqlitePool,
    id: UserId,
    changes: &UserUpdate,
) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, UserRow>(&format!(
        "UPDATE users SET name=COALESCE(?,name), role=COALESCE(?,role), faculty=COALESCE(?,faculty) WHERE id=? RETURNING {USER_COLUMNS}"
    ))
    .bind(changes.name.as_deref())
    .bind(changes.role.map(|role| role.as_str()))
    .bind(changes.faculty.map(|faculty| faculty.as_str()))
    .bind(id)
    .fetch_optional(db_pool)
    .await?
    .map(User::try_from)
    .transpose()
}

pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .is_some_and(|db_err| db_err.is_unique_violation())
}
