use sqlx::{
    SqlitePool,
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
};
use tracing::info;

use crate::{
    auth::password,
    config::{AdminSeed, Config},
    res::{CATALOGUE, SCHEMA},
    roles::{Faculty, Role},
    users::{self, NewUser},
};

pub async fn connect(config: &Config) -> anyhow::Result<SqlitePool> {
    let db_pool = SqlitePoolOptions::new()
        .max_connections(config.db_max_connections)
        .connect(&config.database_url)
        .await?;
    init_schema(&db_pool).await?;
    Ok(db_pool)
}

pub async fn init_schema(db_pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::raw_sql(SCHEMA).execute(db_pool).await?;
    Ok(())
}

/// A private in-memory database with the schema applied.
///
/// The pool holds exactly one connection that never expires, since every
/// SQLite `:memory:` connection is its own database.
pub async fn memory_pool() -> Result<SqlitePool, sqlx::Error> {
    let db_pool = SqlitePoolOptions::new()
        .max_connections(1)
        .min_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(SqliteConnectOptions::new().in_memory(true))
        .await?;
    init_schema(&db_pool).await?;
    Ok(db_pool)
}

/// Inserts the starter classes and courses. Rows already present are kept.
pub async fn seed_catalogue(db_pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::raw_sql(CATALOGUE).execute(db_pool).await?;
    Ok(())
}

/// Creates the administrator account unless a user with that email exists.
pub async fn seed_admin(db_pool: &SqlitePool, seed: &AdminSeed) -> anyhow::Result<()> {
    let email = seed.email.trim().to_lowercase();
    if users::find_credentials_by_email(db_pool, &email).await?.is_some() {
        return Ok(());
    }

    let password_hash = password::hash(seed.password.clone()).await?;
    let admin = users::insert(
        db_pool,
        &NewUser {
            name: "System Administrator".to_owned(),
            email,
            password_hash,
            role: Role::Pl,
            faculty: Faculty::Fict,
        },
    )
    .await?;

    info!(user_id = admin.id, email = %admin.email, "administrator account created");
    Ok(())
}
