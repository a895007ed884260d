//! Session keys and helpers for the logged-in user.

use tower_sessions::Session;

use crate::users::UserId;

pub const USER_ID: &str = "user_id";

/// Binds `user_id` to the session, rotating the session id first so a
/// pre-login cookie can never be reused after authentication.
pub async fn log_in(session: &Session, user_id: UserId) -> Result<(), tower_sessions::session::Error> {
    session.cycle_id().await?;
    session.insert(USER_ID, user_id).await
}

pub async fn user_id(session: &Session) -> Result<Option<UserId>, tower_sessions::session::Error> {
    session.get::<UserId>(USER_ID).await
}
