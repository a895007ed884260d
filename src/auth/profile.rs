use axum::{Json, debug_handler};
use serde_json::{Value, json};

use crate::AppState;

use super::CurrentUser;

#[debug_handler(state = AppState)]
pub(crate) async fn profile(CurrentUser(user): CurrentUser) -> Json<Value> {
    Json(json!({ "user": user }))
}
