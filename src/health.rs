use axum::{
    Json, debug_handler,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use sqlx::SqlitePool;
use time::{OffsetDateTime, format_description::well_known::Rfc3339};
use tracing::warn;

use crate::AppState;

#[debug_handler(state = AppState)]
pub async fn health(State(db_pool): State<SqlitePool>) -> Response {
    let timestamp = OffsetDateTime::now_utc().format(&Rfc3339).ok();

    match sqlx::query("SELECT 1").execute(&db_pool).await {
        Ok(_) => Json(json!({
            "status": "OK",
            "database": "Connected",
            "timestamp": timestamp,
        }))
        .into_response(),
        Err(err) => {
            warn!(error = %err, "health check could not reach the database");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "status": "ERROR",
                    "database": "Disconnected",
                    "timestamp": timestamp,
                })),
            )
                .into_response()
        }
    }
}
