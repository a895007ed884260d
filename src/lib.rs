//! LUCT reporting: lecturers file weekly lecture reports that students sign
//! off and PRLs review, program leaders assign courses and classes, and users
//! file complaints one step up the role chain.

pub mod auth;
pub mod complaints;
pub mod config;
pub mod courses;
pub mod db;
pub mod extract;
pub mod health;
pub mod reports;
pub mod res;
pub mod roles;
pub mod session;
pub mod users;

mod appresult;

use std::sync::Arc;

use axum::{
    Router,
    extract::FromRef,
    http::{HeaderValue, Method, header},
    routing::get,
};
use sqlx::SqlitePool;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tower_sessions::{Expiry, MemoryStore, SessionManagerLayer, cookie::SameSite};
use tracing::warn;

pub use appresult::{AppError, AppResult};

use complaints::{ComplaintService, SqliteComplaintStore};
use config::Config;

#[derive(Clone, FromRef)]
pub struct AppState {
    pub db_pool: SqlitePool,
    pub complaints: ComplaintService,
}

impl AppState {
    pub fn new(db_pool: SqlitePool, config: &Config) -> Self {
        let store = SqliteComplaintStore::new(db_pool.clone());
        Self {
            complaints: ComplaintService::new(Arc::new(store), config.request_timeout),
            db_pool,
        }
    }
}

/// The `/api` routes without any middleware.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(health::health))
        .nest("/api/auth", auth::router())
        .nest("/api/users", users::router())
        .nest("/api/complaints", complaints::router())
        .nest("/api/reports", reports::router())
        .nest("/api/courses", courses::router())
        .with_state(state)
}

/// [`router`] wrapped in sessions, request tracing and, when origins are
/// configured, CORS.
pub fn app(state: AppState, config: &Config) -> Router {
    let session_layer = SessionManagerLayer::new(MemoryStore::default())
        .with_secure(config.session_secure)
        .with_same_site(SameSite::Lax)
        .with_expiry(Expiry::OnInactivity(config.session_idle));

    let app = router(state).layer(session_layer).layer(TraceLayer::new_for_http());

    match cors_layer(&config.cors_origins) {
        Some(cors) => app.layer(cors),
        None => app,
    }
}

fn cors_layer(origins: &[String]) -> Option<CorsLayer> {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "ignoring malformed CORS origin");
                None
            }
        })
        .collect();
    if origins.is_empty() {
        return None;
    }

    Some(
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([Method::GET, Method::POST, Method::PUT, Method::PATCH])
            .allow_headers([header::CONTENT_TYPE])
            .allow_credentials(true),
    )
}
