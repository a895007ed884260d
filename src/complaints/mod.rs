//! Complaints filed up the role chain, and the replies to them.

mod error;
mod handlers;
mod model;
mod routing;
mod service;
mod sqlite;
mod store;

use axum::{
    Router,
    routing::{get, patch, post},
};

use crate::AppState;

pub use error::ComplaintError;
pub use model::{
    Complaint, ComplaintId, ComplaintReply, ComplaintStatus, InvalidStatus, NewComplaint,
    PartySnapshot,
};
pub use routing::{check_edge, validate_complaint_edge, validate_not_self};
pub use service::ComplaintService;
pub use sqlite::SqliteComplaintStore;
pub use store::{ComplaintFilter, ComplaintStore, StoreError};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(handlers::file_complaint))
        .route("/my-complaints", get(handlers::my_complaints))
        .route("/against-me", get(handlers::against_me))
        .route("/{complaint_id}/respond", patch(handlers::respond))
        .route("/{complaint_id}/resolve", patch(handlers::resolve))
}
