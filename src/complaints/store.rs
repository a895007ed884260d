//! Storage port for the complaint workflow.

use async_trait::async_trait;
use thiserror::Error;

use crate::{
    roles::InvalidRole,
    users::{User, UserId},
};

use super::model::{Complaint, ComplaintId, NewComplaint};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage unavailable: {0}")]
    Unavailable(String),
    #[error(transparent)]
    InvalidRole(#[from] InvalidRole),
    #[error("malformed row: {0}")]
    Malformed(String),
}

/// Which side of a complaint a listing is keyed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComplaintFilter {
    FiledBy(UserId),
    Against(UserId),
}

impl ComplaintFilter {
    pub fn matches(&self, complaint: &Complaint) -> bool {
        match *self {
            ComplaintFilter::FiledBy(id) => complaint.complainant.id == id,
            ComplaintFilter::Against(id) => complaint.against.id == id,
        }
    }
}

#[async_trait]
pub trait ComplaintStore: Send + Sync {
    async fn find_user(&self, id: UserId) -> Result<Option<User>, StoreError>;

    /// Stores a new complaint as `pending` and returns it with its assigned id.
    async fn insert_complaint(&self, complaint: NewComplaint) -> Result<Complaint, StoreError>;

    async fn find_complaint(&self, id: ComplaintId) -> Result<Option<Complaint>, StoreError>;

    /// Sets the response and moves the complaint to `reviewed`, but only while
    /// it is still `pending`. `None` when no pending complaint matched.
    async fn record_response(
        &self,
        id: ComplaintId,
        text: &str,
        responder: UserId,
    ) -> Result<Option<Complaint>, StoreError>;

    /// Moves a `reviewed` complaint to `resolved`. `None` when no reviewed
    /// complaint matched.
    async fn mark_resolved(&self, id: ComplaintId) -> Result<Option<Complaint>, StoreError>;

    /// Complaints matching `filter`, newest first, ties broken by id descending.
    async fn select_complaints(&self, filter: ComplaintFilter) -> Result<Vec<Complaint>, StoreError>;
}
