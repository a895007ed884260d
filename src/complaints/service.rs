use std::{future::Future, sync::Arc, time::Duration};

use time::OffsetDateTime;
use tracing::{info, warn};

use crate::users::{User, UserId};

use super::{
    error::ComplaintError,
    model::{Complaint, ComplaintId, ComplaintStatus, NewComplaint, PartySnapshot},
    routing::{check_edge, require_text, validate_not_self},
    store::{ComplaintFilter, ComplaintStore, StoreError},
};

/// The complaint workflow: filing, responding, resolving and the two listings.
///
/// Every store call is bounded by `timeout`; an overrun surfaces as
/// [`ComplaintError::Timeout`] instead of holding the request open.
#[derive(Clone)]
pub struct ComplaintService {
    store: Arc<dyn ComplaintStore>,
    timeout: Duration,
}

impl ComplaintService {
    pub fn new(store: Arc<dyn ComplaintStore>, timeout: Duration) -> Self {
        Self { store, timeout }
    }

    async fn bounded<T>(
        &self,
        call: impl Future<Output = Result<T, StoreError>>,
    ) -> Result<T, ComplaintError> {
        match tokio::time::timeout(self.timeout, call).await {
            Ok(result) => result.map_err(ComplaintError::from),
            Err(_) => Err(ComplaintError::Timeout(self.timeout)),
        }
    }

    /// Files a complaint by `complainant` against user `target_id`.
    ///
    /// Checks run in order: text, target existence, self-complaint, role edge.
    /// Names and roles of both parties are copied into the complaint as they
    /// are right now.
    pub async fn create(
        &self,
        complainant: &User,
        target_id: UserId,
        text: &str,
    ) -> Result<Complaint, ComplaintError> {
        require_text(text, "complaint text is required")?;

        let target = self
            .bounded(self.store.find_user(target_id))
            .await?
            .ok_or(ComplaintError::TargetNotFound(target_id))?;

        validate_not_self(complainant.id, target.id)?;
        check_edge(complainant.role, target.role).inspect_err(|_| {
            warn!(
                complainant_id = complainant.id,
                complainant_role = %complainant.role,
                target_id,
                target_role = %target.role,
                "complaint outside the role chain"
            );
        })?;

        let complaint = self
            .bounded(self.store.insert_complaint(NewComplaint {
                complainant: PartySnapshot::from(complainant),
                against: PartySnapshot::from(&target),
                text: text.to_owned(),
                faculty: complainant.faculty,
                created_at: OffsetDateTime::now_utc(),
            }))
            .await?;

        info!(
            complaint_id = complaint.id,
            complainant_id = complainant.id,
            against_id = target.id,
            "complaint filed"
        );
        Ok(complaint)
    }

    /// Records the target's reply and moves the complaint to `reviewed`.
    pub async fn respond(
        &self,
        complaint_id: ComplaintId,
        responder: &User,
        text: &str,
    ) -> Result<Complaint, ComplaintError> {
        require_text(text, "response text is required")?;

        let complaint = self
            .bounded(self.store.find_complaint(complaint_id))
            .await?
            .ok_or(ComplaintError::NotFound(complaint_id))?;

        if complaint.against.id != responder.id {
            warn!(complaint_id, responder_id = responder.id, "response from someone other than the target");
            return Err(ComplaintError::NotComplaintTarget);
        }
        if complaint.status != ComplaintStatus::Pending {
            return Err(ComplaintError::AlreadyResponded(complaint_id));
        }

        // a concurrent responder may have won between the read and the update
        let complaint = self
            .bounded(self.store.record_response(complaint_id, text, responder.id))
            .await?
            .ok_or(ComplaintError::AlreadyResponded(complaint_id))?;

        info!(complaint_id, responder_id = responder.id, "complaint reviewed");
        Ok(complaint)
    }

    /// Closes a reviewed complaint. Only its complainant may do so.
    pub async fn resolve(
        &self,
        complaint_id: ComplaintId,
        caller: &User,
    ) -> Result<Complaint, ComplaintError> {
        let complaint = self
            .bounded(self.store.find_complaint(complaint_id))
            .await?
            .ok_or(ComplaintError::NotFound(complaint_id))?;

        if complaint.complainant.id != caller.id {
            return Err(ComplaintError::NotComplainant);
        }
        if complaint.status != ComplaintStatus::Reviewed {
            return Err(ComplaintError::InvalidTransition {
                id: complaint_id,
                status: complaint.status,
            });
        }

        if let Some(complaint) = self.bounded(self.store.mark_resolved(complaint_id)).await? {
            info!(complaint_id, "complaint resolved");
            return Ok(complaint);
        }

        // the row left `reviewed` after it was read; report where it is now
        let current = self
            .bounded(self.store.find_complaint(complaint_id))
            .await?
            .ok_or(ComplaintError::NotFound(complaint_id))?;
        Err(ComplaintError::InvalidTransition {
            id: complaint_id,
            status: current.status,
        })
    }

    /// Complaints filed by `user_id`, newest first.
    pub async fn list_filed_by(&self, user_id: UserId) -> Result<Vec<Complaint>, ComplaintError> {
        self.bounded(self.store.select_complaints(ComplaintFilter::FiledBy(user_id)))
            .await
    }

    /// Complaints filed against `user_id`, newest first.
    pub async fn list_against(&self, user_id: UserId) -> Result<Vec<Complaint>, ComplaintError> {
        self.bounded(self.store.select_complaints(ComplaintFilter::Against(user_id)))
            .await
    }
}

#[cfg(test)]
mod tests;
