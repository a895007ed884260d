//! Who may file a complaint against whom.
//!
//! Complaints follow the role chain one step upward: a student complains
//! about a lecturer, a lecturer about a PRL, a PRL about a PL and a PL about
//! FMG. FMG sits at the top of the chain and cannot file at all.

use crate::{roles::Role, users::UserId};

use super::error::ComplaintError;

/// Validates an edge given the stored role strings of both parties.
pub fn validate_complaint_edge(
    complainant_role: &str,
    target_role: &str,
) -> Result<(), ComplaintError> {
    let complainant = complainant_role.parse::<Role>()?;
    let target = target_role.parse::<Role>()?;
    check_edge(complainant, target)
}

pub fn check_edge(complainant: Role, target: Role) -> Result<(), ComplaintError> {
    match complainant.complaint_target() {
        Some(required) if required == target => Ok(()),
        _ => Err(ComplaintError::RoleMismatch {
            complainant,
            target,
        }),
    }
}

pub fn validate_not_self(complainant_id: UserId, target_id: UserId) -> Result<(), ComplaintError> {
    if complainant_id == target_id {
        return Err(ComplaintError::SelfComplaint);
    }
    Ok(())
}

pub(crate) fn require_text(text: &str, message: &'static str) -> Result<(), ComplaintError> {
    if text.trim().is_empty() {
        return Err(ComplaintError::Validation(message));
    }
    Ok(())
}
