use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use time::OffsetDateTime;

use crate::{
    roles::{Faculty, Role},
    users::{User, UserId},
};

pub type ComplaintId = i64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComplaintStatus {
    Pending,
    Reviewed,
    Resolved,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unrecognised complaint status `{0}`")]
pub struct InvalidStatus(pub String);

impl ComplaintStatus {
    pub fn as_str(&self) -> &'static str {
        use ComplaintStatus::*;
        match self {
            Pending => "pending",
            Reviewed => "reviewed",
            Resolved => "resolved",
        }
    }
}

impl FromStr for ComplaintStatus {
    type Err = InvalidStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        use ComplaintStatus::*;
        match s {
            "pending" => Ok(Pending),
            "reviewed" => Ok(Reviewed),
            "resolved" => Ok(Resolved),
            _ => Err(InvalidStatus(s.to_owned())),
        }
    }
}

impl fmt::Display for ComplaintStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One side of a complaint as it stood when the complaint was filed.
///
/// Later renames or role changes on the user do not reach back into
/// complaints that were already filed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartySnapshot {
    pub id: UserId,
    pub name: String,
    pub role: Role,
}

impl From<&User> for PartySnapshot {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            role: user.role,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComplaintReply {
    pub text: String,
    pub responded_by: UserId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(into = "ComplaintRecord")]
pub struct Complaint {
    pub id: ComplaintId,
    pub complainant: PartySnapshot,
    pub against: PartySnapshot,
    pub text: String,
    /// Faculty of the complainant at filing time.
    pub faculty: Faculty,
    pub status: ComplaintStatus,
    pub reply: Option<ComplaintReply>,
    pub created_at: OffsetDateTime,
}

/// A complaint that passed validation and is ready to be stored.
#[derive(Debug, Clone)]
pub struct NewComplaint {
    pub complainant: PartySnapshot,
    pub against: PartySnapshot,
    pub text: String,
    pub faculty: Faculty,
    pub created_at: OffsetDateTime,
}

/// Flat wire form, using the column names of the `complaints` table.
#[derive(Debug, Serialize)]
struct ComplaintRecord {
    id: ComplaintId,
    complainant_id: UserId,
    complainant_name: String,
    complainant_role: Role,
    complaint_against_id: UserId,
    complaint_against_name: String,
    complaint_against_role: Role,
    complaint_text: String,
    faculty: Faculty,
    status: ComplaintStatus,
    response_text: Option<String>,
    responded_by: Option<UserId>,
    #[serde(with = "time::serde::rfc3339")]
    created_at: OffsetDateTime,
}

impl From<Complaint> for ComplaintRecord {
    fn from(complaint: Complaint) -> Self {
        let (response_text, responded_by) = match complaint.reply {
            Some(ComplaintReply { text, responded_by }) => (Some(text), Some(responded_by)),
            None => (None, None),
        };

        Self {
            id: complaint.id,
            complainant_id: complaint.complainant.id,
            complainant_name: complaint.complainant.name,
            complainant_role: complaint.complainant.role,
            complaint_against_id: complaint.against.id,
            complaint_against_name: complaint.against.name,
            complaint_against_role: complaint.against.role,
            complaint_text: complaint.text,
            faculty: complaint.faculty,
            status: complaint.status,
            response_text,
            responded_by,
            created_at: complaint.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn serializes_with_table_column_names() {
        let complaint = Complaint {
            id: 1,
            complainant: PartySnapshot {
                id: 5,
                name: "Lerato".to_owned(),
                role: Role::Student,
            },
            against: PartySnapshot {
                id: 9,
                name: "Mr Mokoena".to_owned(),
                role: Role::Lecturer,
            },
            text: "Missed three classes".to_owned(),
            faculty: Faculty::Fict,
            status: ComplaintStatus::Pending,
            reply: None,
            created_at: OffsetDateTime::UNIX_EPOCH,
        };

        assert_eq!(
            serde_json::to_value(&complaint).unwrap(),
            json!({
                "id": 1,
                "complainant_id": 5,
                "complainant_name": "Lerato",
                "complainant_role": "student",
                "complaint_against_id": 9,
                "complaint_against_name": "Mr Mokoena",
                "complaint_against_role": "lecturer",
                "complaint_text": "Missed three classes",
                "faculty": "FICT",
                "status": "pending",
                "response_text": null,
                "responded_by": null,
                "created_at": "1970-01-01T00:00:00Z",
            })
        );
    }

    #[test]
    fn status_parses_only_schema_values() {
        assert_eq!("reviewed".parse(), Ok(ComplaintStatus::Reviewed));
        assert_eq!(
            "closed".parse::<ComplaintStatus>(),
            Err(InvalidStatus("closed".to_owned()))
        );
    }
}
