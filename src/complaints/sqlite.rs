use async_trait::async_trait;
use sqlx::{FromRow, SqlitePool};
use time::OffsetDateTime;

use crate::{
    roles::{Faculty, Role},
    users::{self, User, UserId},
};

use super::{
    model::{Complaint, ComplaintId, ComplaintReply, ComplaintStatus, NewComplaint, PartySnapshot},
    store::{ComplaintFilter, ComplaintStore, StoreError},
};

#[derive(FromRow)]
struct ComplaintRow {
    id: i64,
    complainant_id: i64,
    complainant_name: String,
    complainant_role: String,
    complaint_against_id: i64,
    complaint_against_name: String,
    complaint_against_role: String,
    complaint_text: String,
    faculty: String,
    status: String,
    response_text: Option<String>,
    responded_by: Option<i64>,
    created_at: OffsetDateTime,
}

impl TryFrom<ComplaintRow> for Complaint {
    type Error = StoreError;

    fn try_from(row: ComplaintRow) -> Result<Self, Self::Error> {
        let reply = match (row.response_text, row.responded_by) {
            (Some(text), Some(responded_by)) => Some(ComplaintReply { text, responded_by }),
            _ => None,
        };

        Ok(Complaint {
            id: row.id,
            complainant: PartySnapshot {
                id: row.complainant_id,
                name: row.complainant_name,
                role: row.complainant_role.parse::<Role>()?,
            },
            against: PartySnapshot {
                id: row.complaint_against_id,
                name: row.complaint_against_name,
                role: row.complaint_against_role.parse::<Role>()?,
            },
            text: row.complaint_text,
            faculty: row
                .faculty
                .parse::<Faculty>()
                .map_err(|err| StoreError::Malformed(err.to_string()))?,
            status: row
                .status
                .parse::<ComplaintStatus>()
                .map_err(|err| StoreError::Malformed(err.to_string()))?,
            reply,
            created_at: row.created_at,
        })
    }
}

fn store_error(err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Decode(inner) => match inner.downcast::<crate::roles::InvalidRole>() {
            Ok(invalid) => StoreError::InvalidRole(*invalid),
            Err(inner) => StoreError::Malformed(inner.to_string()),
        },
        sqlx::Error::ColumnDecode { source, .. } => StoreError::Malformed(source.to_string()),
        other => StoreError::Unavailable(other.to_string()),
    }
}

/// [`ComplaintStore`] over the `users` and `complaints` tables.
#[derive(Clone)]
pub struct SqliteComplaintStore {
    db_pool: SqlitePool,
}

impl SqliteComplaintStore {
    pub fn new(db_pool: SqlitePool) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl ComplaintStore for SqliteComplaintStore {
    async fn find_user(&self, id: UserId) -> Result<Option<User>, StoreError> {
        users::find_by_id(&self.db_pool, id).await.map_err(store_error)
    }

    async fn insert_complaint(&self, complaint: NewComplaint) -> Result<Complaint, StoreError> {
        sqlx::query_as::<_, ComplaintRow>(
            "INSERT INTO complaints (complainant_id,complainant_name,complainant_role,complaint_against_id,complaint_against_name,complaint_against_role,complaint_text,faculty,status,created_at) \
             VALUES (?,?,?,?,?,?,?,?,'pending',?) RETURNING *",
        )
        .bind(complaint.complainant.id)
        .bind(&complaint.complainant.name)
        .bind(complaint.complainant.role.as_str())
        .bind(complaint.against.id)
        .bind(&complaint.against.name)
        .bind(complaint.against.role.as_str())
        .bind(&complaint.text)
        .bind(complaint.faculty.as_str())
        .bind(complaint.created_at)
        .fetch_one(&self.db_pool)
        .await
        .map_err(store_error)?
        .try_into()
    }

    async fn find_complaint(&self, id: ComplaintId) -> Result<Option<Complaint>, StoreError> {
        sqlx::query_as::<_, ComplaintRow>("SELECT * FROM complaints WHERE id=?")
            .bind(id)
            .fetch_optional(&self.db_pool)
            .await
            .map_err(store_error)?
            .map(Complaint::try_from)
            .transpose()
    }

    async fn record_response(
        &self,
        id: ComplaintId,
        text: &str,
        responder: UserId,
    ) -> Result<Option<Complaint>, StoreError> {
        sqlx::query_as::<_, ComplaintRow>(
            "UPDATE complaints SET response_text=?, responded_by=?, status='reviewed' \
             WHERE id=? AND status='pending' RETURNING *",
        )
        .bind(text)
        .bind(responder)
        .bind(id)
        .fetch_optional(&self.db_pool)
        .await
        .map_err(store_error)?
        .map(Complaint::try_from)
        .transpose()
    }

    async fn mark_resolved(&self, id: ComplaintId) -> Result<Option<Complaint>, StoreError> {
        sqlx::query_as::<_, ComplaintRow>(
            "UPDATE complaints SET status='resolved' WHERE id=? AND status='reviewed' RETURNING *",
        )
        .bind(id)
        .fetch_optional(&self.db_pool)
        .await
        .map_err(store_error)?
        .map(Complaint::try_from)
        .transpose()
    }

    async fn select_complaints(&self, filter: ComplaintFilter) -> Result<Vec<Complaint>, StoreError> {
        // julianday() orders timestamps by value rather than by their text form
        let (sql, user_id) = match filter {
            ComplaintFilter::FiledBy(id) => (
                "SELECT * FROM complaints WHERE complainant_id=? ORDER BY julianday(created_at) DESC, id DESC",
                id,
            ),
            ComplaintFilter::Against(id) => (
                "SELECT * FROM complaints WHERE complaint_against_id=? ORDER BY julianday(created_at) DESC, id DESC",
                id,
            ),
        };

        sqlx::query_as::<_, ComplaintRow>(sql)
            .bind(user_id)
            .fetch_all(&self.db_pool)
            .await
            .map_err(store_error)?
            .into_iter()
            .map(Complaint::try_from)
            .collect()
    }
}
