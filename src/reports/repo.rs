use sqlx::{FromRow, SqlitePool};
use time::OffsetDateTime;

use crate::{
    roles::{Faculty, InvalidFaculty},
    users::UserId,
};

use super::{InvalidReportStatus, NewReport, Report, ReportId, ReportStatus};

const NEWEST_FIRST: &str = "ORDER BY julianday(created_at) DESC, id DESC";

#[derive(FromRow)]
struct ReportRow {
    id: i64,
    faculty: String,
    class_name: String,
    week_of_reporting: String,
    date_of_lecture: String,
    course_name: String,
    course_code: String,
    lecturer_id: i64,
    lecturer_name: String,
    students_present: i64,
    total_students: i64,
    venue: String,
    scheduled_time: String,
    topic_taught: String,
    learning_outcomes: String,
    recommendations: String,
    status: String,
    student_signature: Option<String>,
    approved_by: Option<i64>,
    prl_feedback: Option<String>,
    reviewed_by: Option<i64>,
    created_at: OffsetDateTime,
}

impl TryFrom<ReportRow> for Report {
    type Error = sqlx::Error;

    fn try_from(row: ReportRow) -> Result<Self, Self::Error> {
        let faculty = row
            .faculty
            .parse::<Faculty>()
            .map_err(|err: InvalidFaculty| sqlx::Error::Decode(Box::new(err)))?;
        let status = row
            .status
            .parse::<ReportStatus>()
            .map_err(|err: InvalidReportStatus| sqlx::Error::Decode(Box::new(err)))?;

        Ok(Report {
            id: row.id,
            faculty,
            class_name: row.class_name,
            week_of_reporting: row.week_of_reporting,
            date_of_lecture: row.date_of_lecture,
            course_name: row.course_name,
            course_code: row.course_code,
            lecturer_id: row.lecturer_id,
            lecturer_name: row.lecturer_name,
            students_present: row.students_present,
            total_students: row.total_students,
            venue: row.venue,
            scheduled_time: row.scheduled_time,
            topic_taught: row.topic_taught,
            learning_outcomes: row.learning_outcomes,
            recommendations: row.recommendations,
            status,
            student_signature: row.student_signature,
            approved_by: row.approved_by,
            prl_feedback: row.prl_feedback,
            reviewed_by: row.reviewed_by,
            created_at: row.created_at,
        })
    }
}

fn into_reports(rows: Vec<ReportRow>) -> Result<Vec<Report>, sqlx::Error> {
    rows.into_iter().map(Report::try_from).collect()
}

pub async fn insert(db_pool: &SqlitePool, report: &NewReport) -> Result<Report, sqlx::Error> {
    sqlx::query_as::<_, ReportRow>(
        "INSERT INTO reports (faculty,class_name,week_of_reporting,date_of_lecture,course_name,course_code,\
         lecturer_id,lecturer_name,students_present,total_students,venue,scheduled_time,topic_taught,\
         learning_outcomes,recommendations,status,created_at) \
         VALUES (?,?,?,?,?,?,?,?,?,?,?,?,?,?,?,'submitted',?) RETURNING *",
    )
    .bind(report.faculty.as_str())
    .bind(&report.class_name)
    .bind(&report.week_of_reporting)
    .bind(&report.date_of_lecture)
    .bind(&report.course_name)
    .bind(&report.course_code)
    .bind(report.lecturer_id)
    .bind(&report.lecturer_name)
    .bind(report.students_present)
    .bind(report.total_students)
    .bind(&report.venue)
    .bind(&report.scheduled_time)
    .bind(&report.topic_taught)
    .bind(&report.learning_outcomes)
    .bind(&report.recommendations)
    .bind(OffsetDateTime::now_utc())
    .fetch_one(db_pool)
    .await?
    .try_into()
}

pub async fn find(db_pool: &SqlitePool, id: ReportId) -> Result<Option<Report>, sqlx::Error> {
    sqlx::query_as::<_, ReportRow>("SELECT * FROM reports WHERE id=?")
        .bind(id)
        .fetch_optional(db_pool)
        .await?
        .map(Report::try_from)
        .transpose()
}

/// Reports filed by `lecturer_id`, newest first.
pub async fn list_by_lecturer(
    db_pool: &SqlitePool,
    lecturer_id: UserId,
) -> Result<Vec<Report>, sqlx::Error> {
    let rows = sqlx::query_as::<_, ReportRow>(&format!(
        "SELECT * FROM reports WHERE lecturer_id=? {NEWEST_FIRST}"
    ))
    .bind(lecturer_id)
    .fetch_all(db_pool)
    .await?;
    into_reports(rows)
}

/// All reports newest first, limited to one faculty when `faculty` is set.
pub async fn list(db_pool: &SqlitePool, faculty: Option<Faculty>) -> Result<Vec<Report>, sqlx::Error> {
    let rows = sqlx::query_as::<_, ReportRow>(&format!(
        "SELECT * FROM reports WHERE ?1 IS NULL OR faculty=?1 {NEWEST_FIRST}"
    ))
    .bind(faculty.map(|faculty| faculty.as_str()))
    .fetch_all(db_pool)
    .await?;
    into_reports(rows)
}

/// Signs a `submitted` report off. `None` when no submitted report matched.
pub async fn approve(
    db_pool: &SqlitePool,
    id: ReportId,
    signature: &str,
    student_id: UserId,
) -> Result<Option<Report>, sqlx::Error> {
    sqlx::query_as::<_, ReportRow>(
        "UPDATE reports SET student_signature=?, approved_by=?, status='student_approved' \
         WHERE id=? AND status='submitted' RETURNING *",
    )
    .bind(signature)
    .bind(student_id)
    .bind(id)
    .fetch_optional(db_pool)
    .await?
    .map(Report::try_from)
    .transpose()
}

/// Attaches PRL feedback and marks the report `prl_approved`. `None` when the
/// report does not exist or has already been reviewed.
pub async fn add_feedback(
    db_pool: &SqlitePool,
    id: ReportId,
    feedback: &str,
    prl_id: UserId,
) -> Result<Option<Report>, sqlx::Error> {
    sqlx::query_as::<_, ReportRow>(
        "UPDATE reports SET prl_feedback=?, reviewed_by=?, status='prl_approved' \
         WHERE id=? AND status IN ('submitted','student_approved') RETURNING *",
    )
    .bind(feedback)
    .bind(prl_id)
    .bind(id)
    .fetch_optional(db_pool)
    .await?
    .map(Report::try_from)
    .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        db,
        roles::Role,
        users::{self, NewUser, User},
    };

    async fn user(db_pool: &SqlitePool, name: &str, role: Role, faculty: Faculty) -> User {
        users::insert(
            db_pool,
            &NewUser {
                name: name.to_owned(),
                email: format!("{}@luct.ac.ls", name.to_lowercase()),
                password_hash: "unused".to_owned(),
                role,
                faculty,
            },
        )
        .await
        .unwrap()
    }

    fn new_report(lecturer: &User, faculty: Faculty, class_name: &str) -> NewReport {
        NewReport {
            faculty,
            class_name: class_name.to_owned(),
            week_of_reporting: "Week 6".to_owned(),
            date_of_lecture: "2025-03-04".to_owned(),
            course_name: "Web Development".to_owned(),
            course_code: "WD101".to_owned(),
            lecturer_id: lecturer.id,
            lecturer_name: lecturer.name.clone(),
            students_present: 38,
            total_students: 45,
            venue: "Hall 2".to_owned(),
            scheduled_time: "08:30".to_owned(),
            topic_taught: "Flexbox".to_owned(),
            learning_outcomes: "Lay out a page".to_owned(),
            recommendations: "More lab time".to_owned(),
        }
    }

    #[tokio::test]
    async fn inserted_report_starts_submitted() {
        let db_pool = db::memory_pool().await.unwrap();
        let lecturer = user(&db_pool, "Lecturer", Role::Lecturer, Faculty::Fict).await;

        let report = insert(&db_pool, &new_report(&lecturer, Faculty::Fict, "BIT-1A"))
            .await
            .unwrap();

        assert_eq!(report.status, ReportStatus::Submitted);
        assert_eq!(report.lecturer_name, "Lecturer");
        assert_eq!(report.student_signature, None);
        assert_eq!(find(&db_pool, report.id).await.unwrap(), Some(report));
    }

    #[tokio::test]
    async fn listings_filter_and_order_newest_first() {
        let db_pool = db::memory_pool().await.unwrap();
        let one = user(&db_pool, "One", Role::Lecturer, Faculty::Fict).await;
        let two = user(&db_pool, "Two", Role::Lecturer, Faculty::Fbmg).await;

        let first = insert(&db_pool, &new_report(&one, Faculty::Fict, "BIT-1A")).await.unwrap();
        let other = insert(&db_pool, &new_report(&two, Faculty::Fbmg, "BBA-1A")).await.unwrap();
        let second = insert(&db_pool, &new_report(&one, Faculty::Fict, "BIT-1B")).await.unwrap();

        let mine: Vec<_> = list_by_lecturer(&db_pool, one.id)
            .await
            .unwrap()
            .into_iter()
            .map(|report| report.id)
            .collect();
        assert_eq!(mine, [second.id, first.id]);

        let fbmg = list(&db_pool, Some(Faculty::Fbmg)).await.unwrap();
        assert_eq!(fbmg, vec![other]);
        assert_eq!(list(&db_pool, None).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn approval_and_feedback_move_the_status_forward_only() {
        let db_pool = db::memory_pool().await.unwrap();
        let lecturer = user(&db_pool, "Lecturer", Role::Lecturer, Faculty::Fict).await;
        let student = user(&db_pool, "Rep", Role::Student, Faculty::Fict).await;
        let prl = user(&db_pool, "Prl", Role::Prl, Faculty::Fict).await;
        let report = insert(&db_pool, &new_report(&lecturer, Faculty::Fict, "BIT-1A"))
            .await
            .unwrap();

        let approved = approve(&db_pool, report.id, "data:image/png;base64,AAAA", student.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(approved.status, ReportStatus::StudentApproved);
        assert_eq!(approved.approved_by, Some(student.id));
        assert_eq!(approve(&db_pool, report.id, "again", student.id).await.unwrap(), None);

        let reviewed = add_feedback(&db_pool, report.id, "Good attendance", prl.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(reviewed.status, ReportStatus::PrlApproved);
        assert_eq!(reviewed.prl_feedback.as_deref(), Some("Good attendance"));
        assert_eq!(add_feedback(&db_pool, report.id, "more", prl.id).await.unwrap(), None);
        assert_eq!(add_feedback(&db_pool, 999, "none", prl.id).await.unwrap(), None);
    }
}
