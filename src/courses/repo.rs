use sqlx::{FromRow, SqlitePool};
use time::OffsetDateTime;

use crate::{
    roles::{Faculty, InvalidFaculty},
    users::UserId,
};

use super::{Class, ClassAssignment, ClassId, Course, CourseId};

const COURSE_COLUMNS: &str = "id, name, code, faculty, assigned_lecturer_id";
const CLASS_COLUMNS: &str = "id, name, faculty, program_leader_id, assigned_lecturer_id";

#[derive(FromRow)]
struct CourseRow {
    id: i64,
    name: String,
    code: String,
    faculty: String,
    assigned_lecturer_id: Option<i64>,
}

#[derive(FromRow)]
struct ClassRow {
    id: i64,
    name: String,
    faculty: String,
    program_leader_id: Option<i64>,
    assigned_lecturer_id: Option<i64>,
}

fn faculty(raw: &str) -> Result<Faculty, sqlx::Error> {
    raw.parse()
        .map_err(|err: InvalidFaculty| sqlx::Error::Decode(Box::new(err)))
}

impl TryFrom<CourseRow> for Course {
    type Error = sqlx::Error;

    fn try_from(row: CourseRow) -> Result<Self, Self::Error> {
        Ok(Course {
            faculty: faculty(&row.faculty)?,
            id: row.id,
            name: row.name,
            code: row.code,
            assigned_lecturer_id: row.assigned_lecturer_id,
        })
    }
}

impl TryFrom<ClassRow> for Class {
    type Error = sqlx::Error;

    fn try_from(row: ClassRow) -> Result<Self, Self::Error> {
        Ok(Class {
            faculty: faculty(&row.faculty)?,
            id: row.id,
            name: row.name,
            program_leader_id: row.program_leader_id,
            assigned_lecturer_id: row.assigned_lecturer_id,
        })
    }
}

#[derive(Debug, Clone)]
pub struct NewAssignment {
    pub class_id: ClassId,
    pub lecturer_id: UserId,
    pub course_id: Option<CourseId>,
    pub assigned_by: UserId,
}

/// Courses ordered by code, limited to one faculty when `faculty` is set.
pub async fn list_courses(
    db_pool: &SqlitePool,
    faculty: Option<Faculty>,
) -> Result<Vec<Course>, sqlx::Error> {
    sqlx::query_as::<_, CourseRow>(&format!(
        "SELECT {COURSE_COLUMNS} FROM courses WHERE ?1 IS NULL OR faculty=?1 ORDER BY code, id"
    ))
    .bind(faculty.map(|faculty| faculty.as_str()))
    .fetch_all(db_pool)
    .await?
    .into_iter()
    .map(Course::try_from)
    .collect()
}

pub async fn find_course(db_pool: &SqlitePool, id: CourseId) -> Result<Option<Course>, sqlx::Error> {
    sqlx::query_as::<_, CourseRow>(&format!("SELECT {COURSE_COLUMNS} FROM courses WHERE id=?"))
        .bind(id)
        .fetch_optional(db_pool)
        .await?
        .map(Course::try_from)
        .transpose()
}

pub async fn list_classes(db_pool: &SqlitePool) -> Result<Vec<Class>, sqlx::Error> {
    sqlx::query_as::<_, ClassRow>(&format!("SELECT {CLASS_COLUMNS} FROM classes ORDER BY name, id"))
        .fetch_all(db_pool)
        .await?
        .into_iter()
        .map(Class::try_from)
        .collect()
}

pub async fn find_class(db_pool: &SqlitePool, id: ClassId) -> Result<Option<Class>, sqlx::Error> {
    sqlx::query_as::<_, ClassRow>(&format!("SELECT {CLASS_COLUMNS} FROM classes WHERE id=?"))
        .bind(id)
        .fetch_optional(db_pool)
        .await?
        .map(Class::try_from)
        .transpose()
}

/// Makes `lecturer_id` the course's lecturer. `None` when the course does not exist.
pub async fn assign_course(
    db_pool: &SqlitePool,
    course_id: CourseId,
    lecturer_id: UserId,
) -> Result<Option<Course>, sqlx::Error> {
    sqlx::query_as::<_, CourseRow>(&format!(
        "UPDATE courses SET assigned_lecturer_id=? WHERE id=? RETURNING {COURSE_COLUMNS}"
    ))
    .bind(lecturer_id)
    .bind(course_id)
    .fetch_optional(db_pool)
    .await?
    .map(Course::try_from)
    .transpose()
}

/// Records the assignment and makes the lecturer the class's current one, in
/// one transaction. A repeated (class, lecturer) pair is a unique violation.
pub async fn assign_class(
    db_pool: &SqlitePool,
    assignment: &NewAssignment,
) -> Result<ClassAssignment, sqlx::Error> {
    let mut tx = db_pool.begin().await?;

    let created = sqlx::query_as::<_, ClassAssignment>(
        "INSERT INTO class_assignments (class_id,lecturer_id,course_id,assigned_by,assigned_at) \
         VALUES (?,?,?,?,?) RETURNING *",
    )
    .bind(assignment.class_id)
    .bind(assignment.lecturer_id)
    .bind(assignment.course_id)
    .bind(assignment.assigned_by)
    .bind(OffsetDateTime::now_utc())
    .fetch_one(&mut *tx)
    .await?;

    sqlx::query("UPDATE classes SET assigned_lecturer_id=? WHERE id=?")
        .bind(assignment.lecturer_id)
        .bind(assignment.class_id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    Ok(created)
}
