use axum::{debug_handler, extract::State, http::StatusCode};
use serde::Deserialize;
use serde_json::{Value, json};
use sqlx::SqlitePool;
use tracing::{info, warn};

use crate::{
    AppResult, AppState,
    auth::CurrentUser,
    extract::{Json, opt_int_or_string},
    roles::Role,
    users::{self, UserId},
};

use super::{Class, ClassId, Course, CourseError, CourseId, NewAssignment, repo};

/// A PRL sees the courses of their own faculty; everyone else sees all.
#[debug_handler(state = AppState)]
pub(crate) async fn courses(
    State(db_pool): State<SqlitePool>,
    caller: CurrentUser,
) -> AppResult<Json<Vec<Course>>> {
    let faculty = (caller.role == Role::Prl).then_some(caller.faculty);
    Ok(Json(repo::list_courses(&db_pool, faculty).await?))
}

#[debug_handler(state = AppState)]
pub(crate) async fn classes(
    State(db_pool): State<SqlitePool>,
    _caller: CurrentUser,
) -> AppResult<Json<Vec<Class>>> {
    Ok(Json(repo::list_classes(&db_pool).await?))
}

async fn require_lecturer(db_pool: &SqlitePool, id: UserId) -> AppResult<()> {
    let Some(user) = users::find_by_id(db_pool, id).await? else {
        return Err(CourseError::LecturerNotFound(id).into());
    };
    if user.role != Role::Lecturer {
        return Err(CourseError::NotALecturer(id).into());
    }
    Ok(())
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct AssignCourseBody {
    #[serde(default, deserialize_with = "opt_int_or_string")]
    course_id: Option<CourseId>,
    #[serde(default, deserialize_with = "opt_int_or_string")]
    lecturer_id: Option<UserId>,
}

#[debug_handler(state = AppState)]
pub(crate) async fn assign_course(
    State(db_pool): State<SqlitePool>,
    caller: CurrentUser,
    Json(body): Json<AssignCourseBody>,
) -> AppResult<Json<Value>> {
    caller.require_role(&[Role::Pl])?;
    let (Some(course_id), Some(lecturer_id)) = (body.course_id, body.lecturer_id) else {
        return Err(CourseError::Validation("courseId and lecturerId are required").into());
    };

    require_lecturer(&db_pool, lecturer_id).await?;
    let Some(course) = repo::assign_course(&db_pool, course_id, lecturer_id).await? else {
        return Err(CourseError::CourseNotFound(course_id).into());
    };

    info!(course_id, lecturer_id, assigned_by = caller.id, "course assigned");
    Ok(Json(json!({ "message": "Course assigned successfully", "course": course })))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct AssignClassBody {
    #[serde(default, deserialize_with = "opt_int_or_string")]
    class_id: Option<ClassId>,
    #[serde(default, deserialize_with = "opt_int_or_string")]
    lecturer_id: Option<UserId>,
    #[serde(default, deserialize_with = "opt_int_or_string")]
    course_id: Option<CourseId>,
}

#[debug_handler(state = AppState)]
pub(crate) async fn assign_class(
    State(db_pool): State<SqlitePool>,
    caller: CurrentUser,
    Json(body): Json<AssignClassBody>,
) -> AppResult<(StatusCode, Json<Value>)> {
    caller.require_role(&[Role::Pl])?;
    let (Some(class_id), Some(lecturer_id)) = (body.class_id, body.lecturer_id) else {
        return Err(CourseError::Validation("classId and lecturerId are required").into());
    };

    if repo::find_class(&db_pool, class_id).await?.is_none() {
        return Err(CourseError::ClassNotFound(class_id).into());
    }
    if let Some(course_id) = body.course_id {
        if repo::find_course(&db_pool, course_id).await?.is_none() {
            return Err(CourseError::CourseNotFound(course_id).into());
        }
    }
    require_lecturer(&db_pool, lecturer_id).await?;

    let assignment = NewAssignment {
        class_id,
        lecturer_id,
        course_id: body.course_id,
        assigned_by: caller.id,
    };
    let assignment = match repo::assign_class(&db_pool, &assignment).await {
        Ok(assignment) => assignment,
        Err(err) if users::is_unique_violation(&err) => {
            warn!(class_id, lecturer_id, "class already assigned to lecturer");
            return Err(CourseError::AlreadyAssigned { class_id, lecturer_id }.into());
        }
        Err(err) => return Err(err.into()),
    };

    info!(class_id, lecturer_id, assigned_by = caller.id, "class assigned");
    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Class assigned successfully", "assignment": assignment })),
    ))
}
