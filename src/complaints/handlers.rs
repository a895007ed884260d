use axum::{debug_handler, extract::State, http::StatusCode};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::{
    AppResult, AppState,
    auth::CurrentUser,
    extract::{Json, Path, opt_int_or_string},
    users::UserId,
};

use super::{ComplaintError, ComplaintService, model::{Complaint, ComplaintId}};

#[derive(Debug, Deserialize)]
pub(crate) struct FileComplaintBody {
    #[serde(default, deserialize_with = "opt_int_or_string")]
    complaint_against_id: Option<UserId>,
    #[serde(default)]
    complaint_text: String,
}

#[debug_handler(state = AppState)]
pub(crate) async fn file_complaint(
    State(complaints): State<ComplaintService>,
    caller: CurrentUser,
    Json(FileComplaintBody { complaint_against_id, complaint_text }): Json<FileComplaintBody>,
) -> AppResult<(StatusCode, Json<Value>)> {
    let Some(target_id) = complaint_against_id else {
        return Err(ComplaintError::Validation("complaint_against_id is required").into());
    };

    let complaint = complaints.create(&caller, target_id, &complaint_text).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Complaint filed successfully", "complaint": complaint })),
    ))
}

#[debug_handler(state = AppState)]
pub(crate) async fn my_complaints(
    State(complaints): State<ComplaintService>,
    caller: CurrentUser,
) -> AppResult<Json<Vec<Complaint>>> {
    Ok(Json(complaints.list_filed_by(caller.id).await?))
}

#[debug_handler(state = AppState)]
pub(crate) async fn against_me(
    State(complaints): State<ComplaintService>,
    caller: CurrentUser,
) -> AppResult<Json<Vec<Complaint>>> {
    Ok(Json(complaints.list_against(caller.id).await?))
}

#[derive(Debug, Deserialize)]
pub(crate) struct RespondBody {
    #[serde(default)]
    response_text: String,
}

#[debug_handler(state = AppState)]
pub(crate) async fn respond(
    State(complaints): State<ComplaintService>,
    caller: CurrentUser,
    Path(complaint_id): Path<ComplaintId>,
    Json(RespondBody { response_text }): Json<RespondBody>,
) -> AppResult<Json<Value>> {
    let complaint = complaints.respond(complaint_id, &caller, &response_text).await?;
    Ok(Json(json!({ "message": "Response added successfully", "complaint": complaint })))
}

#[debug_handler(state = AppState)]
pub(crate) async fn resolve(
    State(complaints): State<ComplaintService>,
    caller: CurrentUser,
    Path(complaint_id): Path<ComplaintId>,
) -> AppResult<Json<Value>> {
    let complaint = complaints.resolve(complaint_id, &caller).await?;
    Ok(Json(json!({ "message": "Complaint resolved", "complaint": complaint })))
}
