use super::{AppState, auth::AuthUser, extract::ApiJson};
use crate::{
    core::submission::{self, ReviewOutcome},
    entities::TaskSubmissionModel,
    errors::Result,
};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct SubmitRequest {
    task_id: i64,
    proof: String,
}

#[derive(Debug, Deserialize)]
pub struct ReviewRequest {
    status: ReviewOutcome,
    #[serde(default)]
    feedback: Option<String>,
}

pub async fn submit(
    State(state): State<AppState>,
    caller: AuthUser,
    ApiJson(request): ApiJson<SubmitRequest>,
) -> Result<(StatusCode, Json<TaskSubmissionModel>)> {
    let created = submission::submit(
        &state.db,
        &state.config.marketplace,
        request.task_id,
        caller.0,
        request.proof,
    )
    .await?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn review(
    State(state): State<AppState>,
    caller: AuthUser,
    Path(submission_id): Path<i64>,
    ApiJson(request): ApiJson<ReviewRequest>,
) -> Result<Json<TaskSubmissionModel>> {
    let reviewed = submission::review(
        &state.db,
        &state.config.marketplace,
        caller.0,
        submission_id,
        request.status,
        request.feedback,
    )
    .await?;
    Ok(Json(reviewed))
}
