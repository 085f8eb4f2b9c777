use super::{
    AppState,
    auth::AuthUser,
    extract::{ApiJson, ApiQuery},
};
use crate::{
    core::{submission, task, transaction, user, withdrawal},
    entities::{
        TaskModel, TaskSubmissionModel, TransactionModel, TransactionType, UserModel,
        WithdrawalRequestModel,
    },
    errors::Result,
};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct TransactionQuery {
    #[serde(rename = "type")]
    transaction_type: Option<String>,
}

/// Registration is open; identity is still assigned by the auth proxy.
pub async fn create_user(
    State(state): State<AppState>,
    ApiJson(new_user): ApiJson<user::NewUser>,
) -> Result<(StatusCode, Json<UserModel>)> {
    let created = user::create_user(&state.db, new_user).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn user_stats(
    State(state): State<AppState>,
    caller: AuthUser,
    Path(user_id): Path<i64>,
) -> Result<Json<user::UserStats>> {
    caller.ensure_self_or_admin(&state.db, user_id).await?;
    Ok(Json(user::get_user_stats(&state.db, user_id).await?))
}

pub async fn user_tasks(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> Result<Json<Vec<TaskModel>>> {
    Ok(Json(task::get_tasks_for_creator(&state.db, user_id).await?))
}

pub async fn user_submissions(
    State(state): State<AppState>,
    caller: AuthUser,
    Path(user_id): Path<i64>,
) -> Result<Json<Vec<TaskSubmissionModel>>> {
    caller.ensure_self_or_admin(&state.db, user_id).await?;
    Ok(Json(
        submission::get_submissions_for_worker(&state.db, user_id).await?,
    ))
}

pub async fn user_transactions(
    State(state): State<AppState>,
    caller: AuthUser,
    Path(user_id): Path<i64>,
    ApiQuery(query): ApiQuery<TransactionQuery>,
) -> Result<Json<Vec<TransactionModel>>> {
    caller.ensure_self_or_admin(&state.db, user_id).await?;
    let transaction_type = query
        .transaction_type
        .as_deref()
        .map(str::parse::<TransactionType>)
        .transpose()?;
    Ok(Json(
        transaction::get_transactions_for_user(&state.db, user_id, transaction_type).await?,
    ))
}

pub async fn user_withdrawals(
    State(state): State<AppState>,
    caller: AuthUser,
    Path(user_id): Path<i64>,
) -> Result<Json<Vec<WithdrawalRequestModel>>> {
    caller.ensure_self_or_admin(&state.db, user_id).await?;
    Ok(Json(
        withdrawal::get_withdrawals_for_user(&state.db, user_id).await?,
    ))
}
