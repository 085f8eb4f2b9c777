use super::{
    AppState,
    auth::AuthUser,
    extract::{ApiJson, ApiQuery},
};
use crate::{
    core::{
        submission,
        task::{self, TaskFilter, TaskPage, TaskPatch, TaskSpec},
    },
    entities::{TaskModel, TaskSubmissionModel, TaskType},
    errors::{Error, Result},
};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use sea_orm::DatabaseConnection;
use serde::Deserialize;

/// Query string of `GET /api/tasks`, e.g. `?types=like,watch&page=2&limit=20`.
#[derive(Debug, Deserialize)]
pub struct TaskListQuery {
    types: Option<String>,
    page: Option<u64>,
    limit: Option<u64>,
}

impl TaskListQuery {
    fn into_filter(self) -> Result<TaskFilter> {
        let defaults = TaskFilter::default();
        let types = self
            .types
            .as_deref()
            .unwrap_or_default()
            .split(',')
            .filter(|t| !t.trim().is_empty())
            .map(str::parse::<TaskType>)
            .collect::<Result<Vec<_>>>()?;

        Ok(TaskFilter {
            types,
            page: self.page.unwrap_or(defaults.page),
            limit: self.limit.unwrap_or(defaults.limit),
        })
    }
}

async fn ensure_can_manage(
    db: &DatabaseConnection,
    caller: AuthUser,
    task: &TaskModel,
) -> Result<()> {
    if task.creator_id == caller.0 || caller.load(db).await?.is_admin {
        return Ok(());
    }
    Err(Error::unauthorized("only the task's creator or an admin can do this"))
}

pub async fn list_tasks(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<TaskListQuery>,
) -> Result<Json<TaskPage>> {
    let filter = query.into_filter()?;
    let page = task::get_tasks(&state.db, filter, state.config.marketplace.max_page_size).await?;
    Ok(Json(page))
}

pub async fn get_task(
    State(state): State<AppState>,
    Path(task_id): Path<i64>,
) -> Result<Json<TaskModel>> {
    Ok(Json(task::require_task(&state.db, task_id).await?))
}

pub async fn create_task(
    State(state): State<AppState>,
    caller: AuthUser,
    ApiJson(spec): ApiJson<TaskSpec>,
) -> Result<(StatusCode, Json<TaskModel>)> {
    let created = task::create_task(&state.db, caller.0, spec).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn update_task(
    State(state): State<AppState>,
    caller: AuthUser,
    Path(task_id): Path<i64>,
    ApiJson(patch): ApiJson<TaskPatch>,
) -> Result<Json<TaskModel>> {
    let existing = task::require_task(&state.db, task_id).await?;
    ensure_can_manage(&state.db, caller, &existing).await?;
    Ok(Json(task::update_task(&state.db, task_id, patch).await?))
}

pub async fn task_submissions(
    State(state): State<AppState>,
    caller: AuthUser,
    Path(task_id): Path<i64>,
) -> Result<Json<Vec<TaskSubmissionModel>>> {
    let existing = task::require_task(&state.db, task_id).await?;
    ensure_can_manage(&state.db, caller, &existing).await?;
    Ok(Json(
        submission::get_submissions_for_task(&state.db, task_id).await?,
    ))
}
